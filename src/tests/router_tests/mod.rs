mod chantier_tests;
mod contact_tests;
mod dashboard_tests;
mod ltv_tests;
mod pipeline_tests;
