pub mod chantier;
pub mod client_dashboard;
pub mod contact_actions;
pub mod ltv;
pub mod pipeline;
pub mod planning;
