pub mod chantiers;
pub mod client_dashboard;
pub mod contact_actions;
pub mod error;
pub mod ltv;
pub mod pipeline;
pub mod planning;

pub use chantiers::chantiers_page;
pub use client_dashboard::client_dashboard_page;
pub use contact_actions::contact_actions_page;
pub use error::error_page;
pub use ltv::ltv_page;
pub use pipeline::{completion_page, pipeline_page, CompletionParams, CompletionVm};
pub use planning::{planning_page, PlanningVm};
