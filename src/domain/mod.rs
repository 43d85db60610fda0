pub mod chantier;
pub mod client;
pub mod contact_action;
pub mod dates;
pub mod intervention;
pub mod ltv;
pub mod opportunity;
