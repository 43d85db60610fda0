pub mod chantiers;
pub mod clients;
pub mod connection;
pub mod contact_actions;
pub mod employes;
pub mod interactions;
pub mod interventions;
pub mod ltv;
pub mod opportunities;
pub mod procedures;

pub use connection::{init_db, Database};
