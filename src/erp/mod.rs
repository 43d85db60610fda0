mod client;
mod erp_error;
mod models;

pub use client::{ErpApi, ExtrabatClient};
pub use erp_error::ErpError;
pub use models::{
    Appointment, ClientCodes, ClientDocuments, ErpClient, ErpUser, ParamKind, ParamOption,
};
