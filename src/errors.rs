// errors.rs
use crate::erp::ErpError;
use crate::mailer::MailerError;

/// Errors originating from either the request layer
/// (routing, validation, missing records) or downstream layers (store, ERP, mail).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// Form input rejected before any store or network call.
    #[error("{0}")]
    Validation(String),
    /// The transition is not allowed from the current state.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("ERP Error: {0}")]
    Erp(#[from] ErpError),
    #[error("Mail Error: {0}")]
    Mail(#[from] MailerError),
    #[error("Spreadsheet Error: {0}")]
    XlsxError(String),
    #[error("Internal Server Error")]
    InternalError,
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::BadRequest(_) | ServerError::Validation(_) => 400,
            ServerError::Conflict(_) => 409,
            ServerError::Erp(ErpError::NotFound(_)) => 404,
            ServerError::Mail(MailerError::MissingRecipient(_)) => 400,
            ServerError::Erp(_) | ServerError::Mail(_) => 502,
            ServerError::DbError(_) | ServerError::XlsxError(_) | ServerError::InternalError => 500,
        }
    }
}
