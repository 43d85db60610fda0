#[derive(Debug, thiserror::Error)]
pub enum ErpError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Not found in Extrabat: {0}")]
    NotFound(String),
    #[error("Extrabat responded {status}: {body}")]
    Api { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    JsonParse(String),
    #[error("Unexpected data shape: {0}")]
    UnexpectedShape(String),
}
