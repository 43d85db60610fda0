use crate::errors::ServerError;
use crate::templates::pages::error_page;
use astra::{Body, Response, ResponseBuilder};

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into an HTML error page with the matching status.
/// `retry` is the page the user came from, offered as a retry link.
pub fn error_to_response(err: ServerError, retry: &str) -> Response {
    let status = err.status_code();
    if status >= 500 {
        tracing::error!(status, error = %err, "request failed");
    } else {
        tracing::warn!(status, error = %err, "request rejected");
    }

    let html = error_page(status, &err.to_string(), retry).into_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::from(html))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
