use axum::Json;
use serde::Serialize;
use tracing::info;

/// Body shape shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Message<T> {
    pub message: String,
    pub data: T,
}

/// Builds the success envelope and records `log` for operators.
///
/// `log` is not sent to the client; pass an empty string to skip the log line.
pub fn message<T: Serialize>(log: &str, message: impl Into<String>, data: T) -> Json<Message<T>> {
    if !log.is_empty() {
        info!(target: "blogd::message", "{log}");
    }
    Json(Message {
        message: message.into(),
        data,
    })
}
