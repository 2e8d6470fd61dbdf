//! Error types for the signed client.

use thiserror::Error;

/// Failures a read call can surface. The tolerated HTTP 400 on config field
/// reads never appears here; it is synthesized into an empty value instead.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure: DNS, connect, timeout, reset.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server error ({status}): {message}")]
    Status { status: u16, message: String },

    /// A 2xx response whose body was not valid JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Status { status: 503, message: "unavailable".into() };
        let shown = format!("{err}");
        assert!(shown.contains("503"));
        assert!(shown.contains("unavailable"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
