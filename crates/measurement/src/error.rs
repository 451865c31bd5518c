//! Error types for the measurement client.

/// Errors that can occur when using the measurement client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector answered with something other than 200.
    #[error("{}", .0.as_u16())]
    Status(reqwest::StatusCode),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Hit could not be encoded into a query string.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Tracker has been shutdown.
    #[error("Tracker has been shutdown")]
    Shutdown,
}
