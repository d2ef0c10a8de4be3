//! Error types for notification delivery.

use thiserror::Error;

/// Errors that can occur while configuring or delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed (connect, DNS, TLS, or body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file used as the request body could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Destination URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl NotifyError {
    /// Whether this error came from the network round trip itself.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Io(_))
    }
}
