/// Errors raised while setting up an [`HttpTransport`](crate::HttpTransport).
///
/// Request-time failures are reported as [`aidbox_core::Error`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported base URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),

    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
