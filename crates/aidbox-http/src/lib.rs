//! HTTP transport for [`aidbox_core`].
//!
//! ```no_run
//! use aidbox_http::{ConnectionConfig, connect};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = connect(ConnectionConfig::new("http://localhost:8080").with_basic_auth("root", "secret"))?;
//! let patients = client
//!     .fetch(&client.resources("Patient").search("name", "John").limit(10))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod transport;

pub use config::{AuthConfig, ConnectionConfig};
pub use error::ConfigError;
pub use transport::HttpTransport;

/// Async client over HTTP.
pub type HttpClient = aidbox_core::Client<HttpTransport>;

/// Blocking client over HTTP.
pub type BlockingHttpClient = aidbox_core::BlockingClient<HttpTransport>;

/// Builds an async client for `config`.
pub fn connect(config: ConnectionConfig) -> Result<HttpClient, ConfigError> {
    Ok(aidbox_core::Client::new(HttpTransport::new(config)?))
}
