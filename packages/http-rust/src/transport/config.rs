//! Transport configuration.

use std::time::Duration;

/// Settings for [`ReqwestTransport`](super::ReqwestTransport).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Bound on establishing the TCP/TLS connection. `None` leaves it to the OS.
    pub connect_timeout: Option<Duration>,
    /// Value of the `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: concat!("toolbelt-http/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
