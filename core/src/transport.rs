//! Transports that carry `db` payloads to the server.
//!
//! `Transport` is the seam `DB` talks through: hand it an endpoint path and
//! a payload, get back the reply object. `Connector` is the blocking HTTP
//! implementation (behind the `ureq` feature); tests plug in their own.

use serde_json::Value;

use crate::error::DbError;

/// Sends one JSON-RPC payload and returns the reply object.
///
/// Implementations must turn an `error` reply into `DbError::Rpc` (see
/// `rpc::check_reply`) so that an `Ok` value always holds a `result`-bearing
/// reply.
pub trait Transport {
    fn json(&self, path: &str, payload: &Value) -> Result<Value, DbError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn json(&self, path: &str, payload: &Value) -> Result<Value, DbError> {
        (**self).json(path, payload)
    }
}

#[cfg(feature = "ureq")]
pub use connector::{Connector, ConnectorConfig, DEFAULT_TIMEOUT};

#[cfg(feature = "ureq")]
mod connector {
    use std::time::Duration;

    use serde_json::Value;

    use super::Transport;
    use crate::error::DbError;
    use crate::rpc;

    /// Applied when the caller does not pick a timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Where and how long to wait.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ConnectorConfig {
        pub base_url: String,
        pub timeout: Duration,
    }

    impl ConnectorConfig {
        pub fn new(base_url: &str) -> Self {
            Self {
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout: DEFAULT_TIMEOUT,
            }
        }

        pub fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }
    }

    /// Blocking JSON-RPC transport over HTTP.
    ///
    /// Dumps and restores of large databases can take far longer than the
    /// default timeout; raise it with `set_timeout` around such calls.
    pub struct Connector {
        config: ConnectorConfig,
        agent: ureq::Agent,
    }

    impl std::fmt::Debug for Connector {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Connector").field("config", &self.config).finish()
        }
    }

    impl Connector {
        pub fn new(config: ConnectorConfig) -> Self {
            let agent = build_agent(config.timeout);
            Self { config, agent }
        }

        pub fn base_url(&self) -> &str {
            &self.config.base_url
        }

        pub fn timeout(&self) -> Duration {
            self.config.timeout
        }

        /// Replace the timeout for subsequent calls.
        pub fn set_timeout(&mut self, timeout: Duration) {
            self.config.timeout = timeout;
            self.agent = build_agent(timeout);
        }
    }

    fn build_agent(timeout: Duration) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent()
    }

    impl Transport for Connector {
        fn json(&self, path: &str, payload: &Value) -> Result<Value, DbError> {
            let url = format!("{}{path}", self.config.base_url);
            let body = serde_json::to_string(&rpc::envelope(payload))
                .map_err(|e| DbError::Serialization(e.to_string()))?;
            tracing::trace!(%url, bytes = body.len(), "posting JSON-RPC request");

            let mut response = self
                .agent
                .post(&url)
                .content_type("application/json")
                .send(body.as_bytes())
                .map_err(|e| DbError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let text = response
                .body_mut()
                .with_config()
                .limit(u64::MAX)
                .read_to_string()
                .map_err(|e| DbError::Transport(e.to_string()))?;

            if status != 200 {
                return Err(DbError::Http { status, body: text });
            }
            rpc::parse_reply(&text)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn trailing_slash_is_stripped() {
            let config = ConnectorConfig::new("http://localhost:8069//");
            assert_eq!(config.base_url, "http://localhost:8069");
            assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        }

        #[test]
        fn set_timeout_updates_config() {
            let mut connector = Connector::new(ConnectorConfig::new("http://localhost:8069"));
            connector.set_timeout(Duration::from_secs(600));
            assert_eq!(connector.timeout(), Duration::from_secs(600));
            assert_eq!(connector.base_url(), "http://localhost:8069");
        }

        #[test]
        fn unreachable_server_is_a_transport_error() {
            let connector = Connector::new(
                ConnectorConfig::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(2)),
            );
            let err = connector
                .json("/jsonrpc", &serde_json::json!({}))
                .unwrap_err();
            assert!(matches!(err, DbError::Transport(_)));
        }
    }
}
