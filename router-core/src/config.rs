//! Router and server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the plain (unencrypted) TCP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlainSocketConfig {
    /// Whether the plain listener should be started at all.
    pub enabled: bool,
    /// Address to bind, e.g. `"0.0.0.0:6100"`.
    pub bind_addr: String,
}

impl Default for PlainSocketConfig {
    fn default() -> Self {
        PlainSocketConfig { enabled: true, bind_addr: "0.0.0.0:6100".to_string() }
    }
}

/// Configuration for the TLS listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsSocketConfig {
    /// Whether the TLS listener should be started at all.
    pub enabled: bool,
    /// Address to bind, e.g. `"0.0.0.0:6101"`.
    pub bind_addr: String,
    /// Path to a PEM-encoded certificate chain.
    pub cert_path: String,
    /// Path to a PEM-encoded private key.
    pub key_path: String,
}

impl Default for TlsSocketConfig {
    fn default() -> Self {
        TlsSocketConfig {
            enabled: false,
            bind_addr: "0.0.0.0:6101".to_string(),
            cert_path: String::new(),
            key_path: String::new(),
        }
    }
}

/// Top-level router configuration, loaded from YAML by the embedding
/// binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Plain TCP listener settings.
    pub plain_socket: PlainSocketConfig,
    /// TLS listener settings.
    pub tls_socket: TlsSocketConfig,
    /// Seconds a connection may stay unauthenticated before being
    /// dropped.
    pub pre_auth_timeout_secs: u64,
    /// Maximum accepted input line length, in bytes, before the
    /// connection is dropped as a protocol violation.
    pub max_input_line_len: usize,
    /// Soft target, in bytes, for how much unacknowledged output may
    /// accumulate before the driver requests an ack.
    pub target_pending_ack_bytes: usize,
    /// Seconds a puppet channel may sit idle before being reaped.
    pub puppet_idle_secs: u64,
    /// Maximum number of in-flight (unacknowledged) serial ids a
    /// client may have outstanding.
    pub client_window_size: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            plain_socket: PlainSocketConfig::default(),
            tls_socket: TlsSocketConfig::default(),
            pre_auth_timeout_secs: 60,
            max_input_line_len: 4096,
            target_pending_ack_bytes: 4096,
            puppet_idle_secs: 600,
            client_window_size: 64,
        }
    }
}

impl RouterConfig {
    /// Parses a `RouterConfig` from a YAML document, filling in
    /// defaults for any field the document omits.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let cfg = RouterConfig::default();
        assert_eq!(cfg.pre_auth_timeout_secs, 60);
        assert_eq!(cfg.max_input_line_len, 4096);
        assert_eq!(cfg.target_pending_ack_bytes, 4096);
        assert_eq!(cfg.puppet_idle_secs, 600);
        assert_eq!(cfg.client_window_size, 64);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let cfg = RouterConfig::from_yaml_str("puppet_idle_secs: 120\n").unwrap();
        assert_eq!(cfg.puppet_idle_secs, 120);
        assert_eq!(cfg.max_input_line_len, 4096);
    }
}
