//! Server configuration.

use std::net::SocketAddr;

use exrates_fx::{FxEngineConfig, RateCacheConfig};

/// Environment variables holding the upstream API key, in lookup order.
pub const API_KEY_VARS: [&str; 2] = ["apikey", "EXCHANGE_RATE_API_KEY"];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Upstream API key.
    pub api_key: Option<String>,
    /// Log output format.
    pub log_format: LogFormat,
    /// FX engine configuration.
    pub fx: FxEngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8000,
            api_key: None,
            log_format: LogFormat::Text,
            fx: FxEngineConfig {
                cache: RateCacheConfig::default(),
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.api_key = API_KEY_VARS.iter().find_map(|key| lookup(key));

        if let Some(addr) = lookup("EXRATES_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("EXRATES_LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Some(format) = lookup("EXRATES_LOG_FORMAT") {
            config.log_format = LogFormat::parse(&format);
        }

        config
    }

    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.listen_addr, self.listen_port)
            .parse()
            .map_err(|e| format!("Invalid listen address: {}", e))
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        match &self.api_key {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(format!(
                    "Upstream API key missing, set one of {}",
                    API_KEY_VARS.join(", ")
                ))
            }
        }

        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        self.socket_addr()?;

        if self.fx.cache.ttl <= chrono::Duration::zero() {
            return Err("Cache TTL must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_needs_api_key() {
        let config = ServerConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("apikey", "abc123"),
            ("EXRATES_LISTEN_ADDR", "127.0.0.1"),
            ("EXRATES_LISTEN_PORT", "9000"),
            ("EXRATES_LOG_FORMAT", "JSON"),
        ]));

        assert!(config.validate().is_ok());
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.socket_addr().unwrap().port(), 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.fx.cache.ttl, chrono::Duration::seconds(86_400));
    }

    #[test]
    fn test_api_key_fallback_variable() {
        let config = ServerConfig::from_lookup(lookup(&[("EXCHANGE_RATE_API_KEY", "k")]));
        assert_eq!(config.api_key.as_deref(), Some("k"));

        let both = ServerConfig::from_lookup(lookup(&[
            ("apikey", "primary"),
            ("EXCHANGE_RATE_API_KEY", "secondary"),
        ]));
        assert_eq!(both.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ServerConfig::from_lookup(lookup(&[("apikey", "k")]));
        config.listen_port = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::from_lookup(lookup(&[("apikey", "k")]));
        config.listen_addr = "not an address".to_string();
        assert!(config.validate().is_err());

        let blank = ServerConfig::from_lookup(lookup(&[("apikey", "   ")]));
        assert!(blank.validate().is_err());
    }
}
