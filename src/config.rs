//! Configuration management for the anchoring server

use serde::Deserialize;
use std::env;

use crate::anchoring::{EngineConfig, DEFAULT_CAPACITY};
use crate::memory::DEFAULT_CONTEXT_CHARS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub anchoring: AnchoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnchoringConfig {
    /// Entries kept in each document's quote-position cache
    pub quote_cache_capacity: usize,
    /// Characters of context captured around described quotes
    pub context_chars: usize,
    /// Register documents as if produced by a viewer without end-of-line markers
    pub legacy_text_rendering: bool,
}

impl AnchoringConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            quote_cache_capacity: self.quote_cache_capacity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            anchoring: AnchoringConfig {
                quote_cache_capacity: DEFAULT_CAPACITY,
                context_chars: DEFAULT_CONTEXT_CHARS,
                legacy_text_rendering: false,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            anchoring: AnchoringConfig {
                quote_cache_capacity: env::var("ANCHOR_QUOTE_CACHE_CAPACITY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_CAPACITY),
                context_chars: env::var("ANCHOR_CONTEXT_CHARS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_CONTEXT_CHARS),
                legacy_text_rendering: env::var("ANCHOR_LEGACY_TEXT_RENDERING")
                    .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
        }
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.anchoring.quote_cache_capacity, 1000);
        assert_eq!(config.anchoring.context_chars, 32);
        assert!(!config.anchoring.legacy_text_rendering);
    }

    #[test]
    fn test_engine_config() {
        let mut config = Config::default();
        config.anchoring.quote_cache_capacity = 12;
        assert_eq!(config.anchoring.engine_config().quote_cache_capacity, 12);
    }

    #[test]
    fn test_from_env_falls_back_on_invalid_values() {
        env::set_var("SERVER_PORT", "not-a-port");
        env::set_var("ANCHOR_CONTEXT_CHARS", "many");
        let config = Config::from_env();
        env::remove_var("SERVER_PORT");
        env::remove_var("ANCHOR_CONTEXT_CHARS");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.anchoring.context_chars, DEFAULT_CONTEXT_CHARS);
    }
}
