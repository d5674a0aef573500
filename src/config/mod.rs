//! Configuration management for the flowlite engine.
//!
//! Handles server configuration and runtime parameters.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Engine and built-in flow parameters
    pub engine: EngineConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Engine parameters shared by all runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard cap on node executions per run, guarding against unbounded loops
    pub max_steps: u32,
    /// Chunk size (in chars) for the built-in summarize flow
    pub chunk_size: usize,
    /// Length limit (in chars) the summarize flow shortens towards
    pub summary_limit: usize,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("FLOWLITE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("FLOWLITE_PORT", 3007),
            },
            engine: EngineConfig {
                max_steps: env_or("FLOWLITE_MAX_STEPS", 20),
                chunk_size: env_or("FLOWLITE_CHUNK_SIZE", 200),
                summary_limit: env_or("FLOWLITE_SUMMARY_LIMIT", 200),
            },
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Config::default().engine
    }
}

/// Parse an env var, falling back to the default on absence or bad input.
fn env_or<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
