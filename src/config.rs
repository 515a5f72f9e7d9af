//! Configuration management for the Scroll Portal server
//!
//! Everything is read from the environment once at startup. The parser
//! policy lives here so that it is fixed for the lifetime of the process;
//! request handlers only ever see the resulting immutable value.

use std::env;

use crate::scroll::ParserPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub parser: ParserPolicy,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 1337,
            },
            parser: ParserPolicy::restrictive(),
        }
    }
}

impl Config {
    /// Read configuration from the environment. Every variable is optional;
    /// missing or unparseable values fall back to the defaults, which keep
    /// every external-resolution capability off.
    pub fn from_env() -> Self {
        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|port| port.parse().ok())
                    .unwrap_or(1337),
            },
            parser: ParserPolicy {
                load_external_declarations: env_bool("SCROLL_LOAD_EXTERNAL_DTD", false),
                resolve_external_entities: env_bool("SCROLL_RESOLVE_EXTERNAL_ENTITIES", false),
                allow_network_fetch: env_bool("SCROLL_ALLOW_NETWORK_FETCH", false),
            },
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
