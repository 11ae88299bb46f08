// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the resource files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_data_dir() -> String {
    ".".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Resources configuration
///
/// Maps a request path to the file that persists it and the body a GET
/// returns before the file exists. Defining a `[resources.routes]` table in
/// the config file replaces the default set wholesale.
#[derive(Debug, Deserialize, Clone)]
pub struct ResourcesConfig {
    pub routes: HashMap<String, ResourceRoute>,
}

/// A single persisted resource route
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ResourceRoute {
    /// File name under `storage.data_dir`
    pub file: String,
    /// Body returned by GET while the file does not exist yet
    pub default: String,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            "/chat_history".to_string(),
            ResourceRoute {
                file: "chat_history.json".to_string(),
                default: "{}".to_string(),
            },
        );
        routes.insert(
            "/atividades".to_string(),
            ResourceRoute {
                file: "atividades.json".to_string(),
                default: "[]".to_string(),
            },
        );
        Self { routes }
    }
}

/// A resolved resource: storage key plus the default GET body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDef {
    pub key: String,
    pub default: String,
}

impl ResourcesConfig {
    /// Check that every route is usable before the server starts
    pub fn validate(&self) -> Result<(), String> {
        if self.routes.is_empty() {
            return Err("resources.routes must define at least one route".to_string());
        }
        let mut seen_keys: HashMap<String, &String> = HashMap::new();
        for (route, def) in &self.routes {
            if !route.starts_with('/') {
                return Err(format!("resource route '{route}' must start with '/'"));
            }
            if route.len() == 1 {
                return Err("resource route '/' is reserved".to_string());
            }
            if def.file.is_empty() {
                return Err(format!("resource route '{route}' has an empty file name"));
            }
            // Keys drop leading slashes, so distinct routes can collide
            let key = storage_key(route);
            if key.is_empty() {
                return Err(format!(
                    "resource route '{route}' reduces to an empty storage key"
                ));
            }
            if let Some(first) = seen_keys.insert(key.clone(), route) {
                return Err(format!(
                    "resource routes '{first}' and '{route}' map to the same storage key '{key}'"
                ));
            }
        }
        Ok(())
    }

    /// Build the request-path lookup table used by the router
    pub fn table(&self) -> HashMap<String, ResourceDef> {
        self.routes
            .iter()
            .map(|(route, def)| {
                (
                    route.clone(),
                    ResourceDef {
                        key: storage_key(route),
                        default: def.default.clone(),
                    },
                )
            })
            .collect()
    }

    /// Key-to-file pairs for constructing the file store
    pub fn store_entries(&self) -> Vec<(String, String)> {
        self.routes
            .iter()
            .map(|(route, def)| (storage_key(route), def.file.clone()))
            .collect()
    }
}

/// Derive the storage key from a route path
fn storage_key(route: &str) -> String {
    route.trim_start_matches('/').to_string()
}
