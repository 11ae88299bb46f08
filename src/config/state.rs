// Application state module
// Holds the loaded configuration and the injected resource store

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::{Config, ResourceDef};
use crate::store::ResourceStore;

/// Application state shared by every connection
pub struct AppState {
    pub config: Config,
    /// Storage backing the resource routes
    pub store: Arc<dyn ResourceStore>,
    /// Request path -> resource lookup table
    pub resources: HashMap<String, ResourceDef>,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            config: config.clone(),
            store,
            resources: config.resources.table(),
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }
}
