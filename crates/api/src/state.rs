use std::sync::Arc;

use crate::config::ServerConfig;
use crate::optimization::OptimizationRelay;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Optimization job relay (engine bridge + scratch workspace).
    pub relay: Arc<OptimizationRelay>,
}

impl AppState {
    /// Build state from configuration, wiring the relay to the configured engine.
    pub fn new(config: ServerConfig) -> Self {
        let relay = OptimizationRelay::from_config(&config.engine);
        Self {
            config: Arc::new(config),
            relay: Arc::new(relay),
        }
    }
}
