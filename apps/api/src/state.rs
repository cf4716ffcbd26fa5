use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Holds configuration only. Model clients and agents are built per request so that
/// concurrent runs share nothing mutable.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
}
