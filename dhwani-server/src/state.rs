use dhwani_core::{Config, SynthesisService};
use std::sync::Arc;

/// Shared state across all handlers. Everything is constructed once in
/// `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<SynthesisService>,
}

impl AppState {
    pub fn new(config: Config, service: SynthesisService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
        }
    }
}
