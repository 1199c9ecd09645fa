use std::sync::Arc;
use sm_discovery::DiscoveryEngine;

pub struct AppState {
    pub engine: Arc<DiscoveryEngine>,
}

impl AppState {
    pub fn new(engine: Arc<DiscoveryEngine>) -> Self {
        Self { engine }
    }
}
