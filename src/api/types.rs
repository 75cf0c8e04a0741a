//! Shared state handed to API handlers.

use std::sync::Arc;

use crate::analysis::AnalysisClient;
use crate::config::Config;
use crate::storage::TempStore;

/// Shared context for all API handlers.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<Config>,
    pub store: Arc<TempStore>,
    pub client: Arc<dyn AnalysisClient>,
}

impl ApiContext {
    pub fn new(config: Arc<Config>, client: Arc<dyn AnalysisClient>) -> Self {
        let store = Arc::new(TempStore::new(config.upload_dir.clone()));
        Self {
            config,
            store,
            client,
        }
    }
}
