use std::sync::Arc;

use super::error::ApiError;
use crate::config::Config;
use crate::relay::{Dispatcher, Fetcher, HttpTransport, ReqwestTransport, TransportConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: Config, transport: Arc<dyn HttpTransport>) -> Self {
        let settings = Arc::new(config.relay.clone());
        let dispatcher = Dispatcher::new(Fetcher::new(settings, transport));
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// State backed by a real HTTP client configured from `config.relay`
    pub fn from_config(config: Config) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(TransportConfig::from_settings(&config.relay))
            .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::new(config, Arc::new(transport)))
    }
}
