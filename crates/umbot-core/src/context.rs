//! Shared application context: configuration, storage, HTTP client, media cache.
//! Built once at startup and shared by every request through `Arc`.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiClient;
use crate::config::{AppConfig, PlatformParams};
use crate::error::BotResult;
use crate::models::{open_storage, Storage};

pub struct AppContext {
    pub config: AppConfig,
    pub storage: Arc<dyn Storage>,
    pub api: ApiClient,
    /// Hot cache in front of the `ImageTokens`/`SoundTokens` models:
    /// `platform:kind:source` -> token.
    pub(crate) media_cache: DashMap<String, String>,
}

impl AppContext {
    /// Open the configured storage backend and build the HTTP client.
    pub fn new(config: AppConfig) -> BotResult<Self> {
        let storage = open_storage(&config.storage)?;
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: AppConfig, storage: Arc<dyn Storage>) -> BotResult<Self> {
        let api = ApiClient::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self {
            config,
            storage,
            api,
            media_cache: DashMap::new(),
        })
    }

    pub fn params(&self) -> &PlatformParams {
        &self.config.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StorageConfig, StorageMode};

    #[test]
    fn builds_with_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage: StorageConfig {
                mode: StorageMode::File,
                path: dir.path().to_path_buf(),
            },
            ..Default::default()
        };
        let ctx = AppContext::new(config).unwrap();
        assert!(ctx.params().telegram_token.is_none());
        assert!(ctx.media_cache.is_empty());
    }
}
