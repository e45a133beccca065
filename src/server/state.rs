use anyhow::{Context, Result};
use std::sync::Arc;

use crate::auth::{SessionStore, UserStore};
use crate::backend::BackendClient;
use crate::config::{self, Config};
use crate::ranking::{FileSource, ScoreRankConverter};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub converter: ScoreRankConverter<FileSource>,
    pub backend: BackendClient,
    pub users: UserStore,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<SharedState> {
        let timeout = config::request_timeout(&config)?;
        let ttl = config::session_ttl(&config)?;

        let backend = BackendClient::new(&config.backend_url, timeout)
            .context("Failed to create backend client")?;
        let users = UserStore::open(config::users_path(&config))?;
        let converter = ScoreRankConverter::new(FileSource::new(config.data_dir.clone()));

        Ok(Arc::new(Self {
            config,
            converter,
            backend,
            users,
            sessions: SessionStore::new(ttl),
        }))
    }

    /// Province from the request, or the configured default when absent or blank
    pub fn province_or_default(&self, province: Option<String>) -> String {
        province
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.config.default_province.clone())
    }

    pub fn subject_or_default(&self, subject: Option<String>) -> String {
        subject
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.config.default_subject.clone())
    }
}
