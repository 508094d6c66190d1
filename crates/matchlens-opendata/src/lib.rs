// StatsBomb open-data provider: an HTTP client over the public repository and
// a reader over a local checkout. `from_config` picks one from `[source]`.

pub mod client;
pub mod local;
pub mod records;

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use matchlens_core::config::{SourceConfig, SourceKind};
use matchlens_core::model::{Competition, Match, RawEvent};
use matchlens_core::source::{EventSource, FetchError, TournamentQuery};

pub use client::OpenDataClient;
pub use local::LocalOpenData;

/// The configured provider.
pub enum OpenDataSource {
    Http(OpenDataClient),
    Local(LocalOpenData),
}

/// Build the source described by the `[source]` config section.
pub fn from_config(config: &SourceConfig) -> Result<OpenDataSource, FetchError> {
    match config.kind {
        SourceKind::Http => {
            info!("using open-data over HTTP at {}", config.base_url);
            let client = OpenDataClient::new(
                &config.base_url,
                Duration::from_secs(config.timeout_secs),
                config.max_concurrent_fetches,
            )?;
            Ok(OpenDataSource::Http(client))
        }
        SourceKind::Local => {
            let dir = config
                .local_dir
                .as_deref()
                .ok_or_else(|| FetchError::NotFound("source.local_dir is not set".into()))?;
            info!("using local open-data checkout at {}", dir);
            Ok(OpenDataSource::Local(LocalOpenData::new(
                dir,
                config.max_concurrent_fetches,
            )))
        }
    }
}

#[async_trait]
impl EventSource for OpenDataSource {
    async fn competitions(&self) -> Result<Vec<Competition>, FetchError> {
        match self {
            OpenDataSource::Http(s) => s.competitions().await,
            OpenDataSource::Local(s) => s.competitions().await,
        }
    }

    async fn matches(&self, competition_id: u32, season_id: u32) -> Result<Vec<Match>, FetchError> {
        match self {
            OpenDataSource::Http(s) => s.matches(competition_id, season_id).await,
            OpenDataSource::Local(s) => s.matches(competition_id, season_id).await,
        }
    }

    async fn events(&self, match_id: u64) -> Result<Vec<RawEvent>, FetchError> {
        match self {
            OpenDataSource::Http(s) => s.events(match_id).await,
            OpenDataSource::Local(s) => s.events(match_id).await,
        }
    }

    async fn tournament_events(
        &self,
        query: &TournamentQuery,
    ) -> Result<Vec<RawEvent>, FetchError> {
        match self {
            OpenDataSource::Http(s) => s.tournament_events(query).await,
            OpenDataSource::Local(s) => s.tournament_events(query).await,
        }
    }
}
