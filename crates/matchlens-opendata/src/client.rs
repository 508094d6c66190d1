// HTTP client for the StatsBomb open-data repository.
//
// Files are fetched from a raw-content base URL
// (`{base_url}/competitions.json`, `{base_url}/matches/{c}/{s}.json`,
// `{base_url}/events/{id}.json`). No retries; a failed request surfaces as a
// `FetchError` and the caller decides what to do.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use matchlens_core::model::{parse_competitions, parse_matches, Competition, Match, RawEvent};
use matchlens_core::source::{EventSource, FetchError, TournamentQuery};

use crate::records::{self, COMPETITIONS_PATH};

/// Public GitHub raw-content root of the open-data repository.
pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/statsbomb/open-data/master/data";

pub struct OpenDataClient {
    http: reqwest::Client,
    base_url: String,
    max_concurrent: usize,
}

impl OpenDataClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        max_concurrent: usize,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http {
                url: base_url.to_string(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_concurrent,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_array(&self, path: &str) -> Result<Vec<Value>, FetchError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await.map_err(|e| FetchError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;
        records::decode_array(&url, &body)
    }
}

#[async_trait]
impl EventSource for OpenDataClient {
    async fn competitions(&self) -> Result<Vec<Competition>, FetchError> {
        Ok(parse_competitions(self.get_array(COMPETITIONS_PATH).await?))
    }

    async fn matches(&self, competition_id: u32, season_id: u32) -> Result<Vec<Match>, FetchError> {
        let path = records::matches_path(competition_id, season_id);
        Ok(parse_matches(self.get_array(&path).await?))
    }

    async fn events(&self, match_id: u64) -> Result<Vec<RawEvent>, FetchError> {
        let values = self.get_array(&records::events_path(match_id)).await?;
        Ok(records::into_raw_events(values, match_id))
    }

    async fn tournament_events(
        &self,
        query: &TournamentQuery,
    ) -> Result<Vec<RawEvent>, FetchError> {
        records::collect_tournament(self, query, self.max_concurrent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let client =
            OpenDataClient::new("http://example.test/data/", Duration::from_secs(1), 2).unwrap();
        assert_eq!(client.url("competitions.json"), "http://example.test/data/competitions.json");
    }
}
