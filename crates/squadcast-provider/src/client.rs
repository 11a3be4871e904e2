// HTTP stats provider for the public fantasy API.
//
// Raw JSON responses are cached per URL for the configured TTL. Concurrent
// requests for one URL wait on a per-URL gate and then read the cache, so
// the bootstrap document that carries both players and teams is fetched
// once per run even when both trait methods run together.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use squadcast_core::config::ProviderConfig;
use squadcast_core::PlayerId;

use crate::cache::TtlCache;
use crate::records::{BootstrapRecord, FixtureRecord, HistoryRecord, PlayerRecord, TeamRecord};
use crate::{ProviderError, StatsProvider};

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

const BOOTSTRAP_PATH: &str = "/bootstrap-static/";
const FIXTURES_PATH: &str = "/fixtures/";

fn element_summary_path(id: PlayerId) -> String {
    format!("/element-summary/{id}/")
}

fn fixtures_path(gameweek: Option<u32>) -> String {
    match gameweek {
        Some(gw) => format!("{FIXTURES_PATH}?event={gw}"),
        None => FIXTURES_PATH.to_string(),
    }
}

// ---------------------------------------------------------------------------
// FplClient
// ---------------------------------------------------------------------------

pub struct FplClient {
    http: reqwest::Client,
    base_url: String,
    cache: Mutex<TtlCache<String, Value>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FplClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        cache_ttl: Duration,
        cache_max_entries: usize,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("squadcast/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: Mutex::new(TtlCache::new(cache_ttl, cache_max_entries)),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::new(
            config.base_url.clone(),
            config.request_timeout(),
            config.cache_ttl(),
            config.cache_max_entries,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn cached(&self, url: &str) -> Option<Value> {
        let hit = self.cache.lock().await.get(&url.to_string());
        if hit.is_some() {
            debug!(%url, "cache hit");
        }
        hit
    }

    /// GET `path` as JSON. `Ok(None)` on 404.
    async fn get_json(&self, path: &str) -> Result<Option<Value>, ProviderError> {
        let url = self.url(path);
        if let Some(hit) = self.cached(&url).await {
            return Ok(Some(hit));
        }

        let gate = Arc::clone(self.in_flight.lock().await.entry(url.clone()).or_default());
        let _turn = gate.lock().await;
        // another caller may have filled the cache while we waited
        if let Some(hit) = self.cached(&url).await {
            return Ok(Some(hit));
        }

        let result = self.request(&url).await;
        self.in_flight.lock().await.remove(&url);
        result
    }

    async fn request(&self, url: &str) -> Result<Option<Value>, ProviderError> {
        debug!(%url, "requesting");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|source| ProviderError::Decode {
            url: url.to_string(),
            source,
        })?;
        self.cache.lock().await.insert(url.to_string(), value.clone());
        Ok(Some(value))
    }

    /// GET and decode, treating 404 as an error.
    async fn get_required<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let url = self.url(path);
        let value = self
            .get_json(path)
            .await?
            .ok_or_else(|| ProviderError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                url: url.clone(),
            })?;
        serde_json::from_value(value).map_err(|source| ProviderError::Decode { url, source })
    }

    async fn bootstrap(&self) -> Result<BootstrapRecord, ProviderError> {
        self.get_required(BOOTSTRAP_PATH).await
    }
}

#[async_trait]
impl StatsProvider for FplClient {
    async fn fetch_all_players(&self) -> Result<Vec<PlayerRecord>, ProviderError> {
        Ok(self.bootstrap().await?.elements)
    }

    async fn fetch_teams(&self) -> Result<Vec<TeamRecord>, ProviderError> {
        Ok(self.bootstrap().await?.teams)
    }

    async fn fetch_fixtures(&self, gameweek: Option<u32>) -> Result<Vec<FixtureRecord>, ProviderError> {
        self.get_required(&fixtures_path(gameweek)).await
    }

    async fn fetch_player_history(&self, id: PlayerId) -> Result<Option<HistoryRecord>, ProviderError> {
        let path = element_summary_path(id);
        let url = self.url(&path);
        match self.get_json(&path).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| ProviderError::Decode { url, source }),
            None => Ok(None),
        }
    }
}
