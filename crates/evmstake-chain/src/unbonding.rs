//! Pending unbonding entries from the indexer API.
//!
//! The collection is refetched whenever the watched address, the API base
//! URL or the refresh counter changes. Failures never clear what is shown:
//! the tracker keeps the last successful snapshot.

use crate::config::{HTTP_TIMEOUT, unbonding_url};
use crate::error::ChainError;
use async_trait::async_trait;
use evmstake_core::UnbondingEntry;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Where unbonding entries come from.
#[async_trait]
pub trait UnbondingSource: Send + Sync {
    async fn fetch(&self, api_url: &str, address: &str) -> Result<Vec<UnbondingEntry>, ChainError>;
}

/// Indexer REST API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUnbondingSource {
    client: reqwest::Client,
}

impl HttpUnbondingSource {
    pub fn new() -> Result<Self, ChainError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UnbondingSource for HttpUnbondingSource {
    async fn fetch(&self, api_url: &str, address: &str) -> Result<Vec<UnbondingEntry>, ChainError> {
        let url = unbonding_url(api_url, address);
        tracing::debug!("Fetching unbonding entries from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ChainError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let entries: Option<Vec<UnbondingEntry>> = response.json().await?;
        Ok(entries.unwrap_or_default())
    }
}

/// Inputs that decide which collection to show.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnbondingQuery {
    pub address: Option<String>,
    pub api_url: Option<String>,
    /// Bumped to force a refetch with otherwise unchanged inputs.
    pub refresh: u64,
}

impl UnbondingQuery {
    pub fn new(address: Option<String>, api_url: Option<String>) -> Self {
        Self {
            address,
            api_url,
            refresh: 0,
        }
    }

    /// Same inputs, next refresh generation.
    pub fn bumped(&self) -> Self {
        Self {
            refresh: self.refresh.wrapping_add(1),
            ..self.clone()
        }
    }
}

/// Fetch entries for `query`.
///
/// Without an address or an API URL the result is empty and no request is
/// made. Server order is preserved.
pub async fn fetch_unbonding<S>(
    source: &S,
    query: &UnbondingQuery,
) -> Result<Vec<UnbondingEntry>, ChainError>
where
    S: UnbondingSource + ?Sized,
{
    match (query.api_url.as_deref(), query.address.as_deref()) {
        (Some(api_url), Some(address)) if !api_url.is_empty() && !address.is_empty() => {
            source.fetch(api_url, address).await
        }
        _ => Ok(Vec::new()),
    }
}

/// Result of one fetch, tagged with the query it answers.
#[derive(Debug)]
pub struct UnbondingUpdate {
    pub query: UnbondingQuery,
    pub result: Result<Vec<UnbondingEntry>, ChainError>,
}

/// Last good collection plus loading state.
#[derive(Debug, Default)]
pub struct UnbondingTracker {
    entries: Vec<UnbondingEntry>,
    current: Option<UnbondingQuery>,
    loading: bool,
    last_error: Option<String>,
}

impl UnbondingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[UnbondingEntry] {
        &self.entries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether `query` differs from the one the tracker is showing.
    pub fn needs_fetch(&self, query: &UnbondingQuery) -> bool {
        self.current.as_ref() != Some(query)
    }

    /// Switch to `query`. Returns false if it is already current.
    pub fn begin(&mut self, query: UnbondingQuery) -> bool {
        if !self.needs_fetch(&query) {
            return false;
        }
        self.loading = true;
        self.current = Some(query);
        true
    }

    /// Apply a fetch result. Results for a superseded query are ignored.
    ///
    /// Returns true if the result was applied.
    pub fn apply(&mut self, update: UnbondingUpdate) -> bool {
        if self.current.as_ref() != Some(&update.query) {
            tracing::debug!("Dropping unbonding result for superseded query");
            return false;
        }
        self.loading = false;
        match update.result {
            Ok(entries) => {
                self.entries = entries;
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch unbonding delegations: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
        true
    }
}

/// Refetch on every change of `queries` until `cancel` fires.
///
/// The current value of `queries` is fetched immediately. Results that
/// complete after cancellation are dropped.
pub fn spawn_unbonding_watcher<S>(
    source: S,
    mut queries: watch::Receiver<UnbondingQuery>,
    sink: mpsc::Sender<UnbondingUpdate>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    S: UnbondingSource + 'static,
{
    tokio::spawn(async move {
        loop {
            let query = queries.borrow_and_update().clone();

            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = fetch_unbonding(&source, &query) => result,
            };
            if cancel.is_cancelled() {
                break;
            }
            if sink.send(UnbondingUpdate { query, result }).await.is_err() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = queries.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Unbonding watcher stopped");
    })
}
