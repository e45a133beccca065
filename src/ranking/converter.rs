use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use super::source::DistributionSource;
use super::table::DistributionTable;
use super::types::{
    Choice, Conversion, DistributionEntry, TableKey, SUPPORTED_PROVINCES, SUPPORTED_SUBJECTS,
};

type LoadResult = Result<Arc<DistributionTable>, Arc<anyhow::Error>>;
type PendingLoad = Shared<BoxFuture<'static, LoadResult>>;

/// Rank estimate used when no table is available
pub fn fallback_rank(score: f64) -> u64 {
    ((750.0 - score) * 100.0).floor().max(1.0) as u64
}

/// Score estimate used when no table is available
pub fn fallback_score(rank: u64) -> f64 {
    (750.0 - (rank / 100) as f64).max(200.0)
}

/// Score/rank converter backed by per-province distribution tables.
///
/// Tables are loaded once per key and kept for the life of the converter.
/// Concurrent callers asking for the same key share one in-flight load.
/// Load failures are logged and answered with the fallback formulas, so
/// conversions never fail.
pub struct ScoreRankConverter<S> {
    source: Arc<S>,
    inner: Mutex<CacheData>,
}

struct CacheData {
    tables: HashMap<TableKey, Arc<DistributionTable>>,
    loading: HashMap<TableKey, PendingLoad>,
}

impl<S: DistributionSource> ScoreRankConverter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            inner: Mutex::new(CacheData {
                tables: HashMap::new(),
                loading: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheData> {
        // The guarded maps stay consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get the table for `key`, loading it if needed
    pub async fn table(&self, key: &TableKey) -> LoadResult {
        let pending = {
            let mut data = self.lock();
            if let Some(table) = data.tables.get(key) {
                return Ok(table.clone());
            }
            match data.loading.get(key) {
                Some(pending) => {
                    debug!(%key, "joining in-flight table load");
                    pending.clone()
                }
                None => {
                    debug!(%key, "loading distribution table");
                    let source = self.source.clone();
                    let owned_key = key.clone();
                    let pending = async move {
                        source
                            .fetch(&owned_key)
                            .await
                            .map(Arc::new)
                            .map_err(Arc::new)
                    }
                    .boxed()
                    .shared();
                    data.loading.insert(key.clone(), pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut data = self.lock();
        if data
            .loading
            .get(key)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            data.loading.remove(key);
        }
        if let Ok(table) = &result {
            data.tables.insert(key.clone(), table.clone());
        }
        result
    }

    pub async fn score_to_rank(&self, score: f64, province: &str, subject: &str) -> u64 {
        self.score_to_rank_detailed(score, province, subject)
            .await
            .value
    }

    pub async fn rank_to_score(&self, rank: u64, province: &str, subject: &str) -> f64 {
        self.rank_to_score_detailed(rank, province, subject)
            .await
            .value
    }

    /// Convert a score to a rank, reporting whether the fallback was used
    pub async fn score_to_rank_detailed(
        &self,
        score: f64,
        province: &str,
        subject: &str,
    ) -> Conversion<u64> {
        let key = TableKey::new(province, subject);
        match self.table(&key).await {
            Ok(table) => Conversion {
                value: table.score_to_rank(score),
                approximate: false,
            },
            Err(e) => {
                warn!(%key, score, error = %e, "score to rank conversion failed, using estimate");
                Conversion {
                    value: fallback_rank(score),
                    approximate: true,
                }
            }
        }
    }

    /// Convert a rank to a score, reporting whether the fallback was used
    pub async fn rank_to_score_detailed(
        &self,
        rank: u64,
        province: &str,
        subject: &str,
    ) -> Conversion<f64> {
        let key = TableKey::new(province, subject);
        match self.table(&key).await {
            Ok(table) => Conversion {
                value: table.rank_to_score(rank),
                approximate: false,
            },
            Err(e) => {
                warn!(%key, rank, error = %e, "rank to score conversion failed, using estimate");
                Conversion {
                    value: fallback_score(rank),
                    approximate: true,
                }
            }
        }
    }

    /// Table rows with `min_score <= score <= max_score`; empty when the
    /// table cannot be loaded
    pub async fn score_range(
        &self,
        min_score: f64,
        max_score: f64,
        province: &str,
        subject: &str,
    ) -> Vec<DistributionEntry> {
        let key = TableKey::new(province, subject);
        match self.table(&key).await {
            Ok(table) => table.range(min_score, max_score),
            Err(e) => {
                warn!(%key, error = %e, "failed to load score range");
                Vec::new()
            }
        }
    }

    /// Whether a table for the pair can be loaded
    pub async fn is_supported(&self, province: &str, subject: &str) -> bool {
        self.table(&TableKey::new(province, subject)).await.is_ok()
    }

    /// Drop loaded tables. Loads already in flight still complete.
    pub fn clear_cache(&self) {
        self.lock().tables.clear();
    }

    pub fn supported_provinces(&self) -> &'static [Choice] {
        SUPPORTED_PROVINCES
    }

    pub fn supported_subjects(&self) -> &'static [Choice] {
        SUPPORTED_SUBJECTS
    }
}
