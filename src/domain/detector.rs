//! Detection orchestrator.
//!
//! Runs the standard pipeline for one symbol and caches the annotated result
//! keyed by the last bar date. A repeated call whose last date matches the
//! cached one returns the cached `Arc` without running any analyzer; any
//! other last date recomputes and overwrites the entry.

use crate::domain::analyzer::big_order::BigOrderRecord;
use crate::domain::analyzer::StageOutcome;
use crate::domain::cache::{lock, CacheEntry, ResultCache};
use crate::domain::config::DetectorConfig;
use crate::domain::error::DetectionError;
use crate::domain::ohlcv::{check_ascending, OhlcvBar};
use crate::domain::pipeline::Pipeline;
use crate::domain::series::AnnotatedSeries;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one `detect` call.
#[derive(Debug, Clone)]
pub struct Detection {
    pub result: Arc<AnnotatedSeries>,
    /// Served from the cache without recomputation.
    pub cached: bool,
    /// Stages that failed; their columns are absent from `result`.
    pub degraded: Vec<DetectionError>,
}

impl Detection {
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }
}

#[derive(Debug)]
pub struct Detector {
    config: DetectorConfig,
    cache: Arc<ResultCache>,
    runs: AtomicUsize,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_cache(config, Arc::new(ResultCache::new()))
    }

    pub fn with_cache(config: DetectorConfig, cache: Arc<ResultCache>) -> Self {
        Self {
            config,
            cache,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Number of pipeline executions so far. Cache hits do not count.
    pub fn pipeline_runs(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }

    /// Annotate `bars` for `symbol`. Never fails: input problems and failing
    /// stages are reported in [`Detection::degraded`].
    pub fn detect(
        &self,
        symbol: &str,
        bars: Vec<OhlcvBar>,
        big_orders: Option<&[BigOrderRecord]>,
    ) -> Detection {
        let slot = self.cache.slot(symbol);
        let mut entry = lock(&slot);
        let last_date = bars.last().map(|b| b.date);

        if let (Some(cached), Some(date)) = (entry.as_ref(), last_date) {
            if cached.last_date == date {
                debug!(symbol, %date, "cache hit");
                return Detection {
                    result: Arc::clone(&cached.result),
                    cached: true,
                    degraded: cached.degraded.clone(),
                };
            }
        }

        let mut series = AnnotatedSeries::new(symbol, bars);
        if let Err(date) = check_ascending(&series.bars) {
            warn!(symbol, %date, "bars not in ascending date order, skipping analysis");
            *entry = None;
            return Detection {
                result: Arc::new(series),
                cached: false,
                degraded: vec![DetectionError::Input {
                    stage: "series",
                    reason: format!("dates not strictly ascending at {date}"),
                }],
            };
        }

        let outcomes = Pipeline::standard(&self.config, big_orders).run(&mut series);
        self.runs.fetch_add(1, Ordering::Relaxed);

        let degraded: Vec<DetectionError> = outcomes
            .into_iter()
            .filter_map(|o| match o {
                StageOutcome::Degraded { cause, .. } => Some(cause),
                _ => None,
            })
            .collect();

        let result = Arc::new(series);
        *entry = last_date.map(|last_date| CacheEntry {
            last_date,
            result: Arc::clone(&result),
            degraded: degraded.clone(),
        });
        info!(
            symbol,
            bars = result.len(),
            degraded = degraded.len(),
            "detection complete"
        );

        Detection {
            result,
            cached: false,
            degraded,
        }
    }
}
