//! Per-symbol result cache keyed by the last bar date.
//!
//! Every symbol has its own slot behind its own mutex. The detector holds a
//! slot's lock across check, compute and store, so two calls for the same
//! symbol never interleave while different symbols proceed in parallel.

use crate::domain::error::DetectionError;
use crate::domain::series::AnnotatedSeries;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub last_date: NaiveDate,
    pub result: Arc<AnnotatedSeries>,
    /// Stage failures of the run that produced `result`.
    pub degraded: Vec<DetectionError>,
}

pub type Slot = Arc<Mutex<Option<CacheEntry>>>;

#[derive(Debug, Default)]
pub struct ResultCache {
    slots: Mutex<HashMap<String, Slot>>,
}

/// A panic while a lock was held leaves at worst a stale entry, which the
/// next differing last date overwrites.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `symbol`, created empty on first use.
    pub fn slot(&self, symbol: &str) -> Slot {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(symbol.to_string()).or_default())
    }

    fn existing(&self, symbol: &str) -> Option<Slot> {
        lock(&self.slots).get(symbol).cloned()
    }

    pub fn get(&self, symbol: &str) -> Option<CacheEntry> {
        let slot = self.existing(symbol)?;
        let entry = lock(&slot).clone();
        entry
    }

    pub fn last_date(&self, symbol: &str) -> Option<NaiveDate> {
        self.get(symbol).map(|e| e.last_date)
    }

    pub fn invalidate(&self, symbol: &str) {
        if let Some(slot) = self.existing(symbol) {
            *lock(&slot) = None;
        }
    }

    /// Drop every slot. A detector already holding a slot finishes against
    /// its own copy; the next call for that symbol starts from a fresh one.
    pub fn clear(&self) {
        let slots: Vec<Slot> = lock(&self.slots).drain().map(|(_, slot)| slot).collect();
        for slot in slots {
            *lock(&slot) = None;
        }
    }

    /// Number of symbols with a slot, stored result or not.
    pub fn tracked(&self) -> usize {
        lock(&self.slots).len()
    }

    /// Number of symbols with a stored result.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
