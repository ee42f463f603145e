//! Per-sale memoisation on top of the engine.
//!
//! Entries are keyed by sale id and plan fingerprint, so switching rate
//! tables never serves stale records. Only sales held by the ledger are
//! cached; anything else is computed directly. The cache belongs to one snapshot;
//! build a new `CachedEngine` when the directory or ledger changes.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::directory::Directory;
use crate::engine::{CommissionEngine, CommissionRecord, CommissionSource};
use crate::ledger::Ledger;
use crate::model::{Sale, SaleId};
use crate::rates::CommissionPlan;

type CacheKey = (SaleId, [u8; 32]);

pub struct CachedEngine<'a> {
    inner: CommissionEngine<'a>,
    entries: DashMap<CacheKey, Arc<Vec<CommissionRecord>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<'a> CachedEngine<'a> {
    pub fn new(directory: &'a Directory, ledger: &'a Ledger) -> Self {
        Self {
            inner: CommissionEngine::new(directory, ledger),
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl CommissionSource for CachedEngine<'_> {
    fn directory(&self) -> &Directory {
        self.inner.directory()
    }

    fn ledger(&self) -> &Ledger {
        self.inner.ledger()
    }

    fn commissions_for_sale(&self, sale: &Sale, plan: &CommissionPlan) -> Vec<CommissionRecord> {
        // Only ledger sales are cached; any other sale may reuse a ledger id.
        if self.ledger().find_sale(&sale.id) != Some(sale) {
            debug!(sale = %sale.id, "sale not in ledger, bypassing cache");
            return self.inner.commissions_for_sale(sale, plan);
        }

        let key = (sale.id.clone(), plan.fingerprint());
        if let Some(hit) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit.value().to_vec();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let records = Arc::new(self.inner.commissions_for_sale(sale, plan));
        // Concurrent misses on the same key compute identical records; first
        // insert wins.
        let stored = self.entries.entry(key).or_insert(records).value().clone();
        debug!(sale = %sale.id, cached = self.entries.len(), "commission cache miss");
        stored.to_vec()
    }
}
