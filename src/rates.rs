//! Commission rate table and the plan (table + depth) the engine runs with.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{DEFAULT_MAX_LEVELS, DEFAULT_RATES, RATE_SCALE};
use crate::money::Rate;

static STANDARD_TABLE: Lazy<RateTable> = Lazy::new(|| {
    RateTable::from_pairs(DEFAULT_RATES.iter().map(|&(level, fraction)| {
        (level, Rate::from_ppm((fraction * RATE_SCALE as f64).round() as u32))
    }))
});

/// Level (1-based distance from the seller) -> rate.
/// Levels missing from the table earn nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    levels: BTreeMap<u32, Rate>,
}

impl RateTable {
    pub fn standard() -> Self {
        STANDARD_TABLE.clone()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, Rate)>) -> Self {
        Self {
            levels: pairs.into_iter().collect(),
        }
    }

    pub fn rate_for(&self, level: u32) -> Rate {
        self.levels.get(&level).copied().unwrap_or(Rate::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Rate)> + '_ {
        self.levels.iter().map(|(l, r)| (*l, *r))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Everything a commission computation is parameterised by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionPlan {
    pub rates: RateTable,
    /// Upline depth; 0 disables commissions entirely
    pub max_levels: usize,
}

impl CommissionPlan {
    pub fn new(rates: RateTable, max_levels: usize) -> Self {
        Self { rates, max_levels }
    }

    pub fn standard() -> Self {
        Self::new(RateTable::standard(), DEFAULT_MAX_LEVELS)
    }

    /// Content hash of the plan. Two plans with equal fingerprints produce
    /// identical commission records for the same sale.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"referral-plan-v1");
        hasher.update(&(self.max_levels as u64).to_le_bytes());
        for (level, rate) in self.rates.iter() {
            hasher.update(&level.to_le_bytes());
            hasher.update(&rate.ppm().to_le_bytes());
        }
        *hasher.finalize().as_bytes()
    }
}

impl Default for CommissionPlan {
    fn default() -> Self {
        Self::standard()
    }
}
