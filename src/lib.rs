// ---- Clippy/lints: keep signals high, noise low ----
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! Multi-level referral commissions over a sponsor tree.
//!
//! Build a [`Directory`] and a [`Ledger`] once, then ask a
//! [`CommissionEngine`] for the records of a sale or of a beneficiary.

pub mod cache;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod directory;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod ledger;
pub mod model;
pub mod money;
pub mod rates;
pub mod report;

pub use cache::CachedEngine;
pub use config::{load_engine_config, EngineConfig};
pub use dataset::NetworkData;
pub use directory::{Directory, DownlineNode, UplineEntry};
pub use engine::{CommissionEngine, CommissionRecord, CommissionSource};
pub use error::ReferralError;
pub use integrity::IntegrityIssue;
pub use ledger::Ledger;
pub use model::{Sale, SaleId, User, UserId};
pub use money::{Money, Rate};
pub use rates::{CommissionPlan, RateTable};
