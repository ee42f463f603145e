//! Error types for snapshot construction and data loading.
//!
//! Engine queries themselves never fail; only building a Directory/Ledger
//! snapshot or reading input can.

use thiserror::Error;

use crate::model::{SaleId, UserId};

#[derive(Error, Debug)]
pub enum ReferralError {
    #[error("duplicate user id: {0}")]
    DuplicateUser(UserId),
    #[error("duplicate sale id: {0}")]
    DuplicateSale(SaleId),
    #[error("sponsor cycle detected through user {0}")]
    SponsorCycle(UserId),
    #[error("sale {0} has a non-positive amount")]
    NonPositiveAmount(SaleId),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid rate: {0}")]
    InvalidRate(String),
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = ReferralError> = std::result::Result<T, E>;
