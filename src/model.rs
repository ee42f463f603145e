//! Users and sales as loaded from external data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SaleId {
    pub fn new(id: impl Into<String>) -> Self {
        SaleId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A member of the referral network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Short human-facing code, e.g. `D-201`
    pub code: String,
    /// The user who recruited this one; `None` for a root
    #[serde(default, alias = "sponsorId")]
    pub sponsor_id: Option<UserId>,
}

impl User {
    pub fn new(id: &str, name: &str, code: &str, sponsor_id: Option<&str>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.to_string(),
            code: code.to_string(),
            sponsor_id: sponsor_id.map(UserId::new),
        }
    }

    pub fn is_root(&self) -> bool {
        self.sponsor_id.is_none()
    }
}

/// A recorded sale. Immutable once it enters the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    /// The user who made the sale
    #[serde(alias = "makerId", alias = "user_id")]
    pub maker_id: UserId,
    pub amount: Money,
    pub product: String,
    pub date: NaiveDate,
}

impl Sale {
    pub fn new(id: &str, maker_id: &str, amount: Money, product: &str, date: NaiveDate) -> Self {
        Self {
            id: SaleId::new(id),
            maker_id: UserId::new(maker_id),
            amount,
            product: product.to_string(),
            date,
        }
    }
}
