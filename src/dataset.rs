//! Input data sets: users plus sales, as read from JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::directory::Directory;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::model::{Sale, User};
use crate::money::Money;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub sales: Vec<Sale>,
}

impl NetworkData {
    /// Read a data set from a JSON file of the form `{"users": [...], "sales": [...]}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let data: NetworkData = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            users = data.users.len(),
            sales = data.sales.len(),
            "loaded network data"
        );
        Ok(data)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Freeze into the read-only snapshots the engine works on.
    pub fn into_snapshot(self) -> Result<(Directory, Ledger)> {
        Ok((Directory::new(self.users)?, Ledger::new(self.sales)?))
    }

    /// Demo network: eight users, four sales.
    ///
    /// ```text
    /// u1 ─┬─ u2 ─┬─ u4 ── u6 ── u7
    ///     │      └─ u5 ── u8
    ///     └─ u3
    /// ```
    pub fn sample() -> Self {
        let users = vec![
            User::new("u1", "Fundador", "F-001", None),
            User::new("u2", "Agente A", "A-101", Some("u1")),
            User::new("u3", "Agente B", "A-102", Some("u1")),
            User::new("u4", "Distribuidor 1", "D-201", Some("u2")),
            User::new("u5", "Distribuidor 2", "D-202", Some("u2")),
            User::new("u6", "Distribuidor 3", "D-301", Some("u4")),
            User::new("u7", "Cliente X", "C-401", Some("u6")),
            User::new("u8", "Cliente Y", "C-402", Some("u5")),
        ];
        let sales = vec![
            Sale::new("s1", "u7", Money::from_units(1000), "Plan A", ymd(2025, 11, 1)),
            Sale::new("s2", "u8", Money::from_units(500), "Plan B", ymd(2025, 11, 3)),
            Sale::new("s3", "u6", Money::from_units(800), "Plan A", ymd(2025, 11, 5)),
            Sale::new("s4", "u4", Money::from_units(1200), "Plan C", ymd(2025, 10, 20)),
        ];
        Self { users, sales }
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
