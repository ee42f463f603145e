//! Per-user and whole-network views over engine output, plus the JSON
//! workbook export.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::directory::DownlineNode;
use crate::engine::{CommissionRecord, CommissionSource};
use crate::error::Result;
use crate::model::{Sale, User, UserId};
use crate::money::Money;
use crate::rates::CommissionPlan;

/// Everything shown for a single user.
#[derive(Debug, Clone, Serialize)]
pub struct UserReport<'a> {
    pub user: &'a User,
    pub total_commissions: Money,
    pub commissions: Vec<CommissionRecord>,
    pub own_sales: Vec<&'a Sale>,
    pub downline: Option<DownlineNode<'a>>,
}

/// Downline tree bounds for `user_report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeBounds {
    pub max_depth: usize,
    pub max_children: usize,
}

impl Default for TreeBounds {
    fn default() -> Self {
        Self {
            max_depth: crate::constants::DOWNLINE_MAX_DEPTH,
            max_children: crate::constants::DOWNLINE_MAX_CHILDREN,
        }
    }
}

/// `None` when `user_id` is not in the directory.
pub fn user_report<'a, S: CommissionSource>(
    source: &'a S,
    user_id: &UserId,
    plan: &CommissionPlan,
    bounds: TreeBounds,
) -> Option<UserReport<'a>> {
    let directory = source.directory();
    let user = directory.find_user(user_id)?;
    let commissions = source.commissions_for_beneficiary(user_id, plan);
    let total_commissions: Money = commissions.iter().map(|c| c.amount).sum();

    info!(
        user = %user_id,
        records = commissions.len(),
        total = %total_commissions,
        "user report"
    );
    Some(UserReport {
        user,
        total_commissions,
        commissions,
        own_sales: source.ledger().sales_by(user_id),
        downline: directory.downline(user_id, bounds.max_depth, bounds.max_children),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTotals {
    pub id: UserId,
    pub name: String,
    pub code: String,
    pub total_sales: Money,
    pub total_commissions: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    /// Highest earners first; ties keep directory order
    pub rows: Vec<UserTotals>,
    pub total_sales: Money,
    pub total_commissions: Money,
}

pub fn network_summary<S: CommissionSource + Sync>(
    source: &S,
    plan: &CommissionPlan,
) -> NetworkSummary {
    let mut earned: HashMap<&UserId, Money> = HashMap::new();
    let all = source.all_commissions(plan);
    for record in &all {
        let slot = earned.entry(&record.beneficiary_id).or_default();
        *slot = *slot + record.amount;
    }

    let ledger = source.ledger();
    let mut rows: Vec<UserTotals> = source
        .directory()
        .users()
        .iter()
        .map(|u| UserTotals {
            id: u.id.clone(),
            name: u.name.clone(),
            code: u.code.clone(),
            total_sales: ledger.total_by(&u.id),
            total_commissions: earned.get(&u.id).copied().unwrap_or_default(),
        })
        .collect();
    rows.sort_by(|a, b| b.total_commissions.cmp(&a.total_commissions));

    let total_sales: Money = rows.iter().map(|r| r.total_sales).sum();
    let total_commissions: Money = rows.iter().map(|r| r.total_commissions).sum();
    info!(
        users = rows.len(),
        total_sales = %total_sales,
        total_commissions = %total_commissions,
        "network summary"
    );
    NetworkSummary {
        rows,
        total_sales,
        total_commissions,
    }
}

/// A named table of rows, the unit of export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<serde_json::Value>,
}

impl Sheet {
    pub fn from_rows<T: Serialize>(name: &str, rows: &[T]) -> Result<Self> {
        let rows = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            rows,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Sales plus every commission record.
pub fn commissions_workbook<S: CommissionSource + Sync>(
    source: &S,
    plan: &CommissionPlan,
) -> Result<Workbook> {
    Ok(Workbook {
        sheets: vec![
            Sheet::from_rows("Sales", source.ledger().all_sales())?,
            Sheet::from_rows("Commissions", source.all_commissions(plan).as_slice())?,
        ],
    })
}

/// Per-user totals plus sales.
pub fn global_workbook<S: CommissionSource + Sync>(
    source: &S,
    plan: &CommissionPlan,
) -> Result<Workbook> {
    let summary = network_summary(source, plan);
    Ok(Workbook {
        sheets: vec![
            Sheet::from_rows("Users", summary.rows.as_slice())?,
            Sheet::from_rows("Sales", source.ledger().all_sales())?,
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::NetworkData;
    use crate::engine::CommissionEngine;

    #[test]
    fn test_user_report_for_sponsor() {
        let (dir, ledger) = NetworkData::sample().into_snapshot().unwrap();
        let engine = CommissionEngine::new(&dir, &ledger);
        let plan = CommissionPlan::standard();

        let report =
            user_report(&engine, &UserId::new("u4"), &plan, TreeBounds::default()).unwrap();
        // s1 level 2 (15.00) + s3 level 1 (16.00)
        assert_eq!(report.total_commissions, Money::from_cents(3100));
        assert_eq!(report.commissions.len(), 2);
        assert_eq!(report.own_sales.len(), 1);
        assert_eq!(report.own_sales[0].id.as_str(), "s4");
        // u4 -> u6 -> u7
        assert_eq!(report.downline.as_ref().map(|d| d.size()), Some(3));

        assert!(user_report(&engine, &UserId::new("zz"), &plan, TreeBounds::default()).is_none());
    }

    #[test]
    fn test_network_summary_sorted_by_commissions() {
        let (dir, ledger) = NetworkData::sample().into_snapshot().unwrap();
        let engine = CommissionEngine::new(&dir, &ledger);
        let summary = network_summary(&engine, &CommissionPlan::standard());

        assert_eq!(summary.rows.len(), 8);
        assert!(summary
            .rows
            .windows(2)
            .all(|w| w[0].total_commissions >= w[1].total_commissions));
        assert_eq!(summary.total_sales, Money::from_units(3500));
        let record_total: Money = engine
            .all_commissions(&CommissionPlan::standard())
            .iter()
            .map(|c| c.amount)
            .sum();
        assert_eq!(summary.total_commissions, record_total);

        // users who earn nothing keep directory order at the tail
        let tail: Vec<_> = summary
            .rows
            .iter()
            .filter(|r| r.total_commissions.is_zero())
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(tail, vec!["u3", "u7", "u8"]);
    }

    #[test]
    fn test_workbooks_have_expected_sheets() {
        let (dir, ledger) = NetworkData::sample().into_snapshot().unwrap();
        let engine = CommissionEngine::new(&dir, &ledger);
        let plan = CommissionPlan::standard();

        let book = commissions_workbook(&engine, &plan).unwrap();
        assert_eq!(book.sheet("Sales").map(|s| s.rows.len()), Some(4));
        let commissions = book.sheet("Commissions").unwrap();
        assert_eq!(commissions.rows[0]["beneficiary_id"], "u6");
        assert_eq!(commissions.rows[0]["amount"], 20.0);

        let global = global_workbook(&engine, &plan).unwrap();
        assert_eq!(global.sheet("Users").map(|s| s.rows.len()), Some(8));
        assert!(global.to_json().unwrap().contains("\"Sales\""));
    }
}
