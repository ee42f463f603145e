//! Optional strict pre-check over a snapshot.
//!
//! The engine tolerates dangling references; callers that want to reject
//! such data run `check` first.

use serde::Serialize;
use std::fmt;

use crate::directory::Directory;
use crate::ledger::Ledger;
use crate::model::{SaleId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// `user` names a sponsor that is not in the directory
    DanglingSponsor { user: UserId, sponsor: UserId },
    /// `sale` was made by a user that is not in the directory
    UnknownMaker { sale: SaleId, maker: UserId },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DanglingSponsor { user, sponsor } => {
                write!(f, "user {} references unknown sponsor {}", user, sponsor)
            }
            IntegrityIssue::UnknownMaker { sale, maker } => {
                write!(f, "sale {} references unknown maker {}", sale, maker)
            }
        }
    }
}

/// All reference problems, users first then sales, each in snapshot order.
pub fn check(directory: &Directory, ledger: &Ledger) -> Vec<IntegrityIssue> {
    let dangling = directory.users().iter().filter_map(|u| {
        let sponsor = u.sponsor_id.as_ref()?;
        directory
            .find_user(sponsor)
            .is_none()
            .then(|| IntegrityIssue::DanglingSponsor {
                user: u.id.clone(),
                sponsor: sponsor.clone(),
            })
    });
    let orphans = ledger.all_sales().iter().filter_map(|s| {
        directory
            .find_user(&s.maker_id)
            .is_none()
            .then(|| IntegrityIssue::UnknownMaker {
                sale: s.id.clone(),
                maker: s.maker_id.clone(),
            })
    });
    dangling.chain(orphans).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::NetworkData;
    use crate::model::{Sale, User};
    use crate::money::Money;
    use chrono::NaiveDate;

    #[test]
    fn test_sample_is_clean() {
        let (dir, ledger) = NetworkData::sample().into_snapshot().unwrap();
        assert!(check(&dir, &ledger).is_empty());
    }

    #[test]
    fn test_reports_dangling_refs() {
        let dir = Directory::new(vec![
            User::new("a", "A", "A", None),
            User::new("b", "B", "B", Some("ghost")),
        ])
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let ledger = Ledger::new(vec![
            Sale::new("s1", "a", Money::from_units(10), "P", date),
            Sale::new("s2", "nobody", Money::from_units(10), "P", date),
        ])
        .unwrap();

        let issues = check(&dir, &ledger);
        assert_eq!(
            issues,
            vec![
                IntegrityIssue::DanglingSponsor {
                    user: UserId::new("b"),
                    sponsor: UserId::new("ghost"),
                },
                IntegrityIssue::UnknownMaker {
                    sale: SaleId::new("s2"),
                    maker: UserId::new("nobody"),
                },
            ]
        );
        assert_eq!(issues[1].to_string(), "sale s2 references unknown maker nobody");
    }
}
