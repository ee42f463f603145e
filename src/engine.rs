//! Commission engine.
//!
//! For a sale, walk the maker's upline and credit each sponsor the rate of
//! its level. Results are plain records recomputed on every call; the engine
//! only ever reads its Directory and Ledger snapshots.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::Directory;
use crate::ledger::Ledger;
use crate::model::{Sale, SaleId, UserId};
use crate::money::{Money, Rate};
use crate::rates::CommissionPlan;

/// One sponsor's share of one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub sale_id: SaleId,
    pub beneficiary_id: UserId,
    pub beneficiary_name: String,
    pub level: u32,
    pub rate: Rate,
    pub amount: Money,
    pub sale_amount: Money,
    pub sale_date: NaiveDate,
    pub product: String,
}

/// Anything that can produce commission records over a snapshot.
///
/// Only `commissions_for_sale` is required; the aggregations are defined in
/// terms of it so cached and uncached engines agree by construction.
pub trait CommissionSource {
    fn directory(&self) -> &Directory;
    fn ledger(&self) -> &Ledger;

    /// Records for one sale, nearest sponsor first.
    fn commissions_for_sale(&self, sale: &Sale, plan: &CommissionPlan) -> Vec<CommissionRecord>;

    /// Every record crediting `user_id`, in ledger-then-level order.
    fn commissions_for_beneficiary(
        &self,
        user_id: &UserId,
        plan: &CommissionPlan,
    ) -> Vec<CommissionRecord> {
        self.ledger()
            .all_sales()
            .iter()
            .flat_map(|sale| self.commissions_for_sale(sale, plan))
            .filter(|c| &c.beneficiary_id == user_id)
            .collect()
    }

    fn total_for_beneficiary(&self, user_id: &UserId, plan: &CommissionPlan) -> Money {
        self.commissions_for_beneficiary(user_id, plan)
            .iter()
            .map(|c| c.amount)
            .sum()
    }

    /// Records for every sale in the ledger, in ledger-then-level order.
    /// Sales are computed in parallel; the output order is unaffected.
    fn all_commissions(&self, plan: &CommissionPlan) -> Vec<CommissionRecord>
    where
        Self: Sync,
    {
        let per_sale: Vec<Vec<CommissionRecord>> = self
            .ledger()
            .all_sales()
            .par_iter()
            .map(|sale| self.commissions_for_sale(sale, plan))
            .collect();
        per_sale.into_iter().flatten().collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommissionEngine<'a> {
    directory: &'a Directory,
    ledger: &'a Ledger,
}

impl<'a> CommissionEngine<'a> {
    pub fn new(directory: &'a Directory, ledger: &'a Ledger) -> Self {
        Self { directory, ledger }
    }
}

impl CommissionSource for CommissionEngine<'_> {
    fn directory(&self) -> &Directory {
        self.directory
    }

    fn ledger(&self) -> &Ledger {
        self.ledger
    }

    fn commissions_for_sale(&self, sale: &Sale, plan: &CommissionPlan) -> Vec<CommissionRecord> {
        let records: Vec<CommissionRecord> = self
            .directory
            .uplines_of(&sale.maker_id, plan.max_levels)
            .into_iter()
            .map(|upline| {
                // zero-rate levels still get a record
                let rate = plan.rates.rate_for(upline.level);
                CommissionRecord {
                    sale_id: sale.id.clone(),
                    beneficiary_id: upline.sponsor.id.clone(),
                    beneficiary_name: upline.sponsor.name.clone(),
                    level: upline.level,
                    rate,
                    amount: rate.apply(sale.amount),
                    sale_amount: sale.amount,
                    sale_date: sale.date,
                    product: sale.product.clone(),
                }
            })
            .collect();

        debug!(
            sale = %sale.id,
            maker = %sale.maker_id,
            records = records.len(),
            "computed sale commissions"
        );
        records
    }
}
