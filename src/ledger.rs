//! Sale ledger snapshot.

use std::collections::HashMap;
use tracing::info;

use crate::error::{ReferralError, Result};
use crate::model::{Sale, SaleId, UserId};
use crate::money::Money;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    sales: Vec<Sale>,
    index: HashMap<SaleId, usize>,
}

impl Ledger {
    /// Build a ledger. Makers are not checked against any directory.
    pub fn new(sales: Vec<Sale>) -> Result<Self> {
        let mut index = HashMap::with_capacity(sales.len());
        for (i, sale) in sales.iter().enumerate() {
            if sale.amount.is_zero() {
                return Err(ReferralError::NonPositiveAmount(sale.id.clone()));
            }
            if index.insert(sale.id.clone(), i).is_some() {
                return Err(ReferralError::DuplicateSale(sale.id.clone()));
            }
        }
        info!(sales = sales.len(), "ledger snapshot built");
        Ok(Self { sales, index })
    }

    /// Every sale, in ledger order.
    pub fn all_sales(&self) -> &[Sale] {
        &self.sales
    }

    /// Sales made by `user_id`, in ledger order.
    pub fn sales_by(&self, user_id: &UserId) -> Vec<&Sale> {
        self.sales.iter().filter(|s| &s.maker_id == user_id).collect()
    }

    pub fn find_sale(&self, id: &SaleId) -> Option<&Sale> {
        self.index.get(id).map(|&i| &self.sales[i])
    }

    /// Sum of the user's own sales.
    pub fn total_by(&self, user_id: &UserId) -> Money {
        self.sales_by(user_id).iter().map(|s| s.amount).sum()
    }

    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    #[test]
    fn test_sales_by_keeps_ledger_order() {
        let ledger = Ledger::new(vec![
            Sale::new("s1", "u7", Money::from_units(1000), "Plan A", day(1)),
            Sale::new("s2", "u8", Money::from_units(500), "Plan B", day(3)),
            Sale::new("s3", "u7", Money::from_units(800), "Plan A", day(5)),
        ])
        .unwrap();

        let mine: Vec<_> = ledger
            .sales_by(&UserId::new("u7"))
            .iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(mine, vec!["s1", "s3"]);
        assert_eq!(ledger.total_by(&UserId::new("u7")), Money::from_units(1800));
        assert!(ledger.sales_by(&UserId::new("u1")).is_empty());
        assert_eq!(ledger.all_sales().len(), 3);
        assert_eq!(
            ledger.find_sale(&SaleId::new("s2")).map(|s| s.amount),
            Some(Money::from_units(500))
        );
    }

    #[test]
    fn test_rejects_bad_sales() {
        let dup = Ledger::new(vec![
            Sale::new("s1", "u7", Money::from_units(1), "P", day(1)),
            Sale::new("s1", "u8", Money::from_units(2), "P", day(2)),
        ]);
        assert!(matches!(dup, Err(ReferralError::DuplicateSale(_))));

        let zero = Ledger::new(vec![Sale::new("s1", "u7", Money::ZERO, "P", day(1))]);
        assert!(matches!(zero, Err(ReferralError::NonPositiveAmount(_))));
    }
}
