use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use molino_core::{DomainResult, LotId, Quantity};
use molino_ledger::{LotScope, StockLedger, StockQuery};
use molino_lots::{Lot, LotFilter, LotRegistry};

use crate::status::{classify, days_to_expiry, ExpiryStatus};

/// One row of the expiry report: a lot joined with its remaining shelf life
/// and current on-hand stock (summed over warehouses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringLot {
    pub lot: Lot,
    pub days_to_expiry: Option<i64>,
    pub status: ExpiryStatus,
    pub on_hand: Quantity,
}

/// Read-only view over the lot registry and the stock ledger.
///
/// Results are recomputed per query; nothing is cached or scheduled.
pub struct ExpiryMonitor<L, S> {
    lots: L,
    ledger: S,
}

impl<L, S> ExpiryMonitor<L, S>
where
    L: LotRegistry,
    S: StockLedger,
{
    pub fn new(lots: L, ledger: S) -> Self {
        Self { lots, ledger }
    }

    /// Classify one lot as of `today`.
    pub fn status(&self, lot_id: LotId, today: NaiveDate) -> DomainResult<ExpiryStatus> {
        let lot = self.lots.require(lot_id)?;
        Ok(classify(&lot, today))
    }

    /// Lots whose expiry falls within `within_days` of `today`, expired ones
    /// included, joined with current on-hand stock. Lots without an expiry
    /// date never appear. Ordered by production date (registry order).
    pub fn expiring(&self, within_days: i64, today: NaiveDate) -> DomainResult<Vec<ExpiringLot>> {
        let filter = LotFilter {
            product_id: None,
            expiring_within_days: Some(within_days),
        };
        let lots = self.lots.list(&filter, today)?;
        debug!(count = lots.len(), within_days, "expiry scan");

        lots.into_iter()
            .map(|lot| {
                let on_hand = self.on_hand(lot.id)?;
                Ok(ExpiringLot {
                    days_to_expiry: days_to_expiry(&lot, today),
                    status: classify(&lot, today),
                    on_hand,
                    lot,
                })
            })
            .collect()
    }

    fn on_hand(&self, lot_id: LotId) -> DomainResult<Quantity> {
        let entries = self.ledger.stock_levels(&StockQuery {
            warehouse_id: None,
            product_id: None,
            lot: LotScope::Lot(lot_id),
        })?;
        Ok(entries
            .into_iter()
            .fold(Quantity::ZERO, |total, entry| total + entry.quantity))
    }
}
