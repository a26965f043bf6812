use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;

use molino_core::{DomainError, DomainResult, LotId, OrderId, ProductId};

use crate::lot::{Lot, LotNumber, NewLot};

/// Listing filter for lots.
#[derive(Debug, Clone, Default)]
pub struct LotFilter {
    pub product_id: Option<ProductId>,
    /// Keep only lots whose expiry falls within this many days of `today`
    /// (expired lots included). Lots without an expiry date are dropped.
    pub expiring_within_days: Option<i64>,
}

/// Store of immutable production lots.
///
/// Reads are fallible: a broken store surfaces `Persistence` instead of
/// pretending a lot does not exist.
pub trait LotRegistry: Send + Sync {
    /// Persist a new lot. The lot number is derived from the production date
    /// and originating order; a duplicate number means the same completion
    /// already minted a lot and is rejected as a conflict.
    fn mint(&self, new_lot: NewLot) -> DomainResult<Lot>;

    fn get(&self, id: LotId) -> DomainResult<Option<Lot>>;

    /// The lot minted by a given production order, if its completion already
    /// ran once. Lets order completion be retried without minting twice.
    fn find_by_order(&self, order_id: OrderId) -> DomainResult<Option<Lot>>;

    fn list(&self, filter: &LotFilter, today: NaiveDate) -> DomainResult<Vec<Lot>>;

    fn require(&self, id: LotId) -> DomainResult<Lot> {
        self.get(id)?
            .ok_or_else(|| DomainError::reference_not_found(format!("lot {id}")))
    }
}

impl<R> LotRegistry for Arc<R>
where
    R: LotRegistry + ?Sized,
{
    fn mint(&self, new_lot: NewLot) -> DomainResult<Lot> {
        (**self).mint(new_lot)
    }

    fn get(&self, id: LotId) -> DomainResult<Option<Lot>> {
        (**self).get(id)
    }

    fn find_by_order(&self, order_id: OrderId) -> DomainResult<Option<Lot>> {
        (**self).find_by_order(order_id)
    }

    fn list(&self, filter: &LotFilter, today: NaiveDate) -> DomainResult<Vec<Lot>> {
        (**self).list(filter, today)
    }
}

/// In-memory lot registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLotRegistry {
    lots: RwLock<HashMap<LotId, Lot>>,
}

impl InMemoryLotRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LotRegistry for InMemoryLotRegistry {
    fn mint(&self, new_lot: NewLot) -> DomainResult<Lot> {
        new_lot.validate()?;
        let lot_number = LotNumber::derive(new_lot.production_date, new_lot.order_id);

        let mut lots = self
            .lots
            .write()
            .map_err(|_| DomainError::persistence("lot registry lock poisoned"))?;

        if lots.values().any(|l| l.lot_number == lot_number) {
            return Err(DomainError::conflict(format!(
                "lot number {lot_number} already minted"
            )));
        }

        let lot = Lot {
            id: new_lot.id,
            lot_number,
            product_id: new_lot.product_id,
            order_id: new_lot.order_id,
            production_date: new_lot.production_date,
            expiry_date: new_lot.expiry_date,
            initial_quantity: new_lot.initial_quantity,
        };
        lots.insert(lot.id, lot.clone());
        Ok(lot)
    }

    fn get(&self, id: LotId) -> DomainResult<Option<Lot>> {
        let lots = self
            .lots
            .read()
            .map_err(|_| DomainError::persistence("lot registry lock poisoned"))?;
        Ok(lots.get(&id).cloned())
    }

    fn find_by_order(&self, order_id: OrderId) -> DomainResult<Option<Lot>> {
        let lots = self
            .lots
            .read()
            .map_err(|_| DomainError::persistence("lot registry lock poisoned"))?;
        Ok(lots.values().find(|l| l.order_id == order_id).cloned())
    }

    fn list(&self, filter: &LotFilter, today: NaiveDate) -> DomainResult<Vec<Lot>> {
        let lots = self
            .lots
            .read()
            .map_err(|_| DomainError::persistence("lot registry lock poisoned"))?;

        let mut out: Vec<Lot> = lots
            .values()
            .filter(|lot| {
                if let Some(product_id) = filter.product_id {
                    if lot.product_id != product_id {
                        return false;
                    }
                }
                if let Some(window) = filter.expiring_within_days {
                    match lot.expiry_date {
                        Some(expiry) => (expiry - today).num_days() <= window,
                        None => return false,
                    }
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        out.sort_by(|a, b| {
            a.production_date
                .cmp(&b.production_date)
                .then_with(|| a.lot_number.cmp(&b.lot_number))
        });
        Ok(out)
    }
}
