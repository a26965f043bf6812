use serde::{Deserialize, Serialize};

use molino_core::{LotId, ProductId, Quantity, WarehouseId};

use crate::movement::Movement;

/// Key of one materialized on-hand figure.
///
/// `lot_id = None` is its own bucket (lot-agnostic stock), distinct from any
/// lot-tracked bucket of the same warehouse/product.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub lot_id: Option<LotId>,
}

impl StockKey {
    pub fn of(movement: &Movement) -> Self {
        Self {
            warehouse_id: movement.warehouse_id,
            product_id: movement.product_id,
            lot_id: movement.lot_id,
        }
    }
}

/// Materialized current quantity for one key.
///
/// Invariant: `quantity == sum(movement.quantity)` over all movements
/// matching the key, at every point in time. The entry exists purely for
/// O(1) reads; the movement log is authoritative. `version` counts applied
/// movements and guards optimistic updates; a depleted entry sits at zero
/// rather than being deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub key: StockKey,
    pub quantity: Quantity,
    pub version: u64,
}

impl StockEntry {
    pub fn empty(key: StockKey) -> Self {
        Self {
            key,
            quantity: Quantity::ZERO,
            version: 0,
        }
    }
}

/// Which lot buckets a stock query selects.
///
/// The lot-agnostic bucket (`lot_id = None` on the key) is a real bucket,
/// so it must be addressable on its own, not just reachable by omission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LotScope {
    /// Lot-tracked and lot-agnostic buckets alike.
    #[default]
    Any,
    /// Only the lot-agnostic bucket.
    Agnostic,
    /// Only the bucket of one specific lot.
    Lot(LotId),
}

impl LotScope {
    pub fn matches(self, lot_id: Option<LotId>) -> bool {
        match self {
            LotScope::Any => true,
            LotScope::Agnostic => lot_id.is_none(),
            LotScope::Lot(id) => lot_id == Some(id),
        }
    }
}

/// Filter for stock-level listings; all criteria are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct StockQuery {
    pub warehouse_id: Option<WarehouseId>,
    pub product_id: Option<ProductId>,
    pub lot: LotScope,
}

impl StockQuery {
    pub fn matches(&self, key: &StockKey) -> bool {
        if let Some(warehouse_id) = self.warehouse_id {
            if key.warehouse_id != warehouse_id {
                return false;
            }
        }
        if let Some(product_id) = self.product_id {
            if key.product_id != product_id {
                return false;
            }
        }
        self.lot.matches(key.lot_id)
    }
}
