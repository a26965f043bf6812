use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use molino_core::{LotId, MovementId, ProductId, Quantity, UserId, WarehouseId};

/// Why a quantity moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    ProductionConsume,
    ProductionOutput,
    Transfer,
    Adjustment,
}

/// Kind of document a movement points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    ProductionOrder,
    PurchaseOrder,
    SalesOrder,
}

/// Typed back-reference to the originating document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementReference {
    pub kind: ReferenceKind,
    pub id: Uuid,
}

impl MovementReference {
    pub fn production_order(id: impl Into<Uuid>) -> Self {
        Self {
            kind: ReferenceKind::ProductionOrder,
            id: id.into(),
        }
    }
}

/// A movement ready to be appended (no id, sequence or timestamp yet).
///
/// Signed quantity: negative = outflow. Consumption movements are
/// lot-agnostic (`lot_id = None`) by design — they debit the lot-agnostic
/// stock key even when lot-tracked stock exists for the material. Preserved
/// source behavior, pending product-owner clarification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub movement_type: MovementType,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub lot_id: Option<LotId>,
    pub quantity: Quantity,
    pub reference: Option<MovementReference>,
    pub created_by: UserId,
}

/// One signed, timestamped, typed quantity change recorded permanently.
///
/// Append-only: never updated or deleted. `sequence` is the movement's
/// position in the whole ledger (assigned at append, monotonically
/// increasing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub sequence: u64,
    pub movement_type: MovementType,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub lot_id: Option<LotId>,
    pub quantity: Quantity,
    pub reference: Option<MovementReference>,
    pub created_by: UserId,
    pub recorded_at: DateTime<Utc>,
}

/// History query filter; all criteria are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub product_id: Option<ProductId>,
    pub movement_type: Option<MovementType>,
    pub reference: Option<MovementReference>,
}

impl MovementFilter {
    pub fn by_reference(reference: MovementReference) -> Self {
        Self {
            reference: Some(reference),
            ..Self::default()
        }
    }

    pub fn matches(&self, movement: &Movement) -> bool {
        if let Some(warehouse_id) = self.warehouse_id {
            if movement.warehouse_id != warehouse_id {
                return false;
            }
        }
        if let Some(product_id) = self.product_id {
            if movement.product_id != product_id {
                return false;
            }
        }
        if let Some(movement_type) = self.movement_type {
            if movement.movement_type != movement_type {
                return false;
            }
        }
        if let Some(reference) = self.reference {
            if movement.reference != Some(reference) {
                return false;
            }
        }
        true
    }
}
