use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use molino_core::{DomainError, DomainResult, LotId, OrderId, ProductId, Quantity};

/// Human lot number, e.g. `LOT-20260830-4567f3a1`.
///
/// Derived from the production date plus the last 8 hex characters of the
/// originating order's UUID. The trailing hex of a v7 id is random (the
/// leading hex is the timestamp, shared by ids minted close together), so
/// two orders completed the same day never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotNumber(String);

impl LotNumber {
    pub fn derive(production_date: NaiveDate, order_id: OrderId) -> Self {
        let uuid = order_id.as_uuid().simple().to_string();
        let order_suffix = &uuid[uuid.len() - 8..];
        Self(format!(
            "LOT-{}-{order_suffix}",
            production_date.format("%Y%m%d")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for LotNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lot content before minting; the registry derives the number and persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLot {
    pub id: LotId,
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub production_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub initial_quantity: Quantity,
}

/// Immutable production lot record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub id: LotId,
    pub lot_number: LotNumber,
    pub product_id: ProductId,
    /// The production order whose completion minted this lot.
    pub order_id: OrderId,
    pub production_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub initial_quantity: Quantity,
}

impl NewLot {
    pub fn validate(&self) -> DomainResult<()> {
        if !self.initial_quantity.is_positive() {
            return Err(DomainError::validation(format!(
                "initial lot quantity must be positive, got {}",
                self.initial_quantity
            )));
        }
        if let Some(expiry) = self.expiry_date {
            if expiry < self.production_date {
                return Err(DomainError::validation(
                    "expiry date cannot precede production date",
                ));
            }
        }
        Ok(())
    }
}
