use serde::{Deserialize, Serialize};

use molino_core::{DomainError, DomainResult, ProductId, Quantity};

/// Product kind; determines where a product may appear in a BOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    RawMaterial,
    Packaging,
    FinishedProduct,
}

impl ProductType {
    /// Only finished products may be the target of a BOM; anything else may
    /// appear on its lines.
    pub fn is_finished(self) -> bool {
        matches!(self, ProductType::FinishedProduct)
    }
}

/// Product record (immutable once referenced by a movement).
///
/// Created and edited by the product-management collaborator; the ledger core
/// treats this as a typed read-only row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub product_type: ProductType,
    pub unit_of_measure: String,
    pub reorder_point: Quantity,
    pub active: bool,
}

impl Product {
    pub fn new(
        id: ProductId,
        sku: impl Into<String>,
        name: impl Into<String>,
        product_type: ProductType,
        unit_of_measure: impl Into<String>,
        reorder_point: Quantity,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        let name = name.into();
        if sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if reorder_point.is_negative() {
            return Err(DomainError::validation("reorder point cannot be negative"));
        }
        Ok(Self {
            id,
            sku,
            name,
            product_type,
            unit_of_measure: unit_of_measure.into(),
            reorder_point,
            active: true,
        })
    }
}
