//! Proportional recipe scaling.
//!
//! `required = quantity_per_batch * target / batch_size`, per line, in exact
//! decimal arithmetic. Pure function; no hidden state.

use serde::{Deserialize, Serialize};

use molino_core::{DomainError, DomainResult, ProductId, Quantity};

use crate::bom::Bom;

/// One resolved material requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Scale a recipe to a target production quantity.
///
/// Fails with `InvalidBom` if the batch size, any line quantity, or the
/// target quantity is not positive.
pub fn resolve(bom: &Bom, target_quantity: Quantity) -> DomainResult<Vec<Requirement>> {
    if !bom.header.batch_size.is_positive() {
        return Err(DomainError::invalid_bom(format!(
            "batch size must be positive, got {}",
            bom.header.batch_size
        )));
    }
    if !target_quantity.is_positive() {
        return Err(DomainError::invalid_bom(format!(
            "target quantity must be positive, got {target_quantity}"
        )));
    }

    bom.lines
        .iter()
        .map(|line| {
            if !line.quantity_per_batch.is_positive() {
                return Err(DomainError::invalid_bom(format!(
                    "line quantity for product {} must be positive, got {}",
                    line.product_id, line.quantity_per_batch
                )));
            }
            let required = line.quantity_per_batch.value() * target_quantity.value()
                / bom.header.batch_size.value();
            Ok(Requirement {
                product_id: line.product_id,
                quantity: Quantity::new(required),
            })
        })
        .collect()
}
