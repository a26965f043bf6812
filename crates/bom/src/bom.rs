use serde::{Deserialize, Serialize};

use molino_core::{BomId, DomainError, DomainResult, ProductId, Quantity};

/// One material line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomLine {
    pub product_id: ProductId,
    /// Quantity of this material consumed per `batch_size` of output.
    pub quantity_per_batch: Quantity,
    pub unit_of_measure: String,
}

/// BOM header: the recipe's identity and batch scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomHeader {
    pub id: BomId,
    /// Target (finished) product this recipe produces.
    pub product_id: ProductId,
    /// Monotonic per target product; assigned by the registry.
    pub version: u32,
    pub name: String,
    pub batch_size: Quantity,
    pub active: bool,
}

/// A complete, validated recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bom {
    pub header: BomHeader,
    pub lines: Vec<BomLine>,
}

/// Caller-supplied recipe content; the registry assigns id and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomSpec {
    pub product_id: ProductId,
    pub name: String,
    pub batch_size: Quantity,
    pub lines: Vec<BomLine>,
}

impl Bom {
    /// Structural invariants, checked before any write:
    /// positive batch size, at least one line, every line quantity positive,
    /// no duplicate material on the line set.
    pub fn validate_structure(batch_size: Quantity, lines: &[BomLine]) -> DomainResult<()> {
        if !batch_size.is_positive() {
            return Err(DomainError::invalid_bom(format!(
                "batch size must be positive, got {batch_size}"
            )));
        }
        if lines.is_empty() {
            return Err(DomainError::invalid_bom("a BOM needs at least one line"));
        }
        for line in lines {
            if !line.quantity_per_batch.is_positive() {
                return Err(DomainError::invalid_bom(format!(
                    "line quantity for product {} must be positive, got {}",
                    line.product_id, line.quantity_per_batch
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for line in lines {
            if !seen.insert(line.product_id) {
                return Err(DomainError::invalid_bom(format!(
                    "product {} appears on more than one line",
                    line.product_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(qty: Quantity) -> BomLine {
        BomLine {
            product_id: ProductId::new(),
            quantity_per_batch: qty,
            unit_of_measure: "kg".to_string(),
        }
    }

    #[test]
    fn rejects_non_positive_batch_size() {
        let lines = vec![line(Quantity::new(dec!(1)))];
        let err = Bom::validate_structure(Quantity::ZERO, &lines).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBom(_)));
    }

    #[test]
    fn rejects_empty_line_set() {
        let err = Bom::validate_structure(Quantity::new(dec!(100)), &[]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBom(_)));
    }

    #[test]
    fn rejects_duplicate_material() {
        let l = line(Quantity::new(dec!(2)));
        let dup = l.clone();
        let err = Bom::validate_structure(Quantity::new(dec!(100)), &[l, dup]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBom(_)));
    }
}
