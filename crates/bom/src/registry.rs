use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use molino_catalog::Catalog;
use molino_core::{BomId, DomainError, DomainResult, ProductId};

use crate::bom::{Bom, BomHeader, BomLine, BomSpec};

/// Versioned recipe store.
///
/// `update` replaces the full line set atomically — there are no partial line
/// edits. Deactivating a BOM does not affect orders already created against
/// it; they keep resolving through the stored recipe by id.
pub trait BomRegistry: Send + Sync {
    fn create(&self, spec: BomSpec) -> DomainResult<Bom>;
    /// Wholesale replacement of name, batch size and lines. Version is
    /// unchanged: versions count distinct recipes per product, not edits.
    fn update(&self, id: BomId, spec: BomSpec) -> DomainResult<Bom>;
    fn deactivate(&self, id: BomId) -> DomainResult<Bom>;
    fn get(&self, id: BomId) -> Option<Bom>;
    /// The active recipe with the highest version for a product, if any.
    fn active_for_product(&self, product_id: ProductId) -> Option<Bom>;

    fn require(&self, id: BomId) -> DomainResult<Bom> {
        self.get(id)
            .ok_or_else(|| DomainError::reference_not_found(format!("bom {id}")))
    }
}

impl<R> BomRegistry for Arc<R>
where
    R: BomRegistry + ?Sized,
{
    fn create(&self, spec: BomSpec) -> DomainResult<Bom> {
        (**self).create(spec)
    }

    fn update(&self, id: BomId, spec: BomSpec) -> DomainResult<Bom> {
        (**self).update(id, spec)
    }

    fn deactivate(&self, id: BomId) -> DomainResult<Bom> {
        (**self).deactivate(id)
    }

    fn get(&self, id: BomId) -> Option<Bom> {
        (**self).get(id)
    }

    fn active_for_product(&self, product_id: ProductId) -> Option<Bom> {
        (**self).active_for_product(product_id)
    }
}

/// In-memory registry for tests/dev.
///
/// Holds a catalog handle so product-type invariants (finished target,
/// non-finished lines) are checked at the write boundary.
pub struct InMemoryBomRegistry<C> {
    catalog: C,
    boms: RwLock<HashMap<BomId, Bom>>,
}

impl<C> InMemoryBomRegistry<C>
where
    C: Catalog,
{
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            boms: RwLock::new(HashMap::new()),
        }
    }

    fn validate_spec(&self, spec: &BomSpec) -> DomainResult<()> {
        Bom::validate_structure(spec.batch_size, &spec.lines)?;
        if spec.name.trim().is_empty() {
            return Err(DomainError::validation("BOM name cannot be empty"));
        }

        let target = self.catalog.require_product(spec.product_id)?;
        if !target.product_type.is_finished() {
            return Err(DomainError::invalid_bom(format!(
                "target product {} is not a finished product",
                target.sku
            )));
        }
        for line in &spec.lines {
            let material = self.catalog.require_product(line.product_id)?;
            if material.product_type.is_finished() {
                return Err(DomainError::invalid_bom(format!(
                    "line product {} is a finished product",
                    material.sku
                )));
            }
        }
        Ok(())
    }
}

impl<C> BomRegistry for InMemoryBomRegistry<C>
where
    C: Catalog,
{
    fn create(&self, spec: BomSpec) -> DomainResult<Bom> {
        self.validate_spec(&spec)?;

        let mut boms = self
            .boms
            .write()
            .map_err(|_| DomainError::persistence("bom registry lock poisoned"))?;

        let next_version = boms
            .values()
            .filter(|b| b.header.product_id == spec.product_id)
            .map(|b| b.header.version)
            .max()
            .unwrap_or(0)
            + 1;

        let bom = Bom {
            header: BomHeader {
                id: BomId::new(),
                product_id: spec.product_id,
                version: next_version,
                name: spec.name,
                batch_size: spec.batch_size,
                active: true,
            },
            lines: spec.lines,
        };
        boms.insert(bom.header.id, bom.clone());
        Ok(bom)
    }

    fn update(&self, id: BomId, spec: BomSpec) -> DomainResult<Bom> {
        self.validate_spec(&spec)?;

        let mut boms = self
            .boms
            .write()
            .map_err(|_| DomainError::persistence("bom registry lock poisoned"))?;

        let existing = boms
            .get(&id)
            .ok_or_else(|| DomainError::reference_not_found(format!("bom {id}")))?;
        if existing.header.product_id != spec.product_id {
            return Err(DomainError::invalid_bom(
                "cannot repoint a BOM at a different target product",
            ));
        }

        let updated = Bom {
            header: BomHeader {
                name: spec.name,
                batch_size: spec.batch_size,
                ..existing.header.clone()
            },
            lines: spec.lines,
        };
        boms.insert(id, updated.clone());
        Ok(updated)
    }

    fn deactivate(&self, id: BomId) -> DomainResult<Bom> {
        let mut boms = self
            .boms
            .write()
            .map_err(|_| DomainError::persistence("bom registry lock poisoned"))?;
        let bom = boms
            .get_mut(&id)
            .ok_or_else(|| DomainError::reference_not_found(format!("bom {id}")))?;
        bom.header.active = false;
        Ok(bom.clone())
    }

    fn get(&self, id: BomId) -> Option<Bom> {
        self.boms.read().ok()?.get(&id).cloned()
    }

    fn active_for_product(&self, product_id: ProductId) -> Option<Bom> {
        let boms = self.boms.read().ok()?;
        boms.values()
            .filter(|b| b.header.product_id == product_id && b.header.active)
            .max_by_key(|b| b.header.version)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use molino_catalog::{InMemoryCatalog, Product, ProductType};
    use molino_core::Quantity;
    use rust_decimal_macros::dec;

    fn catalog_with(products: &[(ProductId, ProductType)]) -> Arc<InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        for (i, (id, ty)) in products.iter().enumerate() {
            catalog
                .add_product(
                    Product::new(*id, format!("SKU-{i}"), format!("P{i}"), *ty, "kg", Quantity::ZERO)
                        .unwrap(),
                )
                .unwrap();
        }
        Arc::new(catalog)
    }

    fn spec(product_id: ProductId, material_id: ProductId) -> BomSpec {
        BomSpec {
            product_id,
            name: "Granola base".to_string(),
            batch_size: Quantity::new(dec!(100)),
            lines: vec![BomLine {
                product_id: material_id,
                quantity_per_batch: Quantity::new(dec!(20)),
                unit_of_measure: "kg".to_string(),
            }],
        }
    }

    #[test]
    fn versions_are_monotonic_per_product() {
        let finished = ProductId::new();
        let other_finished = ProductId::new();
        let material = ProductId::new();
        let catalog = catalog_with(&[
            (finished, ProductType::FinishedProduct),
            (other_finished, ProductType::FinishedProduct),
            (material, ProductType::RawMaterial),
        ]);
        let registry = InMemoryBomRegistry::new(catalog);

        let v1 = registry.create(spec(finished, material)).unwrap();
        let v2 = registry.create(spec(finished, material)).unwrap();
        let other = registry.create(spec(other_finished, material)).unwrap();

        assert_eq!(v1.header.version, 1);
        assert_eq!(v2.header.version, 2);
        // Versions are independent per target product.
        assert_eq!(other.header.version, 1);
    }

    #[test]
    fn rejects_finished_product_on_a_line() {
        let finished = ProductId::new();
        let also_finished = ProductId::new();
        let catalog = catalog_with(&[
            (finished, ProductType::FinishedProduct),
            (also_finished, ProductType::FinishedProduct),
        ]);
        let registry = InMemoryBomRegistry::new(catalog);

        let err = registry.create(spec(finished, also_finished)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBom(_)));
    }

    #[test]
    fn rejects_non_finished_target() {
        let raw = ProductId::new();
        let material = ProductId::new();
        let catalog = catalog_with(&[
            (raw, ProductType::RawMaterial),
            (material, ProductType::Packaging),
        ]);
        let registry = InMemoryBomRegistry::new(catalog);

        let err = registry.create(spec(raw, material)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBom(_)));
    }

    #[test]
    fn update_replaces_the_full_line_set() {
        let finished = ProductId::new();
        let m1 = ProductId::new();
        let m2 = ProductId::new();
        let catalog = catalog_with(&[
            (finished, ProductType::FinishedProduct),
            (m1, ProductType::RawMaterial),
            (m2, ProductType::Packaging),
        ]);
        let registry = InMemoryBomRegistry::new(catalog);

        let bom = registry.create(spec(finished, m1)).unwrap();
        let mut new_spec = spec(finished, m2);
        new_spec.lines.push(BomLine {
            product_id: m1,
            quantity_per_batch: Quantity::new(dec!(5)),
            unit_of_measure: "kg".to_string(),
        });

        let updated = registry.update(bom.header.id, new_spec).unwrap();
        assert_eq!(updated.header.version, bom.header.version);
        assert_eq!(updated.lines.len(), 2);
        assert_eq!(updated.lines[0].product_id, m2);
    }

    #[test]
    fn deactivation_keeps_the_recipe_resolvable_by_id() {
        let finished = ProductId::new();
        let material = ProductId::new();
        let catalog = catalog_with(&[
            (finished, ProductType::FinishedProduct),
            (material, ProductType::RawMaterial),
        ]);
        let registry = InMemoryBomRegistry::new(catalog);

        let bom = registry.create(spec(finished, material)).unwrap();
        registry.deactivate(bom.header.id).unwrap();

        assert!(registry.active_for_product(finished).is_none());
        // Orders created against this BOM still find it.
        assert!(registry.get(bom.header.id).is_some());
    }
}
