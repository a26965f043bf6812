use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use molino_core::{DomainError, DomainResult, ProductId, WarehouseId};

use crate::product::Product;
use crate::warehouse::Warehouse;

/// Read-only lookup surface over products and warehouses.
///
/// The ledger validates movement references against this; it never writes
/// catalog rows. Reads are fallible: a broken store surfaces `Persistence`
/// instead of masquerading as "not found".
pub trait Catalog: Send + Sync {
    fn product(&self, id: ProductId) -> DomainResult<Option<Product>>;
    fn warehouse(&self, id: WarehouseId) -> DomainResult<Option<Warehouse>>;

    fn require_product(&self, id: ProductId) -> DomainResult<Product> {
        self.product(id)?
            .ok_or_else(|| DomainError::reference_not_found(format!("product {id}")))
    }

    fn require_warehouse(&self, id: WarehouseId) -> DomainResult<Warehouse> {
        self.warehouse(id)?
            .ok_or_else(|| DomainError::reference_not_found(format!("warehouse {id}")))
    }
}

impl<C> Catalog for Arc<C>
where
    C: Catalog + ?Sized,
{
    fn product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        (**self).product(id)
    }

    fn warehouse(&self, id: WarehouseId) -> DomainResult<Option<Warehouse>> {
        (**self).warehouse(id)
    }
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
    warehouses: RwLock<HashMap<WarehouseId, Warehouse>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&self, product: Product) -> DomainResult<()> {
        let mut map = self
            .products
            .write()
            .map_err(|_| DomainError::persistence("catalog lock poisoned"))?;
        map.insert(product.id, product);
        Ok(())
    }

    pub fn add_warehouse(&self, warehouse: Warehouse) -> DomainResult<()> {
        let mut map = self
            .warehouses
            .write()
            .map_err(|_| DomainError::persistence("catalog lock poisoned"))?;
        map.insert(warehouse.id, warehouse);
        Ok(())
    }
}

impl Catalog for InMemoryCatalog {
    fn product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let products = self
            .products
            .read()
            .map_err(|_| DomainError::persistence("catalog lock poisoned"))?;
        Ok(products.get(&id).cloned())
    }

    fn warehouse(&self, id: WarehouseId) -> DomainResult<Option<Warehouse>> {
        let warehouses = self
            .warehouses
            .read()
            .map_err(|_| DomainError::persistence("catalog lock poisoned"))?;
        Ok(warehouses.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductType;
    use molino_core::Quantity;

    #[test]
    fn require_product_reports_missing_reference() {
        let catalog = InMemoryCatalog::new();
        let id = ProductId::new();
        let err = catalog.require_product(id).unwrap_err();
        assert!(matches!(err, DomainError::ReferenceNotFound(_)));

        let product = Product::new(
            id,
            "RM-OATS",
            "Rolled oats",
            ProductType::RawMaterial,
            "kg",
            Quantity::ZERO,
        )
        .unwrap();
        catalog.add_product(product.clone()).unwrap();
        assert_eq!(catalog.require_product(id).unwrap(), product);
    }

    #[test]
    fn poisoned_lock_surfaces_as_persistence_failure() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let poisoner = Arc::clone(&catalog);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.products.write().unwrap();
            panic!("poison the product lock");
        })
        .join();

        let err = catalog.product(ProductId::new()).unwrap_err();
        assert!(matches!(err, DomainError::Persistence(_)));
    }
}
