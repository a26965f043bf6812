use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use molino_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion, OrderId};

use crate::order::ProductionOrder;

/// Persistence seam for production orders.
pub trait OrderStore: Send + Sync {
    /// Insert a freshly created order. Rejects a reused id or order number.
    fn insert(&self, order: ProductionOrder) -> DomainResult<()>;

    /// Overwrite an existing order, guarded by an optimistic version check
    /// against the stored copy.
    fn save(&self, order: ProductionOrder, expected: ExpectedVersion) -> DomainResult<()>;

    fn get(&self, order_id: OrderId) -> DomainResult<Option<ProductionOrder>>;

    /// All orders, ordered by order number.
    fn list(&self) -> DomainResult<Vec<ProductionOrder>>;

    fn require(&self, order_id: OrderId) -> DomainResult<ProductionOrder> {
        self.get(order_id)?
            .ok_or_else(|| DomainError::reference_not_found(format!("production order {order_id}")))
    }
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn insert(&self, order: ProductionOrder) -> DomainResult<()> {
        (**self).insert(order)
    }

    fn save(&self, order: ProductionOrder, expected: ExpectedVersion) -> DomainResult<()> {
        (**self).save(order, expected)
    }

    fn get(&self, order_id: OrderId) -> DomainResult<Option<ProductionOrder>> {
        (**self).get(order_id)
    }

    fn list(&self) -> DomainResult<Vec<ProductionOrder>> {
        (**self).list()
    }

    fn require(&self, order_id: OrderId) -> DomainResult<ProductionOrder> {
        (**self).require(order_id)
    }
}

/// In-memory order store for tests/dev.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, ProductionOrder>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: ProductionOrder) -> DomainResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::persistence("order store lock poisoned"))?;

        if orders.contains_key(order.id()) {
            return Err(DomainError::conflict(format!(
                "production order {} already exists",
                order.id()
            )));
        }
        if orders
            .values()
            .any(|existing| existing.order_number() == order.order_number())
        {
            return Err(DomainError::conflict(format!(
                "order number {} already taken",
                order.order_number()
            )));
        }

        orders.insert(order.id_typed(), order);
        Ok(())
    }

    fn save(&self, order: ProductionOrder, expected: ExpectedVersion) -> DomainResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::persistence("order store lock poisoned"))?;

        let stored = orders.get(order.id()).ok_or_else(|| {
            DomainError::reference_not_found(format!("production order {}", order.id()))
        })?;
        expected.check(stored.version())?;

        orders.insert(order.id_typed(), order);
        Ok(())
    }

    fn get(&self, order_id: OrderId) -> DomainResult<Option<ProductionOrder>> {
        let orders = self
            .orders
            .read()
            .map_err(|_| DomainError::persistence("order store lock poisoned"))?;
        Ok(orders.get(&order_id).cloned())
    }

    fn list(&self) -> DomainResult<Vec<ProductionOrder>> {
        let orders = self
            .orders
            .read()
            .map_err(|_| DomainError::persistence("order store lock poisoned"))?;
        let mut all: Vec<ProductionOrder> = orders.values().cloned().collect();
        all.sort_by(|a, b| a.order_number().cmp(b.order_number()));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{CreateOrder, OrderCommand};
    use chrono::Utc;
    use molino_core::{Aggregate, BomId, ProductId, Quantity, UserId, WarehouseId};
    use rust_decimal_macros::dec;

    fn order_with_number(number: &str) -> ProductionOrder {
        let order_id = OrderId::new();
        let mut order = ProductionOrder::empty(order_id);
        let events = order
            .handle(&OrderCommand::CreateOrder(CreateOrder {
                order_id,
                order_number: number.to_string(),
                bom_id: BomId::new(),
                product_id: ProductId::new(),
                warehouse_id: WarehouseId::new(),
                planned_quantity: Quantity::new(dec!(10)),
                scheduled_start: None,
                scheduled_end: None,
                as_draft: false,
                created_by: UserId::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        order.apply(&events[0]);
        order
    }

    #[test]
    fn insert_rejects_duplicate_order_number() {
        let store = InMemoryOrderStore::new();
        store.insert(order_with_number("OP-20260830-0001")).unwrap();

        let err = store
            .insert(order_with_number("OP-20260830-0001"))
            .unwrap_err();
        assert!(matches!(err, DomainError::ConcurrencyConflict(_)));
    }

    #[test]
    fn save_enforces_expected_version() {
        let store = InMemoryOrderStore::new();
        let order = order_with_number("OP-20260830-0002");
        store.insert(order.clone()).unwrap();

        let err = store
            .save(order.clone(), ExpectedVersion::Exact(7))
            .unwrap_err();
        assert!(matches!(err, DomainError::ConcurrencyConflict(_)));

        store.save(order, ExpectedVersion::Exact(1)).unwrap();
    }

    #[test]
    fn list_sorts_by_order_number() {
        let store = InMemoryOrderStore::new();
        store.insert(order_with_number("OP-20260830-0002")).unwrap();
        store.insert(order_with_number("OP-20260830-0001")).unwrap();

        let numbers: Vec<String> = store
            .list()
            .unwrap()
            .iter()
            .map(|o| o.order_number().to_string())
            .collect();
        assert_eq!(numbers, vec!["OP-20260830-0001", "OP-20260830-0002"]);
    }

    #[test]
    fn poisoned_lock_surfaces_as_persistence_failure() {
        let store = Arc::new(InMemoryOrderStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.orders.write().unwrap();
            panic!("poison the order store lock");
        })
        .join();

        assert!(matches!(
            store.get(OrderId::new()).unwrap_err(),
            DomainError::Persistence(_)
        ));
        assert!(matches!(
            store.list().unwrap_err(),
            DomainError::Persistence(_)
        ));
    }
}
