use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::{debug, warn};

use molino_catalog::Catalog;
use molino_core::{DomainError, DomainResult, MovementId, Quantity};
use molino_lots::LotRegistry;

use crate::movement::{Movement, MovementFilter, NewMovement};
use crate::stock::{StockEntry, StockKey, StockQuery};

/// Internal retries before a lost race surfaces as `ConcurrencyConflict`.
pub const MAX_APPEND_RETRIES: usize = 3;

/// The single shared mutable resource of the core.
///
/// `append` is one serializable unit of work: the whole batch of movements
/// lands in the log and every touched stock entry is updated, or nothing
/// happens. Validation errors are detected before any write.
pub trait StockLedger: Send + Sync {
    /// Validate and append a batch of movements atomically, returning each
    /// committed movement with the stock entry it produced.
    fn append(&self, batch: Vec<NewMovement>) -> DomainResult<Vec<(Movement, StockEntry)>>;

    /// Current on-hand quantity for one key (zero when no movement ever
    /// touched it). Read-only; fails with `Persistence` if the store is
    /// broken rather than reporting zero.
    fn stock(&self, key: &StockKey) -> DomainResult<Quantity>;

    /// Materialized entries matching a query.
    fn stock_levels(&self, query: &StockQuery) -> DomainResult<Vec<StockEntry>>;

    /// Movement history matching a filter, newest first.
    fn history(&self, filter: &MovementFilter) -> DomainResult<Vec<Movement>>;
}

impl<S> StockLedger for Arc<S>
where
    S: StockLedger + ?Sized,
{
    fn append(&self, batch: Vec<NewMovement>) -> DomainResult<Vec<(Movement, StockEntry)>> {
        (**self).append(batch)
    }

    fn stock(&self, key: &StockKey) -> DomainResult<Quantity> {
        (**self).stock(key)
    }

    fn stock_levels(&self, query: &StockQuery) -> DomainResult<Vec<StockEntry>> {
        (**self).stock_levels(query)
    }

    fn history(&self, filter: &MovementFilter) -> DomainResult<Vec<Movement>> {
        (**self).history(filter)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    log: Vec<Movement>,
    stock: HashMap<StockKey, StockEntry>,
}

/// In-memory ledger for tests/dev. Not optimized for performance.
///
/// Appends follow an optimistic discipline: deltas are computed against a
/// read snapshot, entry versions are re-checked under the write lock, and a
/// changed version restarts the attempt (bounded by [`MAX_APPEND_RETRIES`]).
/// The unguarded read-add-write-by-id pattern the ledger replaces would
/// silently lose one delta when two completions race on a key.
pub struct InMemoryStockLedger<C, L> {
    catalog: C,
    lots: L,
    state: RwLock<LedgerState>,
}

impl<C, L> InMemoryStockLedger<C, L>
where
    C: Catalog,
    L: LotRegistry,
{
    pub fn new(catalog: C, lots: L) -> Self {
        Self {
            catalog,
            lots,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Reference and quantity validation; runs before any write.
    fn validate(&self, movement: &NewMovement) -> DomainResult<()> {
        if movement.quantity.is_zero() {
            return Err(DomainError::validation("movement quantity must be nonzero"));
        }
        self.catalog.require_warehouse(movement.warehouse_id)?;
        self.catalog.require_product(movement.product_id)?;
        if let Some(lot_id) = movement.lot_id {
            self.lots.require(lot_id)?;
        }
        Ok(())
    }

    /// Snapshot the current entry version per touched key.
    fn entry_versions(state: &LedgerState, batch: &[NewMovement]) -> HashMap<StockKey, u64> {
        let mut versions = HashMap::new();
        for movement in batch {
            let key = StockKey {
                warehouse_id: movement.warehouse_id,
                product_id: movement.product_id,
                lot_id: movement.lot_id,
            };
            versions
                .entry(key)
                .or_insert_with(|| state.stock.get(&key).map(|e| e.version).unwrap_or(0));
        }
        versions
    }
}

impl<C, L> StockLedger for InMemoryStockLedger<C, L>
where
    C: Catalog,
    L: LotRegistry,
{
    fn append(&self, batch: Vec<NewMovement>) -> DomainResult<Vec<(Movement, StockEntry)>> {
        if batch.is_empty() {
            return Ok(vec![]);
        }

        for movement in &batch {
            self.validate(movement)?;
        }

        for attempt in 0..MAX_APPEND_RETRIES {
            // Version snapshot under the read lock.
            let snapshot = {
                let state = self
                    .state
                    .read()
                    .map_err(|_| DomainError::persistence("ledger lock poisoned"))?;
                Self::entry_versions(&state, &batch)
            };

            let mut state = self
                .state
                .write()
                .map_err(|_| DomainError::persistence("ledger lock poisoned"))?;

            // Re-check versions under the write lock; a concurrent append to
            // any touched key invalidates the snapshot.
            let stale = snapshot.iter().any(|(key, version)| {
                state.stock.get(key).map(|e| e.version).unwrap_or(0) != *version
            });
            if stale {
                warn!(attempt, "ledger append lost a race, retrying");
                continue;
            }

            // Commit: assign identities, append the log, update entries.
            let recorded_at = Utc::now();
            let mut committed = Vec::with_capacity(batch.len());
            for movement in &batch {
                let sequence = state.log.len() as u64 + 1;
                let stored = Movement {
                    id: MovementId::new(),
                    sequence,
                    movement_type: movement.movement_type,
                    warehouse_id: movement.warehouse_id,
                    product_id: movement.product_id,
                    lot_id: movement.lot_id,
                    quantity: movement.quantity,
                    reference: movement.reference,
                    created_by: movement.created_by,
                    recorded_at,
                };

                let key = StockKey::of(&stored);
                let entry = state
                    .stock
                    .entry(key)
                    .or_insert_with(|| StockEntry::empty(key));
                entry.quantity += stored.quantity;
                entry.version += 1;
                let entry = entry.clone();

                state.log.push(stored.clone());
                committed.push((stored, entry));
            }

            debug!(movements = committed.len(), "ledger batch appended");
            return Ok(committed);
        }

        Err(DomainError::conflict(format!(
            "ledger append still conflicted after {MAX_APPEND_RETRIES} attempts"
        )))
    }

    fn stock(&self, key: &StockKey) -> DomainResult<Quantity> {
        let state = self
            .state
            .read()
            .map_err(|_| DomainError::persistence("ledger lock poisoned"))?;
        Ok(state
            .stock
            .get(key)
            .map(|e| e.quantity)
            .unwrap_or(Quantity::ZERO))
    }

    fn stock_levels(&self, query: &StockQuery) -> DomainResult<Vec<StockEntry>> {
        let state = self
            .state
            .read()
            .map_err(|_| DomainError::persistence("ledger lock poisoned"))?;
        let mut entries: Vec<StockEntry> = state
            .stock
            .values()
            .filter(|e| query.matches(&e.key))
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.key.warehouse_id, e.key.product_id, e.key.lot_id));
        Ok(entries)
    }

    fn history(&self, filter: &MovementFilter) -> DomainResult<Vec<Movement>> {
        let state = self
            .state
            .read()
            .map_err(|_| DomainError::persistence("ledger lock poisoned"))?;
        let mut movements: Vec<Movement> = state
            .log
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        movements.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(movements)
    }
}
