//! `molino-ledger` — the stock ledger of record.
//!
//! Two representations of the same fact live here: the append-only
//! [`Movement`] log (authoritative) and the materialized [`StockEntry`] table
//! (O(1) reads). Every append updates both inside one atomic unit of work;
//! the materialized quantity is never computed by an unguarded
//! read-add-write across separate operations.
//!
//! The ledger is deliberately **non-enforcing**: it records truth and lets
//! stock go negative. Feasibility checks belong to policy layers above it.

pub mod movement;
pub mod stock;
pub mod store;

pub use movement::{Movement, MovementFilter, MovementReference, MovementType, NewMovement, ReferenceKind};
pub use stock::{LotScope, StockEntry, StockKey, StockQuery};
pub use store::{InMemoryStockLedger, StockLedger, MAX_APPEND_RETRIES};
