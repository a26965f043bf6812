//! `molino-production` — production order lifecycle.
//!
//! The [`ProductionOrder`] aggregate is a pure state machine: commands in,
//! events out, no IO. The [`ProductionService`] orchestrates a transition's
//! side effects across the BOM resolver, the stock ledger and the lot
//! registry, then persists the status change with an optimistic version
//! check. Multi-write transitions are re-entrant rather than transactional:
//! retrying a half-applied `start` or `complete` never doubles its effects.

pub mod order;
pub mod service;
pub mod store;

pub use order::{
    CreateOrder, OrderCommand, OrderEvent, OrderStatus, ProductionOrder,
};
pub use service::{AvailabilityPolicy, CreateOrderRequest, ProductionService};
pub use store::{InMemoryOrderStore, OrderStore};
