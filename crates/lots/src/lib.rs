//! `molino-lots` — traceable production lots.
//!
//! A lot is an immutable, dated batch of produced goods, minted exactly once
//! when a production order completes (1:1 with the order's output).

pub mod lot;
pub mod registry;

pub use lot::{Lot, LotNumber, NewLot};
pub use registry::{InMemoryLotRegistry, LotFilter, LotRegistry};
