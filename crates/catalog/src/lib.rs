//! `molino-catalog` — read-only reference data for the ledger core.
//!
//! Products and warehouses are owned by collaborators outside this core
//! (product management, sales). The ledger only ever *reads* them, through
//! an explicit [`Catalog`] handle passed into each component — there is no
//! ambient singleton.

pub mod product;
pub mod store;
pub mod warehouse;

pub use product::{Product, ProductType};
pub use store::{Catalog, InMemoryCatalog};
pub use warehouse::Warehouse;
