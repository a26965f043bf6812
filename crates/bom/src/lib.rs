//! `molino-bom` — bill-of-materials registry and resolver.
//!
//! A BOM is a versioned recipe: a finished product, a batch size, and a list
//! of (material product, quantity-per-batch) lines. The resolver scales a
//! recipe to a target production quantity; it is the only arithmetic that
//! drives material consumption, so it runs on exact decimals.

pub mod bom;
pub mod registry;
pub mod resolver;

pub use bom::{Bom, BomHeader, BomLine, BomSpec};
pub use registry::{BomRegistry, InMemoryBomRegistry};
pub use resolver::{Requirement, resolve};
