//! `molino-expiry` — shelf-life monitoring over the lot registry.
//!
//! Pure classification (a lot is expired, near expiry, valid or unknown)
//! plus a read-only monitor that joins lots with their current on-hand
//! stock. Nothing here writes; expired stock is acted on by people, not by
//! the ledger.

pub mod monitor;
pub mod status;

pub use monitor::{ExpiringLot, ExpiryMonitor};
pub use status::{classify, days_to_expiry, ExpiryStatus, NEAR_EXPIRY_WINDOW_DAYS};
