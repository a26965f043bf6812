//! Tracing/logging setup shared by binaries and integration tests.
//!
//! The domain crates emit spans and events through `tracing` and stay
//! subscriber-agnostic; this is the one place that installs a subscriber.

use tracing_subscriber::EnvFilter;

/// Initialize process-wide JSON logging, filtered via `RUST_LOG`.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    init_with("info");
}

/// Like [`init`], with an explicit fallback directive for when `RUST_LOG`
/// is unset. Tests use this to silence the default `info` chatter.
pub fn init_with(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init_with("warn");
        init_with("warn");
        init();
    }
}
