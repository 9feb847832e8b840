//! Optional tracing setup for embedding hosts (`SPEC_FULL.md` §5's logging
//! addition). The VM emits its own `tracing` spans/events regardless of
//! whether a subscriber is installed; this just gives a host an
//! `EnvFilter`-driven `fmt` subscriber it can install in one call instead
//! of hand-assembling the `tracing-subscriber` builder itself.

use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber filtered by `RUST_LOG` (or `default`
/// if unset). Intended for binaries/tests embedding Slate, not for
/// `slate-vm` itself, which never touches the global subscriber.
///
/// # Panics
/// Panics if a global subscriber is already installed.
pub fn init(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
