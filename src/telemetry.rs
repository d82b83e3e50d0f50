/// Tracing initialization for host applications
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber. Respects `RUST_LOG`, defaulting to
/// debug output for this crate. Call once at host startup.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sol_did_mirror=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
