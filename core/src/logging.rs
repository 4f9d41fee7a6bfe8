use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "REWARDKIT_LOG";

/// Used when `REWARDKIT_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "rewardkit_core=info,reward_curves=info";

static INIT: Once = Once::new();

fn default_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// Install a formatted subscriber filtered by `REWARDKIT_LOG`.
///
/// Calling it more than once has no further effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| default_filter());

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    });
}
