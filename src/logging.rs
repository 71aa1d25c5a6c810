//! Logging setup for the binary

use std::io::IsTerminal as _;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Settings;

/// Install the global subscriber
///
/// Verbose runs log every command at debug level. Events go to stdout with a
/// timestamp. `RUST_LOG` can refine the filter further.
pub fn initialize(settings: &Settings) -> Result<(), anyhow::Error> {
    let level = if settings.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(std::io::stdout().is_terminal())
                .with_writer(std::io::stdout),
        )
        .try_init()?;
    Ok(())
}
