//! Diagnostics for the binaries, through `tracing`.
//!
//! This is separate from the sanity log, which is a report and is written
//! through [`SanityLog`](crate::sanity::SanityLog).

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    Ok(())
}
