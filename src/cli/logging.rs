//! Tracing setup for the CLI.
//!
//! Log lines go to stderr so that stdout only carries command output
//! (answers, `cite --json`, `config show`).

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Level for a `-v` count; without `-v` the configured level is used.
pub fn level_for(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the subscriber writing formatted events to `writer`.
pub fn subscriber<W>(directive: &str, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new(directive))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(writer),
        )
}

/// Install the global subscriber. `RUST_LOG` overrides the level.
pub fn init(verbose: u8, configured: &str) {
    let directive = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("quill={}", level_for(verbose, configured)));

    subscriber(&directive, std::io::stderr).init();
}
