use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "pricescout=info";

/// Installs a console subscriber filtered by `RUST_LOG`. `verbose` lowers the
/// default level to debug. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let default = if verbose { "pricescout=debug" } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
