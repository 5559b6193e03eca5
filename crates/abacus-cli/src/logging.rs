use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Directives used by `--verbose`.
pub const VERBOSE_FILTER: &str = "abacus_calculator=debug,abacus_cli=debug,info";

/// Installs the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if config.json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}
