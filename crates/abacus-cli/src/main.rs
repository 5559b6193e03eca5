use abacus_cli::config::{AbacusConfig, ConfigSource};
use abacus_cli::logging::{VERBOSE_FILTER, init_logging};
use abacus_cli::{Cli, Outcome, build_registry, execute};
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::{debug, info, warn};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<Outcome> {
    let loaded = AbacusConfig::load(cli.config.as_deref())?;
    let mut config = loaded.config.apply_env_overrides()?;
    if cli.verbose {
        config.logging.filter = VERBOSE_FILTER.to_string();
    }
    init_logging(&config.logging)?;

    match &loaded.source {
        ConfigSource::File(path) => info!(
            path = %path.display(),
            environment = %config.environment.env_type,
            "Loaded configuration"
        ),
        ConfigSource::Defaults { attempted } if cli.config.is_some() => {
            warn!(path = %attempted.display(), "Configuration file not found, using defaults")
        }
        ConfigSource::Defaults { attempted } => {
            debug!(path = %attempted.display(), "No configuration file, using defaults")
        }
    }

    let registry = build_registry(&config, &cli.catalogs)?;
    let mut stdout = io::stdout().lock();
    execute(&cli.command, cli.json, &registry, &mut stdout)
}
