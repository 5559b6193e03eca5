//! Command-line front end: configuration loading, logging setup and the
//! `abacus` subcommands over a [`abacus_calculator::CalculatorRegistry`].

pub mod cli;
pub mod config;
pub mod logging;

pub use cli::{Cli, Command, InvocationArgs, Outcome, build_registry, execute};
pub use config::{AbacusConfig, ConfigError, ConfigSource, LoadedConfig};
