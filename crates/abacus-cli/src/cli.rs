//! `abacus` subcommands.
//!
//! Commands write their report to the supplied writer and return an
//! [`Outcome`]; only unexpected failures (unreadable catalogue, malformed
//! input syntax, I/O) surface as errors.

use crate::config::AbacusConfig;
use abacus_calculator::built_in::register_builtins;
use abacus_calculator::catalog::load_catalog;
use abacus_calculator::conformance::{ExampleOutcome, check_registry};
use abacus_calculator::{
    CalculationOutput, CalculatorDescriptor, CalculatorEngine, CalculatorError,
    CalculatorFamily, CalculatorInputs, CalculatorRegistry, FieldSpec, InputError, LookupFailure,
    ValidationFailure,
};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "abacus", version)]
#[command(about = "Run, validate and inspect registered calculators")]
pub struct Cli {
    /// Configuration file (defaults to $ABACUS_CONFIG_PATH, then abacus.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Additional calculator catalogue to load; may be repeated
    #[arg(long = "catalog", global = true, value_name = "PATH")]
    pub catalogs: Vec<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered calculators
    List {
        /// Only calculators of this family
        #[arg(long)]
        category: Option<CalculatorFamily>,

        /// Case-insensitive match on id, name or tag
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a calculator's fields and examples
    Describe { id: String },
    /// Check inputs without calculating
    Validate(InvocationArgs),
    /// Validate, compute and analyze
    Calculate(InvocationArgs),
    /// Run every calculator against its own examples
    Check,
}

#[derive(Args, Debug)]
pub struct InvocationArgs {
    /// Calculator id
    pub id: String,

    /// Input assignment; may be repeated
    #[arg(short, long = "input", value_name = "FIELD=VALUE")]
    pub inputs: Vec<String>,

    /// Inputs as a JSON object; `--input` assignments override its fields
    #[arg(long, value_name = "JSON")]
    pub inputs_json: Option<String>,
}

impl InvocationArgs {
    pub fn calculator_inputs(&self) -> Result<CalculatorInputs, InputError> {
        let base = match &self.inputs_json {
            Some(raw) => CalculatorInputs::from_json_str(raw)?,
            None => CalculatorInputs::new(),
        };
        Ok(base.merge(CalculatorInputs::from_assignments(&self.inputs)?))
    }
}

/// How a command finished. Mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
    Invalid,
    CheckFailed,
}

impl Outcome {
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::NotFound => 2,
            Self::Invalid => 3,
            Self::CheckFailed => 4,
        }
    }
}

/// Builds the registry the configuration describes: built-ins first, then
/// catalogues from the config file, then `extra_catalogs`. Catalogue entries
/// without their own large-amount limit inherit the configured one.
pub fn build_registry(
    config: &AbacusConfig,
    extra_catalogs: &[PathBuf],
) -> anyhow::Result<CalculatorRegistry> {
    let limit = config.warnings.large_amount_limit;
    let mut registry = CalculatorRegistry::with_policy(config.registry.duplicate_policy);
    if config.registry.include_builtins {
        register_builtins(&mut registry, limit);
    }

    for path in config.registry.catalogs.iter().chain(extra_catalogs) {
        let calculators = load_catalog(path)
            .with_context(|| format!("loading catalogue {}", path.display()))?;
        for calculator in calculators {
            let calculator = match calculator.large_amount_limit() {
                Some(_) => calculator,
                None => calculator.with_large_amount_limit(limit),
            };
            registry
                .try_register(CalculatorEngine::shared(calculator))
                .with_context(|| format!("registering calculators from {}", path.display()))?;
        }
    }

    info!(
        calculators = registry.len(),
        policy = %registry.policy(),
        "Calculator registry ready"
    );
    Ok(registry)
}

pub fn execute(
    command: &Command,
    json: bool,
    registry: &CalculatorRegistry,
    out: &mut dyn Write,
) -> anyhow::Result<Outcome> {
    debug!(?command, "Executing command");
    match command {
        Command::List { category, search } => {
            list(registry, *category, search.as_deref(), json, out)
        }
        Command::Describe { id } => describe(registry, id, json, out),
        Command::Validate(args) => validate(registry, args, json, out),
        Command::Calculate(args) => calculate(registry, args, json, out),
        Command::Check => check(registry, json, out),
    }
}

#[derive(Serialize)]
struct CalculatorSummary<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    category: CalculatorFamily,
    tags: &'a [String],
}

impl<'a> From<&'a CalculatorDescriptor> for CalculatorSummary<'a> {
    fn from(descriptor: &'a CalculatorDescriptor) -> Self {
        Self {
            id: &descriptor.id,
            name: &descriptor.name,
            description: &descriptor.description,
            category: descriptor.category,
            tags: &descriptor.tags,
        }
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn not_found(failure: &LookupFailure, json: bool, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    if json {
        let body =
            json!({ "error": "not_found", "id": failure.id, "message": failure.to_string() });
        write_json(out, &body)?;
    } else {
        writeln!(out, "{failure}")?;
    }
    Ok(Outcome::NotFound)
}

fn list(
    registry: &CalculatorRegistry,
    category: Option<CalculatorFamily>,
    search: Option<&str>,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<Outcome> {
    let mut calculators = match search {
        Some(query) => registry.search(query),
        None => registry.list(),
    };
    if let Some(family) = category {
        calculators.retain(|c| c.descriptor().category == family);
    }

    if json {
        let summaries: Vec<CalculatorSummary<'_>> =
            calculators.iter().map(|c| CalculatorSummary::from(c.descriptor())).collect();
        write_json(out, &summaries)?;
    } else {
        for calculator in &calculators {
            writeln!(
                out,
                "{:<24} {:<13} {}",
                calculator.id(),
                calculator.descriptor().category.as_str(),
                calculator.name()
            )?;
        }
    }
    Ok(Outcome::Success)
}

fn field_line(spec: &FieldSpec) -> String {
    let mut line = format!("{:<22} {:<11}", spec.name, spec.kind.as_str());
    line.push_str(if spec.required { " required" } else { " optional" });
    match (spec.min, spec.max) {
        (Some(min), Some(max)) => line.push_str(&format!("  [{min}, {max}]")),
        (Some(min), None) => line.push_str(&format!("  >= {min}")),
        (None, Some(max)) => line.push_str(&format!("  <= {max}")),
        (None, None) => {}
    }
    if !spec.options.is_empty() {
        line.push_str(&format!("  one of: {}", spec.options.join(", ")));
    }
    if spec.display_label() != spec.name {
        line.push_str(&format!("  ({})", spec.display_label()));
    }
    line
}

fn describe(
    registry: &CalculatorRegistry,
    id: &str,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<Outcome> {
    let calculator = match registry.lookup(id) {
        Ok(calculator) => calculator,
        Err(failure) => return not_found(&failure, json, out),
    };
    let descriptor = calculator.descriptor();

    if json {
        write_json(out, descriptor)?;
        return Ok(Outcome::Success);
    }

    writeln!(out, "{} - {} ({})", descriptor.id, descriptor.name, descriptor.category.as_str())?;
    if !descriptor.description.is_empty() {
        writeln!(out, "{}", descriptor.description)?;
    }
    if !descriptor.tags.is_empty() {
        writeln!(out, "Tags: {}", descriptor.tags.join(", "))?;
    }
    if !descriptor.fields.is_empty() {
        writeln!(out, "Fields:")?;
        for spec in &descriptor.fields {
            writeln!(out, "  {}", field_line(spec))?;
        }
    }
    if !descriptor.examples.is_empty() {
        writeln!(out, "Examples:")?;
        for example in &descriptor.examples {
            let assignments: Vec<String> =
                example.inputs.iter().map(|(field, value)| format!("{field}={value}")).collect();
            writeln!(out, "  {}: {}", example.name, assignments.join(" "))?;
            if let Some(result) = example.expected.get("result") {
                writeln!(out, "    expect result = {result}")?;
            }
        }
    }
    Ok(Outcome::Success)
}

fn validate(
    registry: &CalculatorRegistry,
    args: &InvocationArgs,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<Outcome> {
    let calculator = match registry.lookup(&args.id) {
        Ok(calculator) => calculator,
        Err(failure) => return not_found(&failure, json, out),
    };
    let inputs = args.calculator_inputs()?;
    let report = calculator.validation_report(&inputs);
    let valid = report.is_valid();

    if json {
        write_json(
            out,
            &json!({
                "calculatorId": calculator.id(),
                "valid": valid,
                "errors": report.errors,
                "warnings": report.warnings,
            }),
        )?;
    } else {
        if valid {
            writeln!(out, "Inputs are valid for {}", calculator.id())?;
        }
        for error in &report.errors {
            writeln!(out, "error: {error}")?;
        }
        for warning in &report.warnings {
            writeln!(out, "warning: {warning}")?;
        }
    }
    Ok(if valid { Outcome::Success } else { Outcome::Invalid })
}

fn write_output(output: &CalculationOutput, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "Result: {:.2}", output.result)?;
    for (name, value) in &output.metrics.secondary {
        writeln!(out, "  {name}: {value:.2}")?;
    }
    writeln!(out, "Risk level: {}", output.analysis.risk_level)?;
    writeln!(out, "Recommendation: {}", output.analysis.recommendation)?;
    for warning in &output.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    Ok(())
}

fn write_rejection(
    failure: &ValidationFailure,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    if json {
        write_json(out, &json!({ "error": "validation", "errors": failure.errors() }))?;
    } else {
        for error in failure.errors() {
            writeln!(out, "error: {error}")?;
        }
    }
    Ok(())
}

fn calculate(
    registry: &CalculatorRegistry,
    args: &InvocationArgs,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<Outcome> {
    let inputs = args.calculator_inputs()?;
    match registry.invoke(&args.id, &inputs) {
        Ok(output) => {
            if json {
                write_json(out, &output)?;
            } else {
                write_output(&output, out)?;
            }
            Ok(Outcome::Success)
        }
        Err(CalculatorError::NotFound(failure)) => not_found(&failure, json, out),
        Err(CalculatorError::Validation(failure)) => {
            debug!(calculator_id = %args.id, errors = failure.errors().len(), "Inputs rejected");
            write_rejection(&failure, json, out)?;
            Ok(Outcome::Invalid)
        }
    }
}

fn check(
    registry: &CalculatorRegistry,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<Outcome> {
    let reports = check_registry(registry);
    let failed = reports.iter().filter(|r| !r.passed()).count();

    if json {
        write_json(out, &reports)?;
    } else {
        for report in &reports {
            if report.is_skipped() {
                writeln!(out, "SKIP {} (no examples)", report.calculator_id)?;
            } else if report.passed() {
                writeln!(out, "PASS {} ({} examples)", report.calculator_id, report.checks.len())?;
            } else {
                writeln!(out, "FAIL {}", report.calculator_id)?;
                for failure in report.failures() {
                    if let ExampleOutcome::Failed { reason } = &failure.outcome {
                        writeln!(out, "  {}: {reason}", failure.example)?;
                    }
                }
            }
        }
    }

    if failed > 0 {
        warn!(failed, checked = reports.len(), "Calculators failed their examples");
        Ok(Outcome::CheckFailed)
    } else {
        Ok(Outcome::Success)
    }
}
