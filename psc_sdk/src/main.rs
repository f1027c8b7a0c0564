//! # Policy Settings Compliance Scanner CLI
//!

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use psc_catalog::config::runtime::LogLevel;
use psc_catalog::logging::codes;
use psc_catalog::{log_error, log_info, log_success, logging};
use psc_catalog::{Catalog, EngineConfig};
use psc_engine::sources::{PolicySource, RefreshMode};
use psc_engine::{ComplianceEvaluator, Policy, RunReport, RunnerError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

const EXIT_FAILURE: u8 = 1;
const EXIT_FINDINGS: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "psc-scan", version, about = "Policy settings compliance scanner")]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimum log level (error, warning, info, debug)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit one JSON object per log event on stdout
    #[arg(long, global = true)]
    structured_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate every policy export against the catalog
    Run(RunArgs),
    /// Show how one requirement was located in one policy
    Explain(ExplainArgs),
    /// Compile the catalog and list every issue
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Requirement catalog (.json or .toml)
    #[arg(long)]
    catalog: PathBuf,

    /// Directory of policy exports (*.json)
    #[arg(long)]
    policies: PathBuf,

    /// Report destination
    #[arg(long, default_value = "compliance_report.json")]
    output: PathBuf,

    /// Worker threads; 0 uses every available CPU
    #[arg(long)]
    workers: Option<usize>,

    /// Exit non-zero when any policy could not be evaluated
    #[arg(long)]
    fail_on_policy_errors: bool,

    /// Fixed evaluation timestamp (RFC 3339) for reproducible reports
    #[arg(long)]
    evaluated_at: Option<DateTime<Utc>>,

    /// Write only the deterministic outcome block
    #[arg(long)]
    outcome_only: bool,
}

#[derive(Debug, Args)]
struct ExplainArgs {
    #[arg(long)]
    catalog: PathBuf,

    #[arg(long)]
    policies: PathBuf,

    /// Policy id to inspect
    #[arg(long)]
    policy_id: String,

    /// Requirement id; every requirement when omitted
    #[arg(long)]
    requirement_id: Option<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(long)]
    catalog: PathBuf,

    /// Print issues as a JSON array
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match EngineConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }
    log_info!("Compliance scanner starting", "version" => env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Command::Run(args) => {
            apply_run_overrides(&mut config, args);
            run(args, &config)
        }
        Command::Explain(args) => explain(args, &config),
        Command::Validate(args) => validate(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Command-line flags win over the configuration file and environment
fn init_logging(cli: &Cli, config: &EngineConfig) -> Result<(), String> {
    let mut preferences = config.logging.clone();
    if let Some(level) = &cli.log_level {
        preferences.min_log_level =
            LogLevel::parse(level).ok_or_else(|| format!("unknown log level '{}'", level))?;
    }
    if cli.structured_logs {
        preferences.use_structured_logging = true;
        preferences.forward_to_log_facade = false;
    } else if !preferences.use_structured_logging {
        preferences.forward_to_log_facade = true;
    }

    if preferences.forward_to_log_facade {
        let filter = match preferences.min_log_level {
            LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
            .try_init()
            .map_err(|e| e.to_string())?;
    }

    logging::config::init_runtime_preferences(preferences)?;
    logging::init_global_logging()
}

fn apply_run_overrides(config: &mut EngineConfig, args: &RunArgs) {
    if let Some(workers) = args.workers {
        config.runner.max_workers = if workers == 0 {
            num_cpus::get()
        } else {
            workers
        };
    }
    if args.fail_on_policy_errors {
        config.runner.fail_on_policy_errors = true;
    }
}

fn run(args: &RunArgs, config: &EngineConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let runner = psc_sdk::load_engine(&args.catalog, config).map_err(describe)?;
    let source = psc_sdk::create_policy_source(&args.policies, config);
    let batch = source
        .fetch(RefreshMode::Force)
        .map_err(|e| describe(RunnerError::Source(e)))?;

    let report = match args.evaluated_at {
        Some(at) => runner.run_batch_at(&batch, at),
        None => runner.run_batch(&batch),
    }
    .map_err(describe)?;

    print_summary(&report);
    write_report(&report, &args.output, args.outcome_only)?;
    println!("\n[OK] Report saved to: {}", args.output.display());

    log_success!(codes::success::RUN_COMPLETED, "Scan finished",
        "policies" => report.outcome.summary.policies_processed,
        "gaps" => report.outcome.summary.gap_count,
        "duration_ms" => start.elapsed().as_millis()
    );

    if runner.config().fail_on_policy_errors && report.outcome.has_failures() {
        return Ok(ExitCode::from(EXIT_FINDINGS));
    }
    Ok(ExitCode::SUCCESS)
}

fn describe(error: RunnerError) -> String {
    log_error!(error.log_code(), "Scan aborted", "reason" => error);
    error.user_message()
}

fn print_summary(report: &RunReport) {
    println!("\n=== Compliance Results ===");
    println!("{}", report.summary());

    if !report.outcome.failures.is_empty() {
        println!("\nPolicies not evaluated:");
        for failure in &report.outcome.failures {
            println!("  ✗ {} ({}): {}", failure.policy_id, failure.policy_name, failure.reason);
        }
    }

    let weak: Vec<_> = report
        .outcome
        .policy_summaries
        .iter()
        .filter(|p| p.total_checks > 0 && p.extracted_count == 0)
        .collect();
    if !weak.is_empty() {
        println!("\nPolicies with no extracted settings:");
        for summary in weak {
            println!("  - {} ({} candidate checks)", summary.policy_id, summary.total_checks);
        }
    }
}

fn write_report(
    report: &RunReport,
    output: &Path,
    outcome_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = if outcome_only {
        report.outcome_json()?
    } else {
        report.to_json()?
    };
    std::fs::write(output, json).map_err(|e| {
        log_error!(codes::runner::OUTPUT_WRITE_FAILURE, "Failed to write report",
            "path" => output.display(),
            "reason" => e
        );
        format!("Could not write report to {}: {}", output.display(), e)
    })?;
    Ok(())
}

fn explain(
    args: &ExplainArgs,
    config: &EngineConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let runner = psc_sdk::load_engine(&args.catalog, config).map_err(describe)?;
    let source = psc_sdk::create_policy_source(&args.policies, config);
    let policy = source
        .fetch_policies()
        .map_err(|e| describe(RunnerError::Source(e)))?
        .into_iter()
        .find(|p| p.id == args.policy_id)
        .ok_or_else(|| {
            format!(
                "policy '{}' not found in {}",
                args.policy_id,
                args.policies.display()
            )
        })?
        .classify(runner.catalog().families());

    let requirements: Vec<_> = match &args.requirement_id {
        Some(id) => vec![runner
            .catalog()
            .requirement(id)
            .ok_or_else(|| format!("requirement '{}' not in catalog", id))?],
        None => runner.catalog().requirements().iter().collect(),
    };

    print_policy_header(&policy);
    let evaluator = ComplianceEvaluator::new();
    let now = Utc::now();
    for requirement in requirements {
        let extraction = runner.extractor().extract_one(&policy, requirement);
        let check = evaluator.evaluate_check(&policy, requirement, &extraction, now);

        println!("\n{} ({})", requirement.id, requirement.name);
        println!("  Path:       {}", requirement.setting_path);
        println!("  Operator:   {} {}", requirement.operator, requirement.expected_value);
        println!("  Strategy:   {} (confidence {:.2})", check.strategy, check.confidence);
        println!("  Matched:    {}", check.matched_path.as_deref().unwrap_or("-"));
        println!(
            "  Actual:     {}",
            check
                .actual_value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "ABSENT".to_string())
        );
        println!("  Status:     {}", check.status.as_str());
        println!("  Rationale:  {}", check.rationale);
        if let Some(message) = &check.error_message {
            println!("  Error:      {}", message);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_policy_header(policy: &Policy) {
    println!("=== {} ({}) ===", policy.name, policy.id);
    println!("Type:     {}", policy.policy_type);
    println!("Family:   {}", policy.template_family.as_deref().unwrap_or("-"));
    println!(
        "Platform: {}",
        policy
            .platform
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
}

fn validate(args: &ValidateArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let compilation = Catalog::load(&args.catalog).map_err(|e| {
        log_error!(e.log_code(), "Failed to load catalog", "reason" => e);
        format!("Could not load catalog {}: {}", args.catalog.display(), e)
    })?;
    let catalog = &compilation.catalog;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&compilation.issues)?);
    } else {
        println!(
            "Catalog version {}: {} requirements, {} controls",
            catalog.version(),
            catalog.requirements().len(),
            catalog.controls().len()
        );
        for issue in &compilation.issues {
            let operator = issue
                .requirement_id
                .as_deref()
                .and_then(|id| catalog.requirement(id))
                .map(|r| r.operator.to_string())
                .unwrap_or_else(|| "-".to_string());
            let action = if issue.kind.keeps_requirement() {
                "kept"
            } else {
                "dropped"
            };
            println!("  {} (operator {}, {})", issue, operator, action);
        }
        if compilation.issues.is_empty() {
            println!("[OK] No issues found");
        }
    }

    if let Err(e) = catalog.ensure_usable() {
        eprintln!("Error: {}", e);
        return Ok(ExitCode::from(EXIT_FAILURE));
    }
    if compilation.has_issues() {
        return Ok(ExitCode::from(EXIT_FINDINGS));
    }
    Ok(ExitCode::SUCCESS)
}
