use std::path::PathBuf;

use anyhow::{Context, Result};
use lzplan_driver::{AzCliConfig, AzCliProvisioner, LocalProvisioner, Provisioner};
use lzplan_executor::{ExecutionReport, Mode, RunRequest};
use tracing::info;

use crate::cli::{OutputFormat, ProviderArg};
use crate::output;

/// Operator settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: PathBuf,
    pub output: OutputFormat,
    pub az: AzCliConfig,
}

fn provisioner(provider: ProviderArg, settings: &Settings) -> Box<dyn Provisioner> {
    match provider {
        ProviderArg::Az => Box::new(AzCliProvisioner::new(settings.az.clone())),
        ProviderArg::Local => Box::new(LocalProvisioner::new()),
    }
}

// ── Plan ──────────────────────────────────────────────────────────────────────

pub async fn plan(settings: Settings, provider: ProviderArg) -> Result<()> {
    run_mode(settings, provider, Mode::Plan).await
}

// ── Apply ─────────────────────────────────────────────────────────────────────

pub async fn apply(settings: Settings, provider: ProviderArg) -> Result<()> {
    run_mode(settings, provider, Mode::Apply).await
}

async fn run_mode(settings: Settings, provider: ProviderArg, mode: Mode) -> Result<()> {
    let provisioner = provisioner(provider, &settings);
    let req = RunRequest {
        config_path: settings.config.clone(),
        mode,
    };
    let report = lzplan_executor::run(req, provisioner.as_ref())
        .await
        .with_context(|| format!("Failed to {mode} {}", settings.config.display()))?;

    print_report(&report, settings.output)?;

    if let Some(step) = report.failed_step() {
        anyhow::bail!(
            "apply aborted at operation {} ({} {})",
            step.index,
            step.kind,
            step.target
        );
    }
    info!(run_id = %report.run_id, "{} finished", mode);
    Ok(())
}

fn print_report(report: &ExecutionReport, format: OutputFormat) -> Result<()> {
    eprint!("{}", output::render_warnings(&report.warnings));
    match format {
        OutputFormat::Text => print!("{}", output::render_report(report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

// ── Validate ──────────────────────────────────────────────────────────────────

pub async fn validate(settings: Settings) -> Result<()> {
    let cfg = lzplan_config::load_config(&settings.config)
        .with_context(|| format!("Failed to load {}", settings.config.display()))?;
    let plan = lzplan_compiler::compile(&cfg).context("Failed to compile landing zone")?;

    eprint!("{}", output::render_warnings(&plan.warnings));
    match settings.output {
        OutputFormat::Text => print!("{}", output::render_validation(&plan)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}
