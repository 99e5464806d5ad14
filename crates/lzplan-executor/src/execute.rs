use async_trait::async_trait;
use chrono::Utc;
use lzplan_compiler::compile;
use lzplan_domain::Operation;
use lzplan_driver::Provisioner;
use tracing::{debug, error, info};

use crate::error::RunError;
use crate::report::{ExecutionReport, Mode, Outcome, RunRequest, RunStatus, StepReport};

/// What the executor does with each operation. Picked once per run so plan
/// and apply walk the operations through the same loop.
#[async_trait]
trait Strategy: Send + Sync {
    async fn step(&self, op: &Operation) -> Outcome;
}

/// Plan mode: ask the provisioner what it would run.
struct RenderOnly<'a> {
    provisioner: &'a dyn Provisioner,
}

#[async_trait]
impl Strategy for RenderOnly<'_> {
    async fn step(&self, op: &Operation) -> Outcome {
        Outcome::Planned {
            line: self.provisioner.describe(op),
        }
    }
}

/// Apply mode: call the provisioner and check the result.
struct CallAndCheck<'a> {
    provisioner: &'a dyn Provisioner,
}

#[async_trait]
impl Strategy for CallAndCheck<'_> {
    async fn step(&self, op: &Operation) -> Outcome {
        match self.provisioner.apply(op).await {
            Ok(()) => Outcome::Succeeded,
            Err(e) => Outcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

fn strategy_for<'a>(mode: Mode, provisioner: &'a dyn Provisioner) -> Box<dyn Strategy + 'a> {
    match mode {
        Mode::Plan => Box::new(RenderOnly { provisioner }),
        Mode::Apply => Box::new(CallAndCheck { provisioner }),
    }
}

/// Walk `operations` in order.
///
/// In apply mode the first failure aborts the run: the failing step is
/// reported with the provider's error and every later step is marked
/// not attempted. Nothing already applied is rolled back. Plan mode never
/// calls the provider and always succeeds.
pub async fn execute(
    operations: &[Operation],
    mode: Mode,
    provisioner: &dyn Provisioner,
) -> ExecutionReport {
    let mut report = ExecutionReport::new(mode, provisioner.name());
    let strategy = strategy_for(mode, provisioner);
    info!(
        run_id = %report.run_id,
        %mode,
        provisioner = provisioner.name(),
        "Executing {} operation(s)",
        operations.len()
    );

    let mut remaining = operations.iter().enumerate();
    for (i, op) in remaining.by_ref() {
        let index = i + 1;
        debug!(index, kind = %op.kind(), resource = op.target(), "step");

        let outcome = strategy.step(op).await;
        let failed = matches!(outcome, Outcome::Failed { .. });
        if let Outcome::Failed { reason } = &outcome {
            error!(index, kind = %op.kind(), resource = op.target(), "{}", reason);
        }
        report.steps.push(StepReport::new(index, op, outcome));

        if failed {
            report.status = RunStatus::Aborted { at: index };
            break;
        }
    }

    for (i, op) in remaining {
        report.steps.push(StepReport::new(i + 1, op, Outcome::NotAttempted));
    }

    report.finished_at = Some(Utc::now());
    info!(run_id = %report.run_id, status = ?report.status, "Run finished");
    report
}

/// Load the document, compile it and execute the plan.
///
/// Config and compile errors come back as [`RunError`] before the provider
/// is touched. Compile warnings are copied onto the report.
pub async fn run(
    req: RunRequest,
    provisioner: &dyn Provisioner,
) -> Result<ExecutionReport, RunError> {
    // 1. Load YAML
    info!("Loading landing zone from {:?}", req.config_path);
    let cfg = lzplan_config::load_config(&req.config_path)?;

    // 2. Compile
    let plan = compile(&cfg)?;
    debug!("Plan has {} operation(s)", plan.operations.len());

    // 3. Execute
    let mut report = execute(&plan.operations, req.mode, provisioner).await;
    report.warnings = plan.warnings;
    Ok(report)
}
