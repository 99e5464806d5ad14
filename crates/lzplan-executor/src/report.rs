use std::path::PathBuf;

use chrono::{DateTime, Utc};
use lzplan_domain::{Operation, OperationKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Render every operation; no provider calls.
    Plan,
    /// Call the provider for every operation; stop at the first failure.
    Apply,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Plan => write!(f, "plan"),
            Mode::Apply => write!(f, "apply"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub config_path: PathBuf,
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Plan mode: what apply would run.
    Planned { line: String },
    Succeeded,
    Failed { reason: String },
    /// An earlier operation failed.
    NotAttempted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// 1-based position in the plan.
    pub index: usize,
    pub kind: OperationKind,
    pub target: String,
    pub resource_group: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl StepReport {
    pub fn new(index: usize, op: &Operation, outcome: Outcome) -> Self {
        Self {
            index,
            kind: op.kind(),
            target: op.target().to_string(),
            resource_group: op.resource_group().to_string(),
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    /// `at` is the 1-based index of the failed operation.
    Aborted { at: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub run_id: Uuid,
    pub mode: Mode,
    pub provisioner: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepReport>,
    pub status: RunStatus,
    /// Non-fatal compile warnings (skipped phases and the like).
    pub warnings: Vec<String>,
}

impl ExecutionReport {
    pub fn new(mode: Mode, provisioner: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            mode,
            provisioner: provisioner.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
            status: RunStatus::Success,
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// The step that aborted the run, if any.
    pub fn failed_step(&self) -> Option<&StepReport> {
        match self.status {
            RunStatus::Aborted { at } => at.checked_sub(1).and_then(|i| self.steps.get(i)),
            RunStatus::Success => None,
        }
    }
}
