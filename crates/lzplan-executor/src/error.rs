use thiserror::Error;

/// Failures that stop a run before any operation is attempted.
///
/// Operation failures during apply are not errors here; they end up in the
/// report as an aborted run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] lzplan_config::ConfigError),

    #[error("plan error: {0}")]
    Plan(#[from] lzplan_compiler::PlanError),
}
