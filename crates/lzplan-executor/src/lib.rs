pub mod error;
pub mod execute;
pub mod report;

pub use error::RunError;
pub use execute::{execute, run};
pub use report::{ExecutionReport, Mode, Outcome, RunRequest, RunStatus, StepReport};
