use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to start '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command exited with {code}: {command}\n{stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("provision failed: {0}")]
    ProvisionFailed(String),
}
