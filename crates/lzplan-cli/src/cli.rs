use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use lzplan_config::DEFAULT_CONFIG_PATH;

#[derive(Debug, Parser)]
#[command(
    name = "lzplan",
    about = "Compile a declarative landing-zone document into provisioning operations and apply them",
    version
)]
pub struct Cli {
    /// Landing-zone document to read.
    #[arg(long, env = "LZPLAN_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Output format for the run report.
    #[arg(long, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Azure CLI executable.
    #[arg(long, env = "LZPLAN_AZ_BINARY", default_value = "az", global = true)]
    pub az_binary: String,

    /// Subscription passed to every `az` call.
    #[arg(long, env = "LZPLAN_SUBSCRIPTION", global = true)]
    pub subscription: Option<String>,

    /// Defaults to `plan`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every operation without touching the provider.
    Plan {
        /// Provisioner used to render the operations.
        #[arg(long, default_value = "az")]
        provider: ProviderArg,
    },

    /// Provision every operation in order; stop at the first failure.
    Apply {
        /// Provisioner that performs the operations.
        #[arg(long, default_value = "az")]
        provider: ProviderArg,
    },

    /// Parse and compile the document, then print a summary.
    Validate,
}

impl Default for Command {
    fn default() -> Self {
        Command::Plan {
            provider: ProviderArg::Az,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// Shell out to the Azure CLI.
    Az,
    /// Record calls in-process; touches nothing.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_plan() {
        let cli = Cli::try_parse_from(["lzplan"]).unwrap();
        assert!(cli.command.is_none());
        assert!(matches!(
            cli.command.unwrap_or_default(),
            Command::Plan { provider: ProviderArg::Az }
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lzplan",
            "apply",
            "--provider",
            "local",
            "--config",
            "lz.yml",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("lz.yml"));
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Some(Command::Apply { provider: ProviderArg::Local })
        ));
    }

    #[test]
    fn unknown_subcommand_is_usage_error() {
        let err = Cli::try_parse_from(["lzplan", "destroy"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
