use std::process::Stdio;

use async_trait::async_trait;
use lzplan_domain::{
    ConfigureDiagnostics, CreateNsg, CreateNsgRule, CreatePerimeter, CreatePerimeterProfile,
    CreatePerimeterRule, CreateResourceGroup, CreateStorageAccount, CreateSubnet, CreateVnet,
    CreateWorkspace, EnableFlowLog, Operation,
};
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::driver::Provisioner;
use crate::error::DriverError;

// ── Configuration ────────────────────────────────────────────────────────────

/// Operator-level settings for the `az` client. Not part of the landing-zone
/// document.
#[derive(Debug, Clone)]
pub struct AzCliConfig {
    /// Executable to run. Defaults to `az` on `PATH`.
    pub binary: String,
    /// Passed as `--subscription` on every call when set.
    pub subscription: Option<String>,
}

impl Default for AzCliConfig {
    fn default() -> Self {
        Self {
            binary: "az".into(),
            subscription: None,
        }
    }
}

// ── Provisioner ──────────────────────────────────────────────────────────────

/// Provisions by shelling out to the Azure CLI, one process per operation.
#[derive(Debug, Clone, Default)]
pub struct AzCliProvisioner {
    config: AzCliConfig,
}

impl AzCliProvisioner {
    pub fn new(config: AzCliConfig) -> Self {
        Self { config }
    }

    /// `az_args(op)` plus the flags appended to every invocation.
    fn full_args(&self, mut args: Vec<String>) -> Vec<String> {
        if let Some(sub) = &self.config.subscription {
            args.push("--subscription".into());
            args.push(sub.clone());
        }
        args.extend(["--output", "none", "--only-show-errors"].map(String::from));
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<(), DriverError> {
        let args = self.full_args(args);
        let line = command_line(&self.config.binary, &args);
        info!(command = %line, "running az command");

        let output = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DriverError::Spawn {
                binary: self.config.binary.clone(),
                source: e,
            })?;

        if output.status.success() {
            debug!(command = %line, "az command succeeded");
            return Ok(());
        }

        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(code, command = %line, "az command exited non-zero");
        Err(DriverError::CommandFailed {
            command: line,
            code,
            stderr,
        })
    }
}

#[async_trait]
impl Provisioner for AzCliProvisioner {
    fn name(&self) -> &'static str {
        "az"
    }

    fn describe(&self, op: &Operation) -> String {
        command_line(&self.config.binary, &self.full_args(az_args(op)))
    }

    async fn create_resource_group(&self, op: &CreateResourceGroup) -> Result<(), DriverError> {
        self.run(resource_group_args(op)).await
    }

    async fn create_vnet(&self, op: &CreateVnet) -> Result<(), DriverError> {
        self.run(vnet_args(op)).await
    }

    async fn create_nsg(&self, op: &CreateNsg) -> Result<(), DriverError> {
        self.run(nsg_args(op)).await
    }

    async fn create_nsg_rule(&self, op: &CreateNsgRule) -> Result<(), DriverError> {
        self.run(nsg_rule_args(op)).await
    }

    async fn create_subnet(&self, op: &CreateSubnet) -> Result<(), DriverError> {
        self.run(subnet_args(op)).await
    }

    async fn create_perimeter(&self, op: &CreatePerimeter) -> Result<(), DriverError> {
        self.run(perimeter_args(op)).await
    }

    async fn create_perimeter_profile(
        &self,
        op: &CreatePerimeterProfile,
    ) -> Result<(), DriverError> {
        self.run(perimeter_profile_args(op)).await
    }

    async fn create_perimeter_rule(&self, op: &CreatePerimeterRule) -> Result<(), DriverError> {
        self.run(perimeter_rule_args(op)).await
    }

    async fn create_workspace(&self, op: &CreateWorkspace) -> Result<(), DriverError> {
        self.run(workspace_args(op)).await
    }

    async fn create_storage_account(
        &self,
        op: &CreateStorageAccount,
    ) -> Result<(), DriverError> {
        self.run(storage_account_args(op)).await
    }

    async fn enable_flow_log(&self, op: &EnableFlowLog) -> Result<(), DriverError> {
        self.run(flow_log_args(op)).await
    }

    async fn configure_diagnostics(&self, op: &ConfigureDiagnostics) -> Result<(), DriverError> {
        self.run(diagnostics_args(op)).await
    }
}

// ── Argument rendering ───────────────────────────────────────────────────────

/// `az` arguments for `op`, without the per-invocation flags.
pub fn az_args(op: &Operation) -> Vec<String> {
    match op {
        Operation::CreateResourceGroup(o) => resource_group_args(o),
        Operation::CreateVnet(o) => vnet_args(o),
        Operation::CreateNsg(o) => nsg_args(o),
        Operation::CreateNsgRule(o) => nsg_rule_args(o),
        Operation::CreateSubnet(o) => subnet_args(o),
        Operation::CreatePerimeter(o) => perimeter_args(o),
        Operation::CreatePerimeterProfile(o) => perimeter_profile_args(o),
        Operation::CreatePerimeterRule(o) => perimeter_rule_args(o),
        Operation::CreateWorkspace(o) => workspace_args(o),
        Operation::CreateStorageAccount(o) => storage_account_args(o),
        Operation::EnableFlowLog(o) => flow_log_args(o),
        Operation::ConfigureDiagnostics(o) => diagnostics_args(o),
    }
}

struct Args(Vec<String>);

impl Args {
    fn new(words: &[&str]) -> Self {
        Args(words.iter().map(|w| w.to_string()).collect())
    }

    fn opt(mut self, flag: &str, value: impl Into<String>) -> Self {
        self.0.push(flag.to_string());
        self.0.push(value.into());
        self
    }

    /// `flag v1 v2 ...`; nothing when `values` is empty.
    fn multi(mut self, flag: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.0.push(flag.to_string());
            self.0.extend(values.iter().cloned());
        }
        self
    }

    fn build(self) -> Vec<String> {
        self.0
    }
}

fn resource_group_args(op: &CreateResourceGroup) -> Vec<String> {
    Args::new(&["group", "create"])
        .opt("--name", &op.name)
        .opt("--location", &op.location)
        .multi("--tags", &op.tags)
        .build()
}

fn vnet_args(op: &CreateVnet) -> Vec<String> {
    Args::new(&["network", "vnet", "create"])
        .opt("--name", &op.name)
        .opt("--resource-group", &op.resource_group)
        .opt("--location", &op.location)
        .opt("--address-prefixes", &op.address_prefix)
        .multi("--tags", &op.tags)
        .build()
}

fn nsg_args(op: &CreateNsg) -> Vec<String> {
    Args::new(&["network", "nsg", "create"])
        .opt("--name", &op.name)
        .opt("--resource-group", &op.resource_group)
        .opt("--location", &op.location)
        .multi("--tags", &op.tags)
        .build()
}

fn nsg_rule_args(op: &CreateNsgRule) -> Vec<String> {
    let r = &op.rule;
    let args = Args::new(&["network", "nsg", "rule", "create"])
        .opt("--name", &op.name)
        .opt("--nsg-name", &op.nsg)
        .opt("--resource-group", &op.resource_group)
        .opt("--priority", r.priority.to_string())
        .opt("--protocol", r.protocol.to_string())
        .opt("--direction", r.direction.to_string())
        .opt("--access", r.access.to_string())
        .opt("--source-address-prefixes", &r.source_address)
        .opt("--source-port-ranges", &r.source_ports)
        .opt("--destination-address-prefixes", &r.destination_address)
        .opt("--destination-port-ranges", &r.destination_ports);
    match &r.description {
        Some(d) => args.opt("--description", d).build(),
        None => args.build(),
    }
}

fn subnet_args(op: &CreateSubnet) -> Vec<String> {
    Args::new(&["network", "vnet", "subnet", "create"])
        .opt("--name", &op.name)
        .opt("--vnet-name", &op.vnet)
        .opt("--resource-group", &op.resource_group)
        .opt("--address-prefixes", &op.address_prefix)
        .opt("--network-security-group", &op.nsg)
        .build()
}

fn perimeter_args(op: &CreatePerimeter) -> Vec<String> {
    Args::new(&["network", "perimeter", "create"])
        .opt("--name", &op.name)
        .opt("--resource-group", &op.resource_group)
        .opt("--location", &op.location)
        .multi("--tags", &op.tags)
        .build()
}

fn perimeter_profile_args(op: &CreatePerimeterProfile) -> Vec<String> {
    Args::new(&["network", "perimeter", "profile", "create"])
        .opt("--name", &op.name)
        .opt("--perimeter-name", &op.perimeter)
        .opt("--resource-group", &op.resource_group)
        .build()
}

fn perimeter_rule_args(op: &CreatePerimeterRule) -> Vec<String> {
    Args::new(&["network", "perimeter", "profile", "access-rule", "create"])
        .opt("--name", &op.name)
        .opt("--profile-name", &op.profile)
        .opt("--perimeter-name", &op.perimeter)
        .opt("--resource-group", &op.resource_group)
        .opt("--direction", op.direction.to_string())
        .opt("--address-prefixes", format!("[{}]", op.address_prefixes.join(",")))
        .build()
}

fn workspace_args(op: &CreateWorkspace) -> Vec<String> {
    Args::new(&["monitor", "log-analytics", "workspace", "create"])
        .opt("--workspace-name", &op.name)
        .opt("--resource-group", &op.resource_group)
        .opt("--location", &op.location)
        .opt("--retention-time", op.retention_days.to_string())
        .multi("--tags", &op.tags)
        .build()
}

fn storage_account_args(op: &CreateStorageAccount) -> Vec<String> {
    Args::new(&["storage", "account", "create"])
        .opt("--name", &op.name)
        .opt("--resource-group", &op.resource_group)
        .opt("--location", &op.location)
        .opt("--sku", &op.sku)
        .opt("--kind", "StorageV2")
        .opt("--min-tls-version", "TLS1_2")
        .multi("--tags", &op.tags)
        .build()
}

fn flow_log_args(op: &EnableFlowLog) -> Vec<String> {
    let args = Args::new(&["network", "watcher", "flow-log", "create"])
        .opt("--name", &op.name)
        .opt("--resource-group", &op.resource_group)
        .opt("--location", &op.location)
        .opt("--vnet", &op.vnet)
        .opt("--storage-account", &op.storage_account)
        .opt("--retention", op.retention_days.to_string());
    match &op.workspace {
        Some(ws) => args
            .opt("--workspace", ws)
            .opt("--traffic-analytics", "true")
            .build(),
        None => args.build(),
    }
}

fn diagnostics_args(op: &ConfigureDiagnostics) -> Vec<String> {
    let logs = json!([{ "categoryGroup": "allLogs", "enabled": true }]);
    Args::new(&["monitor", "diagnostic-settings", "create"])
        .opt("--name", &op.name)
        .opt("--resource", &op.resource)
        .opt("--resource-type", &op.resource_type)
        .opt("--resource-group", &op.resource_group)
        .opt("--workspace", &op.workspace)
        .opt("--logs", logs.to_string())
        .build()
}

// ── Display ──────────────────────────────────────────────────────────────────

/// Render `binary args...` the way it could be pasted into a POSIX shell.
pub(crate) fn command_line(binary: &str, args: &[String]) -> String {
    std::iter::once(binary)
        .chain(args.iter().map(String::as_str))
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lzplan_domain::{Access, Direction, NsgRule, Protocol};

    fn rg_op() -> Operation {
        Operation::CreateResourceGroup(CreateResourceGroup {
            name: "rg-weu-vks-s1-net-01".into(),
            location: "westeurope".into(),
            tags: vec!["owner=platform".into(), "deployed_at=2024-05-01T12:30:00Z".into()],
        })
    }

    fn rule_op() -> Operation {
        Operation::CreateNsgRule(CreateNsgRule {
            name: "allow-ssh".into(),
            nsg: "nsg-weu-vks-s1-app-01".into(),
            resource_group: "rg-weu-vks-s1-net-01".into(),
            rule: NsgRule {
                priority: 110,
                protocol: Protocol::Tcp,
                direction: Direction::Inbound,
                access: Access::Allow,
                source_address: "10.0.0.0/8".into(),
                source_ports: "*".into(),
                destination_address: "*".into(),
                destination_ports: "22".into(),
                description: Some("SSH from corp".into()),
            },
        })
    }

    #[test]
    fn resource_group_args_include_tags() {
        let args = az_args(&rg_op());
        assert_eq!(
            args,
            vec![
                "group",
                "create",
                "--name",
                "rg-weu-vks-s1-net-01",
                "--location",
                "westeurope",
                "--tags",
                "owner=platform",
                "deployed_at=2024-05-01T12:30:00Z",
            ]
        );
    }

    #[test]
    fn nsg_rule_args() {
        let args = az_args(&rule_op());
        assert_eq!(&args[..4], &["network", "nsg", "rule", "create"]);
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("--priority") + 1], "110");
        assert_eq!(args[pos("--protocol") + 1], "Tcp");
        assert_eq!(args[pos("--nsg-name") + 1], "nsg-weu-vks-s1-app-01");
        assert_eq!(args[pos("--destination-port-ranges") + 1], "22");
        assert_eq!(args[pos("--description") + 1], "SSH from corp");
    }

    #[test]
    fn subnet_attaches_nsg() {
        let args = az_args(&Operation::CreateSubnet(CreateSubnet {
            name: "snet-app".into(),
            vnet: "vnet-hub".into(),
            resource_group: "rg".into(),
            address_prefix: "10.0.1.0/24".into(),
            nsg: "nsg-app".into(),
        }));
        let pos = args.iter().position(|a| a == "--network-security-group").unwrap();
        assert_eq!(args[pos + 1], "nsg-app");
    }

    #[test]
    fn perimeter_rule_prefixes_rendered_as_list() {
        let args = az_args(&Operation::CreatePerimeterRule(CreatePerimeterRule {
            name: "corp".into(),
            profile: "defaultProfile".into(),
            perimeter: "nsp-core".into(),
            resource_group: "rg".into(),
            direction: Direction::Inbound,
            address_prefixes: vec!["203.0.113.0/24".into(), "198.51.100.0/24".into()],
        }));
        assert_eq!(args.last().unwrap(), "[203.0.113.0/24,198.51.100.0/24]");
    }

    #[test]
    fn flow_log_without_workspace_skips_traffic_analytics() {
        let args = az_args(&Operation::EnableFlowLog(EnableFlowLog {
            name: "fl-vnet-hub".into(),
            resource_group: "rg".into(),
            location: "westeurope".into(),
            vnet: "vnet-hub".into(),
            storage_account: "stflowlogs01".into(),
            workspace: None,
            retention_days: 7,
        }));
        assert!(!args.iter().any(|a| a == "--traffic-analytics"));
    }

    #[test]
    fn describe_quotes_shell_sensitive_args() {
        let p = AzCliProvisioner::new(AzCliConfig {
            binary: "az".into(),
            subscription: Some("sub-1".into()),
        });
        let line = p.describe(&rule_op());
        assert!(line.starts_with("az network nsg rule create --name allow-ssh"));
        assert!(line.contains("--source-port-ranges '*'"));
        assert!(line.contains("--description 'SSH from corp'"));
        assert!(line.ends_with("--subscription sub-1 --output none --only-show-errors"));
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("10.0.0.0/8"), "10.0.0.0/8");
    }

    #[tokio::test]
    async fn successful_command_is_ok() {
        let p = AzCliProvisioner::new(AzCliConfig {
            binary: "true".into(),
            subscription: None,
        });
        assert!(p.apply(&rg_op()).await.is_ok());
    }

    #[tokio::test]
    async fn failing_command_reports_exit_code() {
        let p = AzCliProvisioner::new(AzCliConfig {
            binary: "false".into(),
            subscription: None,
        });
        match p.apply(&rg_op()).await.unwrap_err() {
            DriverError::CommandFailed { code, command, .. } => {
                assert_ne!(code, 0);
                assert!(command.starts_with("false group create"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let p = AzCliProvisioner::new(AzCliConfig {
            binary: "/nonexistent/az".into(),
            subscription: None,
        });
        assert!(matches!(
            p.apply(&rg_op()).await,
            Err(DriverError::Spawn { .. })
        ));
    }
}
