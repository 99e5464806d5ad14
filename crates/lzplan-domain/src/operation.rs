use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Direction, NsgRule};

/// Resource type passed to diagnostics settings for a security perimeter.
pub const PERIMETER_RESOURCE_TYPE: &str = "Microsoft.Network/networkSecurityPerimeters";

/// Profile created inside every perimeter.
pub const DEFAULT_PERIMETER_PROFILE: &str = "defaultProfile";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    CreateResourceGroup,
    CreateVnet,
    CreateNsg,
    CreateNsgRule,
    CreateSubnet,
    CreatePerimeter,
    CreatePerimeterProfile,
    CreatePerimeterRule,
    CreateWorkspace,
    CreateStorageAccount,
    EnableFlowLog,
    ConfigureDiagnostics,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationKind::CreateResourceGroup => "create-resource-group",
            OperationKind::CreateVnet => "create-vnet",
            OperationKind::CreateNsg => "create-nsg",
            OperationKind::CreateNsgRule => "create-nsg-rule",
            OperationKind::CreateSubnet => "create-subnet",
            OperationKind::CreatePerimeter => "create-perimeter",
            OperationKind::CreatePerimeterProfile => "create-perimeter-profile",
            OperationKind::CreatePerimeterRule => "create-perimeter-rule",
            OperationKind::CreateWorkspace => "create-workspace",
            OperationKind::CreateStorageAccount => "create-storage-account",
            OperationKind::EnableFlowLog => "enable-flow-log",
            OperationKind::ConfigureDiagnostics => "configure-diagnostics",
        };
        f.write_str(s)
    }
}

// ── Per-kind payloads ────────────────────────────────────────────────────────
//
// All names are fully rendered. `tags` are `key=value` pairs.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResourceGroup {
    pub name: String,
    pub location: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVnet {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub address_prefix: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNsg {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNsgRule {
    /// Symbolic rule name from `custom_nsg_rules`.
    pub name: String,
    pub nsg: String,
    pub resource_group: String,
    pub rule: NsgRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubnet {
    pub name: String,
    pub vnet: String,
    pub resource_group: String,
    pub address_prefix: String,
    pub nsg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePerimeter {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePerimeterProfile {
    pub name: String,
    pub perimeter: String,
    pub resource_group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePerimeterRule {
    pub name: String,
    pub profile: String,
    pub perimeter: String,
    pub resource_group: String,
    pub direction: Direction,
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWorkspace {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub retention_days: u32,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStorageAccount {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub sku: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableFlowLog {
    pub name: String,
    /// Group of the VNet being observed.
    pub resource_group: String,
    pub location: String,
    pub vnet: String,
    pub storage_account: String,
    /// Traffic analytics target; `None` when no workspace is provisioned.
    pub workspace: Option<String>,
    pub retention_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureDiagnostics {
    pub name: String,
    /// Name of the resource the setting is attached to.
    pub resource: String,
    pub resource_type: String,
    pub resource_group: String,
    pub workspace: String,
}

// ── Operation ────────────────────────────────────────────────────────────────

/// One compiled unit of work. Carries no result; outcomes live in the
/// executor's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Operation {
    CreateResourceGroup(CreateResourceGroup),
    CreateVnet(CreateVnet),
    CreateNsg(CreateNsg),
    CreateNsgRule(CreateNsgRule),
    CreateSubnet(CreateSubnet),
    CreatePerimeter(CreatePerimeter),
    CreatePerimeterProfile(CreatePerimeterProfile),
    CreatePerimeterRule(CreatePerimeterRule),
    CreateWorkspace(CreateWorkspace),
    CreateStorageAccount(CreateStorageAccount),
    EnableFlowLog(EnableFlowLog),
    ConfigureDiagnostics(ConfigureDiagnostics),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateResourceGroup(_) => OperationKind::CreateResourceGroup,
            Operation::CreateVnet(_) => OperationKind::CreateVnet,
            Operation::CreateNsg(_) => OperationKind::CreateNsg,
            Operation::CreateNsgRule(_) => OperationKind::CreateNsgRule,
            Operation::CreateSubnet(_) => OperationKind::CreateSubnet,
            Operation::CreatePerimeter(_) => OperationKind::CreatePerimeter,
            Operation::CreatePerimeterProfile(_) => OperationKind::CreatePerimeterProfile,
            Operation::CreatePerimeterRule(_) => OperationKind::CreatePerimeterRule,
            Operation::CreateWorkspace(_) => OperationKind::CreateWorkspace,
            Operation::CreateStorageAccount(_) => OperationKind::CreateStorageAccount,
            Operation::EnableFlowLog(_) => OperationKind::EnableFlowLog,
            Operation::ConfigureDiagnostics(_) => OperationKind::ConfigureDiagnostics,
        }
    }

    /// Rendered name of the resource this operation creates or configures.
    pub fn target(&self) -> &str {
        match self {
            Operation::CreateResourceGroup(op) => &op.name,
            Operation::CreateVnet(op) => &op.name,
            Operation::CreateNsg(op) => &op.name,
            Operation::CreateNsgRule(op) => &op.name,
            Operation::CreateSubnet(op) => &op.name,
            Operation::CreatePerimeter(op) => &op.name,
            Operation::CreatePerimeterProfile(op) => &op.name,
            Operation::CreatePerimeterRule(op) => &op.name,
            Operation::CreateWorkspace(op) => &op.name,
            Operation::CreateStorageAccount(op) => &op.name,
            Operation::EnableFlowLog(op) => &op.name,
            Operation::ConfigureDiagnostics(op) => &op.name,
        }
    }

    /// Resource group the operation is scoped to. A resource group is its
    /// own scope.
    pub fn resource_group(&self) -> &str {
        match self {
            Operation::CreateResourceGroup(op) => &op.name,
            Operation::CreateVnet(op) => &op.resource_group,
            Operation::CreateNsg(op) => &op.resource_group,
            Operation::CreateNsgRule(op) => &op.resource_group,
            Operation::CreateSubnet(op) => &op.resource_group,
            Operation::CreatePerimeter(op) => &op.resource_group,
            Operation::CreatePerimeterProfile(op) => &op.resource_group,
            Operation::CreatePerimeterRule(op) => &op.resource_group,
            Operation::CreateWorkspace(op) => &op.resource_group,
            Operation::CreateStorageAccount(op) => &op.resource_group,
            Operation::EnableFlowLog(op) => &op.resource_group,
            Operation::ConfigureDiagnostics(op) => &op.resource_group,
        }
    }

    /// Provider parameters other than name and scope.
    pub fn params(&self) -> BTreeMap<&'static str, String> {
        let mut p = BTreeMap::new();
        match self {
            Operation::CreateResourceGroup(op) => {
                p.insert("location", op.location.clone());
                p.insert("tags", op.tags.join(" "));
            }
            Operation::CreateVnet(op) => {
                p.insert("location", op.location.clone());
                p.insert("address_prefix", op.address_prefix.clone());
                p.insert("tags", op.tags.join(" "));
            }
            Operation::CreateNsg(op) => {
                p.insert("location", op.location.clone());
                p.insert("tags", op.tags.join(" "));
            }
            Operation::CreateNsgRule(op) => {
                p.insert("nsg", op.nsg.clone());
                p.insert("priority", op.rule.priority.to_string());
                p.insert("protocol", op.rule.protocol.to_string());
                p.insert("direction", op.rule.direction.to_string());
                p.insert("access", op.rule.access.to_string());
                p.insert("source_address", op.rule.source_address.clone());
                p.insert("source_ports", op.rule.source_ports.clone());
                p.insert("destination_address", op.rule.destination_address.clone());
                p.insert("destination_ports", op.rule.destination_ports.clone());
            }
            Operation::CreateSubnet(op) => {
                p.insert("vnet", op.vnet.clone());
                p.insert("address_prefix", op.address_prefix.clone());
                p.insert("nsg", op.nsg.clone());
            }
            Operation::CreatePerimeter(op) => {
                p.insert("location", op.location.clone());
                p.insert("tags", op.tags.join(" "));
            }
            Operation::CreatePerimeterProfile(op) => {
                p.insert("perimeter", op.perimeter.clone());
            }
            Operation::CreatePerimeterRule(op) => {
                p.insert("perimeter", op.perimeter.clone());
                p.insert("profile", op.profile.clone());
                p.insert("direction", op.direction.to_string());
                p.insert("address_prefixes", op.address_prefixes.join(","));
            }
            Operation::CreateWorkspace(op) => {
                p.insert("location", op.location.clone());
                p.insert("retention_days", op.retention_days.to_string());
                p.insert("tags", op.tags.join(" "));
            }
            Operation::CreateStorageAccount(op) => {
                p.insert("location", op.location.clone());
                p.insert("sku", op.sku.clone());
                p.insert("tags", op.tags.join(" "));
            }
            Operation::EnableFlowLog(op) => {
                p.insert("location", op.location.clone());
                p.insert("vnet", op.vnet.clone());
                p.insert("storage_account", op.storage_account.clone());
                if let Some(ws) = &op.workspace {
                    p.insert("workspace", ws.clone());
                }
                p.insert("retention_days", op.retention_days.to_string());
            }
            Operation::ConfigureDiagnostics(op) => {
                p.insert("resource", op.resource.clone());
                p.insert("resource_type", op.resource_type.clone());
                p.insert("workspace", op.workspace.clone());
            }
        }
        p
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} (rg {})", self.kind(), self.target(), self.resource_group())
    }
}
