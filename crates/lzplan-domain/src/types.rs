use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DomainError;

/// Tag key injected by the engine on every taggable resource.
pub const DEPLOYED_AT_TAG: &str = "deployed_at";

/// Resource-group role that hosts VNets, NSGs and the security perimeter.
pub const ROLE_NETWORK: &str = "network";

/// Resource-group role that hosts the workspace and flow-log storage.
pub const ROLE_MONITOR: &str = "monitor";

/// Valid NSG rule priorities, inclusive.
pub const NSG_PRIORITY_MIN: u16 = 100;
pub const NSG_PRIORITY_MAX: u16 = 4096;

// ── Organization context ─────────────────────────────────────────────────────

/// Values every rendered name and tag set is derived from.
///
/// Built once at the start of a run and only ever handed out by reference.
/// There are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgContext {
    org: String,
    pattern: String,
    region: String,
    region_code: String,
    tags: BTreeMap<String, String>,
    deployed_at: DateTime<Utc>,
}

impl OrgContext {
    /// Look up `region` in `region_codes` and freeze the context.
    pub fn new(
        org: impl Into<String>,
        pattern: impl Into<String>,
        region: impl Into<String>,
        region_codes: &BTreeMap<String, String>,
        tags: BTreeMap<String, String>,
        deployed_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let region = region.into();
        let region_code = region_codes
            .get(&region)
            .cloned()
            .ok_or_else(|| DomainError::UnmappedRegion(region.clone()))?;

        Ok(Self {
            org: org.into(),
            pattern: pattern.into(),
            region,
            region_code,
            tags,
            deployed_at,
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Full provider region name, e.g. `westeurope`.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Short code substituted for `{region}`, e.g. `weu`.
    pub fn region_code(&self) -> &str {
        &self.region_code
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn deployed_at(&self) -> DateTime<Utc> {
        self.deployed_at
    }

    /// Tags as `key=value` pairs sorted by key, followed by the
    /// `deployed_at=<timestamp>` pair. A user tag named `deployed_at` is
    /// shadowed by the injected one.
    pub fn tag_pairs(&self) -> Vec<String> {
        let mut pairs: Vec<String> = self
            .tags
            .iter()
            .filter(|(k, _)| k.as_str() != DEPLOYED_AT_TAG)
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        pairs.push(format!(
            "{}={}",
            DEPLOYED_AT_TAG,
            self.deployed_at.format("%Y-%m-%dT%H:%M:%SZ")
        ));
        pairs
    }
}

// ── Naming patterns ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    ResourceGroup,
    Vnet,
    Subnet,
    Nsg,
    Perimeter,
    Workspace,
    StorageAccount,
}

impl ResourceCategory {
    /// Key of this category under `naming:` in the config document.
    pub fn config_key(&self) -> &'static str {
        match self {
            ResourceCategory::ResourceGroup => "resource_group",
            ResourceCategory::Vnet => "vnet",
            ResourceCategory::Subnet => "subnet",
            ResourceCategory::Nsg => "nsg",
            ResourceCategory::Perimeter => "perimeter",
            ResourceCategory::Workspace => "workspace",
            ResourceCategory::StorageAccount => "storage_account",
        }
    }
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Used when the document declares no `naming.nsg` template.
pub const DEFAULT_NSG_PATTERN: &str = "nsg-{region}-{org}-{pattern}-{name}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingPatterns {
    pub resource_group: String,
    pub vnet: String,
    pub subnet: String,
    pub nsg: String,
    pub perimeter: String,
    pub workspace: String,
    pub storage_account: String,
}

impl NamingPatterns {
    pub fn template(&self, category: ResourceCategory) -> &str {
        match category {
            ResourceCategory::ResourceGroup => &self.resource_group,
            ResourceCategory::Vnet => &self.vnet,
            ResourceCategory::Subnet => &self.subnet,
            ResourceCategory::Nsg => &self.nsg,
            ResourceCategory::Perimeter => &self.perimeter,
            ResourceCategory::Workspace => &self.workspace,
            ResourceCategory::StorageAccount => &self.storage_account,
        }
    }

    /// Every template must be non-empty.
    pub fn validate(&self) -> Result<(), DomainError> {
        const ALL: [ResourceCategory; 7] = [
            ResourceCategory::ResourceGroup,
            ResourceCategory::Vnet,
            ResourceCategory::Subnet,
            ResourceCategory::Nsg,
            ResourceCategory::Perimeter,
            ResourceCategory::Workspace,
            ResourceCategory::StorageAccount,
        ];
        for category in ALL {
            if self.template(category).trim().is_empty() {
                return Err(DomainError::InvalidConfig(format!(
                    "naming pattern '{}' is empty",
                    category
                )));
            }
        }
        Ok(())
    }
}

// ── Resource groups ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupSpec {
    /// Logical name, substituted for `{name}`.
    pub name: String,
    /// Type tag used to look the group up by purpose (`network`, `monitor`, ...).
    pub role: String,
}

// ── Network ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnetSpec {
    pub name: String,
    pub cidr: String,
    pub subnets: Vec<SubnetSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub name: String,
    /// Passed through verbatim; not checked against the parent VNet range.
    pub cidr: String,
    pub rules: Vec<RuleRef>,
}

/// One entry of a subnet's rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleRef {
    /// Explicit "no rule" marker: YAML `null`, `""`, `"null"` or `"undefined"`.
    Empty,
    Named(String),
}

impl RuleRef {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("null") | Some("undefined") | Some("~") => RuleRef::Empty,
            Some(name) => RuleRef::Named(name.to_string()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RuleRef::Empty => None,
            RuleRef::Named(n) => Some(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Inbound => write!(f, "Inbound"),
            Direction::Outbound => write!(f, "Outbound"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Allow,
    Deny,
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Access::Allow => write!(f, "Allow"),
            Access::Deny => write!(f, "Deny"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Esp,
    Ah,
    Any,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "Tcp"),
            Protocol::Udp => write!(f, "Udp"),
            Protocol::Icmp => write!(f, "Icmp"),
            Protocol::Esp => write!(f, "Esp"),
            Protocol::Ah => write!(f, "Ah"),
            Protocol::Any => write!(f, "*"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NsgRule {
    pub priority: u16,
    pub protocol: Protocol,
    pub direction: Direction,
    pub access: Access,
    pub source_address: String,
    pub source_ports: String,
    pub destination_address: String,
    pub destination_ports: String,
    pub description: Option<String>,
}

impl NsgRule {
    pub fn validate(&self, rule_name: &str) -> Result<(), DomainError> {
        if !(NSG_PRIORITY_MIN..=NSG_PRIORITY_MAX).contains(&self.priority) {
            return Err(DomainError::PriorityOutOfRange {
                rule: rule_name.to_string(),
                priority: self.priority,
                min: NSG_PRIORITY_MIN,
                max: NSG_PRIORITY_MAX,
            });
        }
        Ok(())
    }
}

// ── Perimeter ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerimeterSpec {
    pub name: String,
    /// In document order.
    pub access_rules: Vec<PerimeterAccessRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerimeterAccessRule {
    pub name: String,
    pub address_prefixes: Vec<String>,
}

// ── Monitoring ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSpec {
    pub enable_workspace: bool,
    pub enable_network_watcher: bool,
    pub enable_diagnostics: bool,
    pub enable_dashboard: bool,
    pub workspace_name: String,
    pub storage_account_name: String,
    pub retention_days: u32,
    pub flow_log_retention_days: u32,
}

impl Default for MonitoringSpec {
    fn default() -> Self {
        Self {
            enable_workspace: false,
            enable_network_watcher: false,
            enable_diagnostics: false,
            enable_dashboard: false,
            workspace_name: "monitoring".to_string(),
            storage_account_name: "flowlogs".to_string(),
            retention_days: 30,
            flow_log_retention_days: 7,
        }
    }
}

impl MonitoringSpec {
    pub fn is_enabled(&self) -> bool {
        self.enable_workspace
            || self.enable_network_watcher
            || self.enable_diagnostics
            || self.enable_dashboard
    }
}

// ── Whole document ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub context: OrgContext,
    pub naming: NamingPatterns,
    pub resource_groups: Vec<ResourceGroupSpec>,
    pub vnets: Vec<VnetSpec>,
    /// Rule definitions keyed by symbolic name (`custom_nsg_rules`).
    pub nsg_rules: BTreeMap<String, NsgRule>,
    pub perimeter: Option<PerimeterSpec>,
    pub monitoring: MonitoringSpec,
}
