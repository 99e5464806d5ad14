use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw YAML representation of a landing-zone document.
///
/// Every field is optional here; required keys are enforced during
/// conversion so the error can name the missing key.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RawDocument {
    pub organization: Option<RawOrganization>,
    /// Region name -> short code, e.g. `westeurope: weu`.
    #[serde(default)]
    pub regions: BTreeMap<String, String>,
    pub naming: Option<RawNaming>,
    #[serde(default)]
    pub tags: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub resource_groups: Vec<RawResourceGroup>,
    #[serde(default)]
    pub vnets: Vec<RawVnet>,
    #[serde(default)]
    pub custom_nsg_rules: BTreeMap<String, RawNsgRule>,
    pub network_security_perimeter: Option<RawPerimeter>,
    pub monitoring: Option<RawMonitoring>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RawOrganization {
    pub name: Option<String>,
    #[serde(alias = "pattern_type")]
    pub pattern: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RawNaming {
    pub resource_group: Option<String>,
    pub vnet: Option<String>,
    pub subnet: Option<String>,
    /// Optional; falls back to the built-in NSG pattern.
    pub nsg: Option<String>,
    pub perimeter: Option<String>,
    pub workspace: Option<String>,
    pub storage_account: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawResourceGroup {
    pub name: Option<String>,
    #[serde(rename = "type", alias = "role")]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawVnet {
    pub name: Option<String>,
    #[serde(alias = "address_space")]
    pub cidr: Option<String>,
    #[serde(default)]
    pub subnets: Vec<RawSubnet>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawSubnet {
    pub name: Option<String>,
    #[serde(alias = "address_prefix")]
    pub cidr: Option<String>,
    /// `null` entries are kept so they can be skipped explicitly.
    #[serde(default)]
    pub rules: Vec<Option<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawNsgRule {
    pub priority: Option<u16>,
    pub protocol: Option<String>,
    pub direction: Option<String>,
    pub access: Option<String>,
    #[serde(alias = "source_address_prefix")]
    pub source_address: Option<String>,
    #[serde(alias = "source_port_range")]
    pub source_ports: Option<String>,
    #[serde(alias = "destination_address_prefix")]
    pub destination_address: Option<String>,
    #[serde(alias = "destination_port_range")]
    pub destination_ports: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawPerimeter {
    pub name: Option<String>,
    /// Rule name -> address prefixes. A mapping keeps document order.
    #[serde(default)]
    pub access_rules: serde_yaml::Mapping,
}

/// Either `corp: 10.0.0.0/8` or `corp: [10.0.0.0/8, 192.168.0.0/16]`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawPrefixes {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RawMonitoring {
    pub enable_workspace: Option<bool>,
    pub enable_network_watcher: Option<bool>,
    pub enable_diagnostics: Option<bool>,
    pub enable_dashboard: Option<bool>,
    pub workspace_name: Option<String>,
    pub storage_account_name: Option<String>,
    pub retention_days: Option<u32>,
    pub flow_log_retention_days: Option<u32>,
}
