use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use lzplan_domain::{
    Access, Configuration, Direction, MonitoringSpec, NamingPatterns, NsgRule, OrgContext,
    PerimeterAccessRule, PerimeterSpec, Protocol, ResourceGroupSpec, RuleRef, SubnetSpec,
    VnetSpec, DEFAULT_NSG_PATTERN,
};
use tracing::debug;

use crate::error::ConfigError;
use crate::raw::{
    RawDocument, RawMonitoring, RawNaming, RawNsgRule, RawPerimeter, RawPrefixes, RawVnet,
};

/// Config location used when the caller does not name one.
pub const DEFAULT_CONFIG_PATH: &str = "config/landingzone.yml";

/// Read and parse the landing-zone document at `path`.
///
/// The `deployed_at` tag is stamped with the current UTC time.
pub fn load_config(path: &Path) -> Result<Configuration, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!("Loading landing zone from {}", path.display());
    parse_config(&content, &path.display().to_string(), Utc::now())
}

/// Parse a landing-zone document. `origin` is only used in error messages.
pub fn parse_config(
    text: &str,
    origin: &str,
    deployed_at: DateTime<Utc>,
) -> Result<Configuration, ConfigError> {
    let raw: RawDocument = serde_yaml::from_str(text).map_err(|e| ConfigError::YamlParse {
        path: origin.to_string(),
        source: e,
    })?;
    convert_document(raw, origin, deployed_at)
}

fn convert_document(
    raw: RawDocument,
    path: &str,
    deployed_at: DateTime<Utc>,
) -> Result<Configuration, ConfigError> {
    let org = raw.organization.unwrap_or_default();
    let org_name = required(org.name, "organization.name", path)?;
    let pattern = required(org.pattern, "organization.pattern", path)?;
    let region = required(org.region, "organization.region", path)?;
    if raw.regions.is_empty() {
        return Err(missing("regions", path));
    }

    let tags = raw
        .tags
        .into_iter()
        .map(|(k, v)| scalar_to_string(&v, &format!("tags.{k}"), path).map(|v| (k, v)))
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let context = OrgContext::new(org_name, pattern, region, &raw.regions, tags, deployed_at)?;
    let naming = convert_naming(raw.naming, path)?;

    let resource_groups = raw
        .resource_groups
        .into_iter()
        .enumerate()
        .map(|(i, rg)| {
            Ok(ResourceGroupSpec {
                name: required(rg.name, &format!("resource_groups[{i}].name"), path)?,
                role: required(rg.role, &format!("resource_groups[{i}].type"), path)?,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let vnets = raw
        .vnets
        .into_iter()
        .enumerate()
        .map(|(i, v)| convert_vnet(v, i, path))
        .collect::<Result<Vec<_>, _>>()?;

    let mut nsg_rules = BTreeMap::new();
    for (name, rule) in raw.custom_nsg_rules {
        let rule = convert_rule(&name, rule, path)?;
        nsg_rules.insert(name, rule);
    }

    let perimeter = raw
        .network_security_perimeter
        .map(|p| convert_perimeter(p, path))
        .transpose()?;

    let monitoring = convert_monitoring(raw.monitoring.unwrap_or_default());

    debug!(
        resource_groups = resource_groups.len(),
        vnets = vnets.len(),
        rules = nsg_rules.len(),
        perimeter = perimeter.is_some(),
        "Parsed landing zone"
    );

    let cfg = Configuration {
        context,
        naming,
        resource_groups,
        vnets,
        nsg_rules,
        perimeter,
        monitoring,
    };
    cfg.validate_names()?;
    Ok(cfg)
}

fn convert_naming(raw: Option<RawNaming>, path: &str) -> Result<NamingPatterns, ConfigError> {
    let raw = raw.ok_or_else(|| missing("naming", path))?;
    let naming = NamingPatterns {
        resource_group: required(raw.resource_group, "naming.resource_group", path)?,
        vnet: required(raw.vnet, "naming.vnet", path)?,
        subnet: required(raw.subnet, "naming.subnet", path)?,
        nsg: raw.nsg.unwrap_or_else(|| DEFAULT_NSG_PATTERN.to_string()),
        perimeter: required(raw.perimeter, "naming.perimeter", path)?,
        workspace: required(raw.workspace, "naming.workspace", path)?,
        storage_account: required(raw.storage_account, "naming.storage_account", path)?,
    };
    naming.validate()?;
    Ok(naming)
}

fn convert_vnet(raw: RawVnet, index: usize, path: &str) -> Result<VnetSpec, ConfigError> {
    let name = required(raw.name, &format!("vnets[{index}].name"), path)?;
    let cidr = required(raw.cidr, &format!("vnets[{index}].cidr"), path)?;

    let subnets = raw
        .subnets
        .into_iter()
        .enumerate()
        .map(|(j, s)| {
            let field = |f: &str| format!("vnets[{index}].subnets[{j}].{f}");
            Ok(SubnetSpec {
                name: required(s.name, &field("name"), path)?,
                cidr: required(s.cidr, &field("cidr"), path)?,
                rules: s.rules.iter().map(|r| RuleRef::from_raw(r.as_deref())).collect(),
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(VnetSpec { name, cidr, subnets })
}

fn convert_rule(name: &str, raw: RawNsgRule, path: &str) -> Result<NsgRule, ConfigError> {
    let field = |f: &str| format!("custom_nsg_rules.{name}.{f}");
    let priority = raw.priority.ok_or_else(|| missing(&field("priority"), path))?;
    let protocol = parse_protocol(&required(raw.protocol, &field("protocol"), path)?, path)?;
    let direction = parse_direction(&required(raw.direction, &field("direction"), path)?, path)?;
    let access = raw
        .access
        .as_deref()
        .map(|a| parse_access(a, path))
        .transpose()?
        .unwrap_or(Access::Allow);

    let rule = NsgRule {
        priority,
        protocol,
        direction,
        access,
        source_address: raw.source_address.unwrap_or_else(|| "*".into()),
        source_ports: raw.source_ports.unwrap_or_else(|| "*".into()),
        destination_address: raw.destination_address.unwrap_or_else(|| "*".into()),
        destination_ports: raw.destination_ports.unwrap_or_else(|| "*".into()),
        description: raw.description,
    };
    rule.validate(name)?;
    Ok(rule)
}

fn convert_perimeter(raw: RawPerimeter, path: &str) -> Result<PerimeterSpec, ConfigError> {
    let name = required(raw.name, "network_security_perimeter.name", path)?;

    let mut access_rules = Vec::with_capacity(raw.access_rules.len());
    for (key, value) in raw.access_rules {
        let rule_name = key.as_str().map(str::to_string).ok_or_else(|| ConfigError::Conversion {
            path: path.to_string(),
            message: format!("perimeter access rule name must be a string, got {:?}", key),
        })?;
        let prefixes: RawPrefixes =
            serde_yaml::from_value(value).map_err(|e| ConfigError::Conversion {
                path: path.to_string(),
                message: format!("perimeter access rule '{}': {}", rule_name, e),
            })?;
        let address_prefixes = match prefixes {
            RawPrefixes::One(p) => vec![p],
            RawPrefixes::Many(ps) => ps,
        };
        access_rules.push(PerimeterAccessRule {
            name: rule_name,
            address_prefixes,
        });
    }

    Ok(PerimeterSpec { name, access_rules })
}

fn convert_monitoring(raw: RawMonitoring) -> MonitoringSpec {
    let defaults = MonitoringSpec::default();
    MonitoringSpec {
        enable_workspace: raw.enable_workspace.unwrap_or(defaults.enable_workspace),
        enable_network_watcher: raw
            .enable_network_watcher
            .unwrap_or(defaults.enable_network_watcher),
        enable_diagnostics: raw.enable_diagnostics.unwrap_or(defaults.enable_diagnostics),
        enable_dashboard: raw.enable_dashboard.unwrap_or(defaults.enable_dashboard),
        workspace_name: raw.workspace_name.unwrap_or(defaults.workspace_name),
        storage_account_name: raw
            .storage_account_name
            .unwrap_or(defaults.storage_account_name),
        retention_days: raw.retention_days.unwrap_or(defaults.retention_days),
        flow_log_retention_days: raw
            .flow_log_retention_days
            .unwrap_or(defaults.flow_log_retention_days),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn missing(field: &str, path: &str) -> ConfigError {
    ConfigError::MissingField {
        path: path.to_string(),
        field: field.to_string(),
    }
}

/// Present and not blank.
fn required(value: Option<String>, field: &str, path: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(field, path)),
    }
}

fn scalar_to_string(value: &serde_yaml::Value, field: &str, path: &str) -> Result<String, ConfigError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConfigError::Conversion {
            path: path.to_string(),
            message: format!("'{}' must be a scalar, got {:?}", field, other),
        }),
    }
}

fn parse_protocol(s: &str, path: &str) -> Result<Protocol, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "tcp" => Ok(Protocol::Tcp),
        "udp" => Ok(Protocol::Udp),
        "icmp" => Ok(Protocol::Icmp),
        "esp" => Ok(Protocol::Esp),
        "ah" => Ok(Protocol::Ah),
        "*" | "any" => Ok(Protocol::Any),
        _ => Err(ConfigError::Conversion {
            path: path.to_string(),
            message: format!("unknown protocol '{}'", s),
        }),
    }
}

fn parse_direction(s: &str, path: &str) -> Result<Direction, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "inbound" => Ok(Direction::Inbound),
        "outbound" => Ok(Direction::Outbound),
        _ => Err(ConfigError::Conversion {
            path: path.to_string(),
            message: format!("unknown direction '{}'", s),
        }),
    }
}

fn parse_access(s: &str, path: &str) -> Result<Access, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "allow" => Ok(Access::Allow),
        "deny" => Ok(Access::Deny),
        _ => Err(ConfigError::Conversion {
            path: path.to_string(),
            message: format!("unknown access '{}'", s),
        }),
    }
}
