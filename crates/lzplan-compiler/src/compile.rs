use lzplan_domain::{
    Configuration, ConfigureDiagnostics, CreateNsg, CreateNsgRule, CreatePerimeter,
    CreatePerimeterProfile, CreatePerimeterRule, CreateResourceGroup, CreateStorageAccount,
    CreateSubnet, CreateVnet, CreateWorkspace, Direction, EnableFlowLog, Operation,
    PerimeterSpec, ResourceCategory, SubnetSpec, VnetSpec, DEFAULT_PERIMETER_PROFILE,
    PERIMETER_RESOURCE_TYPE, ROLE_MONITOR, ROLE_NETWORK,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::PlanError;
use crate::resolve::resolve_role_rg;

const STORAGE_SKU: &str = "Standard_LRS";

/// Ordered operations produced by [`compile`], plus the non-fatal problems
/// met on the way (skipped phases, shadowed roles, ...).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub operations: Vec<Operation>,
    pub warnings: Vec<String>,
}

impl Plan {
    fn push(&mut self, op: Operation) {
        debug!(kind = %op.kind(), resource = op.target(), "Planned operation");
        self.operations.push(op);
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Translate the configuration into provisioning operations.
///
/// Phases run in a fixed order: resource groups, network (VNet, then per
/// subnet its NSG, the NSG's rules and finally the subnet), perimeter,
/// monitoring. A phase whose resource-group role cannot be resolved is
/// skipped with a warning. An undefined rule reference fails the whole
/// compilation before anything is emitted.
///
/// Never talks to the provider.
pub fn compile(cfg: &Configuration) -> Result<Plan, PlanError> {
    check_rule_refs(cfg)?;

    let mut plan = Plan::default();

    // 1. Resource groups
    info!("Compiling {} resource group(s)", cfg.resource_groups.len());
    compile_resource_groups(cfg, &mut plan);

    // 2. Network
    let network_rg = resolve_phase_rg(cfg, ROLE_NETWORK, &mut plan);
    if cfg.vnets.is_empty() {
        plan.warn("no vnets declared; network phase emits nothing".to_string());
    } else if let Some(rg) = &network_rg {
        info!("Compiling {} vnet(s) into {}", cfg.vnets.len(), rg);
        compile_network(cfg, rg, &mut plan);
    } else {
        plan.warn(format!(
            "skipping network phase: no resource group with type '{ROLE_NETWORK}'"
        ));
    }

    // 3. Perimeter
    let mut perimeter_name = None;
    if let Some(nsp) = &cfg.perimeter {
        if let Some(rg) = &network_rg {
            info!("Compiling perimeter {}", nsp.name);
            perimeter_name = Some(compile_perimeter(cfg, nsp, rg, &mut plan));
        } else {
            plan.warn(format!(
                "skipping perimeter phase: no resource group with type '{ROLE_NETWORK}'"
            ));
        }
    }

    // 4. Monitoring
    if cfg.monitoring.is_enabled() {
        match resolve_phase_rg(cfg, ROLE_MONITOR, &mut plan) {
            Some(monitor_rg) => {
                info!("Compiling monitoring into {}", monitor_rg);
                compile_monitoring(
                    cfg,
                    &monitor_rg,
                    network_rg.as_deref(),
                    perimeter_name.as_deref(),
                    &mut plan,
                );
            }
            None => plan.warn(format!(
                "skipping monitoring phase: no resource group with type '{ROLE_MONITOR}'"
            )),
        }
    }

    info!(
        "Compiled {} operation(s), {} warning(s)",
        plan.operations.len(),
        plan.warnings.len()
    );
    Ok(plan)
}

/// Every named rule reference must exist, whether or not its phase runs.
fn check_rule_refs(cfg: &Configuration) -> Result<(), PlanError> {
    for vnet in &cfg.vnets {
        for subnet in &vnet.subnets {
            for name in subnet.rules.iter().filter_map(|r| r.name()) {
                if !cfg.nsg_rules.contains_key(name) {
                    return Err(PlanError::UnknownRule {
                        rule: name.to_string(),
                        subnet: cfg.render_name(ResourceCategory::Subnet, &subnet.name),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Resolve `role`, turning a miss into `None` and shadowed duplicates into
/// plan warnings.
fn resolve_phase_rg(cfg: &Configuration, role: &str, plan: &mut Plan) -> Option<String> {
    match resolve_role_rg(cfg, role) {
        Ok(m) => {
            for ignored in &m.shadowed {
                plan.warnings.push(format!(
                    "resource group {ignored} also has type '{role}'; using {}",
                    m.name
                ));
            }
            Some(m.name)
        }
        Err(e) => {
            debug!("{}", e);
            None
        }
    }
}

fn compile_resource_groups(cfg: &Configuration, plan: &mut Plan) {
    for rg in &cfg.resource_groups {
        plan.push(Operation::CreateResourceGroup(CreateResourceGroup {
            name: cfg.render_name(ResourceCategory::ResourceGroup, &rg.name),
            location: cfg.context.region().to_string(),
            tags: cfg.context.tag_pairs(),
        }));
    }
}

/// NSGs live in the resource group, not the VNet: qualify by VNet so equally
/// named subnets never share one.
fn nsg_logical_name(vnet: &VnetSpec, subnet: &SubnetSpec) -> String {
    format!("{}-{}", vnet.name, subnet.name)
}

fn compile_network(cfg: &Configuration, rg: &str, plan: &mut Plan) {
    let location = cfg.context.region().to_string();
    let tags = cfg.context.tag_pairs();

    for vnet in &cfg.vnets {
        let vnet_name = cfg.render_name(ResourceCategory::Vnet, &vnet.name);
        plan.push(Operation::CreateVnet(CreateVnet {
            name: vnet_name.clone(),
            resource_group: rg.to_string(),
            location: location.clone(),
            address_prefix: vnet.cidr.clone(),
            tags: tags.clone(),
        }));

        for subnet in &vnet.subnets {
            let nsg_name = cfg.render_name(ResourceCategory::Nsg, &nsg_logical_name(vnet, subnet));
            plan.push(Operation::CreateNsg(CreateNsg {
                name: nsg_name.clone(),
                resource_group: rg.to_string(),
                location: location.clone(),
                tags: tags.clone(),
            }));

            for rule_name in subnet.rules.iter().filter_map(|r| r.name()) {
                // check_rule_refs already guaranteed the lookup.
                let Some(rule) = cfg.nsg_rules.get(rule_name) else {
                    continue;
                };
                plan.push(Operation::CreateNsgRule(CreateNsgRule {
                    name: rule_name.to_string(),
                    nsg: nsg_name.clone(),
                    resource_group: rg.to_string(),
                    rule: rule.clone(),
                }));
            }

            // Subnet last: it references the NSG by name.
            plan.push(Operation::CreateSubnet(CreateSubnet {
                name: cfg.render_name(ResourceCategory::Subnet, &subnet.name),
                vnet: vnet_name.clone(),
                resource_group: rg.to_string(),
                address_prefix: subnet.cidr.clone(),
                nsg: nsg_name,
            }));
        }
    }
}

/// Returns the rendered perimeter name.
fn compile_perimeter(cfg: &Configuration, nsp: &PerimeterSpec, rg: &str, plan: &mut Plan) -> String {
    let name = cfg.render_name(ResourceCategory::Perimeter, &nsp.name);

    plan.push(Operation::CreatePerimeter(CreatePerimeter {
        name: name.clone(),
        resource_group: rg.to_string(),
        location: cfg.context.region().to_string(),
        tags: cfg.context.tag_pairs(),
    }));

    plan.push(Operation::CreatePerimeterProfile(CreatePerimeterProfile {
        name: DEFAULT_PERIMETER_PROFILE.to_string(),
        perimeter: name.clone(),
        resource_group: rg.to_string(),
    }));

    for rule in &nsp.access_rules {
        plan.push(Operation::CreatePerimeterRule(CreatePerimeterRule {
            name: rule.name.clone(),
            profile: DEFAULT_PERIMETER_PROFILE.to_string(),
            perimeter: name.clone(),
            resource_group: rg.to_string(),
            direction: Direction::Inbound,
            address_prefixes: rule.address_prefixes.clone(),
        }));
    }

    name
}

fn compile_monitoring(
    cfg: &Configuration,
    monitor_rg: &str,
    network_rg: Option<&str>,
    perimeter: Option<&str>,
    plan: &mut Plan,
) {
    let mon = &cfg.monitoring;
    let location = cfg.context.region().to_string();
    let tags = cfg.context.tag_pairs();

    let workspace = mon
        .enable_workspace
        .then(|| cfg.render_name(ResourceCategory::Workspace, &mon.workspace_name));

    if let Some(ws) = &workspace {
        plan.push(Operation::CreateWorkspace(CreateWorkspace {
            name: ws.clone(),
            resource_group: monitor_rg.to_string(),
            location: location.clone(),
            retention_days: mon.retention_days,
            tags: tags.clone(),
        }));
    }

    if mon.enable_network_watcher {
        let storage = cfg.render_name(ResourceCategory::StorageAccount, &mon.storage_account_name);
        plan.push(Operation::CreateStorageAccount(CreateStorageAccount {
            name: storage.clone(),
            resource_group: monitor_rg.to_string(),
            location: location.clone(),
            sku: STORAGE_SKU.to_string(),
            tags: tags.clone(),
        }));

        match network_rg {
            Some(network_rg) => {
                for vnet in &cfg.vnets {
                    let vnet_name = cfg.render_name(ResourceCategory::Vnet, &vnet.name);
                    plan.push(Operation::EnableFlowLog(EnableFlowLog {
                        name: format!("fl-{vnet_name}"),
                        resource_group: network_rg.to_string(),
                        location: location.clone(),
                        vnet: vnet_name,
                        storage_account: storage.clone(),
                        workspace: workspace.clone(),
                        retention_days: mon.flow_log_retention_days,
                    }));
                }
            }
            None if !cfg.vnets.is_empty() => plan.warn(
                "skipping flow logs: vnets were not planned without a network resource group"
                    .to_string(),
            ),
            None => {}
        }
    }

    if mon.enable_diagnostics {
        match (perimeter, &workspace) {
            (Some(nsp), Some(ws)) => {
                // Perimeter was planned, so the network group resolved.
                let rg = network_rg.unwrap_or(monitor_rg);
                plan.push(Operation::ConfigureDiagnostics(ConfigureDiagnostics {
                    name: format!("diag-{nsp}"),
                    resource: nsp.to_string(),
                    resource_type: PERIMETER_RESOURCE_TYPE.to_string(),
                    resource_group: rg.to_string(),
                    workspace: ws.clone(),
                }));
            }
            (Some(_), None) => plan.warn(
                "skipping perimeter diagnostics: enable_workspace is off".to_string(),
            ),
            (None, _) => debug!("No perimeter planned; no diagnostics settings"),
        }
    }

    if mon.enable_dashboard {
        plan.warn("enable_dashboard is set but dashboards are not deployed by lzplan".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lzplan_config::parse_config;
    use lzplan_domain::OperationKind;

    const HEADER: &str = r#"
organization: { name: vks, pattern: s1, region: westeurope }
regions: { westeurope: weu }
naming:
  resource_group: "rg-{region}-{org}-{pattern}-{name}"
  vnet: "vnet-{region}-{org}-{pattern}-{name}"
  subnet: "snet-{region}-{org}-{pattern}-{name}"
  perimeter: "nsp-{region}-{org}-{pattern}-{name}"
  workspace: "log-{region}-{org}-{pattern}-{name}"
  storage_account: "st{region}{org}{pattern}{name}"
custom_nsg_rules:
  allow-https: { priority: 100, protocol: Tcp, direction: Inbound, destination_ports: "443" }
  allow-ssh:   { priority: 110, protocol: Tcp, direction: Inbound, destination_ports: "22" }
"#;

    fn cfg(body: &str) -> Configuration {
        parse_config(&format!("{HEADER}{body}"), "inline", Utc::now()).unwrap()
    }

    fn kinds(plan: &Plan) -> Vec<OperationKind> {
        plan.operations.iter().map(|o| o.kind()).collect()
    }

    #[test]
    fn zero_vnets_warns_without_network_ops() {
        let plan = compile(&cfg("resource_groups:\n  - { name: net, type: network }\n")).unwrap();
        assert_eq!(kinds(&plan), vec![OperationKind::CreateResourceGroup]);
        assert!(plan.warnings.iter().any(|w| w.contains("no vnets")));
    }

    #[test]
    fn undefined_rule_is_fatal_and_names_subnet() {
        let c = parse_config(
            &format!(
                "{}{}",
                HEADER.replace("  allow-ssh:   { priority: 110, protocol: Tcp, direction: Inbound, destination_ports: \"22\" }\n", ""),
                r#"
resource_groups: [ { name: net, type: network } ]
vnets:
  - name: hub
    cidr: 10.0.0.0/16
    subnets:
      - { name: app, cidr: 10.0.1.0/24, rules: [allow-https, allow-ssh] }
"#
            ),
            "inline",
            Utc::now(),
        )
        .unwrap();

        match compile(&c).unwrap_err() {
            PlanError::UnknownRule { rule, subnet } => {
                assert_eq!(rule, "allow-ssh");
                assert_eq!(subnet, "snet-weu-vks-s1-app-01");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undefined_rule_is_fatal_even_when_network_phase_is_skipped() {
        let c = cfg(r#"
vnets:
  - name: hub
    cidr: 10.0.0.0/16
    subnets:
      - { name: app, cidr: 10.0.1.0/24, rules: [allow-rdp] }
"#);
        assert!(matches!(compile(&c), Err(PlanError::UnknownRule { .. })));
    }

    #[test]
    fn null_rule_entries_are_skipped() {
        let plan = compile(&cfg(r#"
resource_groups: [ { name: net, type: network } ]
vnets:
  - name: hub
    cidr: 10.0.0.0/16
    subnets:
      - { name: app, cidr: 10.0.1.0/24, rules: [allow-https, null, allow-ssh] }
"#))
        .unwrap();
        let rule_ops = plan
            .operations
            .iter()
            .filter(|o| o.kind() == OperationKind::CreateNsgRule)
            .count();
        assert_eq!(rule_ops, 2);
    }

    #[test]
    fn rules_precede_their_subnet_and_the_next_subnet() {
        let plan = compile(&cfg(r#"
resource_groups: [ { name: net, type: network } ]
vnets:
  - name: hub
    cidr: 10.0.0.0/16
    subnets:
      - { name: a, cidr: 10.0.1.0/24, rules: [allow-https, allow-ssh] }
      - { name: b, cidr: 10.0.2.0/24, rules: [allow-ssh] }
"#))
        .unwrap();

        use OperationKind::*;
        assert_eq!(
            kinds(&plan),
            vec![
                CreateResourceGroup,
                CreateVnet,
                CreateNsg,
                CreateNsgRule,
                CreateNsgRule,
                CreateSubnet,
                CreateNsg,
                CreateNsgRule,
                CreateSubnet,
            ]
        );

        let subnet_a = plan
            .operations
            .iter()
            .find_map(|o| match o {
                Operation::CreateSubnet(s) if s.name == "snet-weu-vks-s1-a-01" => Some(s),
                _ => None,
            })
            .unwrap();
        assert_eq!(subnet_a.nsg, "nsg-weu-vks-s1-hub-a-01");
        assert_eq!(subnet_a.vnet, "vnet-weu-vks-s1-hub-01");
        assert_eq!(subnet_a.address_prefix, "10.0.1.0/24");
    }

    #[test]
    fn same_subnet_name_in_two_vnets_gets_separate_nsgs() {
        let plan = compile(&cfg(r#"
resource_groups: [ { name: net, type: network } ]
vnets:
  - name: hub
    cidr: 10.0.0.0/16
    subnets:
      - { name: app, cidr: 10.0.1.0/24, rules: [allow-ssh] }
  - name: spoke
    cidr: 10.1.0.0/16
    subnets:
      - { name: app, cidr: 10.1.1.0/24, rules: [] }
"#))
        .unwrap();

        let nsgs: Vec<&str> = plan
            .operations
            .iter()
            .filter(|o| o.kind() == OperationKind::CreateNsg)
            .map(|o| o.target())
            .collect();
        assert_eq!(nsgs, vec!["nsg-weu-vks-s1-hub-app-01", "nsg-weu-vks-s1-spoke-app-01"]);

        let rule_nsgs: Vec<&str> = plan
            .operations
            .iter()
            .filter_map(|o| match o {
                Operation::CreateNsgRule(r) => Some(r.nsg.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(rule_nsgs, vec!["nsg-weu-vks-s1-hub-app-01"]);

        let subnet_nsgs: Vec<(&str, &str)> = plan
            .operations
            .iter()
            .filter_map(|o| match o {
                Operation::CreateSubnet(s) => Some((s.vnet.as_str(), s.nsg.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            subnet_nsgs,
            vec![
                ("vnet-weu-vks-s1-hub-01", "nsg-weu-vks-s1-hub-app-01"),
                ("vnet-weu-vks-s1-spoke-01", "nsg-weu-vks-s1-spoke-app-01"),
            ]
        );
    }

    #[test]
    fn resource_group_names_rendered() {
        let plan = compile(&cfg("resource_groups:\n  - { name: landingzone, type: workload }\n")).unwrap();
        assert_eq!(plan.operations[0].target(), "rg-weu-vks-s1-landingzone-01");
    }

    #[test]
    fn missing_network_role_skips_network_but_keeps_other_phases() {
        let plan = compile(&cfg(r#"
resource_groups: [ { name: mon, type: monitor } ]
vnets:
  - { name: hub, cidr: 10.0.0.0/16 }
monitoring: { enable_workspace: true }
"#))
        .unwrap();
        assert_eq!(
            kinds(&plan),
            vec![OperationKind::CreateResourceGroup, OperationKind::CreateWorkspace]
        );
        assert!(plan.warnings.iter().any(|w| w.contains("skipping network phase")));
    }

    #[test]
    fn perimeter_phase_order() {
        let plan = compile(&cfg(r#"
resource_groups: [ { name: net, type: network } ]
network_security_perimeter:
  name: core
  access_rules:
    corp: [203.0.113.0/24]
    partner: [192.0.2.0/24]
"#))
        .unwrap();
        use OperationKind::*;
        assert_eq!(
            kinds(&plan),
            vec![
                CreateResourceGroup,
                CreatePerimeter,
                CreatePerimeterProfile,
                CreatePerimeterRule,
                CreatePerimeterRule,
            ]
        );
        assert_eq!(plan.operations[1].target(), "nsp-weu-vks-s1-core-01");
        assert_eq!(plan.operations[3].target(), "corp");
    }

    #[test]
    fn monitoring_emits_workspace_storage_flow_logs_and_diagnostics() {
        let plan = compile(&cfg(r#"
resource_groups:
  - { name: net, type: network }
  - { name: mon, type: monitor }
vnets:
  - { name: hub, cidr: 10.0.0.0/16 }
  - { name: spoke, cidr: 10.1.0.0/16 }
network_security_perimeter: { name: core }
monitoring:
  enable_workspace: true
  enable_network_watcher: true
  enable_diagnostics: true
  workspace_name: core
  storage_account_name: flowlogs
"#))
        .unwrap();

        let tail: Vec<_> = kinds(&plan).into_iter().rev().take(5).collect();
        use OperationKind::*;
        assert_eq!(
            tail,
            vec![
                ConfigureDiagnostics,
                EnableFlowLog,
                EnableFlowLog,
                CreateStorageAccount,
                CreateWorkspace,
            ]
        );

        let storage = plan
            .operations
            .iter()
            .find(|o| o.kind() == CreateStorageAccount)
            .unwrap();
        assert_eq!(storage.target(), "stweuvkss1flowlogs01");
        assert_eq!(storage.resource_group(), "rg-weu-vks-s1-mon-01");

        match plan.operations.last().unwrap() {
            Operation::ConfigureDiagnostics(d) => {
                assert_eq!(d.resource, "nsp-weu-vks-s1-core-01");
                assert_eq!(d.workspace, "log-weu-vks-s1-core-01");
                assert_eq!(d.resource_group, "rg-weu-vks-s1-net-01");
            }
            other => panic!("unexpected operation: {other}"),
        }
    }

    #[test]
    fn missing_monitor_role_skips_monitoring_with_warning() {
        let plan = compile(&cfg(r#"
resource_groups: [ { name: net, type: network } ]
monitoring: { enable_workspace: true }
"#))
        .unwrap();
        assert_eq!(kinds(&plan), vec![OperationKind::CreateResourceGroup]);
        assert!(plan.warnings.iter().any(|w| w.contains("monitoring")));
    }

    #[test]
    fn duplicate_role_is_reported() {
        let plan = compile(&cfg(r#"
resource_groups:
  - { name: net-a, type: network }
  - { name: net-b, type: network }
vnets:
  - { name: hub, cidr: 10.0.0.0/16 }
"#))
        .unwrap();
        let vnet = &plan.operations[2];
        assert_eq!(vnet.resource_group(), "rg-weu-vks-s1-net-a-01");
        assert!(plan.warnings.iter().any(|w| w.contains("net-b")));
    }

    #[test]
    fn dashboard_toggle_only_warns() {
        let plan = compile(&cfg(r#"
resource_groups: [ { name: mon, type: monitor } ]
monitoring: { enable_dashboard: true }
"#))
        .unwrap();
        assert_eq!(plan.operations.len(), 1);
        assert!(plan.warnings.iter().any(|w| w.contains("dashboard")));
    }
}
