use lzplan_domain::{Configuration, ResourceCategory};
use tracing::warn;

use crate::error::PlanError;

/// Outcome of a role lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMatch {
    /// Rendered name of the first group in document order with the role.
    pub name: String,
    /// Rendered names of later groups sharing the role. They are not used.
    pub shadowed: Vec<String>,
}

/// Find the resource group whose type tag is `role` and render its name.
///
/// Groups are matched by tag only, never by position. When several groups
/// share a role the first one in document order wins and the rest are
/// reported in [`RoleMatch::shadowed`].
pub fn resolve_role_rg(cfg: &Configuration, role: &str) -> Result<RoleMatch, PlanError> {
    let mut matches = cfg
        .resource_groups
        .iter()
        .filter(|rg| rg.role == role)
        .map(|rg| cfg.render_name(ResourceCategory::ResourceGroup, &rg.name));

    let name = matches.next().ok_or_else(|| PlanError::RoleNotFound {
        role: role.to_string(),
    })?;
    let shadowed: Vec<String> = matches.collect();

    if !shadowed.is_empty() {
        warn!(
            role,
            using = %name,
            ignored = ?shadowed,
            "Several resource groups share a role; using the first"
        );
    }

    Ok(RoleMatch { name, shadowed })
}
