use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("undefined rule: subnet '{subnet}' references '{rule}' which is not in custom_nsg_rules")]
    UnknownRule { rule: String, subnet: String },

    #[error("no resource group with type '{role}'")]
    RoleNotFound { role: String },
}
