use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("region '{0}' has no entry in the region short-code mapping")]
    UnmappedRegion(String),

    #[error("rule '{rule}' has priority {priority}, expected a value between {min} and {max}")]
    PriorityOutOfRange {
        rule: String,
        priority: u16,
        min: u16,
        max: u16,
    },

    #[error("{category} name '{name}' is invalid: {reason}")]
    InvalidName {
        category: crate::types::ResourceCategory,
        name: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
