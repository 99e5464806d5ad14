mod compile;
mod error;
mod resolve;

pub use compile::{compile, Plan};
pub use error::PlanError;
pub use resolve::{resolve_role_rg, RoleMatch};
