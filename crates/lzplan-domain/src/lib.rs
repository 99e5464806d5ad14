pub mod error;
pub mod naming;
pub mod operation;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use naming::{
    check_storage_account_name, render, render_default, storage_account_name, DEFAULT_SUFFIX,
};
pub use operation::*;
pub use types::*;
