pub mod az;
pub mod driver;
pub mod error;
pub mod local;

pub use az::{az_args, AzCliConfig, AzCliProvisioner};
pub use driver::Provisioner;
pub use error::DriverError;
pub use local::LocalProvisioner;
