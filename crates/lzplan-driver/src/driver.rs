use async_trait::async_trait;
use lzplan_domain::{
    ConfigureDiagnostics, CreateNsg, CreateNsgRule, CreatePerimeter, CreatePerimeterProfile,
    CreatePerimeterRule, CreateResourceGroup, CreateStorageAccount, CreateSubnet, CreateVnet,
    CreateWorkspace, EnableFlowLog, Operation,
};

use crate::error::DriverError;

/// Provisioning client, one capability per resource kind.
///
/// Capabilities are create-or-error: idempotence on re-runs is whatever the
/// underlying tool gives.
#[async_trait]
pub trait Provisioner: Send + Sync {
    fn name(&self) -> &'static str;

    /// One line showing exactly what [`Provisioner::apply`] would do for `op`.
    /// Never has side effects.
    fn describe(&self, op: &Operation) -> String;

    // ── Capabilities ─────────────────────────────────────────────────────────

    async fn create_resource_group(&self, op: &CreateResourceGroup) -> Result<(), DriverError>;

    async fn create_vnet(&self, op: &CreateVnet) -> Result<(), DriverError>;

    async fn create_nsg(&self, op: &CreateNsg) -> Result<(), DriverError>;

    async fn create_nsg_rule(&self, op: &CreateNsgRule) -> Result<(), DriverError>;

    async fn create_subnet(&self, op: &CreateSubnet) -> Result<(), DriverError>;

    async fn create_perimeter(&self, op: &CreatePerimeter) -> Result<(), DriverError>;

    async fn create_perimeter_profile(
        &self,
        op: &CreatePerimeterProfile,
    ) -> Result<(), DriverError>;

    async fn create_perimeter_rule(&self, op: &CreatePerimeterRule) -> Result<(), DriverError>;

    async fn create_workspace(&self, op: &CreateWorkspace) -> Result<(), DriverError>;

    async fn create_storage_account(&self, op: &CreateStorageAccount)
        -> Result<(), DriverError>;

    async fn enable_flow_log(&self, op: &EnableFlowLog) -> Result<(), DriverError>;

    async fn configure_diagnostics(&self, op: &ConfigureDiagnostics) -> Result<(), DriverError>;

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Route `op` to the capability for its kind.
    async fn apply(&self, op: &Operation) -> Result<(), DriverError> {
        match op {
            Operation::CreateResourceGroup(o) => self.create_resource_group(o).await,
            Operation::CreateVnet(o) => self.create_vnet(o).await,
            Operation::CreateNsg(o) => self.create_nsg(o).await,
            Operation::CreateNsgRule(o) => self.create_nsg_rule(o).await,
            Operation::CreateSubnet(o) => self.create_subnet(o).await,
            Operation::CreatePerimeter(o) => self.create_perimeter(o).await,
            Operation::CreatePerimeterProfile(o) => self.create_perimeter_profile(o).await,
            Operation::CreatePerimeterRule(o) => self.create_perimeter_rule(o).await,
            Operation::CreateWorkspace(o) => self.create_workspace(o).await,
            Operation::CreateStorageAccount(o) => self.create_storage_account(o).await,
            Operation::EnableFlowLog(o) => self.enable_flow_log(o).await,
            Operation::ConfigureDiagnostics(o) => self.configure_diagnostics(o).await,
        }
    }
}
