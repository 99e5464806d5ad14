use async_trait::async_trait;
use lzplan_domain::{
    ConfigureDiagnostics, CreateNsg, CreateNsgRule, CreatePerimeter, CreatePerimeterProfile,
    CreatePerimeterRule, CreateResourceGroup, CreateStorageAccount, CreateSubnet, CreateVnet,
    CreateWorkspace, EnableFlowLog, Operation, OperationKind,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::driver::Provisioner;
use crate::error::DriverError;

/// A provisioner that touches nothing.
///
/// - Records every call as `<kind> <target>` in call order.
/// - Fails any call whose target was registered with [`LocalProvisioner::fail_on`].
#[derive(Debug, Default)]
pub struct LocalProvisioner {
    calls: Mutex<Vec<String>>,
    fail_targets: Vec<String>,
}

impl LocalProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make calls for `target` fail. Returns `self` for chaining.
    pub fn fail_on(mut self, target: impl Into<String>) -> Self {
        self.fail_targets.push(target.into());
        self
    }

    /// Calls received so far.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, kind: OperationKind, target: &str) -> Result<(), DriverError> {
        debug!(%kind, resource = target, "LocalProvisioner: call");
        self.calls.lock().await.push(format!("{kind} {target}"));
        if self.fail_targets.iter().any(|t| t == target) {
            return Err(DriverError::ProvisionFailed(format!(
                "{kind} {target}: simulated failure"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Provisioner for LocalProvisioner {
    fn name(&self) -> &'static str {
        "local"
    }

    fn describe(&self, op: &Operation) -> String {
        format!("local: {op}")
    }

    async fn create_resource_group(&self, op: &CreateResourceGroup) -> Result<(), DriverError> {
        self.record(OperationKind::CreateResourceGroup, &op.name).await
    }

    async fn create_vnet(&self, op: &CreateVnet) -> Result<(), DriverError> {
        self.record(OperationKind::CreateVnet, &op.name).await
    }

    async fn create_nsg(&self, op: &CreateNsg) -> Result<(), DriverError> {
        self.record(OperationKind::CreateNsg, &op.name).await
    }

    async fn create_nsg_rule(&self, op: &CreateNsgRule) -> Result<(), DriverError> {
        self.record(OperationKind::CreateNsgRule, &op.name).await
    }

    async fn create_subnet(&self, op: &CreateSubnet) -> Result<(), DriverError> {
        self.record(OperationKind::CreateSubnet, &op.name).await
    }

    async fn create_perimeter(&self, op: &CreatePerimeter) -> Result<(), DriverError> {
        self.record(OperationKind::CreatePerimeter, &op.name).await
    }

    async fn create_perimeter_profile(
        &self,
        op: &CreatePerimeterProfile,
    ) -> Result<(), DriverError> {
        self.record(OperationKind::CreatePerimeterProfile, &op.name).await
    }

    async fn create_perimeter_rule(&self, op: &CreatePerimeterRule) -> Result<(), DriverError> {
        self.record(OperationKind::CreatePerimeterRule, &op.name).await
    }

    async fn create_workspace(&self, op: &CreateWorkspace) -> Result<(), DriverError> {
        self.record(OperationKind::CreateWorkspace, &op.name).await
    }

    async fn create_storage_account(
        &self,
        op: &CreateStorageAccount,
    ) -> Result<(), DriverError> {
        self.record(OperationKind::CreateStorageAccount, &op.name).await
    }

    async fn enable_flow_log(&self, op: &EnableFlowLog) -> Result<(), DriverError> {
        self.record(OperationKind::EnableFlowLog, &op.name).await
    }

    async fn configure_diagnostics(&self, op: &ConfigureDiagnostics) -> Result<(), DriverError> {
        self.record(OperationKind::ConfigureDiagnostics, &op.name).await
    }
}
