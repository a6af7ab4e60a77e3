use crate::domain::model::{
    Account, DeployRequest, Deployment, PricingTable, Session, Vpc,
};
use crate::domain::state::WorkflowState;
use crate::utils::error::Result;
use async_trait::async_trait;

/// AWS 帳號憑證，送往驗證與連線端點
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialCheck {
    Valid,
    Invalid(String),
}

/// 後端 REST API
#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<Account>>;
    async fn validate_credentials(&self, credentials: &AwsCredentials) -> Result<CredentialCheck>;
    async fn connect_account(&self, credentials: &AwsCredentials) -> Result<()>;
    async fn list_vpcs(&self, account_id: &str) -> Result<Vec<Vpc>>;
    async fn fetch_pricing(
        &self,
        region: &str,
        modules: &[String],
        account_id: &str,
    ) -> Result<PricingTable>;
    async fn list_deployments(&self, account_id: &str) -> Result<Vec<Deployment>>;
    /// 不分帳號的所有部署
    async fn list_all_deployments(&self) -> Result<Vec<Deployment>>;
    async fn deploy(&self, request: &DeployRequest) -> Result<String>;
    async fn deployment_logs(&self, deployment_id: &str) -> Result<String>;
    async fn destroy_deployment(&self, deployment_id: &str) -> Result<()>;
}

/// 本機持久化：工作流程狀態與登入 session
pub trait StateStore: Send + Sync {
    fn load_state(&self) -> Result<Option<WorkflowState>>;
    fn save_state(&self, state: &WorkflowState) -> Result<()>;
    fn clear_state(&self) -> Result<()>;
    fn load_session(&self) -> Result<Option<Session>>;
    fn clear_session(&self) -> Result<()>;
}

impl<T: StateStore + ?Sized> StateStore for std::sync::Arc<T> {
    fn load_state(&self) -> Result<Option<WorkflowState>> {
        (**self).load_state()
    }

    fn save_state(&self, state: &WorkflowState) -> Result<()> {
        (**self).save_state(state)
    }

    fn clear_state(&self) -> Result<()> {
        (**self).clear_state()
    }

    fn load_session(&self) -> Result<Option<Session>> {
        (**self).load_session()
    }

    fn clear_session(&self) -> Result<()> {
        (**self).clear_session()
    }
}
