use crate::core::deploy::{DeploymentRunner, PollResult, PollSettings, PollStatus, SubmitOutcome};
use crate::core::{estimator, iac, rules};
use crate::domain::catalog;
use crate::domain::model::{
    Account, Credentials, DeployRequest, Deployment, ModuleConfig, ProviderId, WizardStep,
};
use crate::domain::ports::{AwsCredentials, CloudApi, CredentialCheck, StateStore};
use crate::domain::state::WorkflowState;
use crate::utils::error::{Result, WorkflowError};
use serde_json::Value;

const ROUTE_ROOT: &str = "/sidebar/work-flow";

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Selected(String),
    /// 該模組由其他頁面管理（EKS 叢集）
    ManagedElsewhere { module_id: String, route: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeployOutcome {
    Rejected(String),
    Finished {
        deployment_id: String,
        status: PollStatus,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSummary {
    pub provider: Option<ProviderId>,
    pub step: WizardStep,
    pub region: String,
    pub account_id: Option<String>,
    pub modules: Vec<(String, String)>,
    pub estimated_cost: f64,
}

/// 多步驟部署精靈
///
/// Every mutating operation recomputes the derived flags (form validity,
/// module validity) and writes the state back through the [`StateStore`].
pub struct Workflow<A: CloudApi, S: StateStore> {
    api: A,
    store: S,
    state: WorkflowState,
    deployments: Vec<Deployment>,
}

impl<A: CloudApi, S: StateStore> Workflow<A, S> {
    pub fn new(api: A, store: S, state: WorkflowState) -> Self {
        Self {
            api,
            store,
            state,
            deployments: Vec::new(),
        }
    }

    /// 從本機儲存還原；沒有或損毀的狀態從頭開始
    pub fn restore(api: A, store: S) -> Result<Self> {
        let state = store.load_state()?.unwrap_or_default();
        tracing::debug!(
            "Restored workflow at step {} (provider: {:?})",
            state.current_step.number(),
            state.selected_provider
        );
        Ok(Self::new(api, store, state))
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    fn commit(&mut self) -> Result<()> {
        self.state.form_valid = rules::credentials_valid(
            self.state.selected_provider,
            &self.state.form_data,
            self.state.using_existing_account,
            self.state.selected_account.as_ref(),
        );
        self.state.module_valid = match self.state.selected_modules.first() {
            Some(module_id) if self.state.selected_provider.is_some() => {
                let empty = ModuleConfig::new();
                let config = self.state.config_for(module_id).unwrap_or(&empty);
                rules::validate_module(module_id, config).is_ok()
            }
            _ => false,
        };
        self.store.save_state(&self.state)
    }

    fn require_provider(&self) -> Result<ProviderId> {
        self.state
            .selected_provider
            .ok_or_else(|| WorkflowError::state("No provider selected; run `provider <aws|gcp|azure>` first"))
    }

    fn require_aws(&self, operation: &str) -> Result<()> {
        match self.require_provider()? {
            ProviderId::Aws => Ok(()),
            other => Err(WorkflowError::state(format!(
                "{} is only available for AWS (current provider: {})",
                operation, other
            ))),
        }
    }

    // ── Step 1: provider & connection ────────────────────────────────────

    pub async fn select_provider(&mut self, provider_id: ProviderId) -> Result<()> {
        let provider = catalog::provider(provider_id);
        tracing::info!("☁️ Selected provider: {}", provider.name);

        if self.state.selected_provider != Some(provider_id) {
            self.state.selected_modules.clear();
            self.state.module_config.clear();
            self.state.dynamic_pricing.clear();
        }
        self.state.selected_provider = Some(provider_id);
        self.state.form_data.region = provider.default_region().to_string();
        self.state.current_step = WizardStep::Connection;
        self.state.selected_account = None;
        self.state.using_existing_account = false;
        self.state.vpcs.clear();
        self.state.connected_accounts.clear();

        if provider_id == ProviderId::Aws {
            self.refresh_accounts().await;
        }
        self.commit()
    }

    pub async fn load_accounts(&mut self) -> Result<&[Account]> {
        self.require_aws("Listing connected accounts")?;
        self.refresh_accounts().await;
        self.commit()?;
        Ok(&self.state.connected_accounts)
    }

    /// 重新讀取已連線帳號；失敗時清空列表
    async fn refresh_accounts(&mut self) {
        match self.api.list_accounts().await {
            Ok(accounts) => {
                tracing::debug!("Loaded {} connected accounts", accounts.len());
                self.state.connected_accounts = accounts;
            }
            Err(e) => {
                tracing::error!("Failed to fetch connected AWS accounts: {}", e);
                self.state.connected_accounts.clear();
            }
        }
    }

    pub async fn use_account(&mut self, account_ref: &str) -> Result<()> {
        self.require_aws("Selecting an existing account")?;
        let known = |accounts: &[Account]| {
            accounts
                .iter()
                .any(|a| a.id == account_ref || a.account_id == account_ref)
        };
        if !known(&self.state.connected_accounts) {
            self.refresh_accounts().await;
        }

        let account = self
            .state
            .connected_accounts
            .iter()
            .find(|a| a.id == account_ref || a.account_id == account_ref)
            .cloned()
            .ok_or_else(|| {
                WorkflowError::validation(format!("No connected account matches '{}'", account_ref))
            })?;

        tracing::info!("🔗 Using account {} ({})", account.account_id, account.aws_region);
        if !account.aws_region.is_empty() {
            self.state.form_data.region = account.aws_region.clone();
        }
        self.state.using_existing_account = true;
        self.state.selected_account = Some(account);
        self.refresh_vpcs().await;
        self.commit()
    }

    pub fn clear_account(&mut self) -> Result<()> {
        self.state.selected_account = None;
        self.state.using_existing_account = false;
        self.state.vpcs.clear();
        self.commit()
    }

    async fn refresh_vpcs(&mut self) {
        let Some(account_id) = self.state.account_backend_id().map(str::to_string) else {
            self.state.vpcs.clear();
            return;
        };
        match self.api.list_vpcs(&account_id).await {
            Ok(vpcs) => self.state.vpcs = vpcs,
            Err(e) => {
                tracing::error!("Error fetching VPCs: {}", e);
                self.state.vpcs.clear();
            }
        }
    }

    /// 更新表單欄位；使用既有帳號時不能改憑證與區域
    pub fn set_form_field(&mut self, field: &str, value: &str) -> Result<()> {
        let provider = self.require_provider()?;
        let locked = matches!(field, "accessKey" | "secretKey" | "region");
        if locked && self.state.using_existing_account {
            return Err(WorkflowError::state(format!(
                "{} is taken from the selected account; run `account clear` to edit it",
                field
            )));
        }

        let form = &mut self.state.form_data;
        match field {
            "accessKey" => form.access_key = value.to_string(),
            "secretKey" => form.secret_key = value.to_string(),
            "region" => {
                let regions = catalog::provider(provider).regions;
                if !regions.iter().any(|r| *r == value) {
                    return Err(WorkflowError::InvalidConfigValueError {
                        field: "region".to_string(),
                        value: value.to_string(),
                        reason: format!("Supported regions: {}", regions.join(", ")),
                    });
                }
                form.region = value.to_string();
            }
            "serviceAccountJson" => form.service_account_json = value.to_string(),
            "tenantId" => form.tenant_id = value.to_string(),
            "clientId" => form.client_id = value.to_string(),
            "clientSecret" => form.client_secret = value.to_string(),
            "subscriptionId" => form.subscription_id = value.to_string(),
            other => {
                return Err(WorkflowError::validation(format!("Unknown form field '{}'", other)));
            }
        }
        self.commit()
    }

    fn aws_credentials(&self) -> AwsCredentials {
        AwsCredentials {
            access_key_id: self.state.form_data.access_key.clone(),
            secret_access_key: self.state.form_data.secret_key.clone(),
            region: self.state.form_data.region.clone(),
        }
    }

    pub async fn validate_credentials(&self) -> Result<CredentialCheck> {
        self.require_aws("Testing the connection")?;
        if self.state.using_existing_account {
            return Err(WorkflowError::state(
                "An existing account is selected; its credentials are already stored",
            ));
        }
        let check = self.api.validate_credentials(&self.aws_credentials()).await?;
        match &check {
            CredentialCheck::Valid => tracing::info!("✅ Connection successful!"),
            CredentialCheck::Invalid(reason) => tracing::warn!("❌ {}", reason),
        }
        Ok(check)
    }

    /// 儲存新帳號；無論成功與否都重新讀取帳號列表
    pub async fn connect_account(&mut self) -> Result<()> {
        self.require_aws("Connecting an account")?;
        let form = &self.state.form_data;
        if form.access_key.is_empty() || form.secret_key.is_empty() {
            return Err(WorkflowError::validation(
                "Access key and secret key are required to connect an account",
            ));
        }

        let result = self.api.connect_account(&self.aws_credentials()).await;
        self.refresh_accounts().await;

        match result {
            Ok(()) => {
                tracing::info!("✅ Account saved successfully!");
                self.state.selected_account = None;
                self.state.using_existing_account = false;
                self.commit()
            }
            Err(e) => {
                self.commit()?;
                Err(e)
            }
        }
    }

    // ── Step 2: existing deployments ─────────────────────────────────────

    pub async fn load_deployments(&mut self) -> Result<&[Deployment]> {
        self.deployments.clear();
        let is_aws = self.state.selected_provider == Some(ProviderId::Aws);
        if let (true, Some(account_id)) = (is_aws, self.state.account_backend_id()) {
            self.deployments = self.api.list_deployments(account_id).await?;
            tracing::info!("📦 Found {} deployments", self.deployments.len());
        }
        Ok(&self.deployments)
    }

    /// 所有帳號的部署，ECR 排最前面，其餘由新到舊
    pub async fn load_all_deployments(&mut self) -> Result<&[Deployment]> {
        self.deployments = self.api.list_all_deployments().await?;
        sort_for_listing(&mut self.deployments);
        tracing::info!("📦 Found {} deployments across all accounts", self.deployments.len());
        Ok(&self.deployments)
    }

    pub async fn destroy_deployment(&mut self, deployment_id: &str) -> Result<()> {
        tracing::warn!("💥 Destroying deployment {}", deployment_id);
        self.api.destroy_deployment(deployment_id).await?;
        self.deployments.retain(|d| d.deployment_id != deployment_id);
        tracing::info!("✅ Destroyed: {}", deployment_id);
        Ok(())
    }

    // ── Step 3: modules ──────────────────────────────────────────────────

    /// 單選：以新模組取代目前的選擇，沿用既有設定或套用預設值
    pub fn toggle_module(&mut self, module_id: &str) -> Result<ToggleOutcome> {
        let provider = self.require_provider()?;
        let module = catalog::find_module(provider, module_id).ok_or_else(|| {
            WorkflowError::validation(format!("Module '{}' is not offered for {}", module_id, provider))
        })?;

        if module.id == "eks" {
            return Ok(ToggleOutcome::ManagedElsewhere {
                module_id: module.id.to_string(),
                route: "/sidebar/clusters".to_string(),
            });
        }

        let config = self
            .state
            .module_config
            .remove(module.id)
            .unwrap_or_else(|| rules::default_config(module.id, &self.state.form_data.region));
        self.state.module_config.clear();
        self.state.module_config.insert(module.id.to_string(), config);
        self.state.selected_modules = vec![module.id.to_string()];

        tracing::info!("🧩 Selected module: {}", module.name);
        self.commit()?;
        Ok(ToggleOutcome::Selected(module.id.to_string()))
    }

    /// 值能解析成 JSON 就用 JSON，否則當成字串；選項以外的值直接拒絕
    pub fn set_config_field(&mut self, module_id: &str, key: &str, raw: &str) -> Result<()> {
        let config = self.state.module_config.get_mut(module_id).ok_or_else(|| {
            WorkflowError::state(format!("Module '{}' is not selected", module_id))
        })?;
        let value = match rules::normalize_field(module_id, key, raw) {
            Some(normalized) => Value::String(normalized),
            None => serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
        };
        rules::check_field(module_id, key, &value)?;
        tracing::debug!("Setting {}.{} = {}", module_id, key, value);
        config.insert(key.to_string(), value);
        self.commit()
    }

    pub fn module_problems(&self) -> Vec<String> {
        match self.state.selected_modules.first() {
            Some(module_id) => {
                let empty = ModuleConfig::new();
                let config = self.state.config_for(module_id).unwrap_or(&empty);
                rules::validate_module(module_id, config).err().unwrap_or_default()
            }
            None => vec!["no module selected".to_string()],
        }
    }

    // ── Step 4: pricing & preview ────────────────────────────────────────

    /// 取即時報價；失敗時退回靜態價格表
    pub async fn refresh_pricing(&mut self) {
        if self.state.current_step < WizardStep::Modules || self.state.selected_modules.is_empty() {
            return;
        }
        let Some(account_id) = self.state.account_backend_id().map(str::to_string) else {
            return;
        };
        if self.state.form_data.region.is_empty() {
            return;
        }

        let fetched = self
            .api
            .fetch_pricing(&self.state.form_data.region, &self.state.selected_modules, &account_id)
            .await;
        match fetched {
            Ok(pricing) => self.state.dynamic_pricing = pricing,
            Err(e) => {
                tracing::warn!("Pricing fallback to static: {}", e);
                self.state.dynamic_pricing.clear();
            }
        }
    }

    pub fn recalculate(&mut self) {
        let state = &mut self.state;
        state.estimated_cost = estimator::estimate_monthly_cost(
            state.selected_provider,
            &state.selected_modules,
            &state.module_config,
            &state.dynamic_pricing,
        );
        state.iac_code = iac::generate_preview(
            state.selected_provider,
            &state.form_data,
            &state.selected_modules,
            &state.module_config,
        );
    }

    pub async fn refresh_summary(&mut self) -> Result<()> {
        self.refresh_pricing().await;
        self.recalculate();
        self.commit()
    }

    pub fn summary(&self) -> WorkflowSummary {
        let modules = self
            .state
            .selected_provider
            .map(|provider| {
                self.state
                    .selected_modules
                    .iter()
                    .filter_map(|id| catalog::find_module(provider, id))
                    .map(|m| (m.name.to_string(), m.description.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        WorkflowSummary {
            provider: self.state.selected_provider,
            step: self.state.current_step,
            region: self.state.form_data.region.clone(),
            account_id: self.state.selected_account.as_ref().map(|a| a.account_id.clone()),
            modules,
            estimated_cost: self.state.estimated_cost,
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────

    pub async fn advance(&mut self) -> Result<WizardStep> {
        self.require_provider()?;
        let current = self.state.current_step;
        match current {
            WizardStep::Connection if !self.state.form_valid => {
                return Err(WorkflowError::validation(
                    "Complete the connection details (or pick an existing account) first",
                ));
            }
            WizardStep::Modules if !self.state.module_valid => {
                return Err(WorkflowError::validation(format!(
                    "Module configuration is incomplete: {}",
                    self.module_problems().join("; ")
                )));
            }
            WizardStep::Create => {
                return Err(WorkflowError::state("Already at the last step; run `deploy`"));
            }
            _ => {}
        }

        let next = current
            .next()
            .ok_or_else(|| WorkflowError::state("No further step"))?;
        self.state.current_step = next;
        tracing::info!("➡️ Step {}: {}", next.number(), next.name());

        if next >= WizardStep::Configure {
            self.refresh_pricing().await;
            self.recalculate();
        }
        self.commit()?;
        Ok(next)
    }

    /// 第一步再往回就取消選擇的雲端供應商
    pub fn back(&mut self) -> Result<Option<WizardStep>> {
        match self.state.current_step.previous() {
            Some(previous) => {
                self.state.current_step = previous;
                self.commit()?;
                Ok(Some(previous))
            }
            None => {
                self.state.selected_provider = None;
                self.commit()?;
                Ok(None)
            }
        }
    }

    pub fn jump_to(&mut self, step: WizardStep) -> Result<()> {
        if step > self.state.current_step {
            return Err(WorkflowError::state(format!(
                "Step {} has not been reached yet",
                step.number()
            )));
        }
        self.state.current_step = step;
        self.commit()
    }

    pub fn route(&self) -> String {
        let mut route = ROUTE_ROOT.to_string();
        if let Some(provider) = self.state.selected_provider {
            route.push('/');
            route.push_str(provider.as_str());
            if self.state.current_step > WizardStep::Connection {
                route.push('/');
                route.push_str(self.state.current_step.path());
            }
        }
        route
    }

    /// 從路徑還原供應商與步驟，無法辨識的部分忽略
    pub fn apply_route(&mut self, path: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let Some(root) = parts.iter().position(|p| *p == "work-flow") else {
            return Ok(());
        };
        let Some(provider) = parts.get(root + 1).and_then(|p| p.parse::<ProviderId>().ok()) else {
            return Ok(());
        };

        self.state.selected_provider = Some(provider);
        self.state.current_step = parts
            .get(root + 2)
            .and_then(|p| WizardStep::from_path(p))
            .unwrap_or(WizardStep::Connection);
        self.commit()
    }

    pub fn reset(&mut self) -> Result<()> {
        tracing::info!("🔄 Resetting workflow");
        self.state = WorkflowState::default();
        self.deployments.clear();
        self.store.clear_state()
    }

    // ── Step 5: deploy ───────────────────────────────────────────────────

    pub fn deploy_request(&self) -> Result<DeployRequest> {
        let provider = self.require_provider()?;
        Ok(DeployRequest {
            provider,
            region: self.state.form_data.region.clone(),
            modules: self.state.selected_modules.clone(),
            module_config: self.state.module_config.clone(),
            account: self.state.selected_account.clone(),
            credentials: Credentials::from(&self.state.form_data),
        })
    }

    pub async fn deploy<F>(
        &mut self,
        acknowledged: bool,
        settings: PollSettings,
        on_update: F,
    ) -> Result<DeployOutcome>
    where
        F: FnMut(&[String]),
    {
        if self.state.current_step != WizardStep::Create {
            return Err(WorkflowError::state("Advance to the Create step before deploying"));
        }
        if !acknowledged {
            return Err(WorkflowError::validation(
                "You must accept responsibility for the deployed resources' costs (--agree)",
            ));
        }
        if self.state.selected_modules.is_empty() {
            return Err(WorkflowError::validation("No module selected"));
        }

        let request = self.deploy_request()?;
        self.state.deployment_logs.clear();
        self.state.is_created = false;

        let submitted = DeploymentRunner::new(&self.api, settings.clone())
            .submit(&request)
            .await;
        let deployment_id = match submitted {
            Ok(SubmitOutcome::Accepted(id)) => id,
            Ok(SubmitOutcome::Rejected(message)) => {
                self.state.deployment_logs = vec![format!("❌ Deploy failed: {}", message)];
                self.commit()?;
                return Ok(DeployOutcome::Rejected(message));
            }
            Err(e) => {
                self.state.deployment_logs = vec![format!("❌ Network error: {}", e)];
                self.commit()?;
                return Err(e);
            }
        };

        self.state.last_deployment_id = Some(deployment_id.clone());
        self.commit()?;

        let PollResult { status, logs, .. } = DeploymentRunner::new(&self.api, settings)
            .poll_logs(&deployment_id, on_update)
            .await?;
        self.state.deployment_logs = logs;
        self.state.is_created = status == PollStatus::Completed;
        self.commit()?;

        Ok(DeployOutcome::Finished {
            deployment_id,
            status,
        })
    }
}

pub fn sort_for_listing(deployments: &mut [Deployment]) {
    deployments.sort_by(|a, b| {
        b.is_ecr()
            .cmp(&a.is_ecr())
            .then_with(|| b.created_millis().cmp(&a.created_millis()))
    });
}
