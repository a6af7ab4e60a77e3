use crate::domain::model::{
    Account, FormData, ModuleConfig, PricingTable, ProviderId, Vpc, WizardStep,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 完整的精靈狀態，每次變更後寫回本機儲存，重新啟動時還原
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowState {
    pub selected_provider: Option<ProviderId>,
    pub current_step: WizardStep,
    pub selected_modules: Vec<String>,
    pub form_data: FormData,
    pub module_config: BTreeMap<String, ModuleConfig>,
    pub is_created: bool,
    pub using_existing_account: bool,
    pub selected_account: Option<Account>,
    pub connected_accounts: Vec<Account>,
    pub vpcs: Vec<Vpc>,
    pub form_valid: bool,
    pub module_valid: bool,
    pub estimated_cost: f64,
    pub dynamic_pricing: PricingTable,
    pub iac_code: String,
    pub deployment_logs: Vec<String>,
    pub last_deployment_id: Option<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            selected_provider: None,
            current_step: WizardStep::Connection,
            selected_modules: Vec::new(),
            form_data: FormData::default(),
            module_config: BTreeMap::new(),
            is_created: false,
            using_existing_account: false,
            selected_account: None,
            connected_accounts: Vec::new(),
            vpcs: Vec::new(),
            form_valid: false,
            module_valid: false,
            estimated_cost: 0.0,
            dynamic_pricing: PricingTable::new(),
            iac_code: String::new(),
            deployment_logs: Vec::new(),
            last_deployment_id: None,
        }
    }
}

impl WorkflowState {
    pub fn config_for(&self, module_id: &str) -> Option<&ModuleConfig> {
        self.module_config.get(module_id)
    }

    pub fn account_backend_id(&self) -> Option<&str> {
        self.selected_account.as_ref().map(|a| a.id.as_str())
    }
}
