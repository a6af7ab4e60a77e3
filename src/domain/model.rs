use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Aws,
    Gcp,
    Azure,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Aws => "aws",
            ProviderId::Gcp => "gcp",
            ProviderId::Azure => "azure",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(ProviderId::Aws),
            "gcp" => Ok(ProviderId::Gcp),
            "azure" => Ok(ProviderId::Azure),
            other => Err(WorkflowError::InvalidConfigValueError {
                field: "provider".to_string(),
                value: other.to_string(),
                reason: "Supported providers: aws, gcp, azure".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    pub id: ProviderId,
    pub name: &'static str,
    pub description: &'static str,
    pub regions: &'static [&'static str],
}

impl Provider {
    pub fn default_region(&self) -> &'static str {
        self.regions.first().copied().unwrap_or("us-east-1")
    }
}

/// 可選的雲端資源模組（EC2、S3、VPC ...）
#[derive(Debug, Clone, PartialEq)]
pub struct CloudModule {
    pub id: &'static str,
    pub name: &'static str,
    pub price: &'static [(&'static str, f64)],
    pub requirements: &'static [&'static str],
    pub description: &'static str,
    pub iac_resources: &'static [&'static str],
}

impl CloudModule {
    pub fn static_price(&self, key: &str) -> Option<f64> {
        self.price.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

/// 每個模組的自由格式設定（欄位名稱 → JSON 值）
pub type ModuleConfig = Map<String, Value>;

/// 模組 id → 價格 key → 價格，來自後端即時報價
pub type PricingTable = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormData {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub service_account_json: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
}

impl Default for FormData {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            region: "us-east-1".to_string(),
            service_account_json: String::new(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            subscription_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub account_id: String,
    #[serde(default)]
    pub aws_region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vpc {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cidr_block: Option<String>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    #[serde(default)]
    pub security_groups: Vec<SecurityGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedResource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl DeployedResource {
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("unnamed")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub deployment_id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub modules: Vec<String>,
    /// 後端可能給毫秒數字或 RFC 3339 字串
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub resources: Vec<DeployedResource>,
    #[serde(default)]
    pub module_config: BTreeMap<String, ModuleConfig>,
}

impl Deployment {
    pub fn is_ecr(&self) -> bool {
        self.modules.iter().any(|m| m == "ecr")
    }

    pub fn created_millis(&self) -> Option<i64> {
        match self.created_at.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
                .map(|t| t.timestamp_millis())
                .ok()
                .or_else(|| s.trim().parse().ok()),
            _ => None,
        }
    }

    pub fn created_label(&self) -> String {
        let created = self
            .created_millis()
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis);
        match created {
            Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "-".to_string(),
        }
    }

    /// 以第一個模組的設定命名，沒有設定時退回預設名稱
    pub fn display_name(&self) -> String {
        let Some(first) = self.modules.first() else {
            return "Untitled Resource".to_string();
        };
        let Some(config) = self.module_config.get(first) else {
            return format!("Untitled {}", first);
        };
        let field = |key: &str| {
            config
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };
        let named = |key: &str, fallback: &str| field(key).unwrap_or(fallback).to_string();

        match first.as_str() {
            "vpc" => named("name", "My VPC"),
            "s3" => named("name", "My Bucket"),
            "dynamodb" => named("name", "My Table"),
            "ec2" => named("name", "My EC2 Instance"),
            "lambda" => named("functionName", "My Lambda Function"),
            "ecr" => named("name", "My ECR Repository"),
            "sns" => named("name", "My SNS Topic"),
            "kms" => named("alias", "My KMS Key"),
            "iam" => named("name", "My IAM Role"),
            "efs" => named("name", "My EFS Data"),
            "lb" => named("name", "My LoadBalancer"),
            "route53" => field("domainName")
                .or_else(|| field("recordName"))
                .unwrap_or("My DNS Record")
                .to_string(),
            "cloudwatch" => named("logGroupName", "My Log Group"),
            "cloudfront" => named("name", "My cloudfront"),
            "cloudtrail" => named("name", "My cloudtrail"),
            other => named("name", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub service_account_json: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
}

impl From<&FormData> for Credentials {
    fn from(form: &FormData) -> Self {
        Self {
            access_key: form.access_key.clone(),
            secret_key: form.secret_key.clone(),
            service_account_json: form.service_account_json.clone(),
            tenant_id: form.tenant_id.clone(),
            client_id: form.client_id.clone(),
            client_secret: form.client_secret.clone(),
            subscription_id: form.subscription_id.clone(),
        }
    }
}

/// 送往 `/api/terraform/deploy` 的請求內容
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub provider: ProviderId,
    pub region: String,
    pub modules: Vec<String>,
    pub module_config: BTreeMap<String, ModuleConfig>,
    pub account: Option<Account>,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
}

impl Session {
    /// 空字串、"undefined"、"null" 都視為沒有 token
    pub fn bearer_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != "undefined" && *t != "null")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    Connection = 1,
    ExistingResources = 2,
    Modules = 3,
    Configure = 4,
    Create = 5,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Connection,
        WizardStep::ExistingResources,
        WizardStep::Modules,
        WizardStep::Configure,
        WizardStep::Create,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            WizardStep::Connection => "Connection",
            WizardStep::ExistingResources => "Existing Resources",
            WizardStep::Modules => "Modules",
            WizardStep::Configure => "Configure",
            WizardStep::Create => "Create",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            WizardStep::Connection => "connection",
            WizardStep::ExistingResources => "existing-resources",
            WizardStep::Modules => "module",
            WizardStep::Configure => "configure",
            WizardStep::Create => "create",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.path() == path)
    }

    pub fn next(self) -> Option<Self> {
        Self::try_from(self.number() + 1).ok()
    }

    pub fn previous(self) -> Option<Self> {
        Self::try_from(self.number().saturating_sub(1)).ok()
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|s| s.number() == value)
            .ok_or_else(|| format!("unknown workflow step {}", value))
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}
