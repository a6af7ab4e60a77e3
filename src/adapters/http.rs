use crate::domain::model::{Account, DeployRequest, Deployment, PricingTable, Vpc};
use crate::domain::ports::{AwsCredentials, CloudApi, CredentialCheck, StateStore};
use crate::utils::error::{Result, WorkflowError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct StatusReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidateReply {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VpcReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    vpcs: Vec<Vpc>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PricingReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    pricing: PricingTable,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeploymentsReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    deployments: Vec<Deployment>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    deployment_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// 錯誤回應本體，欄位名稱各端點不一
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn ensure_success(endpoint: &str, success: bool, error: Option<String>, fallback: &str) -> Result<()> {
    if success {
        Ok(())
    } else {
        Err(WorkflowError::BackendError {
            endpoint: endpoint.to_string(),
            message: error.unwrap_or_else(|| fallback.to_string()),
        })
    }
}

/// 後端 REST API 客戶端，token 取自本機 session
pub struct HttpCloudApi<S: StateStore> {
    client: Client,
    base_url: String,
    timeout: Duration,
    session: S,
}

impl<S: StateStore> HttpCloudApi<S> {
    pub fn new(base_url: &str, timeout: Duration, session: S) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| WorkflowError::InvalidConfigValueError {
            field: "api.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            timeout,
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer_token(&self) -> Result<String> {
        let token = self
            .session
            .load_session()?
            .and_then(|s| s.bearer_token().map(str::to_string));

        match token {
            Some(token) => Ok(token),
            None => {
                self.session.clear_session()?;
                Err(WorkflowError::SessionExpired {
                    message: "No valid session token. Please log in again.".to_string(),
                })
            }
        }
    }

    /// 加上 Bearer token 與逾時後送出；401 會清除 session
    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response> {
        let token = self.bearer_token()?;
        tracing::debug!("📡 {}", endpoint);

        let response = request
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("🔒 {} rejected the session token", endpoint);
            self.session.clear_session()?;
            return Err(WorkflowError::SessionExpired {
                message: "Session expired. Please log in again.".to_string(),
            });
        }

        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let detail = body.error.or(body.message).unwrap_or_else(|| "no details".to_string());
            tracing::error!("❌ {} failed with HTTP {}: {}", endpoint, status, detail);
            return Err(WorkflowError::BackendError {
                endpoint: endpoint.to_string(),
                message: format!("HTTP {}: {}", status.as_u16(), detail),
            });
        }

        Ok(response)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.url(path));
        Ok(self.send(request, path).await?.json().await?)
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
        B: Serialize + Sync + ?Sized,
    {
        let request = self.client.post(self.url(path)).json(body);
        Ok(self.send(request, path).await?.json().await?)
    }
}

#[async_trait]
impl<S: StateStore> CloudApi for HttpCloudApi<S> {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.get_json("/api/aws/get-aws-accounts").await
    }

    async fn validate_credentials(&self, credentials: &AwsCredentials) -> Result<CredentialCheck> {
        let reply: ValidateReply = self
            .post_json("/api/aws/validate-credentials", credentials)
            .await?;

        if reply.valid {
            Ok(CredentialCheck::Valid)
        } else {
            Ok(CredentialCheck::Invalid(
                reply.error.unwrap_or_else(|| "Invalid credentials".to_string()),
            ))
        }
    }

    async fn connect_account(&self, credentials: &AwsCredentials) -> Result<()> {
        let endpoint = "/api/aws/connect";
        let reply: StatusReply = self.post_json(endpoint, credentials).await?;
        ensure_success(endpoint, reply.success, reply.error, "Failed to save account")
    }

    async fn list_vpcs(&self, account_id: &str) -> Result<Vec<Vpc>> {
        let endpoint = "/api/aws/get-vpcs";
        let reply: VpcReply = self
            .post_json(endpoint, &json!({ "accountId": account_id }))
            .await?;
        ensure_success(endpoint, reply.success, reply.error, "Failed to load VPCs")?;
        Ok(reply.vpcs)
    }

    async fn fetch_pricing(
        &self,
        region: &str,
        modules: &[String],
        account_id: &str,
    ) -> Result<PricingTable> {
        let endpoint = "/api/aws/pricing";
        let reply: PricingReply = self
            .post_json(
                endpoint,
                &json!({ "region": region, "modules": modules, "accountId": account_id }),
            )
            .await?;
        ensure_success(endpoint, reply.success, reply.error, "Pricing unavailable")?;
        Ok(reply.pricing)
    }

    async fn list_deployments(&self, account_id: &str) -> Result<Vec<Deployment>> {
        let endpoint = "/api/terraform/resources";
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("accountId", account_id)]);
        let reply: DeploymentsReply = self.send(request, endpoint).await?.json().await?;
        ensure_success(endpoint, reply.success, reply.error, "Failed to load deployments")?;

        Ok(reply
            .deployments
            .into_iter()
            .filter(|d| d.account_id == account_id)
            .collect())
    }

    async fn list_all_deployments(&self) -> Result<Vec<Deployment>> {
        let endpoint = "/api/terraform/resources";
        let reply: DeploymentsReply = self.get_json(endpoint).await?;
        ensure_success(endpoint, reply.success, reply.error, "Failed to load deployments")?;
        Ok(reply.deployments)
    }

    async fn deploy(&self, request: &DeployRequest) -> Result<String> {
        let endpoint = "/api/terraform/deploy";
        let reply: DeployReply = self.post_json(endpoint, request).await?;
        ensure_success(endpoint, reply.success, reply.error, "Unknown error")?;

        reply.deployment_id.ok_or_else(|| WorkflowError::BackendError {
            endpoint: endpoint.to_string(),
            message: "Response did not include a deployment id".to_string(),
        })
    }

    async fn deployment_logs(&self, deployment_id: &str) -> Result<String> {
        let endpoint = format!("/api/terraform/logs/{}", deployment_id);
        let request = self.client.get(self.url(&endpoint));
        Ok(self.send(request, &endpoint).await?.text().await?)
    }

    async fn destroy_deployment(&self, deployment_id: &str) -> Result<()> {
        let endpoint = "/api/terraform/destroy-deployment";
        let reply: StatusReply = self
            .post_json(endpoint, &json!({ "deploymentId": deployment_id }))
            .await?;
        ensure_success(endpoint, reply.success, reply.error, "Destroy failed")
    }
}
