use crate::domain::model::DeployRequest;
use crate::domain::ports::CloudApi;
use crate::utils::error::{Result, WorkflowError};
use std::time::Duration;

const APPLY_COMPLETE: &str = "Apply complete";
const APPLY_ERROR: &str = "Error";

#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    pub error_backoff: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            error_backoff: Duration::from_millis(2000),
            max_attempts: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Completed,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted(String),
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollResult {
    pub status: PollStatus,
    pub logs: Vec<String>,
    pub attempts: u32,
}

/// 部署送出與日誌輪詢
pub struct DeploymentRunner<'a, A: CloudApi> {
    api: &'a A,
    settings: PollSettings,
}

impl<'a, A: CloudApi> DeploymentRunner<'a, A> {
    pub fn new(api: &'a A, settings: PollSettings) -> Self {
        Self { api, settings }
    }

    /// 後端回覆 success=false 時回傳 Rejected，其他錯誤照常往上拋
    pub async fn submit(&self, request: &DeployRequest) -> Result<SubmitOutcome> {
        tracing::info!(
            "🚀 Submitting deployment: provider={}, region={}, modules={:?}",
            request.provider,
            request.region,
            request.modules
        );

        match self.api.deploy(request).await {
            Ok(deployment_id) => {
                tracing::info!("✅ Deployment accepted: {}", deployment_id);
                Ok(SubmitOutcome::Accepted(deployment_id))
            }
            Err(WorkflowError::BackendError { message, .. }) => {
                tracing::warn!("❌ Deployment rejected: {}", message);
                Ok(SubmitOutcome::Rejected(message))
            }
            Err(e) => Err(e),
        }
    }

    /// 會話過期時停止輪詢並回傳錯誤，其他讀取失敗則稍候重試
    pub async fn poll_logs<F>(&self, deployment_id: &str, mut on_update: F) -> Result<PollResult>
    where
        F: FnMut(&[String]),
    {
        let mut logs = Vec::new();

        for attempt in 1..=self.settings.max_attempts {
            let delay = match self.api.deployment_logs(deployment_id).await {
                Ok(text) => {
                    logs = stamp_lines(&text);
                    on_update(&logs);

                    if text.contains(APPLY_COMPLETE) {
                        tracing::info!("🎉 Deployment {} finished after {} polls", deployment_id, attempt);
                        return Ok(PollResult {
                            status: PollStatus::Completed,
                            logs,
                            attempts: attempt,
                        });
                    }
                    if text.contains(APPLY_ERROR) {
                        tracing::error!("❌ Deployment {} reported an error", deployment_id);
                        return Ok(PollResult {
                            status: PollStatus::Failed,
                            logs,
                            attempts: attempt,
                        });
                    }
                    self.settings.interval
                }
                Err(e @ WorkflowError::SessionExpired { .. }) => {
                    tracing::error!("🔒 Stopped polling {}: {}", deployment_id, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("⚠️ Log poll {} for {} failed: {}", attempt, deployment_id, e);
                    self.settings.error_backoff
                }
            };

            if attempt < self.settings.max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::warn!(
            "⏱️ Gave up polling {} after {} attempts",
            deployment_id,
            self.settings.max_attempts
        );
        Ok(PollResult {
            status: PollStatus::TimedOut,
            logs,
            attempts: self.settings.max_attempts,
        })
    }
}

/// 去掉空白行，每行加上 `[HH:MM:SS]` 時間戳
pub fn stamp_lines(text: &str) -> Vec<String> {
    let stamp = chrono::Utc::now().format("%H:%M:%S").to_string();
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("[{}] {}", stamp, line))
        .collect()
}
