use crate::core::StateStore;
use crate::domain::model::Session;
use crate::domain::state::WorkflowState;
use crate::utils::error::Result;
use std::fs;
use std::path::PathBuf;

pub const STATE_FILE: &str = "workflow_state.json";
pub const SESSION_FILE: &str = "user.json";

/// 以 JSON 檔案保存精靈狀態與登入 session
#[derive(Debug, Clone)]
pub struct FileStateStore {
    base_path: PathBuf,
}

impl FileStateStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn file(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    fn read_file(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let full_path = self.file(name);
        if !full_path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(full_path)?))
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let full_path = self.file(name);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    fn remove_file(&self, name: &str) -> Result<()> {
        let full_path = self.file(name);
        if full_path.exists() {
            fs::remove_file(full_path)?;
        }
        Ok(())
    }

    /// 寫入 session（通常由登入流程建立）
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_vec_pretty(session)?;
        self.write_file(SESSION_FILE, &data)
    }
}

impl StateStore for FileStateStore {
    fn load_state(&self) -> Result<Option<WorkflowState>> {
        let Some(data) = self.read_file(STATE_FILE)? else {
            return Ok(None);
        };

        match serde_json::from_slice(&data) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                tracing::warn!("⚠️ Ignoring unreadable {}: {}", STATE_FILE, e);
                Ok(None)
            }
        }
    }

    fn save_state(&self, state: &WorkflowState) -> Result<()> {
        let data = serde_json::to_vec_pretty(state)?;
        self.write_file(STATE_FILE, &data)
    }

    fn clear_state(&self) -> Result<()> {
        self.remove_file(STATE_FILE)
    }

    /// 無法解析或 token 無效時移除檔案並回傳 None
    fn load_session(&self) -> Result<Option<Session>> {
        let Some(data) = self.read_file(SESSION_FILE)? else {
            return Ok(None);
        };

        match serde_json::from_slice::<Session>(&data) {
            Ok(session) if session.bearer_token().is_some() => Ok(Some(session)),
            Ok(_) => {
                tracing::warn!("🔒 Stored session has no usable token");
                self.remove_file(SESSION_FILE)?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("🔒 Invalid session file: {}", e);
                self.remove_file(SESSION_FILE)?;
                Ok(None)
            }
        }
    }

    fn clear_session(&self) -> Result<()> {
        self.remove_file(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ProviderId, WizardStep};
    use tempfile::TempDir;

    #[test]
    fn test_state_round_trip_creates_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("nested"));
        assert!(store.load_state().unwrap().is_none());

        let state = WorkflowState {
            selected_provider: Some(ProviderId::Azure),
            current_step: WizardStep::Configure,
            ..Default::default()
        };
        store.save_state(&state).unwrap();
        assert_eq!(store.load_state().unwrap(), Some(state));

        store.clear_state().unwrap();
        assert!(store.load_state().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_state_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STATE_FILE), "{not json").unwrap();
        let store = FileStateStore::new(dir.path());
        assert!(store.load_state().unwrap().is_none());
    }

    #[test]
    fn test_placeholder_tokens_remove_the_session() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path());

        for token in ["", "undefined", "null"] {
            store
                .save_session(&Session {
                    token: Some(token.to_string()),
                })
                .unwrap();
            assert!(store.load_session().unwrap().is_none());
            assert!(!dir.path().join(SESSION_FILE).exists());
        }

        store
            .save_session(&Session {
                token: Some("abc".to_string()),
            })
            .unwrap();
        assert_eq!(
            store.load_session().unwrap().unwrap().bearer_token(),
            Some("abc")
        );
    }
}
