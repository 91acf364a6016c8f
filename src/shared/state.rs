use std::sync::Arc;

use uuid::Uuid;

use crate::config::AppConfig;
use crate::session::{Flash, FlashKind, SessionManager};
use crate::shared::utils::DbPool;

pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub sessions: Arc<tokio::sync::Mutex<SessionManager>>,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig) -> Self {
        Self {
            conn,
            config,
            sessions: Arc::new(tokio::sync::Mutex::new(SessionManager::new())),
        }
    }

    pub async fn flash(&self, session_id: Uuid, kind: FlashKind, message: impl Into<String>) {
        self.sessions
            .lock()
            .await
            .push_flash(session_id, kind, message);
    }

    pub async fn take_flashes(&self, session_id: Uuid) -> Vec<Flash> {
        self.sessions.lock().await.take_flashes(session_id)
    }
}
