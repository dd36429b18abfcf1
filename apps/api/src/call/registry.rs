use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::call::session::CallHandle;

/// Closed sessions stay readable this long.
pub const CLOSED_RETENTION: Duration = Duration::from_secs(10 * 60);
/// Sessions nobody closed are dropped after this long.
pub const MAX_SESSION_AGE: Duration = Duration::from_secs(2 * 60 * 60);

/// Live call sessions by id. Dropping a handle from here closes the session's
/// input channel, which ends its driver task.
#[derive(Clone, Default)]
pub struct CallRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, CallHandle>>>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: CallHandle) {
        self.sessions.write().await.insert(handle.id(), handle);
    }

    pub async fn get(&self, id: Uuid) -> Option<CallHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Removes sessions closed for longer than the retention window, and any
    /// session older than `MAX_SESSION_AGE`. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| {
            let expired_closed = handle
                .closed_since()
                .is_some_and(|since| now.duration_since(since) > CLOSED_RETENTION);
            let too_old = now.duration_since(handle.created_at()) > MAX_SESSION_AGE;
            !(expired_closed || too_old)
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!("Swept {removed} call sessions");
        }
        removed
    }
}
