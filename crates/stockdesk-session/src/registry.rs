use std::{collections::HashMap, fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockdesk_core::{AlertCounts, AlertSnapshot};
use tokio::{sync::RwLock, time::Instant};
use tracing::debug;
use uuid::Uuid;

use crate::recorder::TrendRecorder;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts any non-blank token the client presents.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sessions untouched for this long are dropped along with their trend.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

struct Session {
    recorder: TrendRecorder,
    last_seen: Instant,
}

/// One independent [`TrendRecorder`] per live session.
///
/// A session ends when the client ends it or when it has been idle for
/// longer than `idle_after`; idle sessions are swept whenever a session is
/// touched.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
    idle_after: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE)
    }
}

impl SessionRegistry {
    pub fn new(idle_after: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_after,
        }
    }

    pub async fn record_snapshot(
        &self,
        session: &SessionId,
        counts: AlertCounts,
        now: DateTime<Utc>,
    ) {
        let mut sessions = self.sessions.write().await;
        let seen = self.sweep(&mut sessions);
        sessions
            .entry(session.clone())
            .or_insert_with(|| Session {
                recorder: TrendRecorder::default(),
                last_seen: seen,
            })
            .touch(seen)
            .record_snapshot(counts, now);
    }

    /// Copy of the session's trend, oldest first. Unknown sessions have an
    /// empty trend.
    pub async fn trend(&self, session: &SessionId) -> Vec<AlertSnapshot> {
        let mut sessions = self.sessions.write().await;
        let seen = self.sweep(&mut sessions);
        sessions
            .get_mut(session)
            .map(|entry| entry.touch(seen).trend().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn reset(&self, session: &SessionId) {
        let mut sessions = self.sessions.write().await;
        let seen = self.sweep(&mut sessions);
        if let Some(entry) = sessions.get_mut(session) {
            entry.touch(seen).reset();
        }
    }

    /// Drops the session and its trend.
    pub async fn end(&self, session: &SessionId) {
        if self.sessions.write().await.remove(session).is_some() {
            debug!(%session, "session ended");
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn sweep(&self, sessions: &mut HashMap<SessionId, Session>) -> Instant {
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_after);
        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!(dropped, "idle sessions dropped");
        }
        now
    }
}

impl Session {
    fn touch(&mut self, now: Instant) -> &mut TrendRecorder {
        self.last_seen = now;
        &mut self.recorder
    }
}
