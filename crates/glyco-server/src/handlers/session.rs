//! Session handlers - login by name, session info, logout
//!
//! A session remembers who is logged in and their most recent assessment.
//! Sessions live only in memory and are dropped after 30 minutes without
//! activity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{AppError, AppState};
use glyco_core::models::DEFAULT_AGE;
use glyco_core::{Assessment, UserProfile};

/// Session timeout (30 minutes of inactivity)
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A logged-in user
#[derive(Debug, Clone)]
pub struct UserSession {
    pub profile: UserProfile,
    /// Result of the most recent submission in this session
    pub last_assessment: Option<Assessment>,
    pub created_at: Instant,
    pub last_activity: Instant,
}

impl UserSession {
    fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            last_assessment: None,
            created_at: Instant::now(),
            last_activity: Instant::now(),
        }
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() >= timeout
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

/// In-memory session manager
#[derive(Debug)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, UserSession>>,
    counter: AtomicU64,
    timeout: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_timeout(SESSION_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            counter: AtomicU64::new(0),
            timeout,
        }
    }

    /// Create a new session and return its ID
    pub async fn create(&self, profile: UserProfile) -> String {
        // Unique per process: timestamp + counter, hashed so IDs are opaque
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut hasher = Sha256::new();
        hasher.update(timestamp.to_le_bytes());
        hasher.update(seq.to_le_bytes());
        hasher.update(profile.key.as_bytes());
        let session_id = format!("ses_{}", &hex::encode(hasher.finalize())[..24]);

        let mut sessions = self.sessions.write().await;

        // Clean up expired sessions while we're here
        let timeout = self.timeout;
        sessions.retain(|_, s| !s.is_expired(timeout));

        sessions.insert(session_id.clone(), UserSession::new(profile));
        session_id
    }

    /// Look up a live session, refreshing its activity time
    pub async fn get(&self, session_id: &str) -> Option<UserSession> {
        let mut sessions = self.sessions.write().await;
        let expired = sessions.get(session_id)?.is_expired(self.timeout);
        if expired {
            sessions.remove(session_id);
            return None;
        }
        sessions.get_mut(session_id).map(|s| {
            s.touch();
            s.clone()
        })
    }

    /// Remember the latest assessment for a session
    pub async fn record_assessment(&self, session_id: &str, assessment: Assessment) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.last_assessment = Some(assessment);
                session.touch();
                true
            }
            None => false,
        }
    }

    /// Delete a session
    pub async fn remove(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id).is_some()
    }

    /// Number of sessions that have not expired
    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|s| !s.is_expired(self.timeout))
            .count()
    }
}

/// Resolve a session ID to its user, or 404
pub(crate) async fn require_session(
    state: &AppState,
    session_id: &str,
) -> Result<UserSession, AppError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::not_found("Session not found or expired"))
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    #[serde(default = "default_age")]
    pub age: u32,
}

fn default_age() -> u32 {
    DEFAULT_AGE
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub user: String,
    pub age: u32,
}

/// Session info response
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub user: String,
    pub age: u32,
    /// Number of entries in the user's history
    pub entry_count: usize,
    pub last_assessment: Option<Assessment>,
    pub created_at_secs_ago: u64,
}

/// POST /api/session - Log in by name
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    let Json(req) = payload.map_err(|e| AppError::bad_request(&e.body_text()))?;

    let profile = UserProfile::new(&req.name, req.age).map_err(AppError::from_core)?;
    let user = profile.name.clone();
    let age = profile.age;

    let session_id = state.sessions.create(profile).await;
    info!(user = %user, "User logged in");
    debug!(session_id = %session_id, "Created session");

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            session_id,
            user,
            age,
        }),
    ))
}

/// GET /api/session/:id - Current user and last assessment
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = require_session(&state, &session_id).await?;
    let entry_count = state.agent.history(&session.profile).len();

    Ok(Json(SessionView {
        session_id,
        user: session.profile.name,
        age: session.profile.age,
        entry_count,
        last_assessment: session.last_assessment,
        created_at_secs_ago: session.created_at.elapsed().as_secs(),
    }))
}

/// DELETE /api/session/:id - Log out
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&session_id).await {
        debug!(session_id = %session_id, "Session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Session not found or expired"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> UserProfile {
        UserProfile::new(name, 40).unwrap()
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let manager = SessionManager::new();
        let id = manager.create(profile("dana")).await;
        assert!(id.starts_with("ses_"));
        assert_eq!(id.len(), 28);

        let session = manager.get(&id).await.unwrap();
        assert_eq!(session.profile.name, "dana");
        assert!(session.last_assessment.is_none());
        assert_eq!(manager.active_count().await, 1);

        assert!(manager.remove(&id).await);
        assert!(manager.get(&id).await.is_none());
        assert!(!manager.remove(&id).await);
    }

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let manager = SessionManager::new();
        let a = manager.create(profile("dana")).await;
        let b = manager.create(profile("dana")).await;
        assert_ne!(a, b);
        assert_eq!(manager.active_count().await, 2);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_dropped() {
        let manager = SessionManager::with_timeout(Duration::ZERO);
        let id = manager.create(profile("dana")).await;
        assert!(manager.get(&id).await.is_none());
        assert_eq!(manager.active_count().await, 0);
    }
}
