//! Optional remote mirror for settings and the session log.
//!
//! Present only when a remote identity is configured. Local state is
//! authoritative: pushes happen after the synchronous local write and are
//! never awaited by the engine; a failed push is warned and dropped, never
//! rolled back into local state.
//!
//! Reconciliation runs once when the identity is established: an empty
//! remote receives the local data (migration), a non-empty remote wins and
//! replaces the local copy. Every sync after that only pushes sessions the
//! remote is missing; the local log is never replaced again.

use std::collections::HashSet;

use crate::error::{CoreError, SyncError};
use crate::history::FocusSession;
use crate::storage::{Database, SyncConfig};
use crate::timer::TimerSettings;

/// Who and where to mirror to.
#[derive(Debug, Clone)]
pub struct RemoteIdentity {
    pub base_url: String,
    pub user_id: String,
    pub token: Option<String>,
}

impl RemoteIdentity {
    /// Build from config; `None` when sync is not configured or the
    /// configured base URL does not parse.
    pub fn from_config(sync: &SyncConfig) -> Option<Self> {
        let base_url = sync.base_url.as_deref()?;
        let user_id = sync.user_id.clone()?;
        let parsed = url::Url::parse(base_url).ok()?;
        Some(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            user_id,
            token: sync.token.clone(),
        })
    }
}

/// Outcome of session reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Remote had no records; local log was uploaded.
    UploadedLocal(usize),
    /// Remote had records; they replaced the local log.
    RemoteWins(usize),
}

/// JSON-over-HTTP client for the mirror.
#[derive(Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    identity: RemoteIdentity,
}

impl RemoteStore {
    pub fn new(identity: RemoteIdentity) -> Self {
        Self {
            client: reqwest::Client::new(),
            identity,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/users/{}/{}",
            self.identity.base_url, self.identity.user_id, path
        )
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.identity.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::BadStatus { status, body })
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub async fn fetch_sessions(&self) -> Result<Vec<FocusSession>, SyncError> {
        let response = self
            .authed(self.client.get(self.url("sessions")))
            .send()
            .await?;
        let response = Self::expect_success(response).await?;
        response
            .json::<Vec<FocusSession>>()
            .await
            .map_err(|e| SyncError::InvalidPayload(e.to_string()))
    }

    pub async fn upload_sessions(&self, sessions: &[FocusSession]) -> Result<(), SyncError> {
        let response = self
            .authed(self.client.post(self.url("sessions")))
            .json(sessions)
            .send()
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }

    pub async fn push_session(&self, session: &FocusSession) -> Result<(), SyncError> {
        let response = self
            .authed(
                self.client
                    .put(self.url(&format!("sessions/{}", session.id))),
            )
            .json(session)
            .send()
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }

    /// Mirror one session in the background. Never awaited; failure is
    /// warned and dropped. Requires a running tokio runtime.
    pub fn push_session_detached(&self, session: FocusSession) {
        let store = self.clone();
        tokio::spawn(async move {
            if let Err(e) = store.push_session(&session).await {
                eprintln!("Warning: failed to mirror session to remote: {e}");
            }
        });
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub async fn fetch_settings(&self) -> Result<Option<TimerSettings>, SyncError> {
        let response = self
            .authed(self.client.get(self.url("settings")))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(response).await?;
        let settings = response
            .json::<TimerSettings>()
            .await
            .map_err(|e| SyncError::InvalidPayload(e.to_string()))?;
        settings
            .validate()
            .map_err(|e| SyncError::InvalidPayload(e.to_string()))?;
        Ok(Some(settings))
    }

    pub async fn push_settings(&self, settings: &TimerSettings) -> Result<(), SyncError> {
        let response = self
            .authed(self.client.put(self.url("settings")))
            .json(settings)
            .send()
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }

    /// Mirror settings in the background, best-effort.
    pub fn push_settings_detached(&self, settings: TimerSettings) {
        let store = self.clone();
        tokio::spawn(async move {
            if let Err(e) = store.push_settings(&settings).await {
                eprintln!("Warning: failed to mirror settings to remote: {e}");
            }
        });
    }

    // ── Reconcile ────────────────────────────────────────────────────

    /// Reconcile the session log at identity establishment.
    pub async fn reconcile_sessions(&self, db: &Database) -> Result<ReconcileOutcome, CoreError> {
        let remote = self.fetch_sessions().await.map_err(CoreError::Sync)?;
        if remote.is_empty() {
            let local = db.list_sessions(None)?;
            self.upload_sessions(&local).await.map_err(CoreError::Sync)?;
            Ok(ReconcileOutcome::UploadedLocal(local.len()))
        } else {
            let count = remote.len();
            db.replace_sessions(&remote)?;
            Ok(ReconcileOutcome::RemoteWins(count))
        }
    }

    /// Push local sessions the remote does not have yet. For routine syncs
    /// after the one-time reconcile; leaves the local log untouched.
    pub async fn push_missing_sessions(&self, db: &Database) -> Result<usize, CoreError> {
        let remote = self.fetch_sessions().await.map_err(CoreError::Sync)?;
        let known: HashSet<uuid::Uuid> = remote.iter().map(|s| s.id).collect();
        let mut pushed = 0;
        for session in db.list_sessions(None)? {
            if !known.contains(&session.id) {
                self.push_session(&session).await.map_err(CoreError::Sync)?;
                pushed += 1;
            }
        }
        Ok(pushed)
    }

    /// Reconcile settings: returns the remote copy when it exists (remote
    /// wins, caller persists it), otherwise uploads the local copy and
    /// returns `None`.
    pub async fn reconcile_settings(
        &self,
        local: &TimerSettings,
    ) -> Result<Option<TimerSettings>, SyncError> {
        match self.fetch_settings().await? {
            Some(remote) => Ok(Some(remote)),
            None => {
                self.push_settings(local).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn identity(base_url: &str) -> RemoteIdentity {
        RemoteIdentity {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: "u1".into(),
            token: Some("secret".into()),
        }
    }

    fn session(category: &str) -> FocusSession {
        let now = Utc::now();
        FocusSession {
            id: Uuid::new_v4(),
            started_at: now - Duration::minutes(25),
            ended_at: now,
            minutes: 25,
            category: category.into(),
            linked_task_id: None,
        }
    }

    #[test]
    fn identity_requires_base_url_and_user_id() {
        let mut cfg = SyncConfig::default();
        assert!(RemoteIdentity::from_config(&cfg).is_none());
        cfg.base_url = Some("https://sync.example.com/".into());
        assert!(RemoteIdentity::from_config(&cfg).is_none());
        cfg.user_id = Some("u1".into());
        let id = RemoteIdentity::from_config(&cfg).unwrap();
        assert_eq!(id.base_url, "https://sync.example.com");
    }

    #[test]
    fn identity_rejects_unparseable_base_url() {
        let cfg = SyncConfig {
            base_url: Some("not a url".into()),
            user_id: Some("u1".into()),
            token: None,
        };
        assert!(RemoteIdentity::from_config(&cfg).is_none());
    }

    #[tokio::test]
    async fn reconcile_uploads_local_when_remote_empty() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/users/u1/sessions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let post = server
            .mock("POST", "/users/u1/sessions")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .create_async()
            .await;

        let db = Database::open_memory().unwrap();
        db.append_session(&session("local")).unwrap();

        let store = RemoteStore::new(identity(&server.url()));
        let outcome = store.reconcile_sessions(&db).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::UploadedLocal(1));

        get.assert_async().await;
        post.assert_async().await;
        // Local log untouched.
        assert_eq!(db.count_sessions().unwrap(), 1);
    }

    #[tokio::test]
    async fn reconcile_replaces_local_when_remote_has_records() {
        let remote_sessions = vec![session("remote-a"), session("remote-b")];
        let body = serde_json::to_string(&remote_sessions).unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/u1/sessions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let db = Database::open_memory().unwrap();
        db.append_session(&session("local")).unwrap();

        let store = RemoteStore::new(identity(&server.url()));
        let outcome = store.reconcile_sessions(&db).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::RemoteWins(2));

        let listed = db.list_sessions(None).unwrap();
        let categories: Vec<_> = listed.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(categories, ["remote-a", "remote-b"]);
    }

    #[tokio::test]
    async fn routine_sync_pushes_only_missing_sessions() {
        let mirrored = session("mirrored");
        let local_only = session("local-only");
        let body = serde_json::to_string(&vec![mirrored.clone()]).unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/u1/sessions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;
        let put = server
            .mock("PUT", format!("/users/u1/sessions/{}", local_only.id).as_str())
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let db = Database::open_memory().unwrap();
        db.append_session(&mirrored).unwrap();
        db.append_session(&local_only).unwrap();

        let store = RemoteStore::new(identity(&server.url()));
        assert_eq!(store.push_missing_sessions(&db).await.unwrap(), 1);
        put.assert_async().await;
        // The local log is never replaced on a routine sync.
        assert_eq!(db.count_sessions().unwrap(), 2);
    }

    #[tokio::test]
    async fn fetch_settings_maps_404_to_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/u1/settings")
            .with_status(404)
            .create_async()
            .await;

        let store = RemoteStore::new(identity(&server.url()));
        assert!(store.fetch_settings().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reconcile_settings_pushes_local_when_remote_missing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/u1/settings")
            .with_status(404)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/users/u1/settings")
            .with_status(200)
            .create_async()
            .await;

        let store = RemoteStore::new(identity(&server.url()));
        let local = TimerSettings::default();
        let adopted = store.reconcile_settings(&local).await.unwrap();
        assert!(adopted.is_none());
        put.assert_async().await;
    }

    #[tokio::test]
    async fn push_session_surfaces_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let s = session("x");
        server
            .mock("PUT", format!("/users/u1/sessions/{}", s.id).as_str())
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let store = RemoteStore::new(identity(&server.url()));
        let err = store.push_session(&s).await.unwrap_err();
        assert!(matches!(err, SyncError::BadStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn invalid_remote_settings_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/u1/settings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"work_minutes": 0}"#)
            .create_async()
            .await;

        let store = RemoteStore::new(identity(&server.url()));
        assert!(matches!(
            store.fetch_settings().await,
            Err(SyncError::InvalidPayload(_))
        ));
    }
}
