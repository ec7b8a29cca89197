use crate::{
    config::AppConfig,
    errors::CollaboratorError,
    models::{Account, Session},
};
use async_trait::async_trait;
use std::sync::Arc;

/// IdentityService
///
/// Abstract contract for the identity/session collaborator. The concrete
/// implementation talks to the BaaS account API; tests swap in a mock. All
/// methods are read-or-exchange operations on sessions the BaaS owns; this
/// service never stores credentials itself.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Exchanges a one-time provider token (`user_id`, `secret` from the OAuth
    /// callback query) for a session whose secret goes into the cookie.
    async fn create_session(
        &self,
        user_id: &str,
        secret: &str,
    ) -> Result<Session, CollaboratorError>;

    /// Resolves the account behind a session secret. Fails with
    /// `Unauthenticated` when the secret is absent, expired, or belongs to an
    /// anonymous session.
    async fn get_account(&self, session_secret: &str) -> Result<Account, CollaboratorError>;

    /// Destroys the session behind the secret. Used by logout.
    async fn delete_session(&self, session_secret: &str) -> Result<(), CollaboratorError>;
}

/// IdentityState
///
/// The shared, thread-safe handle to the identity service.
pub type IdentityState = Arc<dyn IdentityService>;

/// AppwriteIdentityClient
///
/// Concrete identity collaborator backed by the Appwrite account API. Session
/// calls authenticate with the per-request session secret header rather than
/// the server API key, so the BaaS applies its own expiry checks.
#[derive(Clone)]
pub struct AppwriteIdentityClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
}

impl AppwriteIdentityClient {
    /// new
    ///
    /// Builds the client from configuration. The passed reqwest client carries
    /// the collaborator timeout, so every call here is bounded.
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            endpoint: config.baas_endpoint.clone(),
            project_id: config.baas_project_id.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

#[async_trait]
impl IdentityService for AppwriteIdentityClient {
    /// create_session
    ///
    /// PUT /account/sessions/token — the token-exchange endpoint used by the
    /// OAuth and magic-link flows.
    async fn create_session(
        &self,
        user_id: &str,
        secret: &str,
    ) -> Result<Session, CollaboratorError> {
        let response = self
            .http
            .put(self.url("/account/sessions/token"))
            .header("X-Appwrite-Project", &self.project_id)
            .json(&serde_json::json!({ "userId": user_id, "secret": secret }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::classify_status(
                status,
                "account/sessions/token",
            ));
        }

        let session = response.json::<Session>().await?;
        Ok(session)
    }

    /// get_account
    ///
    /// GET /account, authenticated with the session secret. An anonymous
    /// session resolves to an account without an email address; the gate must
    /// treat those as unauthenticated, so they are rejected here.
    async fn get_account(&self, session_secret: &str) -> Result<Account, CollaboratorError> {
        let response = self
            .http
            .get(self.url("/account"))
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Session", session_secret)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::classify_status(status, "account"));
        }

        let account = response.json::<Account>().await?;
        if account.email.is_empty() {
            // Anonymous session: a real account record with no credentials.
            return Err(CollaboratorError::Unauthenticated);
        }
        Ok(account)
    }

    /// delete_session
    ///
    /// DELETE /account/sessions/current. A session that is already gone counts
    /// as success; logout must be idempotent from the caller's perspective.
    async fn delete_session(&self, session_secret: &str) -> Result<(), CollaboratorError> {
        let response = self
            .http
            .delete(self.url("/account/sessions/current"))
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Session", session_secret)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(CollaboratorError::classify_status(
                status,
                "account/sessions/current",
            ))
        }
    }
}

/// MockIdentityService
///
/// Identity mock used by unit and integration tests: a fixed table of
/// (secret → account) plus switches to simulate exchange failure and
/// transport errors, letting tests drive every gate branch without a network.
#[derive(Default)]
pub struct MockIdentityService {
    /// Secrets considered valid, with the account each resolves to.
    pub accounts: std::collections::HashMap<String, Account>,
    /// When set, `create_session` fails with this classification.
    pub fail_exchange: bool,
    /// When set, every call fails as a transport error.
    pub fail_transport: bool,
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn create_session(
        &self,
        user_id: &str,
        secret: &str,
    ) -> Result<Session, CollaboratorError> {
        if self.fail_transport {
            return Err(CollaboratorError::Transport("mock transport down".into()));
        }
        if self.fail_exchange {
            return Err(CollaboratorError::Unauthenticated);
        }
        Ok(Session {
            id: format!("sess-{user_id}"),
            secret: format!("secret-for-{secret}"),
            user_id: user_id.to_string(),
            expire: None,
        })
    }

    async fn get_account(&self, session_secret: &str) -> Result<Account, CollaboratorError> {
        if self.fail_transport {
            return Err(CollaboratorError::Transport("mock transport down".into()));
        }
        self.accounts
            .get(session_secret)
            .cloned()
            .ok_or(CollaboratorError::Unauthenticated)
    }

    async fn delete_session(&self, _session_secret: &str) -> Result<(), CollaboratorError> {
        if self.fail_transport {
            return Err(CollaboratorError::Transport("mock transport down".into()));
        }
        Ok(())
    }
}
