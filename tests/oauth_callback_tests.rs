use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use campus_portal::{
    AppState, FieldUpdateBus, MockIdentityService, MockStorageService,
    auth::CurrentUser,
    config::AppConfig,
    errors::CollaboratorError,
    handlers::{self, CallbackParams},
    models::{AnalyticsBeacon, Campus, CollectionSchema, ContentEntry, ContentStatus},
    repository::ContentRepository,
};
use std::sync::Arc;

// --- Stub Repository ---

// The callback never touches the row store; a stub satisfies the state.
struct StubRepo;

#[async_trait]
impl ContentRepository for StubRepo {
    async fn list_news(&self) -> Vec<ContentEntry> {
        vec![]
    }
    async fn list_events(&self) -> Vec<ContentEntry> {
        vec![]
    }
    async fn list_jobs(&self) -> Vec<ContentEntry> {
        vec![]
    }
    async fn list_all_content(&self, _collection: &str) -> Vec<ContentEntry> {
        vec![]
    }
    async fn set_content_status(
        &self,
        _collection: &str,
        _id: &str,
        _status: ContentStatus,
    ) -> Option<ContentEntry> {
        None
    }
    async fn get_campus(&self, _id: &str) -> Option<Campus> {
        None
    }
    async fn list_campuses(&self) -> Vec<Campus> {
        vec![]
    }
    async fn get_user_roles(&self, _user_id: &str) -> Vec<String> {
        vec![]
    }
    async fn get_collection_schema(
        &self,
        collection: &str,
    ) -> Result<CollectionSchema, CollaboratorError> {
        Err(CollaboratorError::NotFound(collection.to_string()))
    }
    async fn record_beacon(&self, _beacon: AnalyticsBeacon) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

// --- Helpers ---

fn create_state(identity: MockIdentityService) -> AppState {
    AppState {
        repo: Arc::new(StubRepo),
        identity: Arc::new(identity),
        storage: Arc::new(MockStorageService::new()),
        updates: FieldUpdateBus::new(8),
        config: AppConfig::default(),
    }
}

fn params(
    user_id: Option<&str>,
    secret: Option<&str>,
    redirect_to: Option<&str>,
) -> Query<CallbackParams> {
    Query(CallbackParams {
        user_id: user_id.map(String::from),
        secret: secret.map(String::from),
        redirect_to: redirect_to.map(String::from),
    })
}

struct CallbackOutcome {
    status: StatusCode,
    location: String,
    set_cookies: Vec<String>,
}

async fn run_callback(
    identity: MockIdentityService,
    query: Query<CallbackParams>,
) -> CallbackOutcome {
    let state = create_state(identity);
    let response = handlers::oauth_callback(State(state), CookieJar::new(), query).await;
    let (parts, _body) = response.into_parts();

    CallbackOutcome {
        status: parts.status,
        location: parts
            .headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string(),
        set_cookies: parts
            .headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect(),
    }
}

// --- Tests ---

#[tokio::test]
async fn missing_secret_redirects_to_login_with_error() {
    let outcome = run_callback(
        MockIdentityService::default(),
        params(Some("u1"), None, None),
    )
    .await;

    assert_eq!(outcome.status, StatusCode::SEE_OTHER);
    assert_eq!(outcome.location, "/login?error=missing_credentials");
    assert!(outcome.set_cookies.is_empty());
}

#[tokio::test]
async fn missing_user_id_is_validated_the_same_way() {
    let outcome = run_callback(
        MockIdentityService::default(),
        params(None, Some("s1"), None),
    )
    .await;

    assert_eq!(outcome.location, "/login?error=missing_credentials");
}

#[tokio::test]
async fn valid_exchange_sets_cookie_and_lands_on_default_path() {
    let outcome = run_callback(
        MockIdentityService::default(),
        params(Some("u1"), Some("s1"), None),
    )
    .await;

    assert_eq!(outcome.status, StatusCode::SEE_OTHER);
    assert_eq!(outcome.location, "/account");

    assert_eq!(outcome.set_cookies.len(), 1);
    let cookie = &outcome.set_cookies[0];
    assert!(cookie.starts_with("cp_session=secret-for-s1"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    // Local environment: the Secure attribute is off so the cookie works
    // over plain http during development.
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn redirect_to_parameter_is_honored_after_cookie_is_set() {
    let outcome = run_callback(
        MockIdentityService::default(),
        params(Some("u1"), Some("s1"), Some("/admin/units")),
    )
    .await;

    assert_eq!(outcome.location, "/admin/units");
    assert_eq!(outcome.set_cookies.len(), 1);
}

#[tokio::test]
async fn absolute_redirect_targets_fall_back_to_default_landing() {
    let outcome = run_callback(
        MockIdentityService::default(),
        params(Some("u1"), Some("s1"), Some("https://evil.example/phish")),
    )
    .await;

    assert_eq!(outcome.location, "/account");

    let scheme_relative = run_callback(
        MockIdentityService::default(),
        params(Some("u1"), Some("s1"), Some("//evil.example")),
    )
    .await;
    assert_eq!(scheme_relative.location, "/account");
}

#[tokio::test]
async fn failed_exchange_is_a_distinct_user_visible_error() {
    let identity = MockIdentityService {
        fail_exchange: true,
        ..MockIdentityService::default()
    };
    let outcome = run_callback(identity, params(Some("u1"), Some("stale"), None)).await;

    assert_eq!(outcome.status, StatusCode::SEE_OTHER);
    assert_eq!(outcome.location, "/login?error=session_exchange_failed");
    assert!(outcome.set_cookies.is_empty());
}

#[tokio::test]
async fn transport_failure_during_exchange_also_fails_closed() {
    let identity = MockIdentityService {
        fail_transport: true,
        ..MockIdentityService::default()
    };
    let outcome = run_callback(identity, params(Some("u1"), Some("s1"), None)).await;

    assert_eq!(outcome.location, "/login?error=session_exchange_failed");
    assert!(outcome.set_cookies.is_empty());
}

#[tokio::test]
async fn logout_clears_cookie_and_returns_home() {
    let state = create_state(MockIdentityService::default());
    let user = CurrentUser {
        id: "u1".to_string(),
        email: "member@example.org".to_string(),
        name: "Member".to_string(),
        session_secret: "valid".to_string(),
    };

    // The jar must hold the incoming cookie as an original, the way the
    // extractor builds it from request headers, for the removal delta to be
    // emitted.
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(header::COOKIE, "cp_session=valid".parse().unwrap());
    let jar = CookieJar::from_headers(&headers);

    let response = handlers::logout(user, State(state), jar)
        .await
        .into_response();
    let (parts, _body) = response.into_parts();

    assert_eq!(parts.status, StatusCode::SEE_OTHER);
    assert_eq!(
        parts
            .headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/")
    );
    let cookie = parts
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    // Removal cookie: empty value, immediate expiry.
    assert!(cookie.starts_with("cp_session="));
    assert!(cookie.contains("Max-Age=0"));
}
