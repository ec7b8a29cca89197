use crate::{
    AppState,
    auth::CurrentUser,
    errors::CollaboratorError,
    events::FieldUpdate,
    models::{
        AnalyticsBeacon, Campus, CollectionSchema, ContentEntry, ContentStatus, ContentView, Feed,
        UpdateStatusRequest, UploadResponse, UserProfile,
    },
    repository::{is_content_collection, lookup_membership_campus},
    translation::resolve_content_list,
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{
        IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

// --- Query Structs ---

/// LocaleQuery
///
/// Accepted query parameters for the public content listings. The active
/// locale defaults to the configured fallback locale when absent.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct LocaleQuery {
    /// Locale tag the translation resolver should prefer (e.g. "fi").
    pub locale: Option<String>,
}

/// CallbackParams
///
/// Query parameters of the OAuth callback: the one-time provider token pair
/// plus an optional post-login destination.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct CallbackParams {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub secret: Option<String>,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// MembershipQuery
///
/// Lookup keys for the membership campus endpoint. Either may be absent.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct MembershipQuery {
    pub id: Option<String>,
    pub name: Option<String>,
}

fn active_locale(state: &AppState, query: &LocaleQuery) -> String {
    query
        .locale
        .clone()
        .unwrap_or_else(|| state.config.default_locale.clone())
}

// --- Session Handlers ---

/// session_cookie
///
/// Builds the session cookie under the single parameterized policy applied to
/// every app surface: HTTP-only, path `/`, SameSite=Lax, Secure outside local
/// development, with an optional configured domain scope.
fn session_cookie(state: &AppState, secret: String) -> Cookie<'static> {
    let mut builder = Cookie::build((state.config.session_cookie_name.clone(), secret))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.env == crate::config::Env::Production);
    if let Some(domain) = &state.config.cookie_domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

/// oauth_callback
///
/// [Public Route] Exchanges the identity provider's one-time token pair for a
/// session, sets the session cookie, and redirects onward.
///
/// Both parameters are validated up front; a missing one redirects to login
/// with an error indicator instead of attempting the exchange. A failed
/// exchange is classified as its own user-visible login error rather than
/// propagating as a framework error page. The `redirectTo` target is only
/// honored when it is a local absolute path.
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(CallbackParams),
    responses((status = 303, description = "Cookie set, redirect to destination"))
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let (Some(user_id), Some(secret)) = (params.user_id, params.secret) else {
        return Redirect::to(&format!(
            "{}?error=missing_credentials",
            state.config.login_path
        ))
        .into_response();
    };

    match state.identity.create_session(&user_id, &secret).await {
        Ok(session) => {
            let jar = jar.add(session_cookie(&state, session.secret));
            let target = params
                .redirect_to
                .filter(|t| t.starts_with('/') && !t.starts_with("//"))
                .unwrap_or_else(|| state.config.default_landing_path.clone());
            (jar, Redirect::to(&target)).into_response()
        }
        Err(e) => {
            tracing::warn!("session exchange failed for user {user_id}: {e}");
            Redirect::to(&format!(
                "{}?error=session_exchange_failed",
                state.config.login_path
            ))
            .into_response()
        }
    }
}

/// logout
///
/// [Authenticated Route] Destroys the session at the identity collaborator,
/// clears the cookie, and sends the caller back to the public landing page.
/// The cookie is cleared even when the upstream delete fails.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 303, description = "Session destroyed, cookie cleared"))
)]
pub async fn logout(
    user: CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Err(e) = state.identity.delete_session(&user.session_secret).await {
        tracing::warn!("logout: session delete failed for {}: {e}", user.id);
    }

    let mut removal = Cookie::build(state.config.session_cookie_name.clone()).path("/");
    if let Some(domain) = &state.config.cookie_domain {
        removal = removal.domain(domain.clone());
    }
    let jar = jar.remove(removal.build());
    (jar, Redirect::to("/"))
}

/// get_me
///
/// [Authenticated Route] The caller's profile: the resolved account plus the
/// role set from the row store.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(user: CurrentUser, State(state): State<AppState>) -> Json<UserProfile> {
    let roles = state.repo.get_user_roles(&user.id).await;
    Json(UserProfile {
        id: user.id,
        email: user.email,
        name: user.name,
        roles,
    })
}

// --- Public Content Handlers ---

/// get_news
///
/// [Public Route] Published news resolved against the active locale. Entries
/// with no translations are excluded from the output.
#[utoipa::path(
    get,
    path = "/news",
    params(LocaleQuery),
    responses((status = 200, description = "Resolved news list", body = [ContentView]))
)]
pub async fn get_news(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Json<Vec<ContentView>> {
    let locale = active_locale(&state, &query);
    let entries = state.repo.list_news().await;
    Json(resolve_content_list(
        &entries,
        &locale,
        &state.config.default_locale,
    ))
}

/// get_events
///
/// [Public Route] Published events resolved against the active locale.
#[utoipa::path(
    get,
    path = "/events",
    params(LocaleQuery),
    responses((status = 200, description = "Resolved event list", body = [ContentView]))
)]
pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Json<Vec<ContentView>> {
    let locale = active_locale(&state, &query);
    let entries = state.repo.list_events().await;
    Json(resolve_content_list(
        &entries,
        &locale,
        &state.config.default_locale,
    ))
}

/// get_jobs
///
/// [Public Route] Published job postings resolved against the active locale.
#[utoipa::path(
    get,
    path = "/jobs",
    params(LocaleQuery),
    responses((status = 200, description = "Resolved job list", body = [ContentView]))
)]
pub async fn get_jobs(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Json<Vec<ContentView>> {
    let locale = active_locale(&state, &query);
    let entries = state.repo.list_jobs().await;
    Json(resolve_content_list(
        &entries,
        &locale,
        &state.config.default_locale,
    ))
}

/// get_feed
///
/// [Public Route] The home feed: news, events, and jobs fetched concurrently
/// and merged only after all three complete. The fetches are independent, so
/// no ordering between them is required or assumed.
#[utoipa::path(
    get,
    path = "/feed",
    params(LocaleQuery),
    responses((status = 200, description = "Merged home feed", body = Feed))
)]
pub async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Json<Feed> {
    let locale = active_locale(&state, &query);
    let default = &state.config.default_locale;

    let (news, events, jobs) = tokio::join!(
        state.repo.list_news(),
        state.repo.list_events(),
        state.repo.list_jobs(),
    );

    Json(Feed {
        news: resolve_content_list(&news, &locale, default),
        events: resolve_content_list(&events, &locale, default),
        jobs: resolve_content_list(&jobs, &locale, default),
    })
}

/// get_membership_campus
///
/// [Public Route] Membership campus lookup: by row id first, then by
/// case/whitespace-insensitive name, otherwise a JSON `null` body. A miss is
/// a normal answer here, not an error.
#[utoipa::path(
    get,
    path = "/campuses/membership",
    params(MembershipQuery),
    responses((status = 200, description = "Matched campus or null", body = Option<Campus>))
)]
pub async fn get_membership_campus(
    State(state): State<AppState>,
    Query(query): Query<MembershipQuery>,
) -> Json<Option<Campus>> {
    let campus = lookup_membership_campus(
        state.repo.as_ref(),
        query.id.as_deref(),
        query.name.as_deref(),
    )
    .await;
    Json(campus)
}

/// record_analytics_beacon
///
/// [Public Route] Fire-and-forget analytics beacon. The row-store write is
/// attempted once; failure is logged and swallowed so the client never blocks
/// or retries on telemetry.
#[utoipa::path(
    post,
    path = "/analytics",
    request_body = AnalyticsBeacon,
    responses((status = 204, description = "Accepted"))
)]
pub async fn record_analytics_beacon(
    State(state): State<AppState>,
    Json(beacon): Json<AnalyticsBeacon>,
) -> StatusCode {
    if let Err(e) = state.repo.record_beacon(beacon).await {
        tracing::warn!("analytics beacon dropped: {e}");
    }
    StatusCode::NO_CONTENT
}

// --- Upload Handlers ---

/// upload_file
///
/// [Authenticated Route] Proxies one multipart file into the media bucket and
/// answers with the structured `{success, error}` result the frontends branch
/// on. Collaborator failure maps to a 500 with `success=false`, not a bare
/// error page.
#[utoipa::path(
    post,
    path = "/upload",
    responses(
        (status = 200, description = "Stored", body = UploadResponse),
        (status = 400, description = "No file part", body = UploadResponse),
        (status = 500, description = "Storage failure", body = UploadResponse)
    )
)]
pub async fn upload_file(
    user: CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<UploadResponse>) {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(UploadResponse {
                    success: false,
                    error: Some("missing file part".to_string()),
                    file_id: None,
                }),
            );
        }
    };

    let filename = field.file_name().unwrap_or("upload.bin").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = match field.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(UploadResponse {
                    success: false,
                    error: Some(format!("unreadable file part: {e}")),
                    file_id: None,
                }),
            );
        }
    };

    match state.storage.create_file(&filename, &content_type, bytes).await {
        Ok(stored) => {
            tracing::info!("user {} uploaded file {}", user.id, stored.id);
            (
                StatusCode::OK,
                Json(UploadResponse {
                    success: true,
                    error: None,
                    file_id: Some(stored.id),
                }),
            )
        }
        Err(e) => {
            tracing::error!("upload failed for user {}: {e}", user.id);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UploadResponse {
                    success: false,
                    error: Some("file storage unavailable".to_string()),
                    file_id: None,
                }),
            )
        }
    }
}

/// get_file_preview
///
/// [Authenticated Route] Proxies preview bytes for a stored file.
#[utoipa::path(
    get,
    path = "/files/{id}/preview",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "Preview bytes"),
        (status = 404, description = "Unknown file")
    )
)]
pub async fn get_file_preview(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Response {
    match state.storage.get_file_preview(&file_id).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Err(CollaboratorError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("preview fetch failed for {file_id}: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Admin Handlers ---

/// get_admin_content
///
/// [Admin Route] Every row of a content collection, drafts and archived
/// included, with all translation rows attached. The admin app resolves
/// locales client-side, so raw entries are returned here.
#[utoipa::path(
    get,
    path = "/admin/content/{collection}",
    params(("collection" = String, Path, description = "Content collection name")),
    responses(
        (status = 200, description = "All rows", body = [ContentEntry]),
        (status = 404, description = "Unknown collection")
    )
)]
pub async fn get_admin_content(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<ContentEntry>>, StatusCode> {
    if !is_content_collection(&collection) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(state.repo.list_all_content(&collection).await))
}

/// update_content_status
///
/// [Admin Route] Publishes or hides one content entry, then broadcasts the
/// field change on the update bus so other open admin sessions refresh.
#[utoipa::path(
    put,
    path = "/admin/content/{collection}/{id}/status",
    params(
        ("collection" = String, Path, description = "Content collection name"),
        ("id" = String, Path, description = "Entry id")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated", body = ContentEntry),
        (status = 404, description = "Unknown collection or entry")
    )
)]
pub async fn update_content_status(
    user: CurrentUser,
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ContentEntry>, StatusCode> {
    if !is_content_collection(&collection) {
        return Err(StatusCode::NOT_FOUND);
    }

    match state
        .repo
        .set_content_status(&collection, &id, payload.status)
        .await
    {
        Some(entry) => {
            state.updates.publish(FieldUpdate {
                collection,
                row_id: id,
                field: "status".to_string(),
                value: status_tag(payload.status).to_string(),
                updated_by: user.id,
            });
            Ok(Json(entry))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

fn status_tag(status: ContentStatus) -> &'static str {
    match status {
        ContentStatus::Published => "published",
        ContentStatus::Draft => "draft",
        ContentStatus::Archived => "archived",
    }
}

/// get_collection_schema
///
/// [Admin Route] Schema-by-collection passthrough for the dynamic form
/// builder.
#[utoipa::path(
    get,
    path = "/admin/schema/{collection}",
    params(("collection" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Attribute schema", body = CollectionSchema),
        (status = 404, description = "Unknown collection")
    )
)]
pub async fn get_collection_schema(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<CollectionSchema>, StatusCode> {
    match state.repo.get_collection_schema(&collection).await {
        Ok(schema) => Ok(Json(schema)),
        Err(CollaboratorError::NotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("schema lookup failed for {collection}: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// field_update_stream
///
/// [Admin Route] Server-sent-events stream of field updates from the update
/// bus. Subscription starts at connection time; a lagging client simply skips
/// the overwritten updates.
pub async fn field_update_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.updates.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|update| match update {
        Ok(update) => serde_json::to_string(&update)
            .ok()
            .map(|json| Ok(Event::default().event("field-update").data(json))),
        // Lagged receivers drop the missed updates and continue.
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
