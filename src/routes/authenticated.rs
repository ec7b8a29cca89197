use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any caller holding a valid session. The session gate on the
/// layer above guarantees every handler here receives a resolved
/// `CurrentUser`; an anonymous caller is redirected to login before the
/// handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The caller's account profile plus assigned role strings.
        .route("/me", get(handlers::get_me))
        // POST /auth/logout
        // Destroys the session upstream and clears the cookie.
        .route("/auth/logout", post(handlers::logout))
        // POST /upload
        // Proxies one multipart file into the media bucket; answers with the
        // structured {success, error} result.
        .route("/upload", post(handlers::upload_file))
        // GET /files/{id}/preview
        // Proxies preview bytes for a stored file.
        .route("/files/{id}/preview", get(handlers::get_file_preview))
}
