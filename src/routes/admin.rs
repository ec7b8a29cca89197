use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Routes restricted to callers whose role set intersects the admin
/// allow-list. The role gate wrapping this router redirects everyone else to
/// the unauthorized page; handlers here never re-check roles.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/content/{collection}
        // Every row of the collection, drafts and archived included.
        .route("/content/{collection}", get(handlers::get_admin_content))
        // PUT /admin/content/{collection}/{id}/status
        // The moderation endpoint: publish, hide, or archive an entry.
        // Broadcasts the change on the field-update bus.
        .route(
            "/content/{collection}/{id}/status",
            put(handlers::update_content_status),
        )
        // GET /admin/schema/{collection}
        // Attribute schema passthrough for the dynamic form builder.
        .route("/schema/{collection}", get(handlers::get_collection_schema))
        // GET /admin/updates
        // SSE stream of field updates for live form refresh.
        .route("/updates", get(handlers::field_update_stream))
}
