use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session: the OAuth callback (which is how a
/// session comes to exist), the published-content listings, the membership
/// lookup, and the analytics beacon.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /auth/callback?userId=...&secret=...&redirectTo=...
        // Exchanges the provider token pair for a session cookie. Both
        // parameters are validated before any collaborator call.
        .route("/auth/callback", get(handlers::oauth_callback))
        // GET /news, /events, /jobs — published entries only, resolved
        // against the requested locale by the translation resolver.
        .route("/news", get(handlers::get_news))
        .route("/events", get(handlers::get_events))
        .route("/jobs", get(handlers::get_jobs))
        // GET /feed — the three collections fetched concurrently and merged.
        .route("/feed", get(handlers::get_feed))
        // GET /campuses/membership?id=...&name=...
        // Membership campus lookup; answers null rather than erroring on a miss.
        .route(
            "/campuses/membership",
            get(handlers::get_membership_campus),
        )
        // POST /analytics — fire-and-forget beacon.
        .route("/analytics", post(handlers::record_analytics_beacon))
}
