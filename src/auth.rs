use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{config::AppConfig, identity::IdentityState};

/// CurrentUser
///
/// The resolved identity of an authenticated request: the output of the
/// session gate. Handlers take this as an argument to require authentication;
/// the role set for admin checks is fetched separately by the role gate.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Account id in the identity collaborator.
    pub id: String,
    pub email: String,
    pub name: String,
    /// The opaque session secret from the cookie, needed again for
    /// session-scoped collaborator calls (logout).
    pub session_secret: String,
}

/// GateRedirect
///
/// Rejection type of the session gate. Authentication failures are never
/// surfaced as errors to the user; they become an HTTP redirect to the login
/// path, preserving the intended destination for the post-login hop.
#[derive(Debug)]
pub struct GateRedirect {
    pub location: String,
}

impl GateRedirect {
    /// Builds the login redirect for a request that failed the session check.
    pub fn to_login(config: &AppConfig, intended: &str) -> Self {
        Self {
            location: format!(
                "{}?redirectTo={}",
                config.login_path,
                encode_redirect_target(intended)
            ),
        }
    }
}

impl IntoResponse for GateRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.location).into_response()
    }
}

/// encode_redirect_target
///
/// Minimal percent-encoding for a path-and-query carried inside a query
/// parameter. Only the characters that would break the outer query string are
/// escaped.
pub fn encode_redirect_target(target: &str) -> String {
    let mut encoded = String::with_capacity(target.len());
    for ch in target.chars() {
        match ch {
            '?' => encoded.push_str("%3F"),
            '&' => encoded.push_str("%26"),
            '#' => encoded.push_str("%23"),
            '%' => encoded.push_str("%25"),
            ' ' => encoded.push_str("%20"),
            _ => encoded.push(ch),
        }
    }
    encoded
}

/// CurrentUser Extractor Implementation
///
/// Implements the session gate as an Axum extractor, so any handler or
/// middleware naming `CurrentUser` is automatically protected.
///
/// The process:
/// 1. Request-scoped cache check: a user already resolved for this request is
///    reused, so layered extractions cost one identity call, not two.
/// 2. Cookie check: the configured session cookie is the sole signal; absence
///    redirects to login immediately, with no collaborator call.
/// 3. Identity lookup: the cookie secret is presented to the identity
///    collaborator. Every failure mode — expired secret, anonymous session,
///    timeout, transport error — fails closed into the same login redirect.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = GateRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(cached) = parts.extensions.get::<CurrentUser>() {
            return Ok(cached.clone());
        }

        let identity = IdentityState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Nested routers see the URI with the nest prefix stripped; the
        // redirect target must be the path the client actually requested.
        let intended = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone())
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let jar = CookieJar::from_headers(&parts.headers);
        let secret = jar
            .get(&config.session_cookie_name)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| GateRedirect::to_login(&config, &intended))?;

        let account = identity.get_account(&secret).await.map_err(|e| {
            // Fail closed: an unreachable identity collaborator is
            // indistinguishable from an invalid session.
            tracing::debug!("session gate rejected request: {e}");
            GateRedirect::to_login(&config, &intended)
        })?;

        let user = CurrentUser {
            id: account.id,
            email: account.email,
            name: account.name,
            session_secret: secret,
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// has_admin_access
///
/// The role check behind the admin gate: true when the caller's role set
/// intersects the configured allow-list. An empty role set (including the
/// lookup-failure case) never passes.
pub fn has_admin_access(roles: &[String], allow_list: &[String]) -> bool {
    roles.iter().any(|role| allow_list.contains(role))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(items: &[&str]) -> Vec<String> {
        items.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn admin_access_requires_intersection() {
        let allow = roles(&["Admin", "hr", "finance", "pr"]);
        assert!(has_admin_access(&roles(&["hr"]), &allow));
        assert!(has_admin_access(&roles(&["member", "Admin"]), &allow));
        assert!(!has_admin_access(&roles(&["member"]), &allow));
        assert!(!has_admin_access(&[], &allow));
    }

    #[test]
    fn role_comparison_is_case_sensitive() {
        // Role strings come verbatim from the BaaS admin tooling; "admin" and
        // "Admin" are different assignments.
        let allow = roles(&["Admin"]);
        assert!(!has_admin_access(&roles(&["admin"]), &allow));
    }

    #[test]
    fn redirect_target_encoding_escapes_query_breakers() {
        assert_eq!(
            encode_redirect_target("/admin/units?locale=fi&tab=2"),
            "/admin/units%3Flocale=fi%26tab=2"
        );
        assert_eq!(encode_redirect_target("/account"), "/account");
    }

    #[test]
    fn login_redirect_preserves_intended_destination() {
        let config = AppConfig::default();
        let redirect = GateRedirect::to_login(&config, "/admin/units");
        assert_eq!(redirect.location, "/login?redirectTo=/admin/units");
    }
}
