use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup,
/// immutable afterwards, and shared across all services (identity, row store,
/// storage) through the unified application state.
#[derive(Clone)]
pub struct AppConfig {
    /// Base URL of the BaaS REST API (e.g. "https://cloud.appwrite.io/v1").
    pub baas_endpoint: String,
    /// BaaS project identifier, sent as the X-Appwrite-Project header.
    pub baas_project_id: String,
    /// Server API key used for row-store and storage calls (not for session auth).
    pub baas_api_key: String,
    /// Database id under which all content collections live.
    pub database_id: String,
    /// Bucket id for media uploads.
    pub bucket_id: String,
    /// Name of the session cookie. Its presence is the sole signal consulted
    /// by the access gate.
    pub session_cookie_name: String,
    /// Optional domain scope for the session cookie. None = host-only cookie.
    pub cookie_domain: Option<String>,
    /// Locale used by the translation resolver when the requested locale has
    /// no matching translation row.
    pub default_locale: String,
    /// Where unauthenticated requests are redirected.
    pub login_path: String,
    /// Where authenticated-but-unauthorized admin requests are redirected.
    pub unauthorized_path: String,
    /// Landing page after a successful OAuth callback without a redirectTo.
    pub default_landing_path: String,
    /// Role allow-list for the admin surface.
    pub admin_roles: Vec<String>,
    /// Upper bound, in seconds, for any single collaborator call.
    pub collaborator_timeout_secs: u64,
    /// Runtime environment marker. Controls log format and cookie Secure flag.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty logs, non-Secure cookies) and production infrastructure (JSON logs,
/// Secure cookies).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// Default admin allow-list, matching the role strings assigned through the
/// BaaS admin tooling.
fn default_admin_roles() -> Vec<String> {
    ["Admin", "hr", "finance", "pr"]
        .iter()
        .map(|r| r.to_string())
        .collect()
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for
    /// test setup, without requiring any environment variables.
    fn default() -> Self {
        Self {
            baas_endpoint: "http://localhost/v1".to_string(),
            baas_project_id: "campus-portal-test".to_string(),
            baas_api_key: "test-api-key".to_string(),
            database_id: "portal".to_string(),
            bucket_id: "media".to_string(),
            session_cookie_name: "cp_session".to_string(),
            cookie_domain: None,
            default_locale: "en".to_string(),
            login_path: "/login".to_string(),
            unauthorized_path: "/unauthorized".to_string(),
            default_landing_path: "/account".to_string(),
            admin_roles: default_admin_roles(),
            collaborator_timeout_secs: 10,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration
    /// at startup. Reads all parameters from environment variables and
    /// fails fast when a variable required for the current environment is
    /// missing.
    ///
    /// # Panics
    /// Panics if a critical environment variable required in Production is not
    /// set. The service must not start with an incomplete configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (baas_endpoint, baas_project_id, baas_api_key) = match env {
            Env::Production => (
                env::var("APPWRITE_ENDPOINT").expect("FATAL: APPWRITE_ENDPOINT required in prod"),
                env::var("APPWRITE_PROJECT_ID")
                    .expect("FATAL: APPWRITE_PROJECT_ID required in prod"),
                env::var("APPWRITE_API_KEY").expect("FATAL: APPWRITE_API_KEY required in prod"),
            ),
            Env::Local => (
                env::var("APPWRITE_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost/v1".to_string()),
                env::var("APPWRITE_PROJECT_ID").unwrap_or_else(|_| "campus-portal".to_string()),
                env::var("APPWRITE_API_KEY").unwrap_or_else(|_| "dev-api-key".to_string()),
            ),
        };

        let admin_roles = env::var("ADMIN_ROLES")
            .map(|raw| {
                raw.split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| default_admin_roles());

        Self {
            env,
            baas_endpoint,
            baas_project_id,
            baas_api_key,
            database_id: env::var("APPWRITE_DATABASE_ID").unwrap_or_else(|_| "portal".to_string()),
            bucket_id: env::var("APPWRITE_BUCKET_ID").unwrap_or_else(|_| "media".to_string()),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "cp_session".to_string()),
            cookie_domain: env::var("SESSION_COOKIE_DOMAIN").ok(),
            default_locale: env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "en".to_string()),
            login_path: "/login".to_string(),
            unauthorized_path: "/unauthorized".to_string(),
            default_landing_path: "/account".to_string(),
            admin_roles,
            collaborator_timeout_secs: env::var("COLLABORATOR_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // These tests mutate process-wide environment variables, so they must not
    // interleave with each other.

    #[test]
    #[serial]
    fn load_defaults_to_local() {
        unsafe {
            env::remove_var("APP_ENV");
            env::remove_var("ADMIN_ROLES");
        }
        let config = AppConfig::load();
        assert_eq!(config.env, Env::Local);
        assert_eq!(config.session_cookie_name, "cp_session");
        assert_eq!(config.admin_roles, default_admin_roles());
    }

    #[test]
    #[serial]
    fn admin_roles_parse_trims_and_drops_empties() {
        unsafe {
            env::remove_var("APP_ENV");
            env::set_var("ADMIN_ROLES", "Admin, hr , ,finance");
        }
        let config = AppConfig::load();
        assert_eq!(config.admin_roles, vec!["Admin", "hr", "finance"]);
        unsafe {
            env::remove_var("ADMIN_ROLES");
        }
    }
}
