use crate::{
    config::AppConfig,
    errors::CollaboratorError,
    models::{AnalyticsBeacon, Campus, CollectionSchema, ContentEntry, ContentStatus},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// The three content collections exposed through the public and admin
/// surfaces. Anything else named in a path parameter is rejected upstream.
pub const CONTENT_COLLECTIONS: [&str; 3] = ["news", "events", "jobs"];

/// Returns true when `collection` is one of the known content collections.
pub fn is_content_collection(collection: &str) -> bool {
    CONTENT_COLLECTIONS.contains(&collection)
}

/// ContentRepository
///
/// Abstract contract for the row-store collaborator: list/get/create/update
/// rows in named collections under a named database, with equality filters.
/// The concrete implementation proxies the BaaS document API; tests mock it.
///
/// Error policy mirrors the call sites: list methods swallow collaborator
/// failures into "no data" (logged), lookups return `None`, and the two
/// operations whose failures the caller must see return `Result`.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    // --- Content Retrieval ---
    /// Published news entries, newest first.
    async fn list_news(&self) -> Vec<ContentEntry>;
    /// Published events, newest first.
    async fn list_events(&self) -> Vec<ContentEntry>;
    /// Published job postings, newest first.
    async fn list_jobs(&self) -> Vec<ContentEntry>;
    /// Admin access: every row of the collection, drafts and archived included.
    async fn list_all_content(&self, collection: &str) -> Vec<ContentEntry>;

    // --- Content Actions ---
    /// Admin action: sets the publication status of one entry. `None` when the
    /// row does not exist or the update failed.
    async fn set_content_status(
        &self,
        collection: &str,
        id: &str,
        status: ContentStatus,
    ) -> Option<ContentEntry>;

    // --- Membership / Roles ---
    async fn get_campus(&self, id: &str) -> Option<Campus>;
    async fn list_campuses(&self) -> Vec<Campus>;
    /// Role strings assigned to the user. Lookup failure yields the empty set;
    /// the role gate fails closed on it.
    async fn get_user_roles(&self, user_id: &str) -> Vec<String>;

    // --- Passthrough ---
    async fn get_collection_schema(
        &self,
        collection: &str,
    ) -> Result<CollectionSchema, CollaboratorError>;
    async fn record_beacon(&self, beacon: AnalyticsBeacon) -> Result<(), CollaboratorError>;
}

/// RepositoryState
///
/// The shared, thread-safe handle to the row store.
pub type RepositoryState = Arc<dyn ContentRepository>;

// --- Wire shapes of the BaaS document API ---

#[derive(Deserialize)]
struct DocumentList<T> {
    // `default = "Vec::new"` keeps the derive from requiring `T: Default`.
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

#[derive(Deserialize)]
struct RoleRow {
    role: String,
}

#[derive(Deserialize)]
struct CollectionDetail {
    #[serde(default)]
    attributes: Vec<crate::models::SchemaAttribute>,
}

/// AppwriteRowStore
///
/// Concrete `ContentRepository` backed by the Appwrite databases API. All
/// calls authenticate with the server API key; row-level visibility is
/// enforced here (status filters on the public listing methods), not left to
/// the BaaS.
#[derive(Clone)]
pub struct AppwriteRowStore {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    database_id: String,
}

impl AppwriteRowStore {
    /// Creates the row store from configuration. The reqwest client carries
    /// the collaborator timeout.
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            endpoint: config.baas_endpoint.clone(),
            project_id: config.baas_project_id.clone(),
            api_key: config.baas_api_key.clone(),
            database_id: config.database_id.clone(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}",
            self.endpoint, self.database_id, collection
        )
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
    }

    /// list_documents
    ///
    /// Shared GET over a collection with optional structured queries.
    async fn list_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: &[String],
    ) -> Result<Vec<T>, CollaboratorError> {
        let url = format!("{}/documents", self.collection_url(collection));
        let mut request = self.authed(self.http.get(&url));
        for query in queries {
            request = request.query(&[("queries[]", query)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::classify_status(status, collection));
        }

        let list = response.json::<DocumentList<T>>().await?;
        Ok(list.documents)
    }

    async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, CollaboratorError> {
        let url = format!("{}/documents/{}", self.collection_url(collection), id);
        let response = self.authed(self.http.get(&url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::classify_status(
                status,
                &format!("{collection}/{id}"),
            ));
        }
        Ok(response.json::<T>().await?)
    }

    /// Published rows of a content collection, newest first.
    async fn list_published(&self, collection: &str) -> Vec<ContentEntry> {
        let queries = vec![
            r#"equal("status", ["published"])"#.to_string(),
            r#"orderDesc("published_at")"#.to_string(),
        ];
        match self.list_documents(collection, &queries).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("list_published({collection}) error: {e}");
                vec![]
            }
        }
    }
}

#[async_trait]
impl ContentRepository for AppwriteRowStore {
    async fn list_news(&self) -> Vec<ContentEntry> {
        self.list_published("news").await
    }

    async fn list_events(&self) -> Vec<ContentEntry> {
        self.list_published("events").await
    }

    async fn list_jobs(&self) -> Vec<ContentEntry> {
        self.list_published("jobs").await
    }

    /// list_all_content
    ///
    /// Administrative listing without the status filter.
    async fn list_all_content(&self, collection: &str) -> Vec<ContentEntry> {
        let queries = vec![r#"orderDesc("$createdAt")"#.to_string()];
        match self.list_documents(collection, &queries).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("list_all_content({collection}) error: {e}");
                vec![]
            }
        }
    }

    /// set_content_status
    ///
    /// PATCH on the document, writing only the status field.
    async fn set_content_status(
        &self,
        collection: &str,
        id: &str,
        status: ContentStatus,
    ) -> Option<ContentEntry> {
        let url = format!("{}/documents/{}", self.collection_url(collection), id);
        let body = serde_json::json!({ "data": { "status": status } });

        let result = async {
            let response = self.authed(self.http.patch(&url)).json(&body).send().await?;
            let http_status = response.status();
            if !http_status.is_success() {
                return Err(CollaboratorError::classify_status(
                    http_status,
                    &format!("{collection}/{id}"),
                ));
            }
            Ok(response.json::<ContentEntry>().await?)
        }
        .await;

        match result {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::error!("set_content_status({collection}/{id}) error: {e}");
                None
            }
        }
    }

    async fn get_campus(&self, id: &str) -> Option<Campus> {
        match self.get_document::<Campus>("campuses", id).await {
            Ok(campus) => Some(campus),
            Err(CollaboratorError::NotFound(_)) => None,
            Err(e) => {
                tracing::error!("get_campus({id}) error: {e}");
                None
            }
        }
    }

    async fn list_campuses(&self) -> Vec<Campus> {
        match self.list_documents::<Campus>("campuses", &[]).await {
            Ok(campuses) => campuses,
            Err(e) => {
                tracing::error!("list_campuses error: {e}");
                vec![]
            }
        }
    }

    /// get_user_roles
    ///
    /// Reads the role-assignment collection. Any failure collapses to the
    /// empty set so the admin gate fails closed.
    async fn get_user_roles(&self, user_id: &str) -> Vec<String> {
        let queries = vec![format!(r#"equal("user_id", ["{user_id}"])"#)];
        match self
            .list_documents::<RoleRow>("role_assignments", &queries)
            .await
        {
            Ok(rows) => rows.into_iter().map(|r| r.role).collect(),
            Err(e) => {
                tracing::error!("get_user_roles({user_id}) error: {e}");
                vec![]
            }
        }
    }

    /// get_collection_schema
    ///
    /// GET on the collection itself, passing the attribute list through for
    /// the admin app's dynamic form builder.
    async fn get_collection_schema(
        &self,
        collection: &str,
    ) -> Result<CollectionSchema, CollaboratorError> {
        let response = self
            .authed(self.http.get(self.collection_url(collection)))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::classify_status(status, collection));
        }

        let detail = response.json::<CollectionDetail>().await?;
        Ok(CollectionSchema {
            collection: collection.to_string(),
            attributes: detail.attributes,
        })
    }

    /// record_beacon
    ///
    /// Appends one analytics row. The handler decides whether to surface the
    /// error; for the beacon endpoint it is logged and swallowed.
    async fn record_beacon(&self, beacon: AnalyticsBeacon) -> Result<(), CollaboratorError> {
        let url = format!("{}/documents", self.collection_url("analytics"));
        let body = serde_json::json!({
            "documentId": uuid::Uuid::new_v4().to_string(),
            "data": beacon,
        });

        let response = self.authed(self.http.post(&url)).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::classify_status(status, "analytics"));
        }
        Ok(())
    }
}

// --- Membership lookup ---

/// Normalizes a campus name for case/whitespace-insensitive comparison.
pub fn normalize_campus_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// match_campus_by_name
///
/// Finds a campus whose normalized name equals the normalized needle.
pub fn match_campus_by_name<'a>(campuses: &'a [Campus], name: &str) -> Option<&'a Campus> {
    let needle = normalize_campus_name(name);
    campuses
        .iter()
        .find(|c| normalize_campus_name(&c.name) == needle)
}

/// lookup_membership_campus
///
/// The membership resolution policy: try the row by id first, then fall back
/// to a case/whitespace-insensitive name match, and finally return `None`
/// without surfacing an error.
pub async fn lookup_membership_campus(
    repo: &dyn ContentRepository,
    id: Option<&str>,
    name: Option<&str>,
) -> Option<Campus> {
    if let Some(id) = id {
        if let Some(campus) = repo.get_campus(id).await {
            return Some(campus);
        }
    }
    if let Some(name) = name {
        let campuses = repo.list_campuses().await;
        return match_campus_by_name(&campuses, name).cloned();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campus(id: &str, name: &str) -> Campus {
        Campus {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn name_matching_ignores_case_and_whitespace() {
        let campuses = vec![campus("5", "  National "), campus("7", "Helsinki")];
        let matched = match_campus_by_name(&campuses, "national").unwrap();
        assert_eq!(matched.id, "5");
        assert!(match_campus_by_name(&campuses, "  HELSINKI").is_some());
        assert!(match_campus_by_name(&campuses, "oulu").is_none());
    }

    #[test]
    fn document_list_deserializes_without_default_row_types() {
        // RoleRow and Campus carry no Default impl; the wrapper must still
        // deserialize, including when the documents field is absent.
        let raw = serde_json::json!({ "total": 0 });
        let empty: DocumentList<RoleRow> = serde_json::from_value(raw).unwrap();
        assert!(empty.documents.is_empty());

        let raw = serde_json::json!({
            "documents": [ { "role": "hr" }, { "role": "finance" } ]
        });
        let roles: DocumentList<RoleRow> = serde_json::from_value(raw).unwrap();
        assert_eq!(roles.documents.len(), 2);
        assert_eq!(roles.documents[0].role, "hr");
    }

    #[test]
    fn content_collection_allow_list() {
        assert!(is_content_collection("news"));
        assert!(is_content_collection("jobs"));
        assert!(!is_content_collection("role_assignments"));
        assert!(!is_content_collection("analytics"));
    }
}
