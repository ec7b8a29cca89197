use crate::{config::AppConfig, errors::CollaboratorError, models::StoredFile};
use async_trait::async_trait;
use std::sync::Arc;

/// StorageService
///
/// Abstract contract for the file-storage collaborator: create and delete
/// files in a named bucket and fetch preview bytes. The concrete
/// implementation proxies the BaaS storage API; the mock keeps tests off the
/// network.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Uploads one file into the media bucket and returns its record.
    async fn create_file(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, CollaboratorError>;

    /// Removes a file by id. Missing files classify as `NotFound`.
    async fn delete_file(&self, file_id: &str) -> Result<(), CollaboratorError>;

    /// Fetches preview bytes for a stored file, for proxying to the client.
    async fn get_file_preview(&self, file_id: &str) -> Result<Vec<u8>, CollaboratorError>;
}

/// StorageState
///
/// The shared, thread-safe handle to the storage service.
pub type StorageState = Arc<dyn StorageService>;

/// AppwriteStorageClient
///
/// Concrete storage collaborator backed by the Appwrite storage API, scoped to
/// the single configured media bucket.
#[derive(Clone)]
pub struct AppwriteStorageClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    bucket_id: String,
}

impl AppwriteStorageClient {
    /// Builds the client from configuration; the reqwest client carries the
    /// collaborator timeout.
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            endpoint: config.baas_endpoint.clone(),
            project_id: config.baas_project_id.clone(),
            api_key: config.baas_api_key.clone(),
            bucket_id: config.bucket_id.clone(),
        }
    }

    fn files_url(&self) -> String {
        format!("{}/storage/buckets/{}/files", self.endpoint, self.bucket_id)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
    }
}

#[async_trait]
impl StorageService for AppwriteStorageClient {
    /// create_file
    ///
    /// Multipart POST with a server-generated file id, so user-provided names
    /// never become object identifiers.
    async fn create_file(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, CollaboratorError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(sanitize_filename(filename))
            .mime_str(content_type)
            .map_err(|e| CollaboratorError::Payload(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("fileId", uuid::Uuid::new_v4().to_string())
            .part("file", part);

        let response = self
            .authed(self.http.post(self.files_url()))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::classify_status(status, "storage/files"));
        }
        Ok(response.json::<StoredFile>().await?)
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), CollaboratorError> {
        let url = format!("{}/{}", self.files_url(), file_id);
        let response = self.authed(self.http.delete(&url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::classify_status(
                status,
                &format!("storage/files/{file_id}"),
            ));
        }
        Ok(())
    }

    async fn get_file_preview(&self, file_id: &str) -> Result<Vec<u8>, CollaboratorError> {
        let url = format!("{}/{}/preview", self.files_url(), file_id);
        let response = self.authed(self.http.get(&url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::classify_status(
                status,
                &format!("storage/files/{file_id}/preview"),
            ));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// sanitize_filename
///
/// Strips path components from a client-supplied filename so it cannot smuggle
/// directory traversal into the upstream request.
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .next_back()
        .unwrap_or("upload.bin")
        .to_string();
    if cleaned.is_empty() {
        "upload.bin".to_string()
    } else {
        cleaned
    }
}

/// MockStorageService
///
/// Mock implementation used by unit and integration tests, isolating handler
/// logic from the network boundary.
#[derive(Clone)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn create_file(
        &self,
        filename: &str,
        content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<StoredFile, CollaboratorError> {
        if self.should_fail {
            return Err(CollaboratorError::Transport(
                "mock storage failure requested".to_string(),
            ));
        }
        Ok(StoredFile {
            id: format!("file-{}", sanitize_filename(filename)),
            name: sanitize_filename(filename),
            mime_type: content_type.to_string(),
        })
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), CollaboratorError> {
        if self.should_fail {
            return Err(CollaboratorError::NotFound(file_id.to_string()));
        }
        Ok(())
    }

    async fn get_file_preview(&self, file_id: &str) -> Result<Vec<u8>, CollaboratorError> {
        if self.should_fail {
            return Err(CollaboratorError::NotFound(file_id.to_string()));
        }
        Ok(format!("preview:{file_id}").into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_traversal_segments() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("dir\\photo.png"), "photo.png");
        assert_eq!(sanitize_filename("../.."), "upload.bin");
    }

    #[tokio::test]
    async fn delete_file_succeeds_and_classifies_misses() {
        let storage = MockStorageService::new();
        assert!(storage.delete_file("file-1").await.is_ok());

        let failing = MockStorageService::new_failing();
        assert!(matches!(
            failing.delete_file("ghost").await,
            Err(CollaboratorError::NotFound(_))
        ));
    }
}
