//! Object storage for generated documents.
//!
//! `ObjectStorage` is the seam the document pipeline talks to; the
//! production implementation is `SupabaseStorage`, which speaks the Supabase
//! Storage REST API. Only a handful of primitive operations need to be
//! implemented; the cleanup and statistics helpers are built on top of them.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use utoipa::ToSchema;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const MAX_OBJECT_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const ALLOWED_MIME_TYPES: [&str; 3] = [PDF_CONTENT_TYPE, "image/png", "image/jpeg"];
const LIST_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("storage provider returned {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("failed to read local file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub file_size: u64,
    pub upload_time_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: UploadMetadata,
}

impl UploadResult {
    pub fn uploaded(file_url: String, storage_path: String, metadata: UploadMetadata) -> Self {
        Self {
            success: true,
            file_url: Some(file_url),
            storage_path: Some(storage_path),
            error: None,
            metadata,
        }
    }

    pub fn failed(error: impl Into<String>, metadata: UploadMetadata) -> Self {
        Self {
            success: false,
            file_url: None,
            storage_path: None,
            error: Some(error.into()),
            metadata,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub public_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_files: usize,
    pub total_size: u64,
    pub oldest_file: Option<String>,
    pub newest_file: Option<String>,
}

impl StorageStats {
    pub fn from_files(files: &[FileInfo]) -> Self {
        let oldest = files.iter().min_by_key(|f| f.last_modified);
        let newest = files.iter().max_by_key(|f| f.last_modified);
        Self {
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            oldest_file: oldest.map(|f| f.name.clone()),
            newest_file: newest.map(|f| f.name.clone()),
        }
    }
}

/// Oldest modification time still kept by a cleanup, `None` when out of range.
pub fn cleanup_cutoff(max_age_hours: i64) -> Option<DateTime<Utc>> {
    ChronoDuration::try_hours(max_age_hours).and_then(|age| Utc::now().checked_sub_signed(age))
}

/// Fetch `offset`-addressed pages until one comes back shorter than `page_size`.
pub async fn collect_pages<T, F, Fut, E>(page_size: u32, mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let mut all = Vec::new();
    let mut offset = 0u32;
    loop {
        let page = fetch(offset).await?;
        let len = page.len();
        all.extend(page);
        if page_size == 0 || len < page_size as usize {
            return Ok(all);
        }
        offset = offset.saturating_add(page_size);
    }
}

/// Join a folder and a file name into an object path.
pub fn object_path(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", folder, file_name)
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload raw bytes to `{folder}/{file_name}`. Existing objects are not
    /// overwritten; a second upload to the same path fails.
    async fn upload_buffer(
        &self,
        data: &[u8],
        file_name: &str,
        folder: &str,
        content_type: &str,
    ) -> UploadResult;

    async fn delete_files(&self, paths: &[String]) -> OperationResult;

    async fn list_files_checked(&self, folder: &str) -> Result<Vec<FileInfo>, StorageError>;

    /// Create the bucket when it does not exist yet.
    async fn ensure_bucket(&self) -> OperationResult;

    fn public_url(&self, path: &str) -> String;

    async fn upload_file(&self, local_path: &Path, file_name: &str, folder: &str) -> UploadResult {
        match tokio::fs::read(local_path).await {
            Ok(data) => {
                self.upload_buffer(&data, file_name, folder, PDF_CONTENT_TYPE)
                    .await
            }
            Err(e) => UploadResult::failed(
                format!("failed to read {}: {}", local_path.display(), e),
                UploadMetadata::default(),
            ),
        }
    }

    async fn delete_file(&self, path: &str) -> OperationResult {
        self.delete_files(&[path.to_string()]).await
    }

    /// Listing that reports failures as an empty folder.
    async fn list_files(&self, folder: &str) -> Vec<FileInfo> {
        match self.list_files_checked(folder).await {
            Ok(files) => files,
            Err(e) => {
                log::error!("Failed to list files in '{}': {}", folder, e);
                Vec::new()
            }
        }
    }

    /// Delete every object in `folder` older than `max_age_hours`.
    async fn cleanup_old_files(&self, folder: &str, max_age_hours: i64) -> usize {
        let files = match self.list_files_checked(folder).await {
            Ok(files) => files,
            Err(e) => {
                log::error!("Cleanup of '{}' skipped, listing failed: {}", folder, e);
                return 0;
            }
        };

        let Some(cutoff) = cleanup_cutoff(max_age_hours) else {
            log::warn!("Cleanup of '{}' skipped, max age {}h is out of range", folder, max_age_hours);
            return 0;
        };
        let expired: Vec<String> = files
            .iter()
            .filter(|f| f.last_modified < cutoff)
            .map(|f| object_path(folder, &f.name))
            .collect();

        if expired.is_empty() {
            return 0;
        }

        let result = self.delete_files(&expired).await;
        if result.success {
            log::info!("Removed {} expired objects from '{}'", expired.len(), folder);
            expired.len()
        } else {
            log::error!(
                "Failed to remove expired objects from '{}': {}",
                folder,
                result.error.unwrap_or_default()
            );
            0
        }
    }

    async fn storage_stats_checked(&self, folder: &str) -> Result<StorageStats, StorageError> {
        let files = self.list_files_checked(folder).await?;
        Ok(StorageStats::from_files(&files))
    }

    async fn get_storage_stats(&self, folder: &str) -> StorageStats {
        match self.storage_stats_checked(folder).await {
            Ok(stats) => stats,
            Err(e) => {
                log::error!("Failed to collect storage stats for '{}': {}", folder, e);
                StorageStats::default()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub supabase_url: String,
    pub service_role_key: String,
    pub bucket_name: String,
    /// Base for public object links, without a trailing slash.
    pub public_base_url: String,
}

impl SupabaseConfig {
    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        Self {
            supabase_url: settings.supabase.url.clone(),
            service_role_key: settings.supabase.service_role_key.clone(),
            bucket_name: settings.storage.bucket.clone(),
            public_base_url: settings.public_storage_base(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListedObjectMetadata {
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    id: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    metadata: Option<ListedObjectMetadata>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct SupabaseStorage {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.config.supabase_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.service_role_key)
            .header("apikey", &self.config.service_role_key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ProviderError>(&body)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or(body);
        Err(StorageError::Provider {
            status: status.as_u16(),
            message,
        })
    }

    async fn put_object(&self, data: &[u8], path: &str, content_type: &str) -> Result<(), StorageError> {
        let url = self.endpoint(&format!("object/{}/{}", self.config.bucket_name, path));
        let response = self
            .authorized(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .body(data.to_vec())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn remove_objects(&self, paths: &[String]) -> Result<(), StorageError> {
        let url = self.endpoint(&format!("object/{}", self.config.bucket_name));
        let response = self
            .authorized(self.client.delete(url))
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn bucket_exists(&self) -> Result<bool, StorageError> {
        let url = self.endpoint(&format!("bucket/{}", self.config.bucket_name));
        let response = self.authorized(self.client.get(url)).send().await?;
        match response.status().as_u16() {
            200..=299 => Ok(true),
            // Supabase answers 400 or 404 for unknown buckets depending on version
            400 | 404 => Ok(false),
            _ => Self::check(response).await.map(|_| true),
        }
    }

    async fn create_bucket(&self) -> Result<(), StorageError> {
        let response = self
            .authorized(self.client.post(self.endpoint("bucket")))
            .json(&serde_json::json!({
                "id": self.config.bucket_name,
                "name": self.config.bucket_name,
                "public": true,
                "file_size_limit": MAX_OBJECT_SIZE_BYTES,
                "allowed_mime_types": ALLOWED_MIME_TYPES,
            }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_page(&self, folder: &str, offset: u32) -> Result<Vec<ListedObject>, StorageError> {
        let url = self.endpoint(&format!("object/list/{}", self.config.bucket_name));
        let response = self
            .authorized(self.client.post(url))
            .json(&serde_json::json!({
                "prefix": folder.trim_matches('/'),
                "limit": LIST_PAGE_LIMIT,
                "offset": offset,
                "sortBy": { "column": "created_at", "order": "asc" },
            }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload_buffer(
        &self,
        data: &[u8],
        file_name: &str,
        folder: &str,
        content_type: &str,
    ) -> UploadResult {
        let started = Instant::now();
        let path = object_path(folder, file_name);
        let outcome = self.put_object(data, &path, content_type).await;
        let metadata = UploadMetadata {
            file_size: data.len() as u64,
            upload_time_ms: started.elapsed().as_millis() as u64,
        };

        match outcome {
            Ok(()) => {
                log::info!("Uploaded {} ({} bytes) to bucket '{}'", path, data.len(), self.config.bucket_name);
                UploadResult::uploaded(self.public_url(&path), path, metadata)
            }
            Err(e) => {
                log::error!("Upload of {} failed: {}", path, e);
                UploadResult::failed(e.to_string(), metadata)
            }
        }
    }

    async fn delete_files(&self, paths: &[String]) -> OperationResult {
        if paths.is_empty() {
            return OperationResult::ok();
        }
        match self.remove_objects(paths).await {
            Ok(()) => OperationResult::ok(),
            Err(e) => {
                log::error!("Failed to delete {} objects: {}", paths.len(), e);
                OperationResult::failed(e.to_string())
            }
        }
    }

    async fn list_files_checked(&self, folder: &str) -> Result<Vec<FileInfo>, StorageError> {
        let objects = collect_pages(LIST_PAGE_LIMIT, |offset| self.list_page(folder, offset)).await?;

        Ok(objects
            .into_iter()
            // entries without an id are folder placeholders
            .filter(|o| o.id.is_some())
            .map(|o| {
                let last_modified = o.updated_at.or(o.created_at).unwrap_or_else(Utc::now);
                FileInfo {
                    public_url: self.public_url(&object_path(folder, &o.name)),
                    size: o.metadata.and_then(|m| m.size).unwrap_or(0),
                    name: o.name,
                    last_modified,
                }
            })
            .collect())
    }

    async fn ensure_bucket(&self) -> OperationResult {
        match self.bucket_exists().await {
            Ok(true) => OperationResult::ok(),
            Ok(false) => match self.create_bucket().await {
                Ok(()) => {
                    log::info!("Created storage bucket '{}'", self.config.bucket_name);
                    OperationResult::ok()
                }
                Err(e) => OperationResult::failed(e.to_string()),
            },
            Err(e) => OperationResult::failed(e.to_string()),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.public_base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Storage with a fixed listing that records deletions.
    struct ListingStorage {
        files: Vec<FileInfo>,
        list_fails: bool,
        deleted: Mutex<Vec<String>>,
    }

    impl ListingStorage {
        fn new(files: Vec<FileInfo>) -> Self {
            Self { files, list_fails: false, deleted: Mutex::new(Vec::new()) }
        }

        fn unreachable() -> Self {
            Self { list_fails: true, ..Self::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ObjectStorage for ListingStorage {
        async fn upload_buffer(
            &self,
            data: &[u8],
            _file_name: &str,
            _folder: &str,
            _content_type: &str,
        ) -> UploadResult {
            UploadResult::failed("read only", UploadMetadata { file_size: data.len() as u64, upload_time_ms: 0 })
        }

        async fn delete_files(&self, paths: &[String]) -> OperationResult {
            self.deleted.lock().extend(paths.iter().cloned());
            OperationResult::ok()
        }

        async fn list_files_checked(&self, _folder: &str) -> Result<Vec<FileInfo>, StorageError> {
            if self.list_fails {
                return Err(StorageError::Provider { status: 503, message: "unavailable".to_string() });
            }
            Ok(self.files.clone())
        }

        async fn ensure_bucket(&self) -> OperationResult {
            OperationResult::ok()
        }

        fn public_url(&self, path: &str) -> String {
            format!("https://cdn.test/{}", path)
        }
    }

    fn file(name: &str, size: u64, hours_old: i64) -> FileInfo {
        FileInfo {
            name: name.to_string(),
            size,
            last_modified: Utc::now() - ChronoDuration::hours(hours_old),
            public_url: format!("https://cdn.test/{}", name),
        }
    }

    #[test]
    fn test_object_path_joins_folder_and_name() {
        assert_eq!(object_path("documents", "a.pdf"), "documents/a.pdf");
        assert_eq!(object_path("/documents/", "a.pdf"), "documents/a.pdf");
        assert_eq!(object_path("", "a.pdf"), "a.pdf");
    }

    #[test]
    fn test_stats_pick_oldest_and_newest() {
        let files = vec![file("mid.pdf", 10, 5), file("old.pdf", 20, 50), file("new.pdf", 30, 1)];
        let stats = StorageStats::from_files(&files);

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.total_size, 60);
        assert_eq!(stats.oldest_file.as_deref(), Some("old.pdf"));
        assert_eq!(stats.newest_file.as_deref(), Some("new.pdf"));
    }

    #[test]
    fn test_stats_of_empty_folder() {
        let stats = StorageStats::from_files(&[]);
        assert_eq!(stats, StorageStats::default());
    }

    #[test]
    fn test_supabase_config_uses_settings() {
        let settings = crate::config::Settings::from_lookup(|key| match key {
            "SUPABASE_URL" => Some("https://test.supabase.co".to_string()),
            "SUPABASE_SERVICE_ROLE_KEY" => Some("service-key".to_string()),
            _ => None,
        });
        let config = SupabaseConfig::from_settings(&settings);

        assert_eq!(config.bucket_name, "order-documents");
        assert_eq!(
            config.public_base_url,
            "https://test.supabase.co/storage/v1/object/public/order-documents"
        );
        let storage = SupabaseStorage::new(config, reqwest::Client::new());
        assert_eq!(
            storage.public_url("documents/a.pdf"),
            "https://test.supabase.co/storage/v1/object/public/order-documents/documents/a.pdf"
        );
    }

    #[tokio::test]
    async fn test_cleanup_deletes_only_expired_objects() {
        let storage = ListingStorage::new(vec![file("old.pdf", 10, 48), file("new.pdf", 10, 1)]);

        assert_eq!(storage.cleanup_old_files("documents", 24).await, 1);
        assert_eq!(*storage.deleted.lock(), vec!["documents/old.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_cleanup_with_out_of_range_age_removes_nothing() {
        let storage = ListingStorage::new(vec![file("old.pdf", 10, 48)]);

        assert_eq!(storage.cleanup_old_files("documents", i64::MAX).await, 0);
        assert!(storage.deleted.lock().is_empty());
        assert!(cleanup_cutoff(i64::MAX).is_none());
        assert!(cleanup_cutoff(24).is_some());
    }

    #[tokio::test]
    async fn test_listing_failure_reads_as_empty_folder() {
        let storage = ListingStorage::unreachable();

        assert!(storage.list_files("documents").await.is_empty());
        assert_eq!(storage.get_storage_stats("documents").await, StorageStats::default());
        assert!(storage.storage_stats_checked("documents").await.is_err());
        assert_eq!(storage.cleanup_old_files("documents", 24).await, 0);
        assert!(storage.deleted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stats_and_single_delete_use_primitives() {
        let storage = ListingStorage::new(vec![file("a.pdf", 5, 2), file("b.pdf", 7, 1)]);

        let stats = storage.get_storage_stats("documents").await;
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 12);
        assert_eq!(storage.list_files("documents").await.len(), 2);

        assert!(storage.delete_file("documents/a.pdf").await.success);
        assert_eq!(*storage.deleted.lock(), vec!["documents/a.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_collect_pages_follows_offsets_past_first_page() {
        let total = 2500u32;
        let offsets = Mutex::new(Vec::new());
        let items = collect_pages(1000, |offset| {
            offsets.lock().push(offset);
            let end = (offset + 1000).min(total);
            async move { Ok::<_, StorageError>((offset..end).collect::<Vec<u32>>()) }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 2500);
        assert_eq!(items.last(), Some(&2499));
        assert_eq!(*offsets.lock(), vec![0, 1000, 2000]);
    }

    #[tokio::test]
    async fn test_collect_pages_stops_on_error() {
        let result = collect_pages(2, |offset| async move {
            if offset == 0 {
                Ok(vec![1, 2])
            } else {
                Err(StorageError::Provider { status: 500, message: "boom".to_string() })
            }
        })
        .await;

        assert!(matches!(result, Err(StorageError::Provider { status: 500, .. })));
    }
}
