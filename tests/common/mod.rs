#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use order_document_server::db::{AppState, OrderStore};
use order_document_server::document::model::{
    DocumentStatus, DocumentUpdate, NewOrderDocument, OrderDocument,
};
use order_document_server::order::model::{
    Order, OrderAddon, OrderCommunication, OrderDetails, OrderItem, OrderStatus,
};
use order_document_server::storage::{
    object_path, FileInfo, ObjectStorage, OperationResult, StorageError, UploadMetadata,
    UploadResult,
};
use order_document_server::webhook::model::{WebhookEvent, WebhookStatus};
use order_document_server::Settings;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Order store backed by plain collections.
#[derive(Default)]
pub struct InMemoryStore {
    orders: Mutex<HashMap<Uuid, OrderDetails>>,
    documents: Mutex<Vec<OrderDocument>>,
    communications: Mutex<Vec<OrderCommunication>>,
    webhook_events: Mutex<Vec<WebhookEvent>>,
    database_down: AtomicBool,
}

fn unavailable() -> sqlx::Error {
    sqlx::Error::PoolTimedOut
}

fn merge(target: &mut serde_json::Value, extra: &serde_json::Value) {
    if let (Some(target), Some(extra)) = (target.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_order(&self, details: OrderDetails) -> Uuid {
        let id = details.order.id;
        self.orders.lock().insert(id, details);
        id
    }

    pub fn insert_communication(&self, communication: OrderCommunication) {
        self.communications.lock().push(communication);
    }

    pub fn set_database_down(&self, down: bool) {
        self.database_down.store(down, Ordering::SeqCst);
    }

    pub fn documents(&self) -> Vec<OrderDocument> {
        self.documents.lock().clone()
    }

    pub fn webhook_events(&self) -> Vec<WebhookEvent> {
        self.webhook_events.lock().clone()
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.database_down.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn fetch_order_details(&self, order_id: Uuid) -> Result<Option<OrderDetails>, sqlx::Error> {
        self.check()?;
        Ok(self.orders.lock().get(&order_id).cloned())
    }

    async fn list_order_communications(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderCommunication>, sqlx::Error> {
        self.check()?;
        let mut rows: Vec<_> = self
            .communications
            .lock()
            .iter()
            .filter(|c| c.order_id == order_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create_document(&self, document: NewOrderDocument) -> Result<OrderDocument, sqlx::Error> {
        self.check()?;
        let now = Utc::now();
        let row = OrderDocument {
            id: Uuid::new_v4(),
            order_id: document.order_id,
            document_type: document.document_type,
            status: DocumentStatus::Pending,
            file_url: None,
            file_path: None,
            error_message: None,
            retry_count: 0,
            metadata: document.metadata,
            created_at: now,
            updated_at: now,
        };
        self.documents.lock().push(row.clone());
        Ok(row)
    }

    async fn update_document(
        &self,
        document_id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Option<OrderDocument>, sqlx::Error> {
        self.check()?;
        let mut documents = self.documents.lock();
        Ok(documents.iter_mut().find(|d| d.id == document_id).map(|row| {
            row.status = update.status;
            row.file_url = update.file_url;
            row.file_path = update.file_path;
            row.error_message = update.error_message;
            merge(&mut row.metadata, &update.metadata);
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Option<OrderDocument>, sqlx::Error> {
        self.check()?;
        Ok(self
            .documents
            .lock()
            .iter()
            .find(|d| d.id == document_id)
            .cloned())
    }

    async fn list_order_documents(&self, order_id: Uuid) -> Result<Vec<OrderDocument>, sqlx::Error> {
        self.check()?;
        // insertion order stands in for created_at, reversed for newest first
        Ok(self
            .documents
            .lock()
            .iter()
            .rev()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn mark_document_retry(
        &self,
        document_id: Uuid,
        metadata: serde_json::Value,
    ) -> Result<Option<OrderDocument>, sqlx::Error> {
        self.check()?;
        let mut documents = self.documents.lock();
        Ok(documents.iter_mut().find(|d| d.id == document_id).map(|row| {
            row.status = DocumentStatus::Pending;
            row.retry_count += 1;
            row.error_message = None;
            row.file_url = None;
            row.file_path = None;
            merge(&mut row.metadata, &metadata);
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn insert_webhook_event(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<WebhookEvent, sqlx::Error> {
        self.check()?;
        let now = Utc::now();
        let event = WebhookEvent {
            id: Uuid::new_v4(),
            event_type: event_type.to_string(),
            payload,
            status: WebhookStatus::Processing,
            error_message: None,
            processing_duration_ms: None,
            created_at: now,
            updated_at: now,
        };
        self.webhook_events.lock().push(event.clone());
        Ok(event)
    }

    async fn finish_webhook_event(
        &self,
        event_id: Uuid,
        status: WebhookStatus,
        error_message: Option<String>,
        duration_ms: i64,
    ) -> Result<(), sqlx::Error> {
        self.check()?;
        if let Some(event) = self.webhook_events.lock().iter_mut().find(|e| e.id == event_id) {
            event.status = status;
            event.error_message = error_message;
            event.processing_duration_ms = Some(duration_ms);
            event.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.check()
    }
}

/// Mock implementation of ObjectStorage for testing
pub struct MockObjectStorage {
    files: Arc<tokio::sync::Mutex<HashMap<String, Vec<u8>>>>,
    upload_error: Mutex<Option<String>>,
    rejected_prefix: Mutex<Option<(String, String)>>,
    upload_delay: Mutex<Option<Duration>>,
    list_fails: AtomicBool,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            upload_error: Mutex::new(None),
            rejected_prefix: Mutex::new(None),
            upload_delay: Mutex::new(None),
            list_fails: AtomicBool::new(false),
        }
    }

    /// Every following upload returns `{success: false, error}`.
    pub fn fail_uploads(&self, error: &str) {
        *self.upload_error.lock() = Some(error.to_string());
    }

    /// Only uploads whose file name starts with `prefix` fail.
    pub fn fail_uploads_for(&self, prefix: &str, error: &str) {
        *self.rejected_prefix.lock() = Some((prefix.to_string(), error.to_string()));
    }

    pub fn delay_uploads(&self, delay: Duration) {
        *self.upload_delay.lock() = Some(delay);
    }

    pub fn fail_listing(&self) {
        self.list_fails.store(true, Ordering::SeqCst);
    }

    pub async fn has_file(&self, path: &str) -> bool {
        self.files.lock().await.contains_key(path)
    }

    pub async fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(path).cloned()
    }

    pub async fn file_count(&self) -> usize {
        self.files.lock().await.len()
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn upload_buffer(
        &self,
        data: &[u8],
        file_name: &str,
        folder: &str,
        _content_type: &str,
    ) -> UploadResult {
        let delay = *self.upload_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let metadata = UploadMetadata {
            file_size: data.len() as u64,
            upload_time_ms: 1,
        };
        let error = self.upload_error.lock().clone().or_else(|| {
            self.rejected_prefix
                .lock()
                .as_ref()
                .filter(|(prefix, _)| file_name.starts_with(prefix.as_str()))
                .map(|(_, error)| error.clone())
        });
        if let Some(error) = error {
            return UploadResult::failed(error, metadata);
        }

        let path = object_path(folder, file_name);
        let mut files = self.files.lock().await;
        if files.contains_key(&path) {
            return UploadResult::failed("The resource already exists", metadata);
        }
        files.insert(path.clone(), data.to_vec());
        UploadResult::uploaded(self.public_url(&path), path, metadata)
    }

    async fn delete_files(&self, paths: &[String]) -> OperationResult {
        let mut files = self.files.lock().await;
        for path in paths {
            files.remove(path);
        }
        OperationResult::ok()
    }

    async fn list_files_checked(&self, folder: &str) -> Result<Vec<FileInfo>, StorageError> {
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(StorageError::Provider {
                status: 500,
                message: "bucket unavailable".to_string(),
            });
        }
        let prefix = format!("{}/", folder.trim_matches('/'));
        let files = self.files.lock().await;
        Ok(files
            .iter()
            .filter_map(|(path, data)| {
                path.strip_prefix(&prefix).map(|name| FileInfo {
                    name: name.to_string(),
                    size: data.len() as u64,
                    last_modified: Utc::now(),
                    public_url: self.public_url(path),
                })
            })
            .collect())
    }

    async fn ensure_bucket(&self) -> OperationResult {
        OperationResult::ok()
    }

    fn public_url(&self, path: &str) -> String {
        format!("http://test.example.com/storage/{}", path)
    }
}

pub fn test_settings(output_dir: &Path, overrides: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("SUPABASE_URL".to_string(), "http://test.example.com".to_string()),
        ("SUPABASE_SERVICE_ROLE_KEY".to_string(), "service-key".to_string()),
        ("DOCUMENT_OUTPUT_DIR".to_string(), output_dir.display().to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Settings::from_lookup(|key| vars.get(key).cloned())
}

pub fn order(order_number: &str) -> Order {
    let now = Utc::now();
    Order {
        id: Uuid::new_v4(),
        order_number: order_number.to_string(),
        company_name: Some("Test Florist".to_string()),
        contact_name: "Test Buyer".to_string(),
        email: "buyer@example.com".to_string(),
        phone: None,
        delivery_address: Some("1 Main St".to_string()),
        city: Some("Portland".to_string()),
        state: Some("OR".to_string()),
        zip_code: Some("97205".to_string()),
        po_number: None,
        requested_date: None,
        special_instructions: None,
        subtotal: 50.0,
        addon_total: 0.0,
        total: 50.0,
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}

pub fn item(order_id: Uuid, name: &str, quantity: i32, unit_price: f64) -> OrderItem {
    OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: Some(Uuid::new_v4()),
        quantity,
        unit_price,
        total_price: unit_price * f64::from(quantity),
        product_name: Some(name.to_string()),
        product_type: Some("bouquet".to_string()),
        product_description: None,
    }
}

pub fn addon(order_id: Uuid, name: &str, price: f64) -> OrderAddon {
    OrderAddon {
        id: Uuid::new_v4(),
        order_id,
        addon_id: Some(Uuid::new_v4()),
        price,
        addon_name: Some(name.to_string()),
        addon_description: None,
        requirements: None,
    }
}

/// Order `TEST-1` with one "Mixed Variety" line of two stems.
pub fn sample_order() -> OrderDetails {
    let order = order("TEST-1");
    let items = vec![item(order.id, "Mixed Variety", 2, 25.0)];
    OrderDetails {
        order,
        items,
        addons: Vec::new(),
    }
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub storage: Arc<MockObjectStorage>,
    pub output_dir: tempfile::TempDir,
}

pub fn setup(overrides: &[(&str, &str)]) -> TestContext {
    let output_dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(InMemoryStore::new());
    let storage = Arc::new(MockObjectStorage::new());
    let state = AppState::new_with_store_and_storage(
        test_settings(output_dir.path(), overrides),
        store.clone(),
        storage.clone(),
    );
    TestContext {
        state,
        store,
        storage,
        output_dir,
    }
}
