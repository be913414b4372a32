//! Database module - AppState and the order store
//!
//! Queries are split by table family:
//! - `order` - orders with their items, add-ons and communications
//! - `document` - `order_documents` tracking rows
//! - `webhook` - inbound webhook event log
//! - `fixtures` - test schema and seed data

mod document;
pub mod fixtures;
mod order;
mod webhook;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Settings;
use crate::document::model::{DocumentUpdate, NewOrderDocument, OrderDocument};
use crate::document::DocumentService;
use crate::order::model::{OrderCommunication, OrderDetails};
use crate::storage::{ObjectStorage, SupabaseConfig, SupabaseStorage};
use crate::webhook::model::{WebhookEvent, WebhookStatus};

/// Persistence seam used by the document service and handlers.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn fetch_order_details(&self, order_id: Uuid) -> Result<Option<OrderDetails>, sqlx::Error>;

    async fn list_order_communications(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderCommunication>, sqlx::Error>;

    /// Insert a `pending` tracking row.
    async fn create_document(&self, document: NewOrderDocument) -> Result<OrderDocument, sqlx::Error>;

    async fn update_document(
        &self,
        document_id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Option<OrderDocument>, sqlx::Error>;

    async fn get_document(&self, document_id: Uuid) -> Result<Option<OrderDocument>, sqlx::Error>;

    /// Newest first.
    async fn list_order_documents(&self, order_id: Uuid) -> Result<Vec<OrderDocument>, sqlx::Error>;

    /// Reset a row to `pending` and bump its retry count.
    async fn mark_document_retry(
        &self,
        document_id: Uuid,
        metadata: serde_json::Value,
    ) -> Result<Option<OrderDocument>, sqlx::Error>;

    async fn insert_webhook_event(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<WebhookEvent, sqlx::Error>;

    async fn finish_webhook_event(
        &self,
        event_id: Uuid,
        status: WebhookStatus,
        error_message: Option<String>,
        duration_ms: i64,
    ) -> Result<(), sqlx::Error>;

    async fn ping(&self) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct PgOrderStore {
    pub pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn fetch_order_details(&self, order_id: Uuid) -> Result<Option<OrderDetails>, sqlx::Error> {
        self.get_order_details(order_id).await
    }

    async fn list_order_communications(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderCommunication>, sqlx::Error> {
        self.get_order_communications(order_id).await
    }

    async fn create_document(&self, document: NewOrderDocument) -> Result<OrderDocument, sqlx::Error> {
        self.insert_document(&document).await
    }

    async fn update_document(
        &self,
        document_id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Option<OrderDocument>, sqlx::Error> {
        self.set_document_result(document_id, &update).await
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Option<OrderDocument>, sqlx::Error> {
        self.get_document_by_id(document_id).await
    }

    async fn list_order_documents(&self, order_id: Uuid) -> Result<Vec<OrderDocument>, sqlx::Error> {
        self.get_documents_for_order(order_id).await
    }

    async fn mark_document_retry(
        &self,
        document_id: Uuid,
        metadata: serde_json::Value,
    ) -> Result<Option<OrderDocument>, sqlx::Error> {
        self.reset_document_for_retry(document_id, metadata).await
    }

    async fn insert_webhook_event(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<WebhookEvent, sqlx::Error> {
        self.create_webhook_event(event_type, payload).await
    }

    async fn finish_webhook_event(
        &self,
        event_id: Uuid,
        status: WebhookStatus,
        error_message: Option<String>,
        duration_ms: i64,
    ) -> Result<(), sqlx::Error> {
        self.complete_webhook_event(event_id, status, error_message.as_deref(), duration_ms)
            .await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn OrderStore + Send + Sync>,
    pub storage: Arc<dyn ObjectStorage + Send + Sync>,
    pub documents: Arc<DocumentService>,
}

impl AppState {
    pub async fn new_with_config(settings: Settings) -> Result<Self, Box<dyn std::error::Error>> {
        if settings.supabase.database_url.is_empty() {
            return Err("SUPABASE_DATABASE_URL must be set".into());
        }
        let store = PgOrderStore::connect(&settings.supabase.database_url).await?;

        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("order-document-server/0.3")
            .build()?;

        let storage = Arc::new(SupabaseStorage::new(
            SupabaseConfig::from_settings(&settings),
            http_client,
        ));

        Ok(Self::new_with_store_and_storage(
            settings,
            Arc::new(store),
            storage,
        ))
    }

    pub fn new_with_store_and_storage(
        settings: Settings,
        store: Arc<dyn OrderStore + Send + Sync>,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
    ) -> Self {
        let settings = Arc::new(settings);
        let documents = Arc::new(DocumentService::new(
            settings.clone(),
            store.clone(),
            storage.clone(),
        ));

        AppState {
            settings,
            store,
            storage,
            documents,
        }
    }
}
