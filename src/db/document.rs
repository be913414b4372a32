//! Document tracking row operations

use super::PgOrderStore;
use crate::document::model::{DocumentStatus, DocumentUpdate, NewOrderDocument, OrderDocument};
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str = "id, order_id, document_type, status, file_url, file_path, \
     error_message, retry_count, metadata, created_at, updated_at";

impl PgOrderStore {
    pub async fn insert_document(&self, document: &NewOrderDocument) -> Result<OrderDocument, sqlx::Error> {
        let sql = format!(
            "INSERT INTO order_documents (id, order_id, document_type, status, retry_count, metadata) \
             VALUES ($1, $2, $3, $4, 0, $5) \
             RETURNING {}",
            DOCUMENT_COLUMNS
        );
        sqlx::query_as::<_, OrderDocument>(&sql)
            .bind(Uuid::new_v4())
            .bind(document.order_id)
            .bind(document.document_type.as_str())
            .bind(DocumentStatus::Pending.as_str())
            .bind(&document.metadata)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn set_document_result(
        &self,
        document_id: Uuid,
        update: &DocumentUpdate,
    ) -> Result<Option<OrderDocument>, sqlx::Error> {
        let sql = format!(
            "UPDATE order_documents \
             SET status = $2, file_url = $3, file_path = $4, error_message = $5, \
                 metadata = metadata || $6, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            DOCUMENT_COLUMNS
        );
        sqlx::query_as::<_, OrderDocument>(&sql)
            .bind(document_id)
            .bind(update.status.as_str())
            .bind(update.file_url.as_deref())
            .bind(update.file_path.as_deref())
            .bind(update.error_message.as_deref())
            .bind(&update.metadata)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_document_by_id(&self, document_id: Uuid) -> Result<Option<OrderDocument>, sqlx::Error> {
        let sql = format!("SELECT {} FROM order_documents WHERE id = $1", DOCUMENT_COLUMNS);
        sqlx::query_as::<_, OrderDocument>(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_documents_for_order(&self, order_id: Uuid) -> Result<Vec<OrderDocument>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM order_documents WHERE order_id = $1 ORDER BY created_at DESC, id",
            DOCUMENT_COLUMNS
        );
        sqlx::query_as::<_, OrderDocument>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn reset_document_for_retry(
        &self,
        document_id: Uuid,
        metadata: serde_json::Value,
    ) -> Result<Option<OrderDocument>, sqlx::Error> {
        let sql = format!(
            "UPDATE order_documents \
             SET status = $2, retry_count = retry_count + 1, error_message = NULL, \
                 file_url = NULL, file_path = NULL, metadata = metadata || $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            DOCUMENT_COLUMNS
        );
        sqlx::query_as::<_, OrderDocument>(&sql)
            .bind(document_id)
            .bind(DocumentStatus::Pending.as_str())
            .bind(metadata)
            .fetch_optional(&self.pool)
            .await
    }
}
