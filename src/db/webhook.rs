//! Webhook event log operations

use super::PgOrderStore;
use crate::webhook::model::{WebhookEvent, WebhookStatus};
use uuid::Uuid;

impl PgOrderStore {
    pub async fn create_webhook_event(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<WebhookEvent, sqlx::Error> {
        sqlx::query_as::<_, WebhookEvent>(
            r#"
            INSERT INTO webhook_events (id, event_type, payload, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, event_type, payload, status, error_message,
                      processing_duration_ms, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_type)
        .bind(payload)
        .bind(WebhookStatus::Processing.as_str())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn complete_webhook_event(
        &self,
        event_id: Uuid,
        status: WebhookStatus,
        error_message: Option<&str>,
        duration_ms: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE webhook_events
            SET status = $2, error_message = $3, processing_duration_ms = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .bind(status.as_str())
        .bind(error_message)
        .bind(duration_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
