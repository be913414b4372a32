use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::order::model::ParseStatusError;

pub const ORDER_CREATED: &str = "order.created";
pub const ORDER_UPDATED: &str = "order.updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Received,
    Processing,
    Completed,
    Failed,
}

impl WebhookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStatus::Received => "received",
            WebhookStatus::Processing => "processing",
            WebhookStatus::Completed => "completed",
            WebhookStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WebhookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(WebhookStatus::Received),
            "processing" => Ok(WebhookStatus::Processing),
            "completed" => Ok(WebhookStatus::Completed),
            "failed" => Ok(WebhookStatus::Failed),
            other => Err(ParseStatusError {
                kind: "webhook status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for WebhookStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WebhookEvent {
    pub id: Uuid,
    pub event_type: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    #[sqlx(try_from = "String")]
    pub status: WebhookStatus,
    pub error_message: Option<String>,
    pub processing_duration_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inbound order event. Extra fields are kept in the stored payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderWebhookPayload {
    #[serde(rename = "type")]
    #[schema(example = "order.created")]
    pub event_type: String,
    pub order_id: Uuid,
}

impl OrderWebhookPayload {
    pub fn triggers_generation(&self) -> bool {
        matches!(self.event_type.as_str(), ORDER_CREATED | ORDER_UPDATED)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    pub event_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<crate::document::model::DocumentResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
