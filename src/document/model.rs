use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::order::model::ParseStatusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Receipt,
    PickSlip,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Receipt => "receipt",
            DocumentType::PickSlip => "pick_slip",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DocumentType::Receipt => "Receipt",
            DocumentType::PickSlip => "Pick Slip",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "receipt" => Ok(DocumentType::Receipt),
            "pick_slip" => Ok(DocumentType::PickSlip),
            other => Err(ParseStatusError {
                kind: "document type",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DocumentType {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Generated,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Generated => "generated",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DocumentStatus::Pending),
            "generated" => Ok(DocumentStatus::Generated),
            "failed" => Ok(DocumentStatus::Failed),
            other => Err(ParseStatusError {
                kind: "document status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DocumentStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which documents a generation request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRequestType {
    Receipt,
    PickSlip,
    Both,
}

impl DocumentRequestType {
    pub fn document_types(&self) -> Vec<DocumentType> {
        match self {
            DocumentRequestType::Receipt => vec![DocumentType::Receipt],
            DocumentRequestType::PickSlip => vec![DocumentType::PickSlip],
            DocumentRequestType::Both => vec![DocumentType::Receipt, DocumentType::PickSlip],
        }
    }
}

impl From<DocumentType> for DocumentRequestType {
    fn from(value: DocumentType) -> Self {
        match value {
            DocumentType::Receipt => DocumentRequestType::Receipt,
            DocumentType::PickSlip => DocumentRequestType::PickSlip,
        }
    }
}

/// Tracking row for one generated artifact.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderDocument {
    pub id: Uuid,
    pub order_id: Uuid,
    #[sqlx(try_from = "String")]
    pub document_type: DocumentType,
    #[sqlx(try_from = "String")]
    pub status: DocumentStatus,
    pub file_url: Option<String>,
    pub file_path: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrderDocument {
    pub order_id: Uuid,
    pub document_type: DocumentType,
    pub metadata: serde_json::Value,
}

/// Terminal state written at the end of a generation attempt.
#[derive(Debug, Clone)]
pub struct DocumentUpdate {
    pub status: DocumentStatus,
    pub file_url: Option<String>,
    pub file_path: Option<String>,
    pub error_message: Option<String>,
    /// Merged into the existing metadata object.
    pub metadata: serde_json::Value,
}

impl DocumentUpdate {
    pub fn generated(file_url: String, file_path: String, metadata: serde_json::Value) -> Self {
        Self {
            status: DocumentStatus::Generated,
            file_url: Some(file_url),
            file_path: Some(file_path),
            error_message: None,
            metadata,
        }
    }

    pub fn failed(error_message: String, metadata: serde_json::Value) -> Self {
        Self {
            status: DocumentStatus::Failed,
            file_url: None,
            file_path: None,
            error_message: Some(error_message),
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentsRequest {
    pub order_id: Uuid,
    pub document_type: DocumentRequestType,
    #[serde(default)]
    pub webhook_event_id: Option<Uuid>,
}

/// Per-document result of a generation request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutcome {
    pub id: Option<Uuid>,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentOutcome {
    pub fn generated(id: Uuid, file_url: String) -> Self {
        Self {
            id: Some(id),
            status: DocumentStatus::Generated,
            file_url: Some(file_url),
            error: None,
        }
    }

    pub fn failed(id: Option<Uuid>, error: String) -> Self {
        Self {
            id,
            status: DocumentStatus::Failed,
            file_url: None,
            error: Some(error),
        }
    }

    pub fn is_generated(&self) -> bool {
        self.status == DocumentStatus::Generated
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<DocumentOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pick_slip: Option<DocumentOutcome>,
}

impl DocumentResults {
    pub fn set(&mut self, document_type: DocumentType, outcome: DocumentOutcome) {
        match document_type {
            DocumentType::Receipt => self.receipt = Some(outcome),
            DocumentType::PickSlip => self.pick_slip = Some(outcome),
        }
    }

    pub fn get(&self, document_type: DocumentType) -> Option<&DocumentOutcome> {
        match document_type {
            DocumentType::Receipt => self.receipt.as_ref(),
            DocumentType::PickSlip => self.pick_slip.as_ref(),
        }
    }

    pub fn all_generated(&self) -> bool {
        [self.receipt.as_ref(), self.pick_slip.as_ref()]
            .into_iter()
            .flatten()
            .all(DocumentOutcome::is_generated)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentsResponse {
    pub success: bool,
    pub documents: DocumentResults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateDocumentsResponse {
    pub fn from_results(documents: DocumentResults) -> Self {
        let success = documents.all_generated();
        Self {
            success,
            error: if success {
                None
            } else {
                Some("One or more documents failed to generate".to_string())
            },
            documents,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            documents: DocumentResults::default(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct HealthChecks {
    pub database: bool,
    pub storage: bool,
    pub configuration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub healthy: bool,
    pub checks: HealthChecks,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
