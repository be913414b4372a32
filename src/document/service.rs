//! Generation flow for tracked documents.
//!
//! Each requested document gets its own `order_documents` row which ends in
//! either `generated` or `failed`. Documents of one request are independent:
//! a failing pick slip never rolls back a generated receipt.

use chrono::Utc;
use futures::future::join_all;
use log::{error, info, warn};
use serde_json::json;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::generator::{GeneratedFile, GenerationOptions, PdfGenerationService, UploadedDocument, DOCUMENTS_FOLDER};
use super::model::{
    DocumentOutcome, DocumentResults, DocumentStatus, DocumentType, DocumentUpdate,
    GenerateDocumentsRequest, GenerateDocumentsResponse, HealthChecks, HealthStatus,
    NewOrderDocument, OrderDocument,
};
use super::DocumentError;
use crate::config::Settings;
use crate::db::OrderStore;
use crate::metrics;
use crate::order::model::OrderDetails;
use crate::storage::ObjectStorage;

pub struct DocumentService {
    settings: Arc<Settings>,
    store: Arc<dyn OrderStore + Send + Sync>,
    storage: Arc<dyn ObjectStorage + Send + Sync>,
    generator: PdfGenerationService,
}

/// `{type}_{order_number}_{epoch_ms}.pdf`
pub fn tracked_file_name(document_type: DocumentType, order_number: &str) -> String {
    format!(
        "{}_{}_{}.pdf",
        document_type.as_str(),
        order_number,
        Utc::now().timestamp_millis()
    )
}

async fn discard_local(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove local file {}: {}", path.display(), e);
        }
    }
}

impl DocumentService {
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<dyn OrderStore + Send + Sync>,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
    ) -> Self {
        let generator = PdfGenerationService::new(&settings.storage.output_dir, storage.clone());
        Self {
            settings,
            store,
            storage,
            generator,
        }
    }

    pub fn generator(&self) -> &PdfGenerationService {
        &self.generator
    }

    fn trace(&self, message: impl FnOnce() -> String) {
        if self.settings.debug.documents {
            info!("[documents] {}", message());
        }
    }

    fn ensure_enabled(&self, types: &[DocumentType]) -> Result<(), DocumentError> {
        if !self.settings.can_generate_documents() {
            return Err(DocumentError::GenerationDisabled("Document".to_string()));
        }
        for document_type in types {
            let enabled = match document_type {
                DocumentType::Receipt => self.settings.can_generate_receipts(),
                DocumentType::PickSlip => self.settings.can_generate_pick_slips(),
            };
            if !enabled {
                return Err(DocumentError::GenerationDisabled(
                    document_type.title().to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn load_order(&self, order_id: Uuid) -> Result<OrderDetails, DocumentError> {
        self.store
            .fetch_order_details(order_id)
            .await?
            .ok_or(DocumentError::OrderNotFound(order_id))
    }

    pub async fn generate_documents(
        &self,
        request: GenerateDocumentsRequest,
    ) -> Result<GenerateDocumentsResponse, DocumentError> {
        let types = request.document_type.document_types();
        self.ensure_enabled(&types)?;
        let details = self.load_order(request.order_id).await?;

        self.trace(|| {
            format!(
                "Generating {:?} for order {} ({} items, {} add-ons)",
                request.document_type,
                details.order.order_number,
                details.items.len(),
                details.addons.len()
            )
        });

        let outcomes = join_all(
            types
                .iter()
                .map(|t| self.generate_tracked(&details, *t, request.webhook_event_id)),
        )
        .await;

        let mut results = DocumentResults::default();
        for (document_type, outcome) in types.into_iter().zip(outcomes) {
            results.set(document_type, outcome);
        }

        let response = GenerateDocumentsResponse::from_results(results);
        info!(
            "Document generation for order {} finished, success={}",
            details.order.order_number, response.success
        );
        Ok(response)
    }

    /// New tracking row, then the full pipeline on it.
    async fn generate_tracked(
        &self,
        details: &OrderDetails,
        document_type: DocumentType,
        webhook_event_id: Option<Uuid>,
    ) -> DocumentOutcome {
        let mut metadata = json!({ "generation_started_at": Utc::now().to_rfc3339() });
        if let Some(event_id) = webhook_event_id {
            metadata["webhook_event_id"] = json!(event_id);
        }

        let row = match self
            .store
            .create_document(NewOrderDocument {
                order_id: details.order.id,
                document_type,
                metadata,
            })
            .await
        {
            Ok(row) => row,
            Err(e) => {
                error!(
                    "Failed to create {} record for order {}: {}",
                    document_type, details.order.order_number, e
                );
                metrics::record_document(document_type, DocumentStatus::Failed, 0.0);
                return DocumentOutcome::failed(None, format!("Failed to create document record: {}", e));
            }
        };

        self.run_pipeline(row.id, details, document_type).await
    }

    /// Render, upload and record the result on an existing row.
    async fn run_pipeline(
        &self,
        document_id: Uuid,
        details: &OrderDetails,
        document_type: DocumentType,
    ) -> DocumentOutcome {
        let started = Instant::now();
        let result = self.render_and_upload(details, document_type).await;
        let seconds = started.elapsed().as_secs_f64();

        match result {
            Ok((generated, uploaded)) => {
                let metadata = json!({
                    "file_name": generated.file_name,
                    "file_size": generated.metadata.file_size,
                    "page_count": generated.metadata.page_count,
                    "generation_time_ms": generated.metadata.generation_time_ms,
                    "upload_time_ms": uploaded.metadata.upload_time_ms,
                    "generated_at": Utc::now().to_rfc3339(),
                });
                self.record(
                    document_id,
                    DocumentUpdate::generated(uploaded.file_url.clone(), uploaded.file_path.clone(), metadata),
                )
                .await;

                metrics::record_document(document_type, DocumentStatus::Generated, seconds);
                self.trace(|| format!("{} {} uploaded to {}", document_type, document_id, uploaded.file_url));
                DocumentOutcome::generated(document_id, uploaded.file_url)
            }
            Err(e) => {
                let message = e.to_string();
                error!(
                    "{} generation failed for order {}: {}",
                    document_type.title(),
                    details.order.order_number,
                    message
                );
                self.record(
                    document_id,
                    DocumentUpdate::failed(message.clone(), json!({ "failed_at": Utc::now().to_rfc3339() })),
                )
                .await;
                metrics::record_document(document_type, DocumentStatus::Failed, seconds);
                DocumentOutcome::failed(Some(document_id), message)
            }
        }
    }

    async fn render_and_upload(
        &self,
        details: &OrderDetails,
        document_type: DocumentType,
    ) -> Result<(GeneratedFile, UploadedDocument), DocumentError> {
        let data = self.generator.prepare_template_data(details, document_type);
        let options = GenerationOptions {
            file_name: Some(tracked_file_name(document_type, &details.order.order_number)),
        };

        let generated = self
            .bounded("render", self.generator.generate(document_type, data, options))
            .await?;
        let uploaded = self
            .bounded(
                "upload",
                self.generator
                    .upload_document(&generated.file_path, &generated.file_name),
            )
            .await;
        // staging copy, removed whether or not the upload went through
        discard_local(&generated.file_path).await;

        Ok((generated, uploaded?))
    }

    async fn bounded<T, F>(&self, step: &'static str, future: F) -> Result<T, DocumentError>
    where
        F: Future<Output = Result<T, DocumentError>>,
    {
        let limit = self.settings.document_timeout();
        match tokio::time::timeout(limit, future).await {
            Ok(result) => result,
            Err(_) => Err(DocumentError::Timeout {
                step,
                timeout_ms: limit.as_millis() as u64,
            }),
        }
    }

    /// Row updates are best effort; a failed write leaves the row as it was.
    async fn record(&self, document_id: Uuid, update: DocumentUpdate) {
        match self.store.update_document(document_id, update).await {
            Ok(Some(_)) => {}
            Ok(None) => warn!("Document {} disappeared before its status was recorded", document_id),
            Err(e) => error!("Failed to update document {}: {}", document_id, e),
        }
    }

    /// Re-run the whole pipeline for an existing row.
    pub async fn retry_document(
        &self,
        document_id: Uuid,
    ) -> Result<GenerateDocumentsResponse, DocumentError> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or(DocumentError::DocumentNotFound(document_id))?;
        self.ensure_enabled(&[document.document_type])?;
        let details = self.load_order(document.order_id).await?;

        let reset = self
            .store
            .mark_document_retry(document_id, json!({ "retried_at": Utc::now().to_rfc3339() }))
            .await?
            .ok_or(DocumentError::DocumentNotFound(document_id))?;
        info!(
            "Retrying {} {} for order {} (attempt {})",
            reset.document_type, document_id, details.order.order_number, reset.retry_count
        );

        let outcome = self.run_pipeline(document_id, &details, reset.document_type).await;
        let mut results = DocumentResults::default();
        results.set(reset.document_type, outcome);
        Ok(GenerateDocumentsResponse::from_results(results))
    }

    pub async fn get_order_documents(&self, order_id: Uuid) -> Result<Vec<OrderDocument>, DocumentError> {
        Ok(self.store.list_order_documents(order_id).await?)
    }

    pub async fn get_health_status(&self) -> HealthStatus {
        let mut problems = Vec::new();

        let database = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                problems.push(format!("database: {}", e));
                false
            }
        };
        let storage = match self.storage.storage_stats_checked(DOCUMENTS_FOLDER).await {
            Ok(_) => true,
            Err(e) => {
                problems.push(format!("storage: {}", e));
                false
            }
        };
        let configuration = self.settings.can_generate_documents();
        if !configuration {
            problems.push("configuration: document generation is disabled".to_string());
        }

        let healthy = database && storage && configuration;
        if !healthy {
            warn!("Document service unhealthy: {}", problems.join("; "));
        }

        HealthStatus {
            healthy,
            checks: HealthChecks {
                database,
                storage,
                configuration,
            },
            timestamp: Utc::now(),
            error: if healthy { None } else { Some(problems.join("; ")) },
        }
    }

    /// Remove local render output older than `max_age_hours`.
    pub async fn cleanup_local_files(&self, max_age_hours: i64) -> usize {
        self.generator.cleanup_old_files(max_age_hours).await
    }
}
