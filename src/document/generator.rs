//! Render documents to the local output directory and push them to storage.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::model::DocumentType;
use super::pick_slip::render_pick_slip;
use super::receipt::render_receipt;
use super::template::{self, DocumentTemplateData};
use super::{DocumentError, RenderedPdf};
use crate::order::model::OrderDetails;
use crate::storage::{cleanup_cutoff, ObjectStorage, UploadMetadata};

/// Storage folder every generated document is uploaded into.
pub const DOCUMENTS_FOLDER: &str = "documents";

#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Overrides the generated file name.
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationMetadata {
    pub file_size: u64,
    pub generation_time_ms: u64,
    pub page_count: usize,
}

#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub file_path: PathBuf,
    pub file_name: String,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_url: String,
    /// Object path inside the bucket.
    pub file_path: String,
    pub metadata: UploadMetadata,
}

#[derive(Debug)]
pub struct BothDocuments {
    pub receipt: Result<GeneratedFile, DocumentError>,
    pub pick_slip: Result<GeneratedFile, DocumentError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub output_dir: String,
    pub total_files: usize,
    pub total_size: u64,
    pub oldest_file: Option<DateTime<Utc>>,
    pub newest_file: Option<DateTime<Utc>>,
}

/// `receipt-PO-1001-1718000000000.pdf`
pub fn default_file_name(document_type: DocumentType, order_number: &str) -> String {
    let name = format!(
        "{}-{}-{}.pdf",
        document_type.as_str().replace('_', "-"),
        order_number,
        Utc::now().timestamp_millis()
    );
    sanitize_filename::sanitize(name)
}

pub struct PdfGenerationService {
    output_dir: PathBuf,
    storage: Arc<dyn ObjectStorage + Send + Sync>,
}

impl PdfGenerationService {
    pub fn new(output_dir: impl Into<PathBuf>, storage: Arc<dyn ObjectStorage + Send + Sync>) -> Self {
        Self {
            output_dir: output_dir.into(),
            storage,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn prepare_template_data(
        &self,
        details: &OrderDetails,
        document_type: DocumentType,
    ) -> DocumentTemplateData {
        template::prepare_template_data(details, document_type)
    }

    pub async fn generate_receipt(
        &self,
        data: DocumentTemplateData,
        options: GenerationOptions,
    ) -> Result<GeneratedFile, DocumentError> {
        self.generate(DocumentType::Receipt, data, options).await
    }

    pub async fn generate_pick_slip(
        &self,
        data: DocumentTemplateData,
        options: GenerationOptions,
    ) -> Result<GeneratedFile, DocumentError> {
        self.generate(DocumentType::PickSlip, data, options).await
    }

    pub async fn generate(
        &self,
        document_type: DocumentType,
        data: DocumentTemplateData,
        options: GenerationOptions,
    ) -> Result<GeneratedFile, DocumentError> {
        let started = Instant::now();
        let order_number = data.order.order_number.clone();

        // layout and serialisation are CPU-bound
        let rendered: RenderedPdf = tokio::task::spawn_blocking(move || match document_type {
            DocumentType::Receipt => render_receipt(&data),
            DocumentType::PickSlip => render_pick_slip(&data),
        })
        .await
        .map_err(|e| DocumentError::Task(e.to_string()))??;

        tokio::fs::create_dir_all(&self.output_dir).await?;

        let file_name = match options.file_name {
            Some(name) => sanitize_filename::sanitize(name),
            None => default_file_name(document_type, &order_number),
        };
        let file_path = self.output_dir.join(&file_name);
        tokio::fs::write(&file_path, &rendered.bytes).await?;

        let metadata = GenerationMetadata {
            file_size: rendered.bytes.len() as u64,
            generation_time_ms: started.elapsed().as_millis() as u64,
            page_count: rendered.page_count,
        };
        debug!(
            "Rendered {} for order {} to {} ({} bytes, {} pages)",
            document_type,
            order_number,
            file_path.display(),
            metadata.file_size,
            metadata.page_count
        );

        Ok(GeneratedFile {
            file_path,
            file_name,
            metadata,
        })
    }

    pub async fn upload_document(
        &self,
        file_path: &Path,
        file_name: &str,
    ) -> Result<UploadedDocument, DocumentError> {
        let result = self
            .storage
            .upload_file(file_path, file_name, DOCUMENTS_FOLDER)
            .await;

        match (result.success, result.file_url, result.storage_path) {
            (true, Some(file_url), Some(storage_path)) => Ok(UploadedDocument {
                file_url,
                file_path: storage_path,
                metadata: result.metadata,
            }),
            _ => Err(DocumentError::Upload(
                result.error.unwrap_or_else(|| "Upload failed".to_string()),
            )),
        }
    }

    /// Render both documents concurrently. One failing does not affect the other.
    pub async fn generate_both_documents(
        &self,
        details: &OrderDetails,
        options: GenerationOptions,
    ) -> BothDocuments {
        let named = |document_type: DocumentType| GenerationOptions {
            file_name: options.file_name.as_ref().map(|stem| {
                format!(
                    "{}-{}.pdf",
                    stem.trim_end_matches(".pdf"),
                    document_type.as_str().replace('_', "-")
                )
            }),
        };

        let (receipt, pick_slip) = futures::future::join(
            self.generate_receipt(
                self.prepare_template_data(details, DocumentType::Receipt),
                named(DocumentType::Receipt),
            ),
            self.generate_pick_slip(
                self.prepare_template_data(details, DocumentType::PickSlip),
                named(DocumentType::PickSlip),
            ),
        )
        .await;

        BothDocuments { receipt, pick_slip }
    }

    async fn pdf_entries(&self) -> std::io::Result<Vec<(PathBuf, std::fs::Metadata)>> {
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("pdf") {
                continue;
            }
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                entries.push((path, metadata));
            }
        }
        Ok(entries)
    }

    /// Delete local PDFs older than `max_age_hours`. Returns the number removed.
    pub async fn cleanup_old_files(&self, max_age_hours: i64) -> usize {
        let entries = match self.pdf_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to scan {}: {}", self.output_dir.display(), e);
                return 0;
            }
        };

        let Some(cutoff) = cleanup_cutoff(max_age_hours) else {
            warn!("Local cleanup skipped, max age {}h is out of range", max_age_hours);
            return 0;
        };
        let mut removed = 0;
        for (path, metadata) in entries {
            let modified = match metadata.modified() {
                Ok(time) => DateTime::<Utc>::from(time),
                Err(_) => continue,
            };
            if modified >= cutoff {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        if removed > 0 {
            info!("Removed {} generated documents older than {}h", removed, max_age_hours);
        }
        removed
    }

    pub async fn get_service_stats(&self) -> ServiceStats {
        let mut stats = ServiceStats {
            output_dir: self.output_dir.display().to_string(),
            total_files: 0,
            total_size: 0,
            oldest_file: None,
            newest_file: None,
        };

        let entries = match self.pdf_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to scan {}: {}", self.output_dir.display(), e);
                return stats;
            }
        };

        for (_, metadata) in entries {
            stats.total_files += 1;
            stats.total_size += metadata.len();
            if let Ok(time) = metadata.modified() {
                let modified = DateTime::<Utc>::from(time);
                stats.oldest_file = Some(stats.oldest_file.map_or(modified, |t| t.min(modified)));
                stats.newest_file = Some(stats.newest_file.map_or(modified, |t| t.max(modified)));
            }
        }
        stats
    }
}
