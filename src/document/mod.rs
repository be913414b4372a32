//! Document pipeline: receipt and pick-slip PDFs for purchase orders.
//!
//! - `canvas` - page drawing surface and the printpdf backend
//! - `receipt` / `pick_slip` - layouts
//! - `generator` - render to disk and hand off to storage
//! - `service` - tracking rows, timeouts and the generate/retry flows
//! - `handlers` - HTTP endpoints

pub mod canvas;
pub mod format;
pub mod generator;
pub mod handlers;
pub mod model;
pub mod pick_slip;
pub mod receipt;
pub mod service;
pub mod template;

pub use generator::PdfGenerationService;
pub use model::{DocumentStatus, DocumentType, OrderDocument};
pub use service::DocumentService;
pub use template::{DocumentTemplateData, DEFAULT_COMPANY_INFO};

use actix_web::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

/// Failures while laying out or serialising a PDF.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF construction failed: {0}")]
    Pdf(String),
}

/// Rendered document held in memory.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Order not found")]
    OrderNotFound(Uuid),
    #[error("Document not found")]
    DocumentNotFound(Uuid),
    #[error("{0} generation is disabled")]
    GenerationDisabled(String),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("{step} timed out after {timeout_ms}ms")]
    Timeout { step: &'static str, timeout_ms: u64 },
    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("background task failed: {0}")]
    Task(String),
}

impl DocumentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DocumentError::OrderNotFound(_) | DocumentError::DocumentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DocumentError::GenerationDisabled(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error kind used in `ErrorResponse.error`.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::OrderNotFound(_) | DocumentError::DocumentNotFound(_) => "NotFound",
            DocumentError::GenerationDisabled(_) => "ServiceUnavailable",
            _ => "InternalServerError",
        }
    }
}
