//! Document pipeline metrics, exported at `/api/documents/metrics`.
//!
//! HTTP request metrics come from the actix middleware on `/metrics`; these
//! live in their own registry so the two never collide.

use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::document::model::{DocumentStatus, DocumentType};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref DOCUMENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("order_documents_total", "Documents finished, by type and final status"),
        &["document_type", "status"]
    )
    .expect("valid order_documents_total definition");
    pub static ref GENERATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "order_document_generation_seconds",
            "Render and upload time per document"
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["document_type"]
    )
    .expect("valid order_document_generation_seconds definition");
}

/// Register the collectors. Safe to call more than once.
pub fn register() {
    for collector in [
        Box::new(DOCUMENTS_TOTAL.clone()) as Box<dyn prometheus::core::Collector>,
        Box::new(GENERATION_SECONDS.clone()),
    ] {
        if let Err(e) = REGISTRY.register(collector) {
            if !matches!(e, prometheus::Error::AlreadyReg) {
                log::warn!("Failed to register document metrics: {}", e);
            }
        }
    }
}

pub fn record_document(document_type: DocumentType, status: DocumentStatus, seconds: f64) {
    DOCUMENTS_TOTAL
        .with_label_values(&[document_type.as_str(), status.as_str()])
        .inc();
    GENERATION_SECONDS
        .with_label_values(&[document_type.as_str()])
        .observe(seconds);
}

/// Prometheus text exposition of the document registry.
pub fn gather() -> Result<String, prometheus::Error> {
    register();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
