use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use log::error;
use uuid::Uuid;

use super::model::{GenerateDocumentsRequest, GenerateDocumentsResponse, HealthStatus, OrderDocument};
use super::DocumentError;
use crate::db::AppState;
use crate::ErrorResponse;

/// `{success:false, error}` with the status matching the error kind.
fn failure_response(err: &DocumentError) -> HttpResponse {
    let status = err.status_code();
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Document request failed: {}", err);
        "Internal server error".to_string()
    } else {
        err.to_string()
    };
    HttpResponse::build(status).json(GenerateDocumentsResponse::failure(message))
}

#[utoipa::path(
    post,
    path = "/api/documents/generate",
    tag = "Documents",
    request_body = GenerateDocumentsRequest,
    responses(
        (status = 200, description = "Per-document results; success is false when any document failed", body = GenerateDocumentsResponse),
        (status = 404, description = "Order not found", body = GenerateDocumentsResponse),
        (status = 503, description = "Document generation disabled", body = GenerateDocumentsResponse),
        (status = 500, description = "Internal error", body = GenerateDocumentsResponse)
    )
)]
pub async fn generate_documents(
    state: web::Data<AppState>,
    body: web::Json<GenerateDocumentsRequest>,
) -> impl Responder {
    match state.documents.generate_documents(body.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => failure_response(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/documents",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Tracking rows, newest first", body = Vec<OrderDocument>),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn get_order_documents(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let order_id = path.into_inner();
    match state.documents.get_order_documents(order_id).await {
        Ok(documents) => HttpResponse::Ok().json(documents),
        Err(e) => {
            error!("Failed to list documents for order {}: {}", order_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to list documents"))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/documents/{id}/retry",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Result of the new attempt", body = GenerateDocumentsResponse),
        (status = 404, description = "Document or order not found", body = GenerateDocumentsResponse),
        (status = 503, description = "Document generation disabled", body = GenerateDocumentsResponse)
    )
)]
pub async fn retry_document(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.documents.retry_document(path.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => failure_response(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/documents/health",
    tag = "Documents",
    responses(
        (status = 200, description = "All checks passed", body = HealthStatus),
        (status = 503, description = "At least one check failed", body = HealthStatus)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let health = state.documents.get_health_status().await;
    if health.healthy {
        HttpResponse::Ok().json(health)
    } else {
        HttpResponse::ServiceUnavailable().json(health)
    }
}

#[utoipa::path(
    get,
    path = "/api/documents/metrics",
    tag = "Documents",
    responses(
        (status = 200, description = "Prometheus text exposition", body = String, content_type = "text/plain")
    )
)]
pub async fn document_metrics() -> impl Responder {
    match crate::metrics::gather() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            error!("Failed to encode document metrics: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to encode metrics"))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/documents/generate").route(web::post().to(generate_documents)))
        .service(web::resource("/documents/health").route(web::get().to(health_check)))
        .service(web::resource("/documents/metrics").route(web::get().to(document_metrics)))
        .service(web::resource("/documents/{id}/retry").route(web::post().to(retry_document)))
        .service(web::resource("/orders/{id}/documents").route(web::get().to(get_order_documents)));
}
