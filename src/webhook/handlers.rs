use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};
use std::time::Instant;
use uuid::Uuid;

use super::model::{OrderWebhookPayload, WebhookResponse, WebhookStatus};
use crate::db::AppState;
use crate::document::model::{DocumentRequestType, GenerateDocumentsRequest};
use crate::ErrorResponse;

pub const SECRET_HEADER: &str = "x-webhook-secret";

/// Document set enabled by configuration, `None` when nothing may be generated.
fn enabled_request_type(state: &AppState) -> Option<DocumentRequestType> {
    match (
        state.settings.can_generate_receipts(),
        state.settings.can_generate_pick_slips(),
    ) {
        (true, true) => Some(DocumentRequestType::Both),
        (true, false) => Some(DocumentRequestType::Receipt),
        (false, true) => Some(DocumentRequestType::PickSlip),
        (false, false) => None,
    }
}

async fn finish(
    state: &AppState,
    event_id: Uuid,
    status: WebhookStatus,
    error_message: Option<String>,
    started: Instant,
) {
    let duration_ms = started.elapsed().as_millis() as i64;
    if let Err(e) = state
        .store
        .finish_webhook_event(event_id, status, error_message, duration_ms)
        .await
    {
        error!("Failed to update webhook event {}: {}", event_id, e);
    }
}

#[utoipa::path(
    post,
    path = "/api/webhooks/orders",
    tag = "Webhooks",
    request_body = OrderWebhookPayload,
    params(
        ("x-webhook-secret" = Option<String>, Header, description = "Shared secret, required when configured")
    ),
    responses(
        (status = 200, description = "Event processed", body = WebhookResponse),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Missing or wrong secret", body = ErrorResponse),
        (status = 503, description = "Webhook processing disabled", body = ErrorResponse)
    )
)]
pub async fn receive_order_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    if !state.settings.can_process_webhooks() {
        return HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
            "ServiceUnavailable",
            "Webhook processing is disabled",
        ));
    }

    let secret = &state.settings.webhooks.secret;
    if !secret.is_empty() {
        let provided = req
            .headers()
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(secret.as_str()) {
            warn!("Rejected webhook with missing or invalid secret");
            return HttpResponse::Unauthorized()
                .json(ErrorResponse::new("Unauthorized", "Invalid webhook secret"));
        }
    }

    let raw = body.into_inner();
    let payload: OrderWebhookPayload = match serde_json::from_value(raw.clone()) {
        Ok(payload) => payload,
        Err(e) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::bad_request(&format!("Invalid webhook payload: {}", e)))
        }
    };

    let started = Instant::now();
    let event = match state.store.insert_webhook_event(&payload.event_type, raw).await {
        Ok(event) => event,
        Err(e) => {
            error!("Failed to record webhook event {}: {}", payload.event_type, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to record webhook event"));
        }
    };
    if state.settings.debug.webhooks {
        info!(
            "[webhooks] {} for order {} recorded as {}",
            payload.event_type, payload.order_id, event.id
        );
    }

    if !payload.triggers_generation() {
        finish(&state, event.id, WebhookStatus::Completed, None, started).await;
        return HttpResponse::Ok().json(WebhookResponse {
            success: true,
            event_id: Some(event.id),
            documents: None,
            message: Some(format!("Event type '{}' ignored", payload.event_type)),
        });
    }

    let document_type = match enabled_request_type(&state) {
        Some(document_type) => document_type,
        None => {
            finish(&state, event.id, WebhookStatus::Completed, None, started).await;
            return HttpResponse::Ok().json(WebhookResponse {
                success: true,
                event_id: Some(event.id),
                documents: None,
                message: Some("Document generation is disabled".to_string()),
            });
        }
    };

    let request = GenerateDocumentsRequest {
        order_id: payload.order_id,
        document_type,
        webhook_event_id: Some(event.id),
    };

    match state.documents.generate_documents(request).await {
        Ok(response) => {
            let (status, error_message) = if response.success {
                (WebhookStatus::Completed, None)
            } else {
                (WebhookStatus::Failed, response.error.clone())
            };
            finish(&state, event.id, status, error_message, started).await;
            info!(
                "Webhook {} for order {} processed ({})",
                event.id, payload.order_id, status
            );
            HttpResponse::Ok().json(WebhookResponse {
                success: response.success,
                event_id: Some(event.id),
                documents: Some(response.documents),
                message: response.error,
            })
        }
        Err(e) => {
            error!("Webhook {} failed for order {}: {}", event.id, payload.order_id, e);
            finish(&state, event.id, WebhookStatus::Failed, Some(e.to_string()), started).await;
            let status = e.status_code();
            let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
                "Internal server error".to_string()
            } else {
                e.to_string()
            };
            HttpResponse::build(status).json(WebhookResponse {
                success: false,
                event_id: Some(event.id),
                documents: None,
                message: Some(message),
            })
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/webhooks/orders").route(web::post().to(receive_order_webhook)));
}
