use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod db;
pub mod document;
pub mod metrics;
pub mod order;
pub mod storage;
pub mod webhook;

pub use crate::config::Settings;
pub use crate::db::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::document::handlers::generate_documents,
        crate::document::handlers::get_order_documents,
        crate::document::handlers::retry_document,
        crate::document::handlers::health_check,
        crate::document::handlers::document_metrics,
        crate::order::handlers::get_order,
        crate::order::handlers::get_order_communications,
        crate::webhook::handlers::receive_order_webhook
    ),
    components(
        schemas(
            document::model::DocumentType,
            document::model::DocumentStatus,
            document::model::DocumentRequestType,
            document::model::OrderDocument,
            document::model::GenerateDocumentsRequest,
            document::model::GenerateDocumentsResponse,
            document::model::DocumentResults,
            document::model::DocumentOutcome,
            document::model::HealthStatus,
            document::model::HealthChecks,
            order::model::Order,
            order::model::OrderStatus,
            order::model::OrderItem,
            order::model::OrderAddon,
            order::model::OrderDetails,
            order::model::OrderCommunication,
            webhook::model::OrderWebhookPayload,
            webhook::model::WebhookResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Documents", description = "Receipt and pick slip generation."),
        (name = "Orders", description = "Order data read endpoints."),
        (name = "Webhooks", description = "Inbound order events.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Local server")
    )
)]
pub struct ApiDoc;

/// Mount every `/api` route. Shared by `run` and the handler tests.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(document::handlers::config)
            .configure(order::handlers::config)
            .configure(webhook::handlers::config),
    );
}

fn log_validation(subsystem: &str, report: &config::ValidationReport) {
    if !report.valid {
        for error in &report.errors {
            log::warn!("{} configuration: {}", subsystem, error);
        }
    }
}

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env();
    log_validation("Storage", &settings.validate_storage_config());
    if settings.can_send_emails() {
        log_validation("Email", &settings.validate_email_config());
    }
    if settings.can_process_webhooks() {
        log_validation("Webhook", &settings.validate_webhook_config());
    }

    let host = settings.server.host.clone();
    let port = settings.server.port;

    let app_state = match AppState::new_with_config(settings).await {
        Ok(state) => state,
        Err(e) => {
            log::error!("Failed to connect to database. Please check your SUPABASE_DATABASE_URL in .env and ensure the database is running. Error: {}", e);
            std::process::exit(1);
        }
    };

    let bucket = app_state.storage.ensure_bucket().await;
    if !bucket.success {
        log::warn!(
            "Storage bucket check failed: {}",
            bucket.error.unwrap_or_default()
        );
    }
    let removed = app_state.documents.cleanup_local_files(24).await;
    if removed > 0 {
        log::info!("Removed {} stale local documents", removed);
    }
    metrics::register();

    let app_state = web::Data::new(app_state);

    let prometheus = match PrometheusMetricsBuilder::new("order_document_server")
        .endpoint("/metrics")
        .build()
    {
        Ok(prometheus) => prometheus,
        Err(e) => {
            log::error!("Failed to create Prometheus metrics middleware: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    log::info!("Starting server at http://{}:{}", host, port);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = Cors::default()
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:8080")
            .allowed_origin("http://127.0.0.1:8080")
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::HeaderName::from_static(webhook::handlers::SECRET_HEADER),
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .configure(configure_api)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind((host.as_str(), port))?
    .run()
    .await
}
