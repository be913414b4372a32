mod common;

use actix_web::{http::StatusCode, test, web, App};
use chrono::Utc;
use common::{sample_order, setup, TestContext};
use order_document_server::configure_api;
use order_document_server::order::model::OrderCommunication;
use serde_json::{json, Value};
use uuid::Uuid;

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx.state.clone()))
                .configure(configure_api),
        )
        .await
    };
}

fn generate_body(order_id: Uuid, document_type: &str) -> Value {
    json!({ "orderId": order_id, "documentType": document_type })
}

async fn seeded() -> (TestContext, Uuid) {
    let ctx = setup(&[]);
    let order_id = ctx.store.insert_order(sample_order());
    (ctx, order_id)
}

#[actix_web::test]
async fn test_generate_both_endpoint() {
    let (ctx, order_id) = seeded().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/documents/generate")
        .set_json(generate_body(order_id, "both"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["documents"]["receipt"]["status"], "generated");
    assert_eq!(body["documents"]["pickSlip"]["status"], "generated");
    assert!(body["documents"]["receipt"]["fileUrl"]
        .as_str()
        .unwrap()
        .starts_with("http://test.example.com/storage/documents/receipt_TEST-1_"));
    assert!(body.get("error").is_none());
}

#[actix_web::test]
async fn test_generate_reports_failed_document_with_ok_status() {
    let (ctx, order_id) = seeded().await;
    ctx.storage.fail_uploads("quota exceeded");
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/documents/generate")
        .set_json(generate_body(order_id, "pick_slip"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["documents"]["pickSlip"]["status"], "failed");
    assert!(body["documents"]["pickSlip"]["error"]
        .as_str()
        .unwrap()
        .contains("quota exceeded"));
}

#[actix_web::test]
async fn test_generate_unknown_order_is_404() {
    let ctx = setup(&[]);
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/documents/generate")
        .set_json(generate_body(Uuid::new_v4(), "receipt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Order not found");
    assert!(ctx.store.documents().is_empty());
}

#[actix_web::test]
async fn test_generate_when_disabled_is_503() {
    let ctx = setup(&[("ENABLE_RECEIPT_GENERATION", "false")]);
    let order_id = ctx.store.insert_order(sample_order());
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/documents/generate")
        .set_json(generate_body(order_id, "receipt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Receipt generation is disabled");
}

#[actix_web::test]
async fn test_generate_rejects_unknown_document_type() {
    let (ctx, order_id) = seeded().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/documents/generate")
        .set_json(generate_body(order_id, "invoice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_database_failure_hides_details() {
    let (ctx, order_id) = seeded().await;
    ctx.store.set_database_down(true);
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/documents/generate")
        .set_json(generate_body(order_id, "receipt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Internal server error");
}

#[actix_web::test]
async fn test_list_order_documents() {
    let (ctx, order_id) = seeded().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/documents/generate")
        .set_json(generate_body(order_id, "both"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{}/documents", order_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(body.len(), 2);
    assert!(body.iter().all(|d| d["status"] == "generated"));
    assert!(body.iter().any(|d| d["document_type"] == "pick_slip"));
}

#[actix_web::test]
async fn test_list_documents_for_order_without_any() {
    let ctx = setup(&[]);
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{}/documents", Uuid::new_v4()))
        .to_request();
    let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn test_retry_endpoint() {
    let (ctx, order_id) = seeded().await;
    ctx.storage.fail_uploads("temporary outage");
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/documents/generate")
        .set_json(generate_body(order_id, "receipt"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let document_id = body["documents"]["receipt"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/documents/{}/retry", document_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["documents"]["receipt"]["id"], document_id.as_str());
    assert_eq!(ctx.store.documents()[0].retry_count, 1);
}

#[actix_web::test]
async fn test_retry_unknown_document_is_404() {
    let ctx = setup(&[]);
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri(&format!("/api/documents/{}/retry", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_health_endpoint() {
    let ctx = setup(&[]);
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/documents/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["healthy"], true);
    assert_eq!(body["checks"]["database"], true);

    ctx.storage.fail_listing();
    let req = test::TestRequest::get().uri("/api/documents/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["healthy"], false);
    assert_eq!(body["checks"]["storage"], false);
}

#[actix_web::test]
async fn test_metrics_endpoint() {
    let (ctx, order_id) = seeded().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/documents/generate")
        .set_json(generate_body(order_id, "receipt"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/api/documents/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("order_documents_total"));
    assert!(text.contains(r#"document_type="receipt""#));
}

#[actix_web::test]
async fn test_get_order_endpoint() {
    let (ctx, order_id) = seeded().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{}", order_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["order"]["order_number"], "TEST-1");
    assert_eq!(body["items"][0]["product_name"], "Mixed Variety");
    assert_eq!(body["items"][0]["quantity"], 2);
}

#[actix_web::test]
async fn test_get_unknown_order_is_404() {
    let ctx = setup(&[]);
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NotFound");
    assert_eq!(body["message"], "Order not found");
}

#[actix_web::test]
async fn test_order_communications_newest_first() {
    let (ctx, order_id) = seeded().await;
    let now = Utc::now();
    for (minutes, kind) in [(10, "order_confirmation"), (0, "shipping_update")] {
        let at = now - chrono::Duration::minutes(minutes);
        ctx.store.insert_communication(OrderCommunication {
            id: Uuid::new_v4(),
            order_id,
            communication_type: kind.to_string(),
            recipient: "buyer@example.com".to_string(),
            status: "sent".to_string(),
            retry_count: 0,
            error_message: None,
            created_at: at,
            updated_at: at,
        });
    }
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{}/communications", order_id))
        .to_request();
    let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["communication_type"], "shipping_update");
    assert_eq!(body[1]["communication_type"], "order_confirmation");
}
