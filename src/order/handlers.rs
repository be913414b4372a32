use actix_web::{web, HttpResponse, Responder};
use log::error;
use uuid::Uuid;

use super::model::{OrderCommunication, OrderDetails};
use crate::db::AppState;
use crate::ErrorResponse;

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with items and add-ons", body = OrderDetails),
        (status = 404, description = "Order not found", body = ErrorResponse)
    )
)]
pub async fn get_order(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let order_id = path.into_inner();
    match state.store.fetch_order_details(order_id).await {
        Ok(Some(details)) => HttpResponse::Ok().json(details),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::not_found("Order not found")),
        Err(e) => {
            error!("Failed to load order {}: {}", order_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Failed to load order"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/communications",
    tag = "Orders",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Communication log, newest first", body = Vec<OrderCommunication>)
    )
)]
pub async fn get_order_communications(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let order_id = path.into_inner();
    match state.store.list_order_communications(order_id).await {
        Ok(communications) => HttpResponse::Ok().json(communications),
        Err(e) => {
            error!("Failed to load communications for order {}: {}", order_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to load communications"))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/orders/{id}").route(web::get().to(get_order)))
        .service(
            web::resource("/orders/{id}/communications")
                .route(web::get().to(get_order_communications)),
        );
}
