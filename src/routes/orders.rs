use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    ErrorResponse, ListOrdersQuery, ListOrdersResponse, OrderDispatchResponse, RegisterOrderRequest,
    RegisterOrderResponse,
};
use crate::routes::AppState;
use crate::services::{DispatchError, GeocodeError, StoreError};

/// Configure order routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/order", web::post().to(register_order))
        .route("/orders", web::get().to(list_orders));
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

/// Register order endpoint
///
/// POST /api/v1/order
///
/// Request body:
/// ```json
/// {
///   "firstname": "string",
///   "lastname": "string",
///   "address": "string",
///   "phonenumber": "+79001234567",
///   "products": [{"product": 1, "quantity": 2}]
/// }
/// ```
async fn register_order(
    state: web::Data<AppState>,
    req: web::Json<RegisterOrderRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for order request: {:?}", errors);
        return bad_request("Validation failed", errors.to_string());
    }

    let duplicates = req.duplicate_products();
    if !duplicates.is_empty() {
        return bad_request(
            "Validation failed",
            format!("products listed more than once: {:?}", duplicates),
        );
    }

    let new_order = req.into_inner().into_new_order();

    match state.orders.create_order(new_order).await {
        Ok(order) => {
            tracing::info!("Registered order {} for {:?}", order.id, order.address);
            HttpResponse::Ok().json(RegisterOrderResponse::from(&order))
        }
        Err(StoreError::InvalidInput(message)) => bad_request("Invalid order", message),
        Err(e) => {
            tracing::error!("Failed to register order: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to register order".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Orders awaiting dispatch with the restaurants that can cook them
///
/// GET /api/v1/orders?status={status}
///
/// Without a status, lists every order that is not done yet. Each order
/// carries its total and either a nearest-first restaurant list or an
/// `address_not_found` marker.
async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersQuery>,
) -> impl Responder {
    let orders = match state.orders.list_orders(query.status).await {
        Ok(orders) => orders,
        Err(e) => {
            tracing::error!("Failed to load orders: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load orders".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let order_count = orders.len();

    let matches = match state.dispatcher.rank_orders(orders).await {
        Ok(matches) => matches,
        Err(DispatchError::Geocode(GeocodeError::Geocoder(e))) => {
            tracing::error!("Geocoder unavailable while ranking {} orders: {}", order_count, e);
            return HttpResponse::BadGateway().json(ErrorResponse {
                error: "Geocoding failed".to_string(),
                message: e.to_string(),
                status_code: 502,
            });
        }
        Err(e) => {
            tracing::error!("Failed to rank orders: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to rank orders".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let orders: Vec<OrderDispatchResponse> = matches
        .into_iter()
        .map(|m| OrderDispatchResponse::new(&m.order, m.ranking))
        .collect();

    tracing::info!("Returning {} orders for dispatch", orders.len());

    HttpResponse::Ok().json(ListOrdersResponse {
        total_results: orders.len(),
        orders,
    })
}
