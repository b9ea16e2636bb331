use actix_web::{web, HttpResponse, Responder};

use crate::models::{BannerResponse, ErrorResponse, HealthResponse, ProductResponse};
use crate::routes::AppState;

/// Configure catalog routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/banners", web::get().to(list_banners))
        .route("/products", web::get().to(list_products));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.catalog.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Promotional banners for the storefront
///
/// GET /api/v1/banners
async fn list_banners() -> impl Responder {
    let banners = [
        ("Burger", "burger.jpg", "Tasty Burger at your door step"),
        ("Spices", "food.jpg", "All Cuisines"),
        ("New York", "tasty.jpg", "Food is incomplete without a tasty dessert"),
    ]
    .into_iter()
    .map(|(title, image, text)| BannerResponse {
        title: title.to_string(),
        src: format!("/static/{}", image),
        text: text.to_string(),
    })
    .collect::<Vec<_>>();

    HttpResponse::Ok().json(banners)
}

/// Products that at least one restaurant currently sells
///
/// GET /api/v1/products
async fn list_products(state: web::Data<AppState>) -> impl Responder {
    match state.catalog.available_products().await {
        Ok(products) => {
            tracing::debug!("Listing {} available products", products.len());
            let products: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
            HttpResponse::Ok().json(products)
        }
        Err(e) => {
            tracing::error!("Failed to load products: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load products".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
