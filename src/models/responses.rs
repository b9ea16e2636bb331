use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::domain::{Order, OrderStatus, PaymentMethod, Product, ProductCategory, Ranking};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerResponse {
    pub title: String,
    pub src: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub special_status: bool,
    pub description: String,
    pub category: Option<ProductCategory>,
    pub image: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            special_status: product.special_status,
            description: product.description,
            category: product.category,
            image: product.image,
        }
    }
}

/// Echo of a registered order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterOrderResponse {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub address: String,
    pub phonenumber: String,
}

impl From<&Order> for RegisterOrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            firstname: order.firstname.clone(),
            lastname: order.lastname.clone(),
            address: order.address.clone(),
            phonenumber: order.phonenumber.clone(),
        }
    }
}

/// An order together with the restaurants that can cook it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDispatchResponse {
    pub id: i64,
    pub status: OrderStatus,
    #[serde(rename = "paymentMethod")]
    pub payment_method: Option<PaymentMethod>,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub address: String,
    pub comment: String,
    #[serde(rename = "totalPrice")]
    pub total_price: Decimal,
    #[serde(rename = "restaurantId")]
    pub restaurant_id: Option<i64>,
    pub ranking: Ranking,
}

impl OrderDispatchResponse {
    pub fn new(order: &Order, ranking: Ranking) -> Self {
        Self {
            id: order.id,
            status: order.status,
            payment_method: order.payment_method,
            firstname: order.firstname.clone(),
            lastname: order.lastname.clone(),
            phonenumber: order.phonenumber.clone(),
            address: order.address.clone(),
            comment: order.comment.clone(),
            total_price: order.total_price(),
            restaurant_id: order.restaurant_id,
            ranking,
        }
    }
}

/// Response for the order dispatch listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderDispatchResponse>,
    pub total_results: usize,
}
