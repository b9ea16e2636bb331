use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Geocoding results keyed by the address text that was looked up
pub type ResolvedLocations = HashMap<String, Option<Coordinates>>;

/// A resolved point on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Cached geocoding result for a single address
///
/// `lat`/`lon` are both `None` when the geocoder had no match for the
/// address. That negative answer is cached like any other result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: NaiveDate,
}

impl Location {
    pub fn new(address: String, coordinates: Option<Coordinates>, fetched_at: NaiveDate) -> Self {
        Self {
            address,
            lat: coordinates.map(|c| c.lat),
            lon: coordinates.map(|c| c.lon),
            fetched_at,
        }
    }

    /// Coordinates of this location, if the geocoder found the address
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub address: String,
    #[serde(rename = "contactPhone", default)]
    pub contact_phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub category: Option<ProductCategory>,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "specialStatus", default)]
    pub special_status: bool,
    #[serde(default)]
    pub description: String,
}

/// A product on a restaurant's menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub restaurant: Restaurant,
    pub product: Product,
    pub availability: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Created,
    Assembling,
    Delivering,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    Cash,
}

/// One product line of an order, with the price captured at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    #[serde(rename = "productId")]
    pub product_id: i64,
    #[serde(rename = "productName")]
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl OrderLineItem {
    pub fn cost(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub status: OrderStatus,
    #[serde(rename = "paymentMethod")]
    pub payment_method: Option<PaymentMethod>,
    pub address: String,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    #[serde(default)]
    pub comment: String,
    #[serde(rename = "restaurantId")]
    pub restaurant_id: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "calledAt")]
    pub called_at: Option<DateTime<Utc>>,
    #[serde(rename = "deliveredAt")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderLineItem>,
}

impl Order {
    /// Sum of quantity * price over all line items
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(OrderLineItem::cost).sum()
    }
}

/// Validated input for creating an order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub address: String,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i32,
}

/// A restaurant able to fulfil an order, with its distance from the order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRestaurant {
    pub restaurant: Restaurant,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

/// Outcome of ranking restaurants for one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ranking {
    /// Order address resolved; restaurants sorted nearest first
    Ranked { restaurants: Vec<RankedRestaurant> },
    /// Order address could not be geocoded, nothing to rank against
    AddressNotFound,
}

impl Ranking {
    pub fn restaurants(&self) -> &[RankedRestaurant] {
        match self {
            Ranking::Ranked { restaurants } => restaurants,
            Ranking::AddressNotFound => &[],
        }
    }

    pub fn nearest(&self) -> Option<&RankedRestaurant> {
        self.restaurants().first()
    }
}
