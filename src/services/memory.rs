use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::models::{
    Location, MenuItem, NewOrder, Order, OrderLineItem, OrderStatus, Product, Restaurant,
};
use crate::services::store::{CatalogStore, LocationStore, OrderStore, StoreError};

#[derive(Debug, Default)]
struct State {
    locations: HashMap<String, Location>,
    location_writes: usize,
    restaurants: BTreeMap<i64, Restaurant>,
    products: BTreeMap<i64, Product>,
    // (restaurant_id, product_id) -> availability
    menu: BTreeMap<(i64, i64), bool>,
    orders: BTreeMap<i64, Order>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Data store kept entirely in memory
///
/// Implements the same traits as the PostgreSQL client so the matching
/// pipeline and HTTP routes can run without a database.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_restaurant(&self, name: &str, address: &str) -> Restaurant {
        let mut state = self.state.write().await;
        let restaurant = Restaurant {
            id: state.next_id(),
            name: name.to_string(),
            address: address.to_string(),
            contact_phone: String::new(),
        };
        state.restaurants.insert(restaurant.id, restaurant.clone());
        restaurant
    }

    pub async fn add_product(&self, name: &str, price: Decimal) -> Product {
        let mut state = self.state.write().await;
        let product = Product {
            id: state.next_id(),
            name: name.to_string(),
            price,
            category: None,
            image: String::new(),
            special_status: false,
            description: String::new(),
        };
        state.products.insert(product.id, product.clone());
        product
    }

    /// Put a product on a restaurant's menu, replacing any previous entry
    pub async fn set_menu_item(
        &self,
        restaurant_id: i64,
        product_id: i64,
        availability: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.restaurants.contains_key(&restaurant_id) {
            return Err(StoreError::NotFound(format!("restaurant {}", restaurant_id)));
        }
        if !state.products.contains_key(&product_id) {
            return Err(StoreError::NotFound(format!("product {}", product_id)));
        }
        state.menu.insert((restaurant_id, product_id), availability);
        Ok(())
    }

    /// Number of non-empty bulk location inserts performed so far
    pub async fn location_writes(&self) -> usize {
        self.state.read().await.location_writes
    }

    pub async fn location(&self, address: &str) -> Option<Location> {
        self.state.read().await.locations.get(address).cloned()
    }

    pub async fn set_order_status(&self, order_id: i64, status: OrderStatus) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| StoreError::NotFound(format!("order {}", order_id)))?;
        order.status = status;
        Ok(())
    }
}

#[async_trait]
impl LocationStore for InMemoryStore {
    async fn find_locations(&self, addresses: &[String]) -> Result<Vec<Location>, StoreError> {
        let state = self.state.read().await;
        Ok(addresses
            .iter()
            .filter_map(|address| state.locations.get(address).cloned())
            .collect())
    }

    async fn insert_locations(&self, locations: &[Location]) -> Result<u64, StoreError> {
        if locations.is_empty() {
            return Ok(0);
        }

        let mut state = self.state.write().await;
        state.location_writes += 1;

        let mut inserted = 0;
        for location in locations {
            if !state.locations.contains_key(&location.address) {
                state.locations.insert(location.address.clone(), location.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn available_menu_items(&self) -> Result<Vec<MenuItem>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .menu
            .iter()
            .filter_map(|(&(restaurant_id, product_id), &availability)| {
                if !availability {
                    return None;
                }
                Some(MenuItem {
                    restaurant: state.restaurants.get(&restaurant_id)?.clone(),
                    product: state.products.get(&product_id)?.clone(),
                    availability,
                })
            })
            .collect())
    }

    async fn available_products(&self) -> Result<Vec<Product>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|product| {
                state
                    .menu
                    .iter()
                    .any(|(&(_, product_id), &availability)| availability && product_id == product.id)
            })
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut state = self.state.write().await;

        let mut items: Vec<OrderLineItem> = Vec::with_capacity(order.items.len());
        for item in &order.items {
            if items.iter().any(|line| line.product_id == item.product_id) {
                return Err(StoreError::InvalidInput("duplicate product in order".to_string()));
            }
            let product = state
                .products
                .get(&item.product_id)
                .ok_or_else(|| StoreError::InvalidInput(format!("unknown product {}", item.product_id)))?;
            items.push(OrderLineItem {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: item.quantity,
                price: product.price,
            });
        }

        let created = Order {
            id: state.next_id(),
            status: OrderStatus::Created,
            payment_method: None,
            address: order.address,
            firstname: order.firstname,
            lastname: order.lastname,
            phonenumber: order.phonenumber,
            comment: String::new(),
            restaurant_id: None,
            created_at: Utc::now(),
            called_at: None,
            delivered_at: None,
            items,
        };
        state.orders.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| match status {
                Some(status) => order.status == status,
                None => order.status != OrderStatus::Done,
            })
            .cloned()
            .collect();
        orders.sort_by_key(|order| (order.status as u8, order.created_at, order.id));
        Ok(orders)
    }
}
