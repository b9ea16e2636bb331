use std::sync::Arc;
use thiserror::Error;

use crate::core::{Matcher, OrderMatch};
use crate::models::{Order, Ranking, Restaurant};
use crate::services::cache::{GeocodeCache, GeocodeError};
use crate::services::store::{CatalogStore, StoreError};

/// Errors that can occur while matching orders to restaurants
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),
}

/// Matches orders to the nearest restaurants that can cook them
///
/// Loads the available menu once per call and resolves all addresses of a
/// batch through one [`GeocodeCache::resolve`] call.
pub struct DispatchService {
    catalog: Arc<dyn CatalogStore>,
    geocache: Arc<GeocodeCache>,
}

impl DispatchService {
    pub fn new(catalog: Arc<dyn CatalogStore>, geocache: Arc<GeocodeCache>) -> Self {
        Self { catalog, geocache }
    }

    async fn matcher(&self) -> Result<Matcher, DispatchError> {
        let menu_items = self.catalog.available_menu_items().await?;
        Ok(Matcher::new(&menu_items))
    }

    /// Restaurants that stock every product of the order
    pub async fn eligible_restaurants(&self, order: &Order) -> Result<Vec<Restaurant>, DispatchError> {
        Ok(self.matcher().await?.eligible_restaurants(order))
    }

    /// Eligible restaurants of a single order, nearest first
    pub async fn ranked_restaurants(&self, order: Order) -> Result<Ranking, DispatchError> {
        let mut matches = self.rank_orders(vec![order]).await?;
        Ok(matches.pop().map(|m| m.ranking).unwrap_or(Ranking::AddressNotFound))
    }

    /// Rank eligible restaurants for every order of the batch
    ///
    /// Output preserves input order.
    pub async fn rank_orders(&self, orders: Vec<Order>) -> Result<Vec<OrderMatch>, DispatchError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let matcher = self.matcher().await?;
        let plan = matcher.prepare(orders);
        let addresses = plan.addresses();

        tracing::debug!(
            "Ranking {} orders against {} restaurants, {} distinct addresses",
            plan.len(),
            matcher.index().restaurant_count(),
            addresses.len()
        );

        let locations = self.geocache.resolve(addresses).await?;

        Ok(plan.rank(&locations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, NewOrder, NewOrderItem};
    use crate::services::geocoder::{GeocoderError, GeocodingProvider};
    use crate::services::memory::InMemoryStore;
    use crate::services::store::OrderStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TableProvider {
        known: HashMap<&'static str, Coordinates>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeocodingProvider for TableProvider {
        async fn fetch_coordinates(&self, address: &str) -> Result<Option<Coordinates>, GeocoderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.known.get(address).copied())
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        provider: Arc<TableProvider>,
        service: DispatchService,
        burger: i64,
        fries: i64,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(TableProvider {
            known: HashMap::from([
                ("Home", Coordinates::new(55.750, 37.600)),
                ("Near street", Coordinates::new(55.760, 37.600)),
                ("Far street", Coordinates::new(55.850, 37.600)),
            ]),
            calls: AtomicUsize::new(0),
        });

        let near = store.add_restaurant("Near", "Near street").await;
        let far = store.add_restaurant("Far", "Far street").await;
        let lost = store.add_restaurant("Lost", "Unknown street").await;
        let burger = store.add_product("Burger", Decimal::new(30000, 2)).await.id;
        let fries = store.add_product("Fries", Decimal::new(12000, 2)).await.id;

        for restaurant in [&near, &far, &lost] {
            store.set_menu_item(restaurant.id, burger, true).await.unwrap();
        }
        store.set_menu_item(far.id, fries, true).await.unwrap();
        store.set_menu_item(lost.id, fries, true).await.unwrap();

        let geocache = Arc::new(GeocodeCache::new(store.clone(), provider.clone(), 100));
        let service = DispatchService::new(store.clone(), geocache);

        Fixture {
            store,
            provider,
            service,
            burger,
            fries,
        }
    }

    async fn place(store: &InMemoryStore, address: &str, product_ids: &[i64]) -> Order {
        store
            .create_order(NewOrder {
                address: address.to_string(),
                firstname: "Ivan".into(),
                lastname: "Petrov".into(),
                phonenumber: "+79001234567".into(),
                items: product_ids
                    .iter()
                    .map(|&product_id| NewOrderItem { product_id, quantity: 1 })
                    .collect(),
            })
            .await
            .unwrap()
    }

    fn names(ranking: &Ranking) -> Vec<String> {
        ranking.restaurants().iter().map(|r| r.restaurant.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_ranks_nearest_first_and_skips_unresolved() {
        let f = fixture().await;
        let order = place(&f.store, "Home", &[f.burger]).await;

        let ranking = f.service.ranked_restaurants(order).await.unwrap();

        assert_eq!(names(&ranking), vec!["Near", "Far"]);
        assert_eq!(ranking.restaurants()[0].distance_km, 1.11);
    }

    #[tokio::test]
    async fn test_intersection_limits_candidates() {
        let f = fixture().await;
        let order = place(&f.store, "Home", &[f.burger, f.fries]).await;

        let eligible = f.service.eligible_restaurants(&order).await.unwrap();
        let eligible: Vec<&str> = eligible.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(eligible, vec!["Far", "Lost"]);

        let ranking = f.service.ranked_restaurants(order).await.unwrap();
        assert_eq!(names(&ranking), vec!["Far"]);
    }

    #[tokio::test]
    async fn test_unresolved_order_address() {
        let f = fixture().await;
        let order = place(&f.store, "Atlantis", &[f.burger]).await;

        let ranking = f.service.ranked_restaurants(order).await.unwrap();
        assert_eq!(ranking, Ranking::AddressNotFound);
    }

    #[tokio::test]
    async fn test_batch_geocodes_each_address_once() {
        let f = fixture().await;
        let orders = vec![
            place(&f.store, "Home", &[f.burger]).await,
            place(&f.store, "Home", &[f.burger, f.fries]).await,
            place(&f.store, "Far street", &[f.fries]).await,
        ];

        let matches = f.service.rank_orders(orders).await.unwrap();

        assert_eq!(matches.len(), 3);
        // Home, Near street, Far street, Unknown street
        assert_eq!(f.provider.calls.load(Ordering::SeqCst), 4);
        assert_eq!(f.store.location_writes().await, 1);
        assert_eq!(matches[2].ranking.nearest().map(|r| r.distance_km), Some(0.0));

        // Everything is cached now
        let again = f.store.list_orders(None).await.unwrap();
        f.service.rank_orders(again).await.unwrap();
        assert_eq!(f.provider.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_batch_touches_nothing() {
        let f = fixture().await;
        assert!(f.service.rank_orders(vec![]).await.unwrap().is_empty());
        assert_eq!(f.provider.calls.load(Ordering::SeqCst), 0);
    }
}
