// Criterion benchmarks for Foodcart

use async_trait::async_trait;
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use foodcart::core::{calc_distance, Matcher, RestaurantIndex};
use foodcart::models::{
    Coordinates, MenuItem, Order, OrderLineItem, OrderStatus, Product, ResolvedLocations,
    Restaurant,
};
use foodcart::services::{GeocodeCache, GeocoderError, GeocodingProvider, InMemoryStore};
use rust_decimal::Decimal;
use std::sync::Arc;

const PRODUCTS: i64 = 40;

fn create_restaurant(id: i64) -> Restaurant {
    Restaurant {
        id,
        name: format!("Restaurant {}", id),
        address: format!("Street {}", id),
        contact_phone: String::new(),
    }
}

fn create_product(id: i64) -> Product {
    Product {
        id,
        name: format!("Product {}", id),
        price: Decimal::new(19900, 2),
        category: None,
        image: String::new(),
        special_status: false,
        description: String::new(),
    }
}

// Restaurant n stocks every product whose id is not a multiple of (n % 7 + 2)
fn create_menu(restaurant_count: i64) -> Vec<MenuItem> {
    let mut items = Vec::new();
    for r in 1..=restaurant_count {
        let restaurant = create_restaurant(r);
        let gap = r % 7 + 2;
        for p in 1..=PRODUCTS {
            if p % gap != 0 {
                items.push(MenuItem {
                    restaurant: restaurant.clone(),
                    product: create_product(p),
                    availability: true,
                });
            }
        }
    }
    items
}

fn create_order(id: i64, product_ids: &[i64]) -> Order {
    Order {
        id,
        status: OrderStatus::Created,
        payment_method: None,
        address: format!("Customer {}", id % 25),
        firstname: "Ivan".to_string(),
        lastname: "Petrov".to_string(),
        phonenumber: "+79001234567".to_string(),
        comment: String::new(),
        restaurant_id: None,
        created_at: Utc::now(),
        called_at: None,
        delivered_at: None,
        items: product_ids
            .iter()
            .map(|&product_id| OrderLineItem {
                product_id,
                product_name: format!("Product {}", product_id),
                quantity: 1,
                price: Decimal::new(19900, 2),
            })
            .collect(),
    }
}

fn point_for(index: i64) -> Coordinates {
    Coordinates::new(55.60 + (index % 50) as f64 * 0.008, 37.40 + (index % 37) as f64 * 0.011)
}

struct GridGeocoder;

#[async_trait]
impl GeocodingProvider for GridGeocoder {
    async fn fetch_coordinates(&self, address: &str) -> Result<Option<Coordinates>, GeocoderError> {
        let index = address
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse::<i64>().ok())
            .unwrap_or(0);
        Ok(Some(point_for(index)))
    }
}

fn bench_calc_distance(c: &mut Criterion) {
    let a = Coordinates::new(55.7558, 37.6173);
    let b = Coordinates::new(59.9343, 30.3351);

    c.bench_function("calc_distance", |bench| {
        bench.iter(|| calc_distance(black_box(a), black_box(b)));
    });
}

fn bench_eligibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("eligibility");

    for restaurant_count in [10, 100, 500].iter() {
        let menu = create_menu(*restaurant_count);

        group.bench_with_input(
            BenchmarkId::new("build_index", restaurant_count),
            restaurant_count,
            |b, _| {
                b.iter(|| RestaurantIndex::from_menu_items(black_box(&menu)));
            },
        );

        let index = RestaurantIndex::from_menu_items(&menu);
        let order = create_order(1, &[1, 5, 11, 23, 37]);

        group.bench_with_input(
            BenchmarkId::new("eligible_restaurants", restaurant_count),
            restaurant_count,
            |b, _| {
                b.iter(|| index.eligible_restaurants(black_box(&order)));
            },
        );
    }

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let matcher = Matcher::new(&create_menu(200));
    let orders: Vec<Order> = (1..=100)
        .map(|i| create_order(i, &[i % PRODUCTS + 1, (i * 3) % PRODUCTS + 1]))
        .collect();

    let mut locations = ResolvedLocations::new();
    for address in matcher.prepare(orders.clone()).addresses() {
        let index = address
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse::<i64>().ok())
            .unwrap_or(0);
        locations.insert(address, Some(point_for(index)));
    }

    c.bench_function("match_100_orders_200_restaurants", |b| {
        b.iter(|| {
            let plan = matcher.prepare(black_box(orders.clone()));
            black_box(plan.rank(&locations))
        });
    });
}

fn bench_geocode_cache(c: &mut Criterion) {
    let store = Arc::new(InMemoryStore::new());
    let cache = GeocodeCache::new(store, Arc::new(GridGeocoder), 10_000);
    let addresses: Vec<String> = (0..500).map(|i| format!("Street {}", i)).collect();

    // Warm both tiers so the loop measures lookups only
    tokio_test::block_on(cache.resolve(addresses.clone())).unwrap();

    c.bench_function("geocode_cache_resolve_500_warm", |b| {
        b.iter(|| tokio_test::block_on(cache.resolve(black_box(addresses.clone()))).unwrap());
    });
}

criterion_group!(
    benches,
    bench_calc_distance,
    bench_eligibility,
    bench_matching,
    bench_geocode_cache
);

criterion_main!(benches);
