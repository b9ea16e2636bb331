use std::collections::BTreeSet;

use crate::core::{eligibility::RestaurantIndex, ranking::rank_restaurants};
use crate::models::{MenuItem, Order, Ranking, ResolvedLocations, Restaurant};

/// Result of matching a single order
#[derive(Debug, Clone)]
pub struct OrderMatch {
    pub order: Order,
    pub ranking: Ranking,
}

/// Orders paired with the restaurants they need, before geocoding
///
/// Produced by [`Matcher::prepare`]. Holding the eligible sets lets the
/// caller resolve every address of the batch in one lookup, then finish
/// with [`MatchPlan::rank`].
#[derive(Debug, Clone)]
pub struct MatchPlan {
    entries: Vec<(Order, Vec<Restaurant>)>,
}

impl MatchPlan {
    /// Every distinct address the batch needs coordinates for
    ///
    /// Includes each order's address and the addresses of its eligible
    /// restaurants only.
    pub fn addresses(&self) -> BTreeSet<String> {
        let mut addresses = BTreeSet::new();
        for (order, restaurants) in &self.entries {
            addresses.insert(order.address.clone());
            addresses.extend(restaurants.iter().map(|r| r.address.clone()));
        }
        addresses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank each order's eligible restaurants against the resolved addresses
    pub fn rank(self, locations: &ResolvedLocations) -> Vec<OrderMatch> {
        self.entries
            .into_iter()
            .map(|(order, restaurants)| {
                let origin = locations.get(&order.address).copied().flatten();
                let ranking = rank_restaurants(origin, restaurants, locations);
                if ranking == Ranking::AddressNotFound {
                    tracing::debug!("Order {} address {:?} did not resolve", order.id, order.address);
                }
                OrderMatch { order, ranking }
            })
            .collect()
    }
}

/// Order-to-restaurant matching pipeline
///
/// # Pipeline Stages
/// 1. Index available menu items by product
/// 2. Intersect stocking restaurants per order
/// 3. Collect addresses for one batched geocode
/// 4. Rank by distance
#[derive(Debug, Clone)]
pub struct Matcher {
    index: RestaurantIndex,
}

impl Matcher {
    pub fn new(menu_items: &[MenuItem]) -> Self {
        Self {
            index: RestaurantIndex::from_menu_items(menu_items),
        }
    }

    pub fn index(&self) -> &RestaurantIndex {
        &self.index
    }

    /// Restaurants able to fulfil the whole order
    pub fn eligible_restaurants(&self, order: &Order) -> Vec<Restaurant> {
        self.index.eligible_restaurants(order)
    }

    /// Stages 1 and 2 for a batch of orders
    pub fn prepare(&self, orders: Vec<Order>) -> MatchPlan {
        let entries = orders
            .into_iter()
            .map(|order| {
                let restaurants = self.index.eligible_restaurants(&order);
                tracing::trace!("Order {} has {} eligible restaurants", order.id, restaurants.len());
                (order, restaurants)
            })
            .collect();

        MatchPlan { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, OrderLineItem, OrderStatus, Product};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn restaurant(id: i64) -> Restaurant {
        Restaurant {
            id,
            name: format!("Restaurant {}", id),
            address: format!("Restaurant street {}", id),
            contact_phone: String::new(),
        }
    }

    fn menu_item(restaurant_id: i64, product_id: i64) -> MenuItem {
        MenuItem {
            restaurant: restaurant(restaurant_id),
            product: Product {
                id: product_id,
                name: format!("Product {}", product_id),
                price: Decimal::new(25000, 2),
                category: None,
                image: String::new(),
                special_status: false,
                description: String::new(),
            },
            availability: true,
        }
    }

    fn order(id: i64, address: &str, product_ids: &[i64]) -> Order {
        Order {
            id,
            status: OrderStatus::Created,
            payment_method: None,
            address: address.to_string(),
            firstname: "Anna".into(),
            lastname: "Ivanova".into(),
            phonenumber: "+79001234567".into(),
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
                    price: Decimal::new(25000, 2),
                })
                .collect(),
        }
    }

    #[test]
    fn test_plan_collects_only_needed_addresses() {
        let matcher = Matcher::new(&[menu_item(1, 1), menu_item(1, 2), menu_item(2, 1), menu_item(3, 3)]);

        let plan = matcher.prepare(vec![
            order(1, "Home A", &[1, 2]),
            order(2, "Home B", &[1]),
            order(3, "Home A", &[]),
        ]);

        let addresses: Vec<String> = plan.addresses().into_iter().collect();
        assert_eq!(
            addresses,
            vec!["Home A", "Home B", "Restaurant street 1", "Restaurant street 2"]
        );
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_rank_plan() {
        let matcher = Matcher::new(&[menu_item(1, 1), menu_item(2, 1)]);
        let plan = matcher.prepare(vec![order(1, "Home", &[1]), order(2, "Nowhere", &[1])]);

        let mut locations = ResolvedLocations::new();
        locations.insert("Home".into(), Some(Coordinates::new(55.75, 37.61)));
        locations.insert("Nowhere".into(), None);
        locations.insert("Restaurant street 1".into(), Some(Coordinates::new(55.80, 37.61)));
        locations.insert("Restaurant street 2".into(), Some(Coordinates::new(55.76, 37.61)));

        let matches = plan.rank(&locations);

        assert_eq!(matches.len(), 2);
        let ids: Vec<i64> = matches[0].ranking.restaurants().iter().map(|r| r.restaurant.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(matches[1].ranking, Ranking::AddressNotFound);
    }
}
