use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{MenuItem, Order, Restaurant};

/// Index of which restaurants currently stock which product
///
/// Built once per request from the available menu items and reused for
/// every order in the batch.
#[derive(Debug, Clone, Default)]
pub struct RestaurantIndex {
    restaurants: BTreeMap<i64, Restaurant>,
    by_product: HashMap<i64, BTreeSet<i64>>,
}

impl RestaurantIndex {
    /// Build the index, ignoring menu items that are not available
    pub fn from_menu_items<'a, I>(menu_items: I) -> Self
    where
        I: IntoIterator<Item = &'a MenuItem>,
    {
        let mut index = Self::default();

        for item in menu_items.into_iter().filter(|item| item.availability) {
            index
                .restaurants
                .entry(item.restaurant.id)
                .or_insert_with(|| item.restaurant.clone());
            index
                .by_product
                .entry(item.product.id)
                .or_default()
                .insert(item.restaurant.id);
        }

        index
    }

    /// Restaurants able to cook every product of the order, ordered by id
    ///
    /// An order without line items has no eligible restaurants.
    pub fn eligible_restaurants(&self, order: &Order) -> Vec<Restaurant> {
        self.eligible_ids(order.items.iter().map(|item| item.product_id))
            .into_iter()
            .filter_map(|id| self.restaurants.get(&id).cloned())
            .collect()
    }

    /// Intersection of the stocking restaurant sets of all given products
    pub fn eligible_ids<I>(&self, product_ids: I) -> BTreeSet<i64>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut product_ids = product_ids.into_iter();

        let Some(first) = product_ids.next() else {
            return BTreeSet::new();
        };

        let mut eligible = self.stocking(first);

        for product_id in product_ids {
            if eligible.is_empty() {
                break;
            }
            let stocking = self.stocking(product_id);
            eligible.retain(|id| stocking.contains(id));
        }

        eligible
    }

    fn stocking(&self, product_id: i64) -> BTreeSet<i64> {
        self.by_product.get(&product_id).cloned().unwrap_or_default()
    }

    pub fn restaurant_count(&self) -> usize {
        self.restaurants.len()
    }

    pub fn product_count(&self) -> usize {
        self.by_product.len()
    }
}
