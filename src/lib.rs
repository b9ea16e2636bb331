//! Foodcart - food ordering backend
//!
//! Catalog and order intake over HTTP, plus the order-to-restaurant
//! matching pipeline: restaurants that stock every ordered product are
//! ranked by geodesic distance, with addresses resolved through a
//! persistent geocoding cache.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{calc_distance, Matcher, RestaurantIndex};
pub use crate::models::{Coordinates, Order, Ranking, Restaurant};
pub use crate::services::{DispatchService, GeocodeCache};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let point = Coordinates::new(55.75, 37.61);
        assert_eq!(calc_distance(point, point), 0.0);
    }
}
