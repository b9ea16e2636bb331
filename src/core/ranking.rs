use std::cmp::Ordering;

use crate::core::distance::calc_distance;
use crate::models::{Coordinates, RankedRestaurant, Ranking, ResolvedLocations, Restaurant};

/// Rank restaurants by distance from the order's location
///
/// Restaurants whose address is missing from `locations` or resolved to no
/// coordinates are left out. Equal distances are ordered by restaurant id.
pub fn rank_restaurants(
    origin: Option<Coordinates>,
    restaurants: Vec<Restaurant>,
    locations: &ResolvedLocations,
) -> Ranking {
    let Some(origin) = origin else {
        return Ranking::AddressNotFound;
    };

    let mut ranked: Vec<RankedRestaurant> = restaurants
        .into_iter()
        .filter_map(|restaurant| {
            let coordinates = locations.get(&restaurant.address).copied().flatten();
            match coordinates {
                Some(point) => Some(RankedRestaurant {
                    distance_km: calc_distance(origin, point),
                    restaurant,
                }),
                None => {
                    tracing::debug!(
                        "Skipping restaurant {} with unresolved address {:?}",
                        restaurant.id,
                        restaurant.address
                    );
                    None
                }
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.restaurant.id.cmp(&b.restaurant.id))
    });

    Ranking::Ranked { restaurants: ranked }
}
