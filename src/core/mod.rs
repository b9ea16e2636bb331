// Core algorithm exports
pub mod distance;
pub mod eligibility;
pub mod matcher;
pub mod ranking;

pub use distance::{calc_distance, round_km};
pub use eligibility::RestaurantIndex;
pub use matcher::{MatchPlan, Matcher, OrderMatch};
pub use ranking::rank_restaurants;
