// Service exports
pub mod cache;
pub mod dispatch;
pub mod geocoder;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{GeocodeCache, GeocodeError};
pub use dispatch::{DispatchError, DispatchService};
pub use geocoder::{GeocoderError, GeocodingProvider, YandexGeocoder};
pub use memory::InMemoryStore;
pub use postgres::PostgresClient;
pub use store::{CatalogStore, LocationStore, OrderStore, StoreError};
