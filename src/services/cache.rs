use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Coordinates, Location, ResolvedLocations};
use crate::services::geocoder::{GeocoderError, GeocodingProvider};
use crate::services::store::{LocationStore, StoreError};

/// Errors that can occur while resolving addresses
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoder error: {0}")]
    Geocoder(#[from] GeocoderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Two-tier geocoding cache
///
/// L1 is a bounded in-process cache, L2 is the persistent locations
/// store. Addresses missing from both are sent to the geocoding provider
/// one at a time and written back to L2 in a single bulk insert.
///
/// Entries are never refreshed or evicted from L2, including addresses the
/// provider could not find.
pub struct GeocodeCache {
    store: Arc<dyn LocationStore>,
    provider: Arc<dyn GeocodingProvider>,
    l1_cache: moka::future::Cache<String, Option<Coordinates>>,
}

impl GeocodeCache {
    pub fn new(store: Arc<dyn LocationStore>, provider: Arc<dyn GeocodingProvider>, l1_size: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(l1_size).build();

        Self {
            store,
            provider,
            l1_cache,
        }
    }

    /// Resolve every address to coordinates, `None` where nothing was found
    ///
    /// Duplicate addresses are looked up once and blank ones resolve to
    /// `None` without a lookup. A provider failure fails the whole call and
    /// nothing fetched in it is persisted.
    pub async fn resolve<I, S>(&self, addresses: I) -> Result<ResolvedLocations, GeocodeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addresses: BTreeSet<String> = addresses.into_iter().map(Into::into).collect();
        let mut resolved = ResolvedLocations::with_capacity(addresses.len());

        // L1
        let mut l1_misses = Vec::new();
        for address in addresses {
            // Nothing to geocode
            if address.trim().is_empty() {
                resolved.insert(address, None);
                continue;
            }
            match self.l1_cache.get(address.as_str()).await {
                Some(coordinates) => {
                    tracing::trace!("L1 cache hit: {}", address);
                    resolved.insert(address, coordinates);
                }
                None => l1_misses.push(address),
            }
        }

        if l1_misses.is_empty() {
            return Ok(resolved);
        }

        // L2
        for location in self.store.find_locations(&l1_misses).await? {
            let coordinates = location.coordinates();
            self.l1_cache.insert(location.address.clone(), coordinates).await;
            resolved.insert(location.address, coordinates);
        }

        let missing: Vec<String> = l1_misses
            .into_iter()
            .filter(|address| !resolved.contains_key(address))
            .collect();

        if missing.is_empty() {
            return Ok(resolved);
        }

        tracing::debug!("Fetching {} addresses from geocoder", missing.len());

        let fetched_at = Utc::now().date_naive();
        let mut new_locations = Vec::with_capacity(missing.len());

        for address in missing {
            let coordinates = self.provider.fetch_coordinates(&address).await.map_err(|e| {
                tracing::error!("Geocoding {:?} failed: {}", address, e);
                e
            })?;

            if coordinates.is_none() {
                tracing::info!("Geocoder found nothing for {:?}", address);
            }

            new_locations.push(Location::new(address, coordinates, fetched_at));
        }

        match self.store.insert_locations(&new_locations).await {
            Ok(inserted) => tracing::debug!("Cached {} new locations", inserted),
            Err(StoreError::Conflict(e)) => {
                tracing::warn!("Locations already cached by a concurrent request: {}", e)
            }
            Err(e) => return Err(e.into()),
        }

        for location in new_locations {
            let coordinates = location.coordinates();
            self.l1_cache.insert(location.address.clone(), coordinates).await;
            resolved.insert(location.address, coordinates);
        }

        Ok(resolved)
    }

    /// Resolve a single address
    pub async fn resolve_one(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let resolved = self.resolve([address]).await?;
        Ok(resolved.get(address).copied().flatten())
    }

    /// Approximate number of entries held in L1
    pub fn l1_size(&self) -> u64 {
        self.l1_cache.entry_count()
    }
}
