use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::api::{DynGeocodingAPI, DynPlaceSearchAPI};
use crate::entities::{Coordinates, Place};
use crate::error::Error;

/// Labels a point the user picked directly on the map. A geocoding failure
/// degrades to the raw coordinates; the selection itself always succeeds.
pub async fn resolve_place(geocoding: &DynGeocodingAPI, coordinates: Coordinates) -> Place {
    match geocoding.reverse_geocode(coordinates).await {
        Ok(address) => Place::resolved(address, coordinates),
        Err(err) => {
            tracing::warn!(%err, "reverse geocode failed, labelling with raw coordinates");
            Place::from_coordinates(coordinates)
        }
    }
}

/// Free-text place search with a debounce window. A query issued while an
/// older one is still waiting supersedes it; the superseded query resolves
/// to `None` without ever reaching the network.
pub struct DebouncedSearch {
    places: DynPlaceSearchAPI,
    window: Duration,
    generation: AtomicU64,
}

impl DebouncedSearch {
    pub fn new(places: DynPlaceSearchAPI, window: Duration) -> Self {
        Self {
            places,
            window,
            generation: AtomicU64::new(0),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn query(
        &self,
        input: String,
        bias: Option<Coordinates>,
    ) -> Result<Option<Vec<Place>>, Error> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.window).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!("query superseded during debounce window");
            return Ok(None);
        }

        let candidates = self.places.search_places(input, bias).await?;

        Ok(Some(candidates))
    }
}
