use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

use crate::api::{GeocodingAPI, PlaceSearchAPI, RoutingAPI};
use crate::entities::{Coordinates, Place};
use crate::error::{invalid_input_error, upstream_error, Error};

/// Client for the mapping provider: routing, reverse geocoding and place
/// search. Every response arrives in the provider's status envelope.
pub struct MapsClient {
    client: reqwest::Client,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response<T> {
    status: String,
    result: Option<T>,
    results: Option<T>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PlaceCandidate {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Geometry {
    location: Coordinates,
}

impl MapsClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<Response<T>, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let api_base = env::var("MAPS_API_BASE")?;
        let url = format!("https://{}/maps/api/{}/json", api_base, path);
        let key = env::var("MAPS_API_KEY")?;

        let res = self
            .client
            .get(url)
            .query(&[("key", key)])
            .query(query)
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let data: Response<T> = res.json().await?;

        if !(data.status == "OK" || data.status == "ZERO_RESULTS") {
            return Err(upstream_error());
        }

        Ok(data)
    }
}

impl Default for MapsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoutingAPI for MapsClient {
    #[tracing::instrument(skip(self))]
    async fn find_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Vec<Coordinates>, Error> {
        let origin: String = origin.into();
        let destination: String = destination.into();

        let data: Response<Vec<Coordinates>> = self
            .get(
                "directions",
                &[("origin", origin), ("destination", destination)],
            )
            .await?;

        Ok(data.result.ok_or_else(upstream_error)?)
    }
}

#[async_trait]
impl GeocodingAPI for MapsClient {
    #[tracing::instrument(skip(self))]
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, Error> {
        let latlng: String = coordinates.into();

        let data: Response<Vec<GeocodeResult>> =
            self.get("geocode", &[("latlng", latlng)]).await?;

        let results = data.results.ok_or_else(upstream_error)?;
        let first = results.into_iter().next().ok_or_else(upstream_error)?;

        Ok(first.formatted_address)
    }
}

#[async_trait]
impl PlaceSearchAPI for MapsClient {
    #[tracing::instrument(skip(self))]
    async fn search_places(
        &self,
        input: String,
        bias: Option<Coordinates>,
    ) -> Result<Vec<Place>, Error> {
        let mut query = vec![("query", input)];

        if let Some(bias) = bias {
            query.push(("location", bias.into()));
        }

        let data: Response<Vec<PlaceCandidate>> = self.get("place/textsearch", &query).await?;

        let candidates = data.results.unwrap_or_default();

        Ok(candidates
            .into_iter()
            .map(|candidate| {
                Place::resolved(candidate.formatted_address, candidate.geometry.location)
            })
            .collect())
    }
}
