use geo_types::Point;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn haversine_km(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lng / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Point::new(coordinates.longitude, coordinates.latitude)
    }
}

impl From<Coordinates> for String {
    fn from(coordinates: Coordinates) -> Self {
        format!("{},{}", coordinates.latitude, coordinates.longitude)
    }
}

/// One end of a trip. The address or the coordinates may lag behind the
/// other until geocoding or a map selection resolves it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl Place {
    pub fn new(address: Option<String>, coordinates: Option<Coordinates>) -> Self {
        Self {
            address,
            coordinates,
        }
    }

    pub fn from_coordinates(coordinates: Coordinates) -> Self {
        Self {
            address: None,
            coordinates: Some(coordinates),
        }
    }

    pub fn resolved(address: String, coordinates: Coordinates) -> Self {
        Self {
            address: Some(address),
            coordinates: Some(coordinates),
        }
    }

    /// Best-effort display label: the resolved address, or raw coordinates
    /// while geocoding has not caught up.
    pub fn label(&self) -> String {
        match (&self.address, &self.coordinates) {
            (Some(address), _) => address.clone(),
            (None, Some(coordinates)) => (*coordinates).into(),
            (None, None) => "unknown".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fare {
    pub amount: f64,
    pub currency: String,
}

impl Fare {
    pub fn new(amount: f64, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}
