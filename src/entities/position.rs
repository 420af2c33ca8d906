use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// Ephemeral live position of the matched driver. Never persisted; an
/// update either supersedes the held value wholesale or is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverPosition {
    pub coordinates: Coordinates,
    pub heading_deg: Option<f64>,
    pub speed_mps: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl DriverPosition {
    pub fn new(coordinates: Coordinates, updated_at: DateTime<Utc>) -> Self {
        Self {
            coordinates,
            heading_deg: None,
            speed_mps: None,
            updated_at,
        }
    }

    pub fn supersedes(&self, other: &DriverPosition) -> bool {
        self.updated_at > other.updated_at
    }
}
