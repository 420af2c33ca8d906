use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{DriverPosition, Fare, Place, Trip, TripStatus};

/// Partial trip update. Push payloads decode into this; dispatcher results
/// are converted into it so every write path shares the store's guard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripPatch {
    pub status: Option<TripStatus>,
    pub counterpart: Option<String>,
    pub pickup: Option<Place>,
    pub dropoff: Option<Place>,
    pub estimated_fare: Option<Fare>,
    pub final_fare: Option<Fare>,
    pub estimated_distance_km: Option<f64>,
    pub estimated_duration_mins: Option<f64>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub drop_off_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl TripPatch {
    pub fn status(status: TripStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Everything an authoritative snapshot can teach the store, minus the
    /// identity fields that never change.
    pub fn from_snapshot(trip: &Trip) -> Self {
        Self {
            status: Some(trip.status),
            counterpart: trip.counterpart.clone(),
            pickup: Some(trip.pickup.clone()),
            dropoff: Some(trip.dropoff.clone()),
            estimated_fare: Some(trip.estimated_fare.clone()),
            final_fare: trip.final_fare.clone(),
            estimated_distance_km: trip.estimated_distance_km,
            estimated_duration_mins: trip.estimated_duration_mins,
            accepted_at: trip.accepted_at,
            arrived_at: trip.arrived_at,
            drop_off_at: trip.drop_off_at,
            cancelled_at: trip.cancelled_at,
        }
    }
}

/// Wire format of a message on a trip's push topic.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PushMessage {
    Trip(TripPatch),
    Position(DriverPosition),
}
