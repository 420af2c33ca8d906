use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Fare, Place, TripPatch};

/// Nominal urban travel speed used for the client-side duration estimate
/// until a server snapshot refines it.
const ESTIMATE_SPEED_KMH: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Requested,
    Accepted,
    DriverEnRoute,
    DriverArrived,
    OnTrip,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn name(&self) -> String {
        match self {
            Self::Requested => "REQUESTED".into(),
            Self::Accepted => "ACCEPTED".into(),
            Self::DriverEnRoute => "DRIVER_EN_ROUTE".into(),
            Self::DriverArrived => "DRIVER_ARRIVED".into(),
            Self::OnTrip => "ON_TRIP".into(),
            Self::Completed => "COMPLETED".into(),
            Self::Cancelled => "CANCELLED".into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Requested => 0,
            Self::Accepted => 1,
            Self::DriverEnRoute => 2,
            Self::DriverArrived => 3,
            Self::OnTrip => 4,
            Self::Completed => 5,
            Self::Cancelled => 6,
        }
    }

    /// Whether a transition from this status to `next` moves the lifecycle
    /// forward. Cancellation is the one edge permitted from any non-terminal
    /// status; nothing leaves a terminal status.
    pub fn may_advance_to(&self, next: &TripStatus) -> bool {
        if self.is_terminal() {
            return false;
        }

        match next {
            Self::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub status: TripStatus,
    pub pickup: Place,
    pub dropoff: Place,
    pub counterpart: Option<String>,
    pub estimated_fare: Fare,
    pub final_fare: Option<Fare>,
    pub estimated_distance_km: Option<f64>,
    pub estimated_duration_mins: Option<f64>,
    pub requested_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub drop_off_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Trip {
    /// Client-side placeholder created the moment a ride request is
    /// submitted. Everything past this point comes from server state.
    pub fn request(pickup: Place, dropoff: Place, estimated_fare: Fare) -> Self {
        let mut trip = Self {
            id: Uuid::new_v4(),
            status: TripStatus::Requested,
            pickup,
            dropoff,
            counterpart: None,
            estimated_fare,
            final_fare: None,
            estimated_distance_km: None,
            estimated_duration_mins: None,
            requested_at: Utc::now(),
            accepted_at: None,
            arrived_at: None,
            drop_off_at: None,
            cancelled_at: None,
        };

        trip.refresh_estimates();
        trip
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Field-level merge of a partial update. The caller is responsible for
    /// the status monotonicity guard; timestamps are set exactly once and
    /// never overwritten by re-delivered payloads.
    pub fn merge(&mut self, patch: &TripPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }

        if let Some(counterpart) = &patch.counterpart {
            self.counterpart = Some(counterpart.clone());
        }

        let endpoints_changed = patch.pickup.is_some() || patch.dropoff.is_some();

        if let Some(pickup) = &patch.pickup {
            self.pickup = pickup.clone();
        }

        if let Some(dropoff) = &patch.dropoff {
            self.dropoff = dropoff.clone();
        }

        if let Some(fare) = &patch.estimated_fare {
            self.estimated_fare = fare.clone();
        }

        if let Some(fare) = &patch.final_fare {
            self.final_fare = Some(fare.clone());
        }

        if let Some(distance) = patch.estimated_distance_km {
            self.estimated_distance_km = Some(distance);
        }

        if let Some(duration) = patch.estimated_duration_mins {
            self.estimated_duration_mins = Some(duration);
        }

        if self.accepted_at.is_none() {
            self.accepted_at = patch.accepted_at;
        }

        if self.arrived_at.is_none() {
            self.arrived_at = patch.arrived_at;
        }

        if self.drop_off_at.is_none() {
            self.drop_off_at = patch.drop_off_at;
        }

        if self.cancelled_at.is_none() {
            self.cancelled_at = patch.cancelled_at;
        }

        if endpoints_changed && patch.estimated_distance_km.is_none() {
            self.refresh_estimates();
        }
    }

    /// Straight-line estimates, recomputed whenever both endpoints are known.
    fn refresh_estimates(&mut self) {
        let (Some(pickup), Some(dropoff)) = (self.pickup.coordinates, self.dropoff.coordinates)
        else {
            return;
        };

        let distance = pickup.haversine_km(&dropoff);

        self.estimated_distance_km = Some(distance);
        self.estimated_duration_mins = Some(distance / ESTIMATE_SPEED_KMH * 60.0);
    }
}
