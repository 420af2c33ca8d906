use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::api::DynTripAPI;
use crate::engine::store::TripStore;
use crate::entities::{Fare, IssueTicket, Place, Trip, TripPatch, TripStatus};
use crate::error::{invalid_invocation_error, timeout_error, Error};
use crate::session::Session;

/// Translates user intents into backend calls. Preconditions on the stored
/// status fail fast; on success the server's returned snapshot is merged
/// through the store guard, never the optimistic value; on failure the
/// store is untouched and the error says whether a retry makes sense.
pub struct ActionDispatcher {
    store: Arc<TripStore>,
    trips: DynTripAPI,
    session: Session,
    request_timeout: Duration,
}

impl ActionDispatcher {
    pub fn new(
        store: Arc<TripStore>,
        trips: DynTripAPI,
        session: Session,
        request_timeout: Duration,
    ) -> Self {
        Self {
            store,
            trips,
            session,
            request_timeout,
        }
    }

    /// Creates the client-side placeholder for a new ride request. Refused
    /// while another trip is still active; a terminal leftover is cleared
    /// first, which is what "starting a new request" means for the store.
    #[tracing::instrument(skip_all)]
    pub fn submit_request(
        &self,
        pickup: Place,
        dropoff: Place,
        estimated_fare: Fare,
    ) -> Result<Trip, Error> {
        if let Some(current) = self.store.current() {
            if current.is_active() {
                tracing::warn!(trip_id = %current.id, "refusing new request while a trip is active");
                return Err(invalid_invocation_error());
            }

            self.store.clear();
        }

        let trip = Trip::request(pickup, dropoff, estimated_fare);
        self.store.replace(trip.clone());

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    pub async fn confirm_driver(&self) -> Result<Trip, Error> {
        let trip = self.require_status(|status| matches!(status, TripStatus::Requested))?;

        let updated = self
            .bounded(self.trips.confirm_driver(self.session.clone(), trip.id))
            .await?;

        Ok(self.merge_result(updated))
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_picked_up(&self) -> Result<Trip, Error> {
        let trip = self.require_status(|status| matches!(status, TripStatus::DriverEnRoute))?;

        let updated = self
            .bounded(self.trips.mark_picked_up(self.session.clone(), trip.id))
            .await?;

        Ok(self.merge_result(updated))
    }

    #[tracing::instrument(skip(self))]
    pub async fn complete_trip(&self) -> Result<Trip, Error> {
        let trip = self.require_status(|status| {
            matches!(status, TripStatus::OnTrip | TripStatus::DriverArrived)
        })?;

        let updated = self
            .bounded(self.trips.complete_trip(self.session.clone(), trip.id))
            .await?;

        Ok(self.merge_result(updated))
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel_trip(&self) -> Result<Trip, Error> {
        let trip = self.require_status(|status| !status.is_terminal())?;

        let updated = self
            .bounded(self.trips.cancel_trip(self.session.clone(), trip.id))
            .await?;

        Ok(self.merge_result(updated))
    }

    /// Side-channel ticket creation; valid in any status, no store write.
    #[tracing::instrument(skip(self, description))]
    pub async fn report_issue(&self, description: String) -> Result<IssueTicket, Error> {
        let trip = self.store.current().ok_or_else(invalid_invocation_error)?;

        self.bounded(
            self.trips
                .report_issue(self.session.clone(), trip.id, description),
        )
        .await
    }

    fn require_status(&self, permits: impl Fn(&TripStatus) -> bool) -> Result<Trip, Error> {
        let trip = self.store.current().ok_or_else(invalid_invocation_error)?;

        if !permits(&trip.status) {
            tracing::warn!(status = %trip.status.name(), "action not valid from current status");
            return Err(invalid_invocation_error());
        }

        Ok(trip)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| timeout_error())?
    }

    fn merge_result(&self, trip: Trip) -> Trip {
        self.store.apply(TripPatch::from_snapshot(&trip));
        trip
    }
}
