use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{Coordinates, IssueTicket, Place, Trip};
use crate::error::Error;
use crate::session::Session;
use crate::transport::Subscription;

/// Trip snapshot fetch plus the lifecycle action calls. The backend is the
/// authority on every transition; callers merge the returned snapshot, never
/// their optimistic value.
#[async_trait]
pub trait TripAPI {
    async fn current_trip(&self, session: Session) -> Result<Option<Trip>, Error>;

    async fn confirm_driver(&self, session: Session, id: Uuid) -> Result<Trip, Error>;

    async fn mark_picked_up(&self, session: Session, id: Uuid) -> Result<Trip, Error>;

    async fn complete_trip(&self, session: Session, id: Uuid) -> Result<Trip, Error>;

    async fn cancel_trip(&self, session: Session, id: Uuid) -> Result<Trip, Error>;

    async fn report_issue(
        &self,
        session: Session,
        id: Uuid,
        description: String,
    ) -> Result<IssueTicket, Error>;
}

/// Ordered polyline approximating the travel path between two points.
#[async_trait]
pub trait RoutingAPI {
    async fn find_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Vec<Coordinates>, Error>;
}

#[async_trait]
pub trait GeocodingAPI {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, Error>;
}

#[async_trait]
pub trait PlaceSearchAPI {
    async fn search_places(
        &self,
        input: String,
        bias: Option<Coordinates>,
    ) -> Result<Vec<Place>, Error>;
}

/// Minimal pub/sub seam. Any transport that can hand back a message stream
/// per topic is substitutable; dropping the subscription unsubscribes.
#[async_trait]
pub trait PushTransport {
    async fn subscribe(&self, topic: String) -> Result<Subscription, Error>;
}

pub type DynTripAPI = Arc<dyn TripAPI + Send + Sync>;
pub type DynRoutingAPI = Arc<dyn RoutingAPI + Send + Sync>;
pub type DynGeocodingAPI = Arc<dyn GeocodingAPI + Send + Sync>;
pub type DynPlaceSearchAPI = Arc<dyn PlaceSearchAPI + Send + Sync>;
pub type DynPushTransport = Arc<dyn PushTransport + Send + Sync>;
