use std::collections::HashMap;

use geo_types::{LineString, Point};

use crate::api::DynRoutingAPI;
use crate::engine::store::TripView;
use crate::entities::Coordinates;

/// Viewport padding applied when fitting both endpoints, in pixels.
const BOUNDS_PADDING_PX: f64 = 48.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerRole {
    Pickup,
    Dropoff,
    Driver,
}

/// Imperative map handle. The overlay is its only caller; a fake sink
/// stands in for the real renderer in tests.
pub trait MapSink {
    fn place_marker(&mut self, role: MarkerRole, at: Coordinates);

    fn move_marker(&mut self, role: MarkerRole, to: Coordinates);

    fn remove_marker(&mut self, role: MarkerRole);

    fn draw_route(&mut self, path: LineString<f64>);

    fn clear_route(&mut self);

    fn fit_bounds(&mut self, a: Coordinates, b: Coordinates, padding: f64);
}

/// Projects store state onto the map. Owns the role-to-marker bookkeeping
/// so a marker is created once and only repositioned afterwards, and keys
/// route requests to the endpoint pair so the routing service is called
/// once per endpoint change, never per driver-position update.
pub struct GeoOverlay<S: MapSink> {
    sink: S,
    routing: DynRoutingAPI,
    markers: HashMap<MarkerRole, Coordinates>,
    requested_route: Option<(Coordinates, Coordinates)>,
}

impl<S: MapSink> GeoOverlay<S> {
    pub fn new(sink: S, routing: DynRoutingAPI) -> Self {
        Self {
            sink,
            routing,
            markers: HashMap::new(),
            requested_route: None,
        }
    }

    /// Reconciles the map with a store snapshot. Read-only with respect to
    /// the store; all effects go to the sink.
    pub async fn sync(&mut self, view: &TripView) {
        let Some(trip) = &view.trip else {
            self.reset();
            return;
        };

        self.sync_marker(MarkerRole::Pickup, trip.pickup.coordinates);
        self.sync_marker(MarkerRole::Dropoff, trip.dropoff.coordinates);
        self.sync_marker(
            MarkerRole::Driver,
            view.driver_position.as_ref().map(|p| p.coordinates),
        );

        if let (Some(pickup), Some(dropoff)) = (trip.pickup.coordinates, trip.dropoff.coordinates)
        {
            self.refresh_route(pickup, dropoff).await;
        }
    }

    /// Clears everything after the trip leaves the store.
    pub fn reset(&mut self) {
        if self.markers.is_empty() && self.requested_route.is_none() {
            return;
        }

        for (role, _) in self.markers.drain() {
            self.sink.remove_marker(role);
        }

        self.sink.clear_route();
        self.requested_route = None;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn sync_marker(&mut self, role: MarkerRole, at: Option<Coordinates>) {
        let Some(at) = at else {
            return;
        };

        match self.markers.get(&role).copied() {
            None => {
                self.sink.place_marker(role, at);
                self.markers.insert(role, at);
            }
            Some(current) if current != at => {
                self.sink.move_marker(role, at);
                self.markers.insert(role, at);
            }
            Some(_) => {}
        }
    }

    async fn refresh_route(&mut self, pickup: Coordinates, dropoff: Coordinates) {
        if self.requested_route == Some((pickup, dropoff)) {
            return;
        }

        // Key the request to the pair before the call: a failed fetch is
        // retried on the next endpoint change, not at render rate.
        self.requested_route = Some((pickup, dropoff));
        self.sink.fit_bounds(pickup, dropoff, BOUNDS_PADDING_PX);

        match self.routing.find_route(pickup, dropoff).await {
            Ok(path) => {
                let line = LineString::from(
                    path.into_iter().map(Point::from).collect::<Vec<Point<f64>>>(),
                );
                self.sink.draw_route(line);
            }
            Err(err) => {
                tracing::warn!(%err, "route fetch failed, keeping previous route");
            }
        }
    }
}
