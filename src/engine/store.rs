use tokio::sync::watch;

use crate::entities::{DriverPosition, Trip, TripPatch};

/// Everything a read-only observer can see: the canonical trip plus the
/// latest accepted driver position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TripView {
    pub trip: Option<Trip>,
    pub driver_position: Option<DriverPosition>,
}

impl TripView {
    pub fn is_active(&self) -> bool {
        self.trip.as_ref().map(Trip::is_active).unwrap_or(false)
    }
}

/// Single source of truth for the current trip. Written only by the
/// reconciler and the dispatcher's success path; subscribers are notified
/// on every accepted write and never on a rejected or no-op one.
pub struct TripStore {
    state: watch::Sender<TripView>,
}

impl TripStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(TripView::default());

        Self { state }
    }

    pub fn view(&self) -> TripView {
        self.state.borrow().clone()
    }

    pub fn current(&self) -> Option<Trip> {
        self.state.borrow().trip.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TripView> {
        self.state.subscribe()
    }

    /// Unconditional replacement with an authoritative snapshot.
    #[tracing::instrument(skip_all, fields(trip_id = %trip.id, status = %trip.status.name()))]
    pub fn replace(&self, trip: Trip) {
        self.state.send_modify(|view| {
            view.trip = Some(trip);
        });
    }

    /// Guarded merge of a partial update. A patch whose status would move
    /// the lifecycle backward is dropped whole; a patch that changes
    /// nothing is a silent no-op. Returns whether the store changed.
    pub fn apply(&self, patch: TripPatch) -> bool {
        self.state.send_if_modified(|view| {
            let Some(trip) = view.trip.as_mut() else {
                tracing::warn!("dropping patch, no trip in store");
                return false;
            };

            if let Some(status) = &patch.status {
                if *status != trip.status && !trip.status.may_advance_to(status) {
                    tracing::warn!(
                        current = %trip.status.name(),
                        incoming = %status.name(),
                        "dropping stale status patch"
                    );
                    return false;
                }
            }

            let before = trip.clone();
            trip.merge(&patch);

            *trip != before
        })
    }

    /// Last-writer-wins on `updated_at`; older updates are discarded.
    pub fn update_position(&self, position: DriverPosition) -> bool {
        self.state.send_if_modified(|view| {
            if let Some(current) = &view.driver_position {
                if !position.supersedes(current) {
                    tracing::debug!("dropping out-of-order driver position");
                    return false;
                }
            }

            view.driver_position = Some(position);
            true
        })
    }

    /// Drops the trip after a terminal status, once the user moves on.
    pub fn clear(&self) {
        self.state.send_modify(|view| {
            *view = TripView::default();
        });
    }
}

impl Default for TripStore {
    fn default() -> Self {
        Self::new()
    }
}
