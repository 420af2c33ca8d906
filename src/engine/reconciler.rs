use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::{DynPushTransport, DynTripAPI};
use crate::engine::store::TripStore;
use crate::entities::{PushMessage, Trip};
use crate::error::Error;
use crate::session::Session;
use crate::transport::Subscription;

/// The only path from the network into the store. Merges the polling
/// channel (authoritative snapshots) and the push channel (partial
/// patches) under the store's monotonicity guard, and bounds its own
/// lifetime to the lifetime of an active trip.
pub struct Reconciler {
    store: Arc<TripStore>,
    trips: DynTripAPI,
    transport: DynPushTransport,
    session: Session,
    poll_interval: Duration,
}

/// Handle on a started reconciler: exactly one poll task and one push
/// task. Dropping the push subscription is what unsubscribes.
pub struct ReconcilerHandle {
    active: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Forces teardown and waits for both tasks. An in-flight poll is
    /// allowed to finish but its result is discarded, not applied.
    pub async fn stop(self) {
        let _ = self.active.send(false);
        join_all(self.tasks).await;
    }

    /// Resolves once both channels have deactivated on their own, which
    /// happens when the stored trip turns terminal or is cleared.
    pub async fn wait(self) {
        join_all(self.tasks).await;
    }
}

impl Reconciler {
    pub fn new(
        store: Arc<TripStore>,
        trips: DynTripAPI,
        transport: DynPushTransport,
        session: Session,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            trips,
            transport,
            session,
            poll_interval,
        }
    }

    /// One-shot rehydration on session resume: fetches the authoritative
    /// snapshot and seeds the store with it when a trip exists.
    #[tracing::instrument(skip(self))]
    pub async fn resync(&self) -> Result<Option<Trip>, Error> {
        let maybe_trip = self.trips.current_trip(self.session.clone()).await?;

        if let Some(trip) = &maybe_trip {
            self.store.replace(trip.clone());
        }

        Ok(maybe_trip)
    }

    /// Activates both channels for an active trip.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, trip_id: Uuid) -> Result<ReconcilerHandle, Error> {
        let subscription = self.transport.subscribe(topic(trip_id)).await?;
        let (active, _) = watch::channel(true);

        let poll = tokio::spawn(poll_loop(
            self.store.clone(),
            self.trips.clone(),
            self.session.clone(),
            self.poll_interval,
            active.subscribe(),
        ));

        let push = tokio::spawn(push_loop(
            self.store.clone(),
            subscription,
            active.subscribe(),
        ));

        Ok(ReconcilerHandle {
            active,
            tasks: vec![poll, push],
        })
    }
}

fn topic(trip_id: Uuid) -> String {
    format!("trips/{}", trip_id)
}

async fn poll_loop(
    store: Arc<TripStore>,
    trips: DynTripAPI,
    session: Session,
    poll_interval: Duration,
    mut active: watch::Receiver<bool>,
) {
    let mut store_rx = store.subscribe();
    let mut ticker = tokio::time::interval(poll_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !session.is_online() {
                    continue;
                }

                match trips.current_trip(session.clone()).await {
                    Ok(Some(trip)) => {
                        if !*active.borrow() || !store.view().is_active() {
                            tracing::debug!("discarding poll result after deactivation");
                            break;
                        }

                        store.replace(trip);
                    }
                    // Absence of fresh data is not evidence the trip ended.
                    Ok(None) => {
                        tracing::debug!("snapshot reports no active trip, keeping store");
                    }
                    Err(err) => {
                        tracing::warn!(%err, "poll fetch failed, retrying next tick");
                    }
                }

                if !store.view().is_active() {
                    break;
                }
            }
            changed = store_rx.changed() => {
                if changed.is_err() || !store_rx.borrow_and_update().is_active() {
                    break;
                }
            }
            changed = active.changed() => {
                if changed.is_err() || !*active.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("poll channel deactivated");
}

async fn push_loop(
    store: Arc<TripStore>,
    subscription: Subscription,
    mut active: watch::Receiver<bool>,
) {
    let mut store_rx = store.subscribe();

    loop {
        tokio::select! {
            message = subscription.next_message() => {
                let Some(payload) = message else {
                    tracing::info!(topic = subscription.topic(), "push topic closed");
                    break;
                };

                if !*active.borrow() {
                    break;
                }

                dispatch_message(&store, &payload);
            }
            changed = store_rx.changed() => {
                if changed.is_err() || !store_rx.borrow_and_update().is_active() {
                    break;
                }
            }
            changed = active.changed() => {
                if changed.is_err() || !*active.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!(topic = subscription.topic(), "push channel deactivated");
}

fn dispatch_message(store: &TripStore, payload: &str) {
    match serde_json::from_str::<PushMessage>(payload) {
        Ok(PushMessage::Trip(patch)) => {
            store.apply(patch);
        }
        Ok(PushMessage::Position(position)) => {
            store.update_position(position);
        }
        Err(err) => {
            tracing::warn!(%err, "dropping undecodable push payload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TripAPI;
    use crate::entities::{
        Coordinates, DriverPosition, Fare, IssueTicket, Place, TripPatch, TripStatus,
    };
    use crate::transport::LocalHub;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    struct ScriptedTrips {
        responses: Mutex<VecDeque<Result<Option<Trip>, Error>>>,
        delay: Duration,
    }

    impl ScriptedTrips {
        fn new(responses: Vec<Result<Option<Trip>, Error>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl TripAPI for ScriptedTrips {
        async fn current_trip(&self, _session: Session) -> Result<Option<Trip>, Error> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.responses
                .lock()
                .await
                .pop_front()
                .unwrap_or(Ok(None))
        }

        async fn confirm_driver(&self, _session: Session, _id: Uuid) -> Result<Trip, Error> {
            unimplemented!()
        }

        async fn mark_picked_up(&self, _session: Session, _id: Uuid) -> Result<Trip, Error> {
            unimplemented!()
        }

        async fn complete_trip(&self, _session: Session, _id: Uuid) -> Result<Trip, Error> {
            unimplemented!()
        }

        async fn cancel_trip(&self, _session: Session, _id: Uuid) -> Result<Trip, Error> {
            unimplemented!()
        }

        async fn report_issue(
            &self,
            _session: Session,
            _id: Uuid,
            _description: String,
        ) -> Result<IssueTicket, Error> {
            unimplemented!()
        }
    }

    fn placeholder() -> Trip {
        Trip::request(
            Place::from_coordinates(Coordinates::new(6.5244, 3.3792)),
            Place::from_coordinates(Coordinates::new(6.4541, 3.3947)),
            Fare::new(4500.0, "NGN"),
        )
    }

    fn with_status(mut trip: Trip, status: TripStatus) -> Trip {
        trip.status = status;
        trip
    }

    fn reconciler(
        store: Arc<TripStore>,
        trips: ScriptedTrips,
        hub: Arc<LocalHub>,
        session: Session,
    ) -> Reconciler {
        Reconciler::new(
            store,
            Arc::new(trips),
            hub,
            session,
            Duration::from_secs(5),
        )
    }

    fn session() -> Session {
        Session::new(Uuid::new_v4(), "token".into())
    }

    #[tokio::test(start_paused = true)]
    async fn poll_applies_snapshots_until_terminal() {
        let store = Arc::new(TripStore::new());
        let trip = placeholder();
        store.replace(trip.clone());

        let trips = ScriptedTrips::new(vec![
            Ok(Some(with_status(trip.clone(), TripStatus::Accepted))),
            Ok(Some(with_status(trip.clone(), TripStatus::Completed))),
        ]);

        let hub = Arc::new(LocalHub::new());
        let handle = reconciler(store.clone(), trips, hub, session())
            .start(trip.id)
            .await
            .unwrap();

        handle.wait().await;

        assert_eq!(store.current().unwrap().status, TripStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failure_never_clears_the_store() {
        let store = Arc::new(TripStore::new());
        let trip = placeholder();
        store.replace(trip.clone());

        let trips = ScriptedTrips::new(vec![
            Err(crate::error::upstream_error()),
            Ok(Some(with_status(trip.clone(), TripStatus::Cancelled))),
        ]);

        let hub = Arc::new(LocalHub::new());
        let handle = reconciler(store.clone(), trips, hub, session())
            .start(trip.id)
            .await
            .unwrap();

        handle.wait().await;

        assert_eq!(store.current().unwrap().status, TripStatus::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_push_status_is_dropped() {
        let store = Arc::new(TripStore::new());
        let trip = placeholder();
        store.replace(with_status(trip.clone(), TripStatus::OnTrip));

        let hub = Arc::new(LocalHub::new());
        let handle = reconciler(store.clone(), ScriptedTrips::new(vec![]), hub.clone(), session())
            .start(trip.id)
            .await
            .unwrap();

        let stale = serde_json::to_string(&PushMessage::Trip(TripPatch::status(
            TripStatus::Accepted,
        )))
        .unwrap();
        hub.publish(&format!("trips/{}", trip.id), stale).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.current().unwrap().status, TripStatus::OnTrip);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_order_position_is_discarded() {
        let store = Arc::new(TripStore::new());
        let trip = placeholder();
        store.replace(with_status(trip.clone(), TripStatus::DriverEnRoute));

        let hub = Arc::new(LocalHub::new());
        let handle = reconciler(store.clone(), ScriptedTrips::new(vec![]), hub.clone(), session())
            .start(trip.id)
            .await
            .unwrap();

        let topic = format!("trips/{}", trip.id);
        let t1 = Utc::now();
        let t0 = t1 - chrono::Duration::seconds(30);

        let newer = DriverPosition::new(Coordinates::new(6.50, 3.40), t1);
        let older = DriverPosition::new(Coordinates::new(6.49, 3.39), t0);

        for position in [newer, older] {
            let payload = serde_json::to_string(&PushMessage::Position(position)).unwrap();
            hub.publish(&topic, payload).await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.view().driver_position, Some(newer));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_push_payload_is_dropped() {
        let store = Arc::new(TripStore::new());
        let trip = placeholder();
        store.replace(trip.clone());

        let hub = Arc::new(LocalHub::new());
        let handle = reconciler(store.clone(), ScriptedTrips::new(vec![]), hub.clone(), session())
            .start(trip.id)
            .await
            .unwrap();

        hub.publish(&format!("trips/{}", trip.id), "not json".into())
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.current().unwrap().status, TripStatus::Requested);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_poll_is_discarded_after_stop() {
        let store = Arc::new(TripStore::new());
        let trip = placeholder();
        store.replace(trip.clone());

        let trips = ScriptedTrips::new(vec![Ok(Some(with_status(
            trip.clone(),
            TripStatus::Completed,
        )))])
        .with_delay(Duration::from_secs(30));

        let hub = Arc::new(LocalHub::new());
        let handle = reconciler(store.clone(), trips, hub, session())
            .start(trip.id)
            .await
            .unwrap();

        // Let the first tick fire and its fetch get in flight.
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.stop().await;

        assert_eq!(store.current().unwrap().status, TripStatus::Requested);
    }

    #[tokio::test(start_paused = true)]
    async fn offline_session_suspends_polling() {
        let store = Arc::new(TripStore::new());
        let trip = placeholder();
        store.replace(trip.clone());

        let session = session();
        session.set_online(false);

        let trips = ScriptedTrips::new(vec![Ok(Some(with_status(
            trip.clone(),
            TripStatus::Accepted,
        )))]);

        let hub = Arc::new(LocalHub::new());
        let handle = reconciler(store.clone(), trips, hub, session.clone())
            .start(trip.id)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(store.current().unwrap().status, TripStatus::Requested);

        session.set_online(true);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.current().unwrap().status, TripStatus::Accepted);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_store_writes_after_deactivation() {
        let store = Arc::new(TripStore::new());
        let trip = placeholder();
        store.replace(trip.clone());

        let hub = Arc::new(LocalHub::new());
        let handle = reconciler(store.clone(), ScriptedTrips::new(vec![]), hub.clone(), session())
            .start(trip.id)
            .await
            .unwrap();

        handle.stop().await;

        let payload = serde_json::to_string(&PushMessage::Trip(TripPatch::status(
            TripStatus::Accepted,
        )))
        .unwrap();
        hub.publish(&format!("trips/{}", trip.id), payload).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.current().unwrap().status, TripStatus::Requested);
    }
}
