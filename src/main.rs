use std::env;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use palfrey::api::{DynPushTransport, DynTripAPI};
use palfrey::engine::{Reconciler, TripStore};
use palfrey::external::RideBackend;
use palfrey::session::Session;
use palfrey::transport::LocalHub;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let token = env::var("RIDE_SESSION_TOKEN").unwrap_or_default();
    let session = Session::new(Uuid::new_v4(), token);

    let store = Arc::new(TripStore::new());
    let trips: DynTripAPI = Arc::new(RideBackend::new());
    let transport: DynPushTransport = Arc::new(LocalHub::new());

    let reconciler = Reconciler::new(
        store.clone(),
        trips,
        transport,
        session,
        Duration::from_secs(5),
    );

    match reconciler.resync().await {
        Ok(Some(trip)) if trip.is_active() => {
            tracing::info!(
                trip_id = %trip.id,
                status = %trip.status.name(),
                pickup = %trip.pickup.label(),
                dropoff = %trip.dropoff.label(),
                "following active trip"
            );

            let mut updates = store.subscribe();
            let handle = reconciler.start(trip.id).await.unwrap();

            while updates.changed().await.is_ok() {
                let view = updates.borrow_and_update().clone();

                if let Some(trip) = &view.trip {
                    tracing::info!(status = %trip.status.name(), "trip updated");

                    if trip.is_terminal() {
                        break;
                    }
                }
            }

            handle.stop().await;
        }
        Ok(_) => tracing::info!("no active trip for this session"),
        Err(err) => tracing::error!(%err, "failed to fetch current trip"),
    }
}
