mod dispatch;
mod overlay;
mod reconciler;
mod search;
mod store;

pub use dispatch::ActionDispatcher;
pub use overlay::{GeoOverlay, MapSink, MarkerRole};
pub use reconciler::{Reconciler, ReconcilerHandle};
pub use search::{resolve_place, DebouncedSearch};
pub use store::{TripStore, TripView};
