mod patch;
mod place;
mod position;
mod ticket;
mod trip;

pub use patch::{PushMessage, TripPatch};
pub use place::{Coordinates, Fare, Place};
pub use position::DriverPosition;
pub use ticket::IssueTicket;
pub use trip::{Trip, TripStatus};
