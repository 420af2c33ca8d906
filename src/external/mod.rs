mod backend;
mod maps;

pub use backend::RideBackend;
pub use maps::MapsClient;
