mod interface;

pub use interface::{
    DynGeocodingAPI, DynPlaceSearchAPI, DynPushTransport, DynRoutingAPI, DynTripAPI, GeocodingAPI,
    PlaceSearchAPI, PushTransport, RoutingAPI, TripAPI,
};
