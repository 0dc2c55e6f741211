//! Skybook Client - HTTP transport for the flight booking platform
//!
//! Provides the API gateway (bearer attachment and 401 refresh-and-retry
//! interception) and one typed client per REST resource.

pub mod api;
pub mod gateway;

pub use api::{
    AuthApi, BookingCreate, BookingsApi, FlightCreate, FlightUpdate, FlightsApi, LocationCreate,
    LocationUpdate, LocationsApi, LoginResponse, NotificationsApi, ProfileUpdate, RegisterRequest,
};
pub use gateway::{ApiGateway, GatewayConfig, PendingRequest};
