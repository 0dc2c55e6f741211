//! Typed API clients for the flight booking platform
//!
//! One small client per resource, all issued through the gateway so every
//! call inherits bearer attachment and the 401 refresh-and-retry cycle.

pub mod auth;
pub mod bookings;
pub mod flights;
pub mod locations;
pub mod notifications;

#[cfg(test)]
mod tests;

pub use auth::{AuthApi, LoginResponse, ProfileUpdate, RegisterRequest};
pub use bookings::{BookingCreate, BookingsApi};
pub use flights::{FlightCreate, FlightUpdate, FlightsApi};
pub use locations::{LocationCreate, LocationUpdate, LocationsApi};
pub use notifications::NotificationsApi;
