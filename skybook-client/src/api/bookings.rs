//! Booking endpoints
//!
//! The listing is role-scoped server-side: a client sees their own bookings,
//! an administrator sees all of them.

use crate::gateway::ApiGateway;
use serde::Serialize;
use skybook_core::{Booking, Passenger, SkybookResult};
use std::sync::Arc;
use uuid::Uuid;

/// Booking creation payload
#[derive(Debug, Clone, Serialize)]
pub struct BookingCreate {
    pub flight_id: Uuid,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub passengers_list: Vec<Passenger>,
}

/// Client for the booking endpoints
pub struct BookingsApi {
    gateway: Arc<ApiGateway>,
}

impl BookingsApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// List bookings visible to the authenticated user
    pub async fn list(&self) -> SkybookResult<Vec<Booking>> {
        self.gateway.get_json("bookings/").await
    }

    /// Book a flight for the given passengers
    pub async fn create(&self, booking: &BookingCreate) -> SkybookResult<Booking> {
        self.gateway.post_json("bookings/", booking).await
    }

    /// Cancel a booking
    pub async fn cancel(&self, booking_id: Uuid) -> SkybookResult<()> {
        self.gateway
            .delete(&format!("bookings/{}/", booking_id))
            .await
    }
}
