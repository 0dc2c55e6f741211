//! Flight endpoints

use crate::gateway::ApiGateway;
use serde::Serialize;
use skybook_core::{Flight, SkybookResult};
use std::sync::Arc;
use uuid::Uuid;

/// Flight creation payload; locations are referenced by airport code
#[derive(Debug, Clone, Serialize)]
pub struct FlightCreate {
    pub flight_number: String,
    pub departure_location: String,
    pub arrival_location: String,
    pub departure_time: chrono::DateTime<chrono::Utc>,
    pub arrival_time: chrono::DateTime<chrono::Utc>,
    pub total_seats: i64,
    pub available_seats: i64,
    pub price: String,
}

/// Partial flight update; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlightUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seats: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<skybook_core::FlightStatus>,
}

/// Client for the flight endpoints
pub struct FlightsApi {
    gateway: Arc<ApiGateway>,
}

impl FlightsApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// List all flights
    pub async fn list(&self) -> SkybookResult<Vec<Flight>> {
        self.gateway.get_json("flights/").await
    }

    /// List flights matching the given query parameters (e.g. departure,
    /// arrival). Unknown parameters are ignored server-side.
    pub async fn search(&self, params: Vec<(String, String)>) -> SkybookResult<Vec<Flight>> {
        self.gateway.get_json_with_query("flights/", params).await
    }

    /// Fetch a single flight
    pub async fn get(&self, flight_id: Uuid) -> SkybookResult<Flight> {
        self.gateway
            .get_json(&format!("flights/{}/", flight_id))
            .await
    }

    /// Create a flight (admin only, enforced server-side)
    pub async fn create(&self, flight: &FlightCreate) -> SkybookResult<Flight> {
        self.gateway.post_json("flights/", flight).await
    }

    /// Partially update a flight (admin only, enforced server-side)
    pub async fn update(&self, flight_id: Uuid, update: &FlightUpdate) -> SkybookResult<Flight> {
        self.gateway
            .patch_json(&format!("flights/{}/", flight_id), update)
            .await
    }

    /// Delete a flight (admin only, enforced server-side)
    pub async fn delete(&self, flight_id: Uuid) -> SkybookResult<()> {
        self.gateway.delete(&format!("flights/{}/", flight_id)).await
    }
}
