//! Location endpoints

use crate::gateway::ApiGateway;
use serde::Serialize;
use skybook_core::{Location, SkybookResult};
use std::sync::Arc;
use uuid::Uuid;

/// Location creation payload
#[derive(Debug, Clone, Serialize)]
pub struct LocationCreate {
    pub name: String,
    pub airport_code: String,
    pub city: String,
    pub country: String,
}

/// Partial location update; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airport_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Client for the location endpoints
pub struct LocationsApi {
    gateway: Arc<ApiGateway>,
}

impl LocationsApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// List all locations
    pub async fn list(&self) -> SkybookResult<Vec<Location>> {
        self.gateway.get_json("locations/").await
    }

    /// Create a location (admin only, enforced server-side)
    pub async fn create(&self, location: &LocationCreate) -> SkybookResult<Location> {
        self.gateway.post_json("locations/", location).await
    }

    /// Partially update a location (admin only, enforced server-side)
    pub async fn update(
        &self,
        location_id: Uuid,
        update: &LocationUpdate,
    ) -> SkybookResult<Location> {
        self.gateway
            .patch_json(&format!("locations/{}/", location_id), update)
            .await
    }

    /// Delete a location (admin only, enforced server-side)
    pub async fn delete(&self, location_id: Uuid) -> SkybookResult<()> {
        self.gateway
            .delete(&format!("locations/{}/", location_id))
            .await
    }
}
