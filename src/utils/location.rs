use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::AppError;
use crate::model::attendance::GeoPoint;

/// Best-effort reverse geocoding. Callers fall back to a coordinate label
/// when this fails.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<String, AppError>;
}

/// Used when no geocoder is configured.
pub struct CoordinateResolver;

#[async_trait]
impl LocationResolver for CoordinateResolver {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<String, AppError> {
        Ok(GeoPoint::coordinate_label(latitude, longitude))
    }
}

/// Nominatim-compatible `/reverse` endpoint.
pub struct NominatimResolver {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

impl NominatimResolver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("hrm-attendance/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LocationResolver for NominatimResolver {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<String, AppError> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::External(format!("Location lookup failed: {}", e)))?;

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| AppError::External(format!("Location lookup returned bad JSON: {}", e)))?;

        body.display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::External("Location lookup returned no address".into()))
    }
}

/// Resolves a place name, falling back to the coordinates on any failure.
pub async fn resolve_or_label(
    resolver: &dyn LocationResolver,
    latitude: f64,
    longitude: f64,
) -> GeoPoint {
    let place = match resolver.resolve(latitude, longitude).await {
        Ok(place) => place,
        Err(e) => {
            tracing::warn!(error = %e, latitude, longitude, "Falling back to coordinate label");
            GeoPoint::coordinate_label(latitude, longitude)
        }
    };

    GeoPoint {
        latitude,
        longitude,
        place,
    }
}
