//! # Home Assistant State Gateway
//!
//! This module reads entity state from the Home Assistant REST API and turns it
//! into the short strings the panel displays.
//!
//! ## Data Source
//!
//! - **URL**: `{base_url}/states/{entity_id}` where `base_url` is
//!   `{scheme}://{host}:{port}/api`
//! - **Auth**: long-lived access token sent as `Authorization: Bearer {token}`
//! - **Format**: JSON object; only `state` and `attributes.unit_of_measurement`
//!   are read
//!
//! ## Error Handling
//!
//! The gateway separates two very different failures:
//! - **Hub answered with anything but 200** (204, 401, 404, 500...): logged with the
//!   status code and body, then treated as "no data". The panel still renders,
//!   with `-` for sensors and `∅` for the weather.
//! - **Hub could not be reached** (connection refused, DNS, timeout): returned as
//!   [`GatewayError::Transport`]. The update cycle fails and the previous image
//!   stays on the e-paper until the next scheduled run.
//!
//! Missing JSON fields never fail; every field has a default.

use crate::config::{EntityConfig, HubConfig};
use crate::{SensorReading, StatusData};
use log::{debug, warn};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that abort an update cycle.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// HTTP request could not be completed (network, DNS, timeout)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Hub answered 2xx but the body is not an entity state object
    #[error("invalid state for {entity_id}: {source}")]
    Decode {
        entity_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Value shown when an entity has no `state`.
pub const MISSING_STATE: &str = "-";

/// Glyph shown for weather conditions missing from [`WEATHER_GLYPHS`].
pub const FALLBACK_GLYPH: &str = "∅";

/// Home Assistant weather condition codes and their display glyphs.
pub const WEATHER_GLYPHS: [(&str, &str); 15] = [
    ("clear-night", "☾"),
    ("cloudy", "☁"),
    ("fog", "≡"),
    ("hail", "⁘"),
    ("lightning", "☇"),
    ("lightning-rainy", "☇"),
    ("partlycloudy", "☁"),
    ("pouring", "☵"),
    ("rainy", "☵"),
    ("snowy", "❆"),
    ("snowy-rainy", "❆"),
    ("sunny", "☀"),
    ("windy", "✵"),
    ("windy-variant", "✵"),
    ("exceptional", "⚠"),
];

/// Glyph for a weather condition code; total over all inputs.
pub fn glyph_for_condition(condition: Option<&str>) -> &'static str {
    condition
        .and_then(|code| WEATHER_GLYPHS.iter().find(|(known, _)| *known == code))
        .map(|(_, glyph)| *glyph)
        .unwrap_or(FALLBACK_GLYPH)
}

/// Entity state as returned by `GET /api/states/{entity_id}`.
///
/// The default value is the empty state `{}` used when the hub reports an error.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct EntityState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Remaining fields (`context`, `last_reported`, ...) kept as returned
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EntityState {
    /// `attributes.unit_of_measurement`, when it is a string.
    pub fn unit_of_measurement(&self) -> Option<&str> {
        self.attributes
            .get("unit_of_measurement")
            .and_then(serde_json::Value::as_str)
    }

    /// Sensor reading with `-` standing in for a missing state.
    pub fn reading(&self) -> SensorReading {
        SensorReading {
            value: self
                .state
                .clone()
                .unwrap_or_else(|| MISSING_STATE.to_string()),
            unit: self.unit_of_measurement().map(str::to_string),
        }
    }

    /// Glyph for the state read as a weather condition code.
    pub fn weather_glyph(&self) -> &'static str {
        glyph_for_condition(self.state.as_deref())
    }
}

/// Two-line diagnostic for a hub error response.
pub fn describe_failure(status: StatusCode, body: &str) -> String {
    format!(
        "Connection error: Status code: {}\n\tContent: {}",
        status.as_u16(),
        body
    )
}

/// Client for the hub's state API.
pub struct HassGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HassGateway {
    /// Build a gateway from hub settings.
    pub fn new(hub: &HubConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(hub.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, hub.base_url(), hub.token.clone()))
    }

    pub fn with_client(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the state object for one entity exactly as the hub returned it.
    ///
    /// Any status other than 200 is logged and yields an empty object; only
    /// transport failures and unparseable 200 bodies are returned as errors.
    pub async fn fetch_raw(&self, entity_id: &str) -> Result<serde_json::Value, GatewayError> {
        let url = format!("{}/states/{}", self.base_url, entity_id);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            warn!("{}", describe_failure(status, &body));
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&body).map_err(|source| GatewayError::Decode {
            entity_id: entity_id.to_string(),
            source,
        })
    }

    /// Fetch and decode the state of one entity.
    ///
    /// Error statuses yield [`EntityState::default`].
    pub async fn fetch_state(&self, entity_id: &str) -> Result<EntityState, GatewayError> {
        let raw = self.fetch_raw(entity_id).await?;
        serde_json::from_value(raw).map_err(|source| GatewayError::Decode {
            entity_id: entity_id.to_string(),
            source,
        })
    }

    /// `"{state}{unit}"` reading for a sensor entity.
    pub async fn sensor_reading(&self, entity_id: &str) -> Result<SensorReading, GatewayError> {
        Ok(self.fetch_state(entity_id).await?.reading())
    }

    /// Display glyph for a weather entity's current condition.
    pub async fn weather_glyph(&self, entity_id: &str) -> Result<&'static str, GatewayError> {
        Ok(self.fetch_state(entity_id).await?.weather_glyph())
    }

    /// Read all three panel values concurrently.
    pub async fn fetch_status(&self, entities: &EntityConfig) -> Result<StatusData, GatewayError> {
        let (temperature, humidity, weather) = tokio::try_join!(
            self.sensor_reading(&entities.temperature),
            self.sensor_reading(&entities.humidity),
            self.weather_glyph(&entities.weather),
        )?;

        debug!(
            "Status: temperature={} humidity={} weather={}",
            temperature, humidity, weather
        );

        Ok(StatusData {
            temperature,
            humidity,
            weather,
        })
    }
}
