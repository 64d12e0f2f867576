//! # Hass Panel Core Library
//!
//! This library turns Home Assistant sensor state into a finished image for a
//! small black/white/red e-paper display. It's designed for a Raspberry Pi Zero
//! class device that wakes up, draws one panel and goes back to sleep.
//!
//! ## Design Philosophy
//!
//! ### Stateless Cycles
//! - **Nothing persists**: every update fetches fresh state, renders a new
//!   panel and hands it to the display. There is no cache and no renderer state.
//! - **Full refresh only**: e-paper keeps its image without power, so a failed
//!   cycle simply leaves the last good panel on the glass.
//!
//! ### Data Flow
//! 1. **Fetch**: [`hass::HassGateway`] reads temperature, humidity and weather
//!    entities concurrently
//! 2. **Normalize**: states become [`SensorReading`]s and a weather glyph,
//!    with `-` and `∅` for anything missing
//! 3. **Render**: [`renderer::PanelRenderer`] draws the clock and status line
//!    into a [`panel::Panel`] of native palette indices, then rotates it 180°
//! 4. **Present**: [`display::present`] sets the border, image, then refreshes
//!
//! [`cycle::run`] strings the four steps together for one update.
//!
//! ## Core Types
//!
//! - [`SensorReading`]: a sensor value with its optional unit
//! - [`StatusData`]: the three values shown on one panel

use std::fmt;

// Module declarations
pub mod cli;
pub mod colour;
pub mod config;
pub mod cycle;
pub mod display;
pub mod epd4in2b_v2;
pub mod hass;
pub mod icons;
pub mod panel;
pub mod renderer;

/// A normalized sensor value.
///
/// Displays as `"{value}{unit}"` with no separator, so `21.5` + `°C` becomes
/// `21.5°C` and `60` + `%` becomes `60%`. A missing unit adds nothing.
///
/// # Example
/// ```
/// use hass_panel_lib::SensorReading;
///
/// let reading = SensorReading { value: "21.5".to_string(), unit: Some("°C".to_string()) };
/// assert_eq!(reading.to_string(), "21.5°C");
///
/// let missing = SensorReading::missing();
/// assert_eq!(missing.to_string(), "-");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorReading {
    /// Entity state, or `-` when the hub returned none
    pub value: String,
    /// `unit_of_measurement` attribute, if present
    pub unit: Option<String>,
}

impl SensorReading {
    /// Reading used when the hub has no state for an entity.
    pub fn missing() -> Self {
        SensorReading {
            value: hass::MISSING_STATE.to_string(),
            unit: None,
        }
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_deref().unwrap_or(""))
    }
}

/// Everything the status line needs for one update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusData {
    pub temperature: SensorReading,
    pub humidity: SensorReading,
    /// Single-character weather glyph
    pub weather: &'static str,
}

impl StatusData {
    /// Status with every value missing.
    pub fn missing() -> Self {
        StatusData {
            temperature: SensorReading::missing(),
            humidity: SensorReading::missing(),
            weather: hass::FALLBACK_GLYPH,
        }
    }

    /// `"{temperature} {weather} {humidity}"`
    pub fn status_line(&self) -> String {
        format!("{} {} {}", self.temperature, self.weather, self.humidity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_is_single_space_separated() {
        let status = StatusData {
            temperature: SensorReading {
                value: "21.5".to_string(),
                unit: Some("°C".to_string()),
            },
            humidity: SensorReading {
                value: "60".to_string(),
                unit: Some("%".to_string()),
            },
            weather: "☀",
        };
        assert_eq!(status.status_line(), "21.5°C ☀ 60%");
    }

    #[test]
    fn test_missing_status_line() {
        assert_eq!(StatusData::missing().status_line(), "- ∅ -");
    }
}
