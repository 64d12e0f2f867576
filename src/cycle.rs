//! One update cycle: fetch, render, present.

use crate::colour::{Colour, Palette, PanelConfig};
use crate::config::EntityConfig;
use crate::display::{present, PanelDisplay};
use crate::hass::{GatewayError, HassGateway};
use crate::panel::Panel;
use crate::renderer::PanelRenderer;
use chrono::NaiveTime;
use log::info;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("{role} colour {colour} is not supported by a {palette} display")]
    UnsupportedColour {
        role: &'static str,
        colour: Colour,
        palette: Palette,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("display error: {0}")]
    Display(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Run one full cycle against `display` and return the panel that was shown.
///
/// Colours are checked against the display palette before anything is
/// fetched. A transport failure aborts the cycle without touching the display.
pub async fn run<D: PanelDisplay>(
    gateway: &HassGateway,
    entities: &EntityConfig,
    colours: &PanelConfig,
    now: NaiveTime,
    display: &mut D,
) -> Result<Panel, CycleError> {
    let palette = display.palette();
    if let Some((role, colour)) = colours.unsupported_by(palette) {
        return Err(CycleError::UnsupportedColour {
            role,
            colour,
            palette,
        });
    }

    let status = gateway.fetch_status(entities).await?;
    info!("Rendering {}", status.status_line());

    let panel = PanelRenderer::new(display.resolution()).render(now, &status, colours);
    present(display, &panel).map_err(|e| CycleError::Display(Box::new(e)))?;
    Ok(panel)
}
