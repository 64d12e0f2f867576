//! # Hass Panel Application Entry Point
//!
//! This binary crate wires configuration, the Home Assistant gateway, the
//! renderer and a display together. It supports production mode (e-ink display
//! behind the `hardware` feature) and development mode (ASCII output with
//! `update --stdout`).
//!
//! Run it from cron or a systemd timer; each invocation performs one cycle.


#[cfg(all(target_os = "linux", feature = "hardware"))]
mod gpio_sysfs;
#[cfg(all(target_os = "linux", feature = "hardware"))]
mod hw_spi_spidev;

use anyhow::Context;
use chrono::Local;
use embedded_graphics::prelude::Size;
use hass_panel_lib::{
    cli::{self, Command, USAGE},
    colour::PanelConfig,
    config::Config,
    cycle,
    display::{PanelDisplay, TerminalDisplay},
    hass::HassGateway,
};
use log::{info, LevelFilter};
use simplelog::WriteLogger;
use std::{env, io, process, str::FromStr};

/// Environment variable selecting the log level
const LOG_ENV: &str = "HASS_PANEL_LOG";

/// Log to stderr so command output on stdout stays clean.
fn init_logging() {
    let level = env::var(LOG_ENV)
        .ok()
        .and_then(|value| LevelFilter::from_str(&value).ok())
        .unwrap_or(LevelFilter::Info);
    // Only fails if a logger is already installed
    let _ = WriteLogger::init(level, simplelog::Config::default(), io::stderr());
}

/// Resolution of the display `update` would drive.
fn display_resolution(config: &Config) -> Size {
    #[cfg(all(target_os = "linux", feature = "hardware"))]
    {
        let _ = config;
        Size::new(
            hass_panel_lib::epd4in2b_v2::EPD_WIDTH,
            hass_panel_lib::epd4in2b_v2::EPD_HEIGHT,
        )
    }

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    {
        Size::new(config.display.width, config.display.height)
    }
}

fn print_info(config: &Config) {
    let resolution = display_resolution(config);
    println!("Colour: {}", config.display.palette);
    println!("Resolution: ({}, {})", resolution.width, resolution.height);
    println!("HA url: {}", config.base_url());
}

fn run_update<D: PanelDisplay>(
    rt: &tokio::runtime::Runtime,
    config: &Config,
    colours: &PanelConfig,
    display: &mut D,
) -> anyhow::Result<()> {
    let gateway = HassGateway::new(&config.hub).context("building HTTP client")?;
    info!("Updating panel from {}", gateway.base_url());

    // Transport failures end the process; the next scheduled run retries.
    let now = Local::now().time();
    rt.block_on(cycle::run(&gateway, &config.entities, colours, now, display))
        .context("update cycle failed")?;
    Ok(())
}

/// Open the Waveshare 4.2" B/W/Red panel on the configured GPIO pins.
#[cfg(all(target_os = "linux", feature = "hardware"))]
fn open_eink_display(
    config: &Config,
) -> anyhow::Result<
    hass_panel_lib::epd4in2b_v2::EpdPanel<
        hw_spi_spidev::SpidevHwSpi,
        gpio_sysfs::CdevOutputPin,
        gpio_sysfs::CdevOutputPin,
        gpio_sysfs::CdevOutputPin,
        gpio_sysfs::CdevInputPin,
        linux_embedded_hal::Delay,
    >,
> {
    use gpio_sysfs::{CdevInputPin, CdevOutputPin};
    use hass_panel_lib::epd4in2b_v2::{Epd4in2bV2, EpdPanel};
    use linux_embedded_hal::gpio_cdev::Chip;

    let hw = &config.display.hardware;
    info!(
        "E-ink GPIO pins: DC={} RST={} BUSY={} (CS {} owned by the kernel SPI driver)",
        hw.dc_pin, hw.rst_pin, hw.busy_pin, hw.cs_pin
    );

    let mut chip = Chip::new("/dev/gpiochip0").context("open gpiochip0")?;
    let dc = CdevOutputPin::new(&mut chip, hw.dc_pin)?;
    let rst = CdevOutputPin::new(&mut chip, hw.rst_pin)?;
    let busy = CdevInputPin::new(&mut chip, hw.busy_pin)?;
    let spi = hw_spi_spidev::SpidevHwSpi::new()?;

    let epd = Epd4in2bV2::new(spi, None::<CdevOutputPin>, dc, rst, busy, linux_embedded_hal::Delay);
    Ok(EpdPanel::new(epd).context("display initialization failed")?)
}

fn update(
    rt: &tokio::runtime::Runtime,
    config: &Config,
    colours: &PanelConfig,
    stdout: bool,
) -> anyhow::Result<()> {
    let resolution = display_resolution(config);

    if stdout {
        let mut display = TerminalDisplay::stdout(resolution, config.display.palette);
        return run_update(rt, config, colours, &mut display);
    }

    #[cfg(all(target_os = "linux", feature = "hardware"))]
    {
        let mut display = open_eink_display(config)?;
        run_update(rt, config, colours, &mut display)
    }

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    {
        log::warn!("E-ink display support not enabled. Rebuild with --features hardware for display functionality.");
        log::warn!("Showing ASCII output instead");
        let mut display = TerminalDisplay::stdout(resolution, config.display.palette);
        run_update(rt, config, colours, &mut display)
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    init_logging();

    let command = match cli::parse(env::args().skip(1)) {
        Ok(command) => command,
        Err(error) => {
            eprintln!("error: {}\n\n{}", error, USAGE);
            process::exit(2);
        }
    };

    let config = Config::load();

    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;

    match command {
        Command::Help => println!("{}", USAGE),
        Command::Info => print_info(&config),
        Command::TestHa { entity_id } => {
            let gateway = HassGateway::new(&config.hub)?;
            let state = rt.block_on(gateway.fetch_raw(&entity_id))?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Update { colours, stdout } => update(&rt, &config, &colours, stdout)?,
    }

    Ok(())
}
