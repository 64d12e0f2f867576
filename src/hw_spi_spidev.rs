// Kernel SPI driver (/dev/spidev0.0); chip select is handled by the kernel
use hass_panel_lib::epd4in2b_v2::{EpdError, SoftwareSpi};
use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions};
use std::io::Write;

const SPI_DEVICE: &str = "/dev/spidev0.0";

pub struct SpidevHwSpi {
    dev: Spidev,
}

impl SpidevHwSpi {
    pub fn new() -> Result<Self, EpdError> {
        let mut dev =
            Spidev::open(SPI_DEVICE).map_err(|e| EpdError(format!("{}: {}", SPI_DEVICE, e)))?;

        let opts = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(4_000_000)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&opts).map_err(|e| EpdError(e.to_string()))?;
        Ok(Self { dev })
    }
}

impl SoftwareSpi for SpidevHwSpi {
    fn write_byte(&mut self, data: u8) -> Result<(), EpdError> {
        self.dev
            .write_all(&[data])
            .map_err(|e| EpdError(e.to_string()))
    }
}
