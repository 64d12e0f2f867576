//! Custom EPD 4.2" B/W/Red V2 Driver
//!
//! Drives the Waveshare 4.2" tri-colour module (SSD1683 controller) over a
//! byte-oriented SPI link plus DC/RST/BUSY GPIOs, and adapts it to
//! [`PanelDisplay`] through [`EpdPanel`].
//!
//! The hardware traits are small so the Linux adapters in the
//! binary (spidev + gpio-cdev) and test doubles can both implement them.

use crate::colour::{Palette, PaletteIndex};
use crate::display::PanelDisplay;
use crate::panel::Panel;
use embedded_graphics::prelude::Size;
use embedded_hal::delay::DelayNs;
use log::{debug, warn};
use thiserror::Error;

/// Display dimensions
pub const EPD_WIDTH: u32 = 400;
pub const EPD_HEIGHT: u32 = 300;

/// Pixel colours of the black and red RAM planes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
    Red,
}

impl From<PaletteIndex> for Color {
    fn from(index: PaletteIndex) -> Self {
        match index {
            PaletteIndex::BLACK => Color::Black,
            PaletteIndex::RED => Color::Red,
            _ => Color::White,
        }
    }
}

impl Color {
    /// Border Waveform Control (0x3C) value: follow LUT0/1/2.
    fn border_waveform(self) -> u8 {
        match self {
            Color::Black => 0x04,
            Color::White => 0x05,
            Color::Red => 0x06,
        }
    }
}

#[derive(Error, Debug)]
#[error("EPD Error: {0}")]
pub struct EpdError(pub String);

/// Trait for SPI interface
pub trait SoftwareSpi {
    fn write_byte(&mut self, data: u8) -> Result<(), EpdError>;
}

/// Trait for GPIO pin interface
pub trait GpioPin {
    fn set_high(&mut self) -> Result<(), EpdError>;
    fn set_low(&mut self) -> Result<(), EpdError>;
}

/// Trait for input pin interface
pub trait InputPin {
    fn is_high(&self) -> Result<bool, EpdError>;
}

/// Black and red bit planes in controller layout.
///
/// Each row is `(width + 7) / 8` bytes, MSB first. Black plane: 1 = white,
/// 0 = black. Red plane: 1 = red.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayBuffer {
    width: u32,
    height: u32,
    black_buffer: Vec<u8>,
    red_buffer: Vec<u8>,
}

impl DisplayBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8);
        let buffer_size = (bytes_per_row * height) as usize;
        Self {
            width,
            height,
            black_buffer: vec![0xFF; buffer_size], // White by default
            red_buffer: vec![0x00; buffer_size],   // No red by default
        }
    }

    /// Pack a rendered panel into controller planes.
    pub fn from_panel(panel: &Panel) -> Self {
        let mut buffer = Self::new(panel.width(), panel.height());
        for (y, row) in panel.rows().enumerate() {
            for (x, &pixel) in row.iter().enumerate() {
                buffer.set_pixel(x as u32, y as u32, pixel.into());
            }
        }
        buffer
    }

    pub fn black_buffer(&self) -> &[u8] {
        &self.black_buffer
    }

    pub fn red_buffer(&self) -> &[u8] {
        &self.red_buffer
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        let bytes_per_row = self.width.div_ceil(8);
        let byte_index = (y * bytes_per_row + x / 8) as usize;
        let bit_mask = 0x80 >> (x % 8);

        match color {
            Color::White => {
                self.black_buffer[byte_index] |= bit_mask;
                self.red_buffer[byte_index] &= !bit_mask;
            }
            Color::Black => {
                self.black_buffer[byte_index] &= !bit_mask;
                self.red_buffer[byte_index] &= !bit_mask;
            }
            Color::Red => {
                self.black_buffer[byte_index] |= bit_mask;
                self.red_buffer[byte_index] |= bit_mask;
            }
        }
    }
}

/// EPD 4.2" B/W/Red V2 display driver
pub struct Epd4in2bV2<SPI, CS, DC, RST, BUSY, DELAY> {
    spi: SPI,
    /// `None` when the kernel SPI driver owns chip select
    cs_pin: Option<CS>,
    dc_pin: DC,
    rst_pin: RST,
    busy_pin: BUSY,
    delay: DELAY,
    width: u32,
    height: u32,
}

impl<SPI, CS, DC, RST, BUSY, DELAY> Epd4in2bV2<SPI, CS, DC, RST, BUSY, DELAY>
where
    SPI: SoftwareSpi,
    CS: GpioPin,
    DC: GpioPin,
    RST: GpioPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    /// Create a new EPD instance
    pub fn new(spi: SPI, cs_pin: Option<CS>, dc_pin: DC, rst_pin: RST, busy_pin: BUSY, delay: DELAY) -> Self {
        Self {
            spi,
            cs_pin,
            dc_pin,
            rst_pin,
            busy_pin,
            delay,
            width: EPD_WIDTH,
            height: EPD_HEIGHT,
        }
    }

    fn reset(&mut self) -> Result<(), EpdError> {
        self.rst_pin.set_high()?;
        self.delay.delay_ms(200);
        self.rst_pin.set_low()?;
        self.delay.delay_ms(5);
        self.rst_pin.set_high()?;
        self.delay.delay_ms(200);
        Ok(())
    }

    fn select(&mut self, selected: bool) -> Result<(), EpdError> {
        match self.cs_pin.as_mut() {
            Some(cs) if selected => cs.set_low(),
            Some(cs) => cs.set_high(),
            None => Ok(()),
        }
    }

    fn send_command(&mut self, command: u8) -> Result<(), EpdError> {
        self.dc_pin.set_low()?; // Command mode
        self.select(true)?;
        self.spi.write_byte(command)?;
        self.select(false)
    }

    fn send_data(&mut self, data: u8) -> Result<(), EpdError> {
        self.dc_pin.set_high()?; // Data mode
        self.select(true)?;
        self.spi.write_byte(data)?;
        self.select(false)
    }

    /// Wait while BUSY is high (rev2.2+ modules), up to 5 seconds.
    fn read_busy(&mut self) -> Result<(), EpdError> {
        let mut count = 0;
        while self.busy_pin.is_high()? {
            self.delay.delay_ms(10);
            count += 1;
            if count > 500 {
                warn!("BUSY pin timeout after 5 seconds - display may be stuck");
                break;
            }
        }
        Ok(())
    }

    fn turn_on_display(&mut self) -> Result<(), EpdError> {
        self.send_command(0x22)?;
        self.send_data(0xF7)?;
        self.send_command(0x20)?;
        self.read_busy()
    }

    /// Initialize the display
    pub fn init(&mut self) -> Result<(), EpdError> {
        debug!("Initializing EPD");
        self.reset()?;

        self.read_busy()?;
        self.send_command(0x12)?; // SWRESET
        self.read_busy()?;

        self.send_command(0x3C)?; // BorderWaveform
        self.send_data(Color::White.border_waveform())?;

        self.send_command(0x18)?; // Read built-in temperature sensor
        self.send_data(0x80)?;

        self.send_command(0x11)?; // Data entry mode setting
        self.send_data(0x03)?;

        // Set RAM X address start/end
        self.send_command(0x44)?;
        self.send_data(0x00)?;
        self.send_data((self.width / 8 - 1) as u8)?;

        // Set RAM Y address start/end
        self.send_command(0x45)?;
        self.send_data(0x00)?;
        self.send_data(0x00)?;
        self.send_data(((self.height - 1) % 256) as u8)?;
        self.send_data(((self.height - 1) / 256) as u8)?;

        // Set RAM X address counter
        self.send_command(0x4E)?;
        self.send_data(0x00)?;

        // Set RAM Y address counter
        self.send_command(0x4F)?;
        self.send_data(0x00)?;
        self.send_data(0x00)?;

        self.read_busy()
    }

    pub fn set_border(&mut self, color: Color) -> Result<(), EpdError> {
        self.send_command(0x3C)?;
        self.send_data(color.border_waveform())
    }

    /// Write both planes and refresh.
    pub fn display(&mut self, buffer: &DisplayBuffer) -> Result<(), EpdError> {
        let expected = (self.width.div_ceil(8) * self.height) as usize;
        if buffer.black_buffer.len() != expected {
            return Err(EpdError(format!(
                "buffer is {}x{}, display is {}x{}",
                buffer.width, buffer.height, self.width, self.height
            )));
        }

        self.send_command(0x24)?;
        for &byte in &buffer.black_buffer {
            self.send_data(byte)?;
        }

        self.send_command(0x26)?;
        for &byte in &buffer.red_buffer {
            self.send_data(!byte)?; // Red RAM is active low
        }

        self.turn_on_display()
    }

    /// Deep sleep. The image persists without power.
    pub fn sleep(&mut self) -> Result<(), EpdError> {
        self.send_command(0x10)?;
        self.send_data(0x01)?;
        self.delay.delay_ms(100);
        Ok(())
    }
}

/// [`PanelDisplay`] backed by the 4.2" driver.
///
/// `set_border` and `set_image` only buffer; `show` writes the border, both
/// planes, refreshes and parks the controller in deep sleep.
pub struct EpdPanel<SPI, CS, DC, RST, BUSY, DELAY> {
    epd: Epd4in2bV2<SPI, CS, DC, RST, BUSY, DELAY>,
    border: Color,
    buffer: Option<DisplayBuffer>,
}

impl<SPI, CS, DC, RST, BUSY, DELAY> EpdPanel<SPI, CS, DC, RST, BUSY, DELAY>
where
    SPI: SoftwareSpi,
    CS: GpioPin,
    DC: GpioPin,
    RST: GpioPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    /// Initialize the controller and wrap it.
    pub fn new(mut epd: Epd4in2bV2<SPI, CS, DC, RST, BUSY, DELAY>) -> Result<Self, EpdError> {
        epd.init()?;
        Ok(Self {
            epd,
            border: Color::White,
            buffer: None,
        })
    }
}

impl<SPI, CS, DC, RST, BUSY, DELAY> PanelDisplay for EpdPanel<SPI, CS, DC, RST, BUSY, DELAY>
where
    SPI: SoftwareSpi,
    CS: GpioPin,
    DC: GpioPin,
    RST: GpioPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    type Error = EpdError;

    fn resolution(&self) -> Size {
        Size::new(EPD_WIDTH, EPD_HEIGHT)
    }

    fn palette(&self) -> Palette {
        Palette::Red
    }

    fn set_border(&mut self, colour: PaletteIndex) -> Result<(), EpdError> {
        self.border = colour.into();
        Ok(())
    }

    fn set_image(&mut self, panel: &Panel) -> Result<(), EpdError> {
        self.buffer = Some(DisplayBuffer::from_panel(panel));
        Ok(())
    }

    fn show(&mut self) -> Result<(), EpdError> {
        let buffer = self
            .buffer
            .take()
            .ok_or_else(|| EpdError("no image set".to_string()))?;
        self.epd.set_border(self.border)?;
        self.epd.display(&buffer)?;
        self.epd.sleep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::present;
    use embedded_graphics::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Bus event seen by the fake hardware
    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Event {
        Command(u8),
        Data(u8),
    }

    #[derive(Clone, Default)]
    struct Bus {
        dc_high: Rc<RefCell<bool>>,
        events: Rc<RefCell<Vec<Event>>>,
    }

    struct FakeSpi(Bus);
    struct FakeDc(Bus);
    struct FakePin;
    struct IdleBusy;
    struct NoDelay;

    impl SoftwareSpi for FakeSpi {
        fn write_byte(&mut self, data: u8) -> Result<(), EpdError> {
            let event = if *self.0.dc_high.borrow() {
                Event::Data(data)
            } else {
                Event::Command(data)
            };
            self.0.events.borrow_mut().push(event);
            Ok(())
        }
    }

    impl GpioPin for FakeDc {
        fn set_high(&mut self) -> Result<(), EpdError> {
            *self.0.dc_high.borrow_mut() = true;
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), EpdError> {
            *self.0.dc_high.borrow_mut() = false;
            Ok(())
        }
    }

    impl GpioPin for FakePin {
        fn set_high(&mut self) -> Result<(), EpdError> {
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), EpdError> {
            Ok(())
        }
    }

    impl InputPin for IdleBusy {
        fn is_high(&self) -> Result<bool, EpdError> {
            Ok(false)
        }
    }

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn fake_epd(bus: &Bus) -> Epd4in2bV2<FakeSpi, FakePin, FakeDc, FakePin, IdleBusy, NoDelay> {
        Epd4in2bV2::new(
            FakeSpi(bus.clone()),
            None,
            FakeDc(bus.clone()),
            FakePin,
            IdleBusy,
            NoDelay,
        )
    }

    #[test]
    fn test_buffer_packs_pixels_msb_first() {
        let mut buffer = DisplayBuffer::new(10, 2);
        assert_eq!(buffer.black_buffer().len(), 4);

        buffer.set_pixel(0, 0, Color::Black);
        buffer.set_pixel(9, 0, Color::Red);
        buffer.set_pixel(1, 1, Color::Red);
        buffer.set_pixel(1, 1, Color::White);

        assert_eq!(buffer.black_buffer(), &[0x7F, 0xFF, 0xFF, 0xFF]);
        assert_eq!(buffer.red_buffer(), &[0x00, 0x40, 0x00, 0x00]);
    }

    #[test]
    fn test_buffer_from_panel() {
        let mut panel = Panel::new(Size::new(8, 1), PaletteIndex::WHITE);
        Pixel(Point::new(0, 0), PaletteIndex::BLACK)
            .draw(&mut panel)
            .unwrap();
        Pixel(Point::new(7, 0), PaletteIndex::RED)
            .draw(&mut panel)
            .unwrap();

        let buffer = DisplayBuffer::from_panel(&panel);
        assert_eq!(buffer.black_buffer(), &[0x7F]);
        assert_eq!(buffer.red_buffer(), &[0x01]);
    }

    #[test]
    fn test_set_border_writes_border_waveform() {
        let bus = Bus::default();
        let mut epd = fake_epd(&bus);
        epd.set_border(Color::Red).unwrap();

        assert_eq!(
            *bus.events.borrow(),
            vec![Event::Command(0x3C), Event::Data(0x06)]
        );
    }

    #[test]
    fn test_show_sends_border_then_planes_then_sleep() {
        let bus = Bus::default();
        let mut display = EpdPanel::new(fake_epd(&bus)).unwrap();
        bus.events.borrow_mut().clear();

        let mut panel = Panel::new(Size::new(EPD_WIDTH, EPD_HEIGHT), PaletteIndex::WHITE);
        panel.set_border(PaletteIndex::BLACK);
        present(&mut display, &panel).unwrap();

        let events = bus.events.borrow();
        let commands: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                Event::Command(c) => Some(*c),
                Event::Data(_) => None,
            })
            .collect();
        assert_eq!(commands, vec![0x3C, 0x24, 0x26, 0x22, 0x20, 0x10]);
        assert_eq!(events[1], Event::Data(0x04));

        let plane = (EPD_WIDTH / 8 * EPD_HEIGHT) as usize;
        let data_bytes = events.iter().filter(|e| matches!(e, Event::Data(_))).count();
        // border + two planes + update control + sleep
        assert_eq!(data_bytes, 1 + 2 * plane + 1 + 1);
    }

    #[test]
    fn test_wrong_size_panel_is_rejected() {
        let bus = Bus::default();
        let mut display = EpdPanel::new(fake_epd(&bus)).unwrap();
        let panel = Panel::new(Size::new(10, 10), PaletteIndex::WHITE);
        assert!(present(&mut display, &panel).is_err());
    }
}
