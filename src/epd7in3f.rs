//! Custom EPD 7.3" F (7-color) driver
//!
//! Driver for the Waveshare 7.3" ACeP panel (GDEY073D46, 800x480) following
//! the Waveshare C reference sequences. SPI and GPIO access go through small
//! traits so the driver is testable on the host and portable across boards.

use std::convert::Infallible;
use std::thread;
use std::time::Duration;

use embedded_graphics::pixelcolor::PixelColor;
use embedded_graphics::prelude::{OriginDimensions, Size};
use embedded_graphics::{draw_target::DrawTarget, Pixel};

/// Display dimensions
pub const EPD_WIDTH: u32 = 800;
pub const EPD_HEIGHT: u32 = 480;

/// The panel's seven ink colors, with the controller's 4-bit codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paint {
    Black = 0x0,
    White = 0x1,
    Green = 0x2,
    Blue = 0x3,
    Red = 0x4,
    Yellow = 0x5,
    Orange = 0x6,
}

impl PixelColor for Paint {
    type Raw = ();
}

/// Simple error type for EPD operations
#[derive(Debug)]
pub struct EpdError(pub String);

impl std::fmt::Display for EpdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPD Error: {}", self.0)
    }
}

impl std::error::Error for EpdError {}

/// Trait for the SPI interface
pub trait SoftwareSpi {
    fn write_byte(&mut self, data: u8) -> Result<(), EpdError>;
}

/// Trait for GPIO output pin interface
pub trait GpioPin {
    fn set_high(&mut self) -> Result<(), EpdError>;
    fn set_low(&mut self) -> Result<(), EpdError>;
}

/// Trait for input pin interface
pub trait InputPin {
    fn is_high(&self) -> Result<bool, EpdError>;
}

/// Packed 4-bit-per-pixel frame for the 7.3" panel.
///
/// Two pixels per byte, high nibble first, rows packed left to right. This
/// is both the renderer's [`DrawTarget`] and the exact byte layout the
/// controller's 0x10 data command expects, so a completed frame is sent
/// verbatim.
#[derive(Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width * height / 2) as usize;
        Self {
            width,
            height,
            // 0x11 = two white pixels
            data: vec![0x11; size],
        }
    }

    pub fn clear(&mut self, paint: Paint) {
        let code = paint as u8;
        self.data.fill(code << 4 | code);
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, paint: Paint) {
        if x >= self.width || y >= self.height {
            return;
        }

        let index = ((y * self.width + x) / 2) as usize;
        let code = paint as u8;
        if x % 2 == 0 {
            self.data[index] = (self.data[index] & 0x0F) | (code << 4);
        } else {
            self.data[index] = (self.data[index] & 0xF0) | code;
        }
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Paint;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

/// EPD 7.3" F display driver
pub struct Epd7in3f<SPI, CS, DC, RST, BUSY> {
    spi: SPI,
    cs_pin: CS,
    dc_pin: DC,
    rst_pin: RST,
    busy_pin: BUSY,
}

impl<SPI, CS, DC, RST, BUSY> Epd7in3f<SPI, CS, DC, RST, BUSY>
where
    SPI: SoftwareSpi,
    CS: GpioPin,
    DC: GpioPin,
    RST: GpioPin,
    BUSY: InputPin,
{
    pub fn new(spi: SPI, cs_pin: CS, dc_pin: DC, rst_pin: RST, busy_pin: BUSY) -> Self {
        Self {
            spi,
            cs_pin,
            dc_pin,
            rst_pin,
            busy_pin,
        }
    }

    /// Hardware reset - follows the Waveshare reset timing
    fn reset(&mut self) -> Result<(), EpdError> {
        self.rst_pin.set_high()?;
        thread::sleep(Duration::from_millis(20));

        self.rst_pin.set_low()?;
        thread::sleep(Duration::from_millis(2));

        self.rst_pin.set_high()?;
        thread::sleep(Duration::from_millis(20));

        Ok(())
    }

    fn send_command(&mut self, command: u8) -> Result<(), EpdError> {
        self.dc_pin.set_low()?; // Command mode
        self.cs_pin.set_low()?; // Select device
        self.spi.write_byte(command)?;
        self.cs_pin.set_high()?; // Deselect device
        Ok(())
    }

    fn send_data(&mut self, data: u8) -> Result<(), EpdError> {
        self.dc_pin.set_high()?; // Data mode
        self.cs_pin.set_low()?; // Select device
        self.spi.write_byte(data)?;
        self.cs_pin.set_high()?; // Deselect device
        Ok(())
    }

    /// Wait for the controller. BUSY is active LOW on this panel; a full
    /// 7-color refresh takes tens of seconds, so the timeout is generous.
    fn read_busy(&mut self) -> Result<(), EpdError> {
        log::debug!("waiting for display (BUSY pin check)");

        let mut count: u32 = 0;
        while !self.busy_pin.is_high()? {
            thread::sleep(Duration::from_millis(10));
            count += 1;
            if count > 4500 {
                log::warn!("BUSY pin timeout after 45 seconds, display may be stuck");
                break;
            }
        }

        log::debug!("display ready after {count} checks");
        Ok(())
    }

    /// Initialize the display, following the Waveshare 7in3f C init sequence.
    pub fn init(&mut self) -> Result<(), EpdError> {
        self.reset()?;
        self.read_busy()?;

        self.send_command(0xAA)?; // CMDH
        for b in [0x49, 0x55, 0x20, 0x08, 0x09, 0x18] {
            self.send_data(b)?;
        }

        self.send_command(0x01)?; // Power setting
        for b in [0x3F, 0x00, 0x32, 0x2A, 0x0E, 0x2A] {
            self.send_data(b)?;
        }

        self.send_command(0x00)?; // Panel setting
        self.send_data(0x5F)?;
        self.send_data(0x69)?;

        self.send_command(0x03)?; // PoFS
        for b in [0x00, 0x54, 0x00, 0x44] {
            self.send_data(b)?;
        }

        self.send_command(0x05)?; // Booster soft start 1
        for b in [0x40, 0x1F, 0x1F, 0x2C] {
            self.send_data(b)?;
        }

        self.send_command(0x06)?; // Booster soft start 2
        for b in [0x6F, 0x1F, 0x16, 0x25] {
            self.send_data(b)?;
        }

        self.send_command(0x08)?; // Booster soft start 3
        for b in [0x6F, 0x1F, 0x1F, 0x22] {
            self.send_data(b)?;
        }

        self.send_command(0x13)?; // IPC
        self.send_data(0x00)?;
        self.send_data(0x04)?;

        self.send_command(0x30)?; // PLL
        self.send_data(0x02)?;

        self.send_command(0x41)?; // TSE
        self.send_data(0x00)?;

        self.send_command(0x50)?; // VCOM and data interval
        self.send_data(0x3F)?;

        self.send_command(0x60)?; // TCON
        self.send_data(0x02)?;
        self.send_data(0x00)?;

        self.send_command(0x61)?; // Resolution: 800x480
        for b in [0x03, 0x20, 0x01, 0xE0] {
            self.send_data(b)?;
        }

        self.send_command(0x82)?; // VDCS
        self.send_data(0x1E)?;

        self.send_command(0x84)?; // T_VDCS
        self.send_data(0x00)?;

        self.send_command(0x86)?; // AGID
        self.send_data(0x00)?;

        self.send_command(0xE3)?; // PWS
        self.send_data(0x2F)?;

        self.send_command(0xE0)?; // CCSET
        self.send_data(0x00)?;

        self.send_command(0xE6)?; // TSSET
        self.send_data(0x00)?;

        Ok(())
    }

    /// Power on, push a packed frame, refresh, power off.
    pub fn display(&mut self, frame: &[u8]) -> Result<(), EpdError> {
        self.send_command(0x10)?;
        for &byte in frame {
            self.send_data(byte)?;
        }

        self.send_command(0x04)?; // Power on
        self.read_busy()?;

        self.send_command(0x12)?; // Display refresh
        self.send_data(0x00)?;
        self.read_busy()?;

        self.send_command(0x02)?; // Power off
        self.send_data(0x00)?;
        self.read_busy()?;

        Ok(())
    }

    /// Flood the panel with a single color.
    pub fn clear(&mut self, paint: Paint) -> Result<(), EpdError> {
        let code = paint as u8;
        let byte = code << 4 | code;
        let frame = vec![byte; (EPD_WIDTH * EPD_HEIGHT / 2) as usize];
        self.display(&frame)
    }

    /// Enter deep sleep. Only a hardware reset wakes the controller again,
    /// which is exactly what the next cycle's `init` performs.
    pub fn sleep(&mut self) -> Result<(), EpdError> {
        self.send_command(0x07)?;
        self.send_data(0xA5)?;
        thread::sleep(Duration::from_millis(10));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every byte pushed over the mock bus, tagged as command or data.
    #[derive(Default)]
    struct BusLog {
        writes: Vec<(bool, u8)>, // (is_data, byte)
        dc_high: bool,
    }

    struct LogSpi<'a>(&'a std::cell::RefCell<BusLog>);
    struct LogDc<'a>(&'a std::cell::RefCell<BusLog>);
    struct NoopPin;
    struct ReadyPin;

    impl SoftwareSpi for LogSpi<'_> {
        fn write_byte(&mut self, data: u8) -> Result<(), EpdError> {
            let mut log = self.0.borrow_mut();
            let is_data = log.dc_high;
            log.writes.push((is_data, data));
            Ok(())
        }
    }

    impl GpioPin for LogDc<'_> {
        fn set_high(&mut self) -> Result<(), EpdError> {
            self.0.borrow_mut().dc_high = true;
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), EpdError> {
            self.0.borrow_mut().dc_high = false;
            Ok(())
        }
    }

    impl GpioPin for NoopPin {
        fn set_high(&mut self) -> Result<(), EpdError> {
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), EpdError> {
            Ok(())
        }
    }

    impl InputPin for ReadyPin {
        fn is_high(&self) -> Result<bool, EpdError> {
            Ok(true) // Never busy
        }
    }

    #[test]
    fn frame_buffer_starts_white() {
        let buffer = FrameBuffer::new(EPD_WIDTH, EPD_HEIGHT);
        assert_eq!(buffer.bytes().len(), (EPD_WIDTH * EPD_HEIGHT / 2) as usize);
        assert!(buffer.bytes().iter().all(|&b| b == 0x11));
    }

    #[test]
    fn set_pixel_packs_nibbles() {
        let mut buffer = FrameBuffer::new(8, 2);
        buffer.set_pixel(0, 0, Paint::Red);
        buffer.set_pixel(1, 0, Paint::Black);
        assert_eq!(buffer.bytes()[0], 0x40);

        // Out-of-bounds writes are ignored
        buffer.set_pixel(8, 0, Paint::Blue);
        buffer.set_pixel(0, 2, Paint::Blue);
        assert_eq!(buffer.bytes()[0], 0x40);
    }

    #[test]
    fn clear_floods_one_color() {
        let mut buffer = FrameBuffer::new(8, 2);
        buffer.clear(Paint::Yellow);
        assert!(buffer.bytes().iter().all(|&b| b == 0x55));
    }

    #[test]
    fn display_sends_frame_then_refresh_sequence() {
        let log = std::cell::RefCell::new(BusLog::default());
        let mut epd = Epd7in3f::new(LogSpi(&log), NoopPin, LogDc(&log), NoopPin, ReadyPin);

        let frame = [0x11u8, 0x44];
        epd.display(&frame).unwrap();

        let writes = log.into_inner().writes;
        // Frame data command, two data bytes, then power on / refresh / off
        assert_eq!(writes[0], (false, 0x10));
        assert_eq!(writes[1], (true, 0x11));
        assert_eq!(writes[2], (true, 0x44));
        let commands: Vec<u8> = writes
            .iter()
            .filter(|(is_data, _)| !is_data)
            .map(|&(_, b)| b)
            .collect();
        assert_eq!(commands, [0x10, 0x04, 0x12, 0x02]);
    }

    #[test]
    fn sleep_sends_deep_sleep_check_code() {
        let log = std::cell::RefCell::new(BusLog::default());
        let mut epd = Epd7in3f::new(LogSpi(&log), NoopPin, LogDc(&log), NoopPin, ReadyPin);

        epd.sleep().unwrap();

        let writes = log.into_inner().writes;
        assert_eq!(writes, [(false, 0x07), (true, 0xA5)]);
    }
}
