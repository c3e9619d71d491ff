// Character-device GPIO lines for the panel control signals.
//
// Each pin remembers which panel signal it carries so a wiring or
// permission problem names the signal and BCM offset, not just an errno.

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use prayer_display_lib::epd7in3f::{EpdError, GpioPin, InputPin};

const CONSUMER: &str = "prayer-display";

fn request_line(
    chip: &mut Chip,
    offset: u32,
    flags: LineRequestFlags,
    signal: &'static str,
) -> Result<LineHandle, EpdError> {
    chip.get_line(offset)
        .and_then(|line| line.request(flags, 0, CONSUMER))
        .map_err(|e| EpdError(format!("{signal} signal (GPIO {offset}): {e}")))
}

/// Output line driving one of the panel's CS/DC/RST signals.
pub struct CdevOutputPin {
    line: LineHandle,
    signal: &'static str,
}

impl CdevOutputPin {
    pub fn new(chip: &mut Chip, offset: u32, signal: &'static str) -> Result<Self, EpdError> {
        let line = request_line(chip, offset, LineRequestFlags::OUTPUT, signal)?;
        Ok(Self { line, signal })
    }

    fn set(&mut self, value: u8) -> Result<(), EpdError> {
        self.line
            .set_value(value)
            .map_err(|e| EpdError(format!("{} signal: {e}", self.signal)))
    }
}

impl GpioPin for CdevOutputPin {
    fn set_high(&mut self) -> Result<(), EpdError> {
        self.set(1)
    }
    fn set_low(&mut self) -> Result<(), EpdError> {
        self.set(0)
    }
}

/// Input line reading the panel's BUSY signal.
pub struct CdevInputPin {
    line: LineHandle,
    signal: &'static str,
}

impl CdevInputPin {
    pub fn new(chip: &mut Chip, offset: u32, signal: &'static str) -> Result<Self, EpdError> {
        let line = request_line(chip, offset, LineRequestFlags::INPUT, signal)?;
        Ok(Self { line, signal })
    }
}

impl InputPin for CdevInputPin {
    fn is_high(&self) -> Result<bool, EpdError> {
        let value = self
            .line
            .get_value()
            .map_err(|e| EpdError(format!("{} signal: {e}", self.signal)))?;
        Ok(value == 1)
    }
}
