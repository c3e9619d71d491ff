// Kernel SPI device for the panel data line.
//
// Device path and clock come from the hardware config; the panel tops out
// at 10 MHz, and over-clocking it shows up as silent refresh corruption
// rather than an error, so the configured rate is capped here.

use prayer_display_lib::config::HardwareConfig;
use prayer_display_lib::epd7in3f::{EpdError, SoftwareSpi};
use spidev::{SpiModeFlags, Spidev, SpidevOptions};
use std::io::Write;

const MAX_SPI_HZ: u32 = 10_000_000;

pub struct SpidevHwSpi {
    dev: Spidev,
    path: String,
}

impl SpidevHwSpi {
    pub fn new(hw: &HardwareConfig) -> Result<Self, EpdError> {
        let mut dev = Spidev::open(&hw.spi_dev)
            .map_err(|e| EpdError(format!("open {}: {e}", hw.spi_dev)))?;

        let speed = hw.spi_hz.min(MAX_SPI_HZ);
        if speed != hw.spi_hz {
            log::warn!("spi_hz {} above panel limit, capping to {speed}", hw.spi_hz);
        }

        let opts = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(speed)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&opts)
            .map_err(|e| EpdError(format!("configure {}: {e}", hw.spi_dev)))?;

        Ok(Self {
            dev,
            path: hw.spi_dev.clone(),
        })
    }
}

impl SoftwareSpi for SpidevHwSpi {
    fn write_byte(&mut self, data: u8) -> Result<(), EpdError> {
        self.dev
            .write(&[data])
            .map(|_| ())
            .map_err(|e| EpdError(format!("write to {}: {e}", self.path)))
    }
}
