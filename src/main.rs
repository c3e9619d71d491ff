//! # Prayer Display Application Entry Point
//!
//! This binary wires the cycle controller to real collaborators and runs it
//! forever: one boot-to-sleep cycle per iteration, a fresh controller each
//! time, nothing carried across the sleep boundary. It supports production
//! mode (e-ink panel) and development mode (ASCII output via `--stdout`).

// Test modules
#[cfg(test)]
mod tests;

#[cfg(all(target_os = "linux", feature = "hardware"))]
mod gpio_cdev_pins;
#[cfg(all(target_os = "linux", feature = "hardware"))]
mod hw_spi;

use prayer_display_lib::acquire::HttpTransport;
use prayer_display_lib::config::Config;
use prayer_display_lib::cycle::{CycleController, SleepTimer, ThreadSleepTimer};
use prayer_display_lib::renderer::{draw_ascii, BufferSink};
use prayer_display_lib::wake::SystemClock;
use std::env;

/// Run one full cycle on the real e-ink panel and return the scheduled
/// sleep.
#[cfg(all(target_os = "linux", feature = "hardware"))]
fn run_hardware_cycle(config: &Config, rt: &tokio::runtime::Runtime) -> anyhow::Result<u32> {
    use anyhow::Context;
    use crate::gpio_cdev_pins::{CdevInputPin, CdevOutputPin};
    use crate::hw_spi::SpidevHwSpi;
    use prayer_display_lib::epd7in3f::{
        Epd7in3f, FrameBuffer, GpioPin, InputPin, SoftwareSpi,
    };
    use prayer_display_lib::renderer::FrameSink;

    let hw = &config.display.hardware;
    let mut chip = gpio_cdev::Chip::new("/dev/gpiochip0").context("open gpiochip0")?;

    let cs = CdevOutputPin::new(&mut chip, hw.cs_pin, "CS")?;
    let dc = CdevOutputPin::new(&mut chip, hw.dc_pin, "DC")?;
    let rst = CdevOutputPin::new(&mut chip, hw.rst_pin, "RST")?;
    let busy = CdevInputPin::new(&mut chip, hw.busy_pin, "BUSY")?;
    let spi = SpidevHwSpi::new(hw)?;

    let mut epd = Epd7in3f::new(spi, cs, dc, rst, busy);
    epd.init()?;

    // Panel-backed sink: flush pushes the frame through the full refresh
    // and parks the controller in deep sleep.
    struct PanelSink<'a, SPI, CS, DC, RST, BUSY> {
        buffer: FrameBuffer,
        epd: &'a mut Epd7in3f<SPI, CS, DC, RST, BUSY>,
    }

    impl<SPI, CS, DC, RST, BUSY> FrameSink for PanelSink<'_, SPI, CS, DC, RST, BUSY>
    where
        SPI: SoftwareSpi,
        CS: GpioPin,
        DC: GpioPin,
        RST: GpioPin,
        BUSY: InputPin,
    {
        type Target = FrameBuffer;

        fn frame(&mut self) -> &mut FrameBuffer {
            &mut self.buffer
        }

        fn flush(&mut self) {
            if let Err(e) = self.epd.display(self.buffer.bytes()) {
                log::error!("panel refresh failed: {e}");
            }
            if let Err(e) = self.epd.sleep() {
                log::error!("panel deep sleep failed: {e}");
            }
        }
    }

    let mut sink = PanelSink {
        buffer: FrameBuffer::new(config.display.width, config.display.height),
        epd: &mut epd,
    };

    let transport = HttpTransport::new(&config.source);
    let mut controller = CycleController::new(config, transport, SystemClock);
    let result = rt.block_on(controller.run(&mut sink));
    Ok(result.sleep_seconds)
}

/// Run one full cycle against the in-memory sink and print the ASCII
/// rendition.
fn run_development_cycle(config: &Config, rt: &tokio::runtime::Runtime) -> u32 {
    let transport = HttpTransport::new(&config.source);
    let mut controller = CycleController::new(config, transport, SystemClock);
    let mut sink = BufferSink::new(config.display.width, config.display.height);

    let result = rt.block_on(controller.run(&mut sink));
    draw_ascii(&result.outcome);
    println!("\nNext wake in {} s", result.sleep_seconds);
    result.sleep_seconds
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Development mode: render to stdout for testing without hardware.
    // --once runs a single cycle instead of the sleep loop.
    let development_mode = env::args().any(|arg| arg == "--stdout");
    let run_once = env::args().any(|arg| arg == "--once");

    let rt = tokio::runtime::Runtime::new()?;
    let mut timer = ThreadSleepTimer;

    // Each iteration is one process instance in the original design: boot,
    // cycle, deep sleep. The controller is rebuilt every time so nothing
    // survives the sleep boundary.
    loop {
        let config = Config::load();

        let sleep_seconds = if development_mode {
            run_development_cycle(&config, &rt)
        } else {
            #[cfg(all(target_os = "linux", feature = "hardware"))]
            {
                match run_hardware_cycle(&config, &rt) {
                    Ok(seconds) => seconds,
                    Err(e) => {
                        log::error!("e-ink cycle failed: {e}");
                        log::error!("falling back to ASCII output:");
                        run_development_cycle(&config, &rt)
                    }
                }
            }

            #[cfg(not(all(target_os = "linux", feature = "hardware")))]
            {
                log::warn!(
                    "e-ink support not enabled, rebuild with --features hardware; showing ASCII output"
                );
                run_development_cycle(&config, &rt)
            }
        };

        if run_once {
            return Ok(());
        }

        timer.sleep_for(sleep_seconds);
    }
}
