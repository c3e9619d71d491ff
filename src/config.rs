//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! display-config.toml file. It provides a centralized way to configure the
//! data source URL, the wake target, retry policy, display geometry, and
//! hardware pin assignments.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration loaded from display-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Remote data source configuration
    pub source: SourceConfig,
    /// Wake-target configuration
    pub wake: WakeConfig,
    /// Display and layout configuration
    pub display: DisplayConfig,
}

/// Remote JSON data source configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct SourceConfig {
    /// URL of the aggregated display_data.json document
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
    /// Extra fetch attempts after the first failure (0 disables retry)
    pub retries: u32,
    /// Pause between fetch attempts in seconds
    pub retry_backoff_secs: u64,
}

/// Wall-clock wake target
#[derive(Debug, Deserialize, Serialize)]
pub struct WakeConfig {
    /// Hour of day (0-23) the device aims to wake at
    pub hour: u32,
    /// Minute (0-59) of the wake target
    pub minute: u32,
}

/// Display geometry and layout configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Panel width in pixels
    pub width: u32,
    /// Panel height in pixels
    pub height: u32,
    /// Vertical pitch of one prayer row
    pub row_height: u32,
    /// Left edge of the prayer name column
    pub label_x: u32,
    /// Right edge the time values are aligned against
    pub time_right_x: u32,
    /// Number of forecast cards rendered (extra entries are dropped)
    pub forecast_cards: usize,
    /// Hardware pin assignments
    pub hardware: HardwareConfig,
}

/// Panel wiring: GPIO pin assignments (BCM numbering) and the SPI device
#[derive(Debug, Deserialize, Serialize)]
pub struct HardwareConfig {
    pub cs_pin: u32,
    pub dc_pin: u32,
    pub rst_pin: u32,
    pub busy_pin: u32,
    /// Kernel SPI device the panel data line is wired to
    pub spi_dev: String,
    /// SPI clock in Hz
    pub spi_hz: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: SourceConfig {
                url: "https://raw.githubusercontent.com/Amkobano/e-ink-display-module/main/data-collection/output/display_data.json".to_string(),
                timeout_secs: 15,
                max_redirects: 3,
                retries: 2,
                retry_backoff_secs: 5,
            },
            wake: WakeConfig {
                // Aggregator publishes around 06:00 UTC; wake a little after
                hour: 6,
                minute: 15,
            },
            display: DisplayConfig {
                width: 800,  // Waveshare 7.3" F panel
                height: 480, // Waveshare 7.3" F panel
                row_height: 60,
                label_x: 40,
                time_right_x: 380,
                forecast_cards: 3,
                hardware: HardwareConfig {
                    cs_pin: 8,
                    dc_pin: 25,
                    rst_pin: 17,
                    busy_pin: 24,
                    spi_dev: "/dev/spidev0.0".to_string(),
                    spi_hz: 8_000_000,
                },
            },
        }
    }
}

impl Config {
    /// Load configuration from display-config.toml file.
    /// Falls back to default configuration if file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::load_from_path("display-config.toml")
    }

    /// Load configuration from specified path.
    /// Falls back to default configuration if file doesn't exist or is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(mut config) => {
                    log::info!("loaded configuration, source: {}", config.source.url);
                    // An out-of-range wake target would schedule a sleep
                    // longer than a day and leave a stale display up
                    if config.wake.hour > 23 || config.wake.minute > 59 {
                        log::warn!(
                            "wake target {:02}:{:02} out of range, using default",
                            config.wake.hour,
                            config.wake.minute
                        );
                        config.wake = Config::default().wake;
                    }
                    config
                }
                Err(e) => {
                    log::warn!("invalid config file format: {e}");
                    log::warn!("using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("no config file found, using default configuration");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.source.url.ends_with("display_data.json"));
        assert_eq!(config.wake.hour, 6);
        assert_eq!(config.wake.minute, 15);
        assert_eq!(config.display.width, 800);
        assert_eq!(config.display.height, 480);
        assert_eq!(config.display.forecast_cards, 3);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.source.url, parsed.source.url);
        assert_eq!(config.wake.hour, parsed.wake.hour);
        assert_eq!(config.display.row_height, parsed.display.row_height);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.wake.hour, 6);
    }

    #[test]
    fn test_out_of_range_wake_target_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[source]
url = "https://example.org/data.json"
timeout_secs = 5
max_redirects = 1
retries = 0
retry_backoff_secs = 1

[wake]
hour = 24
minute = 30

[display]
width = 800
height = 480
row_height = 56
label_x = 32
time_right_x = 360
forecast_cards = 2

[display.hardware]
cs_pin = 8
dc_pin = 25
rst_pin = 17
busy_pin = 24
spi_dev = "/dev/spidev0.0"
spi_hz = 8000000
"#
        )
        .unwrap();

        let config = Config::load_from_path(file.path());
        // The rest of the file is honored, only the wake target resets
        assert_eq!(config.source.url, "https://example.org/data.json");
        assert_eq!(config.wake.hour, Config::default().wake.hour);
        assert_eq!(config.wake.minute, Config::default().wake.minute);
    }

    #[test]
    fn test_load_custom_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[source]
url = "https://example.org/data.json"
timeout_secs = 5
max_redirects = 1
retries = 0
retry_backoff_secs = 1

[wake]
hour = 5
minute = 30

[display]
width = 800
height = 480
row_height = 56
label_x = 32
time_right_x = 360
forecast_cards = 2

[display.hardware]
cs_pin = 8
dc_pin = 25
rst_pin = 17
busy_pin = 24
spi_dev = "/dev/spidev0.1"
spi_hz = 4000000
"#
        )
        .unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.source.url, "https://example.org/data.json");
        assert_eq!(config.wake.hour, 5);
        assert_eq!(config.wake.minute, 30);
        assert_eq!(config.display.forecast_cards, 2);
        assert_eq!(config.display.hardware.spi_dev, "/dev/spidev0.1");
        assert_eq!(config.display.hardware.spi_hz, 4_000_000);
    }
}
