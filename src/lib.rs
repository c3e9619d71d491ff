//! # Prayer Display Core Library
//!
//! This library provides the data model and cycle components for a small
//! e-ink display node: wake, fetch a JSON document of daily prayer times and
//! a weather forecast, render it (or an error panel), compute the seconds
//! until the next wake target, and hand off to a low-power sleep timer.
//!
//! ## Design Philosophy
//!
//! ### Cycle-scoped values
//! Every run is a fresh, blank-slate cycle. Nothing in this crate persists
//! across a sleep boundary: each cycle constructs its snapshot types fresh,
//! threads them through the pipeline as plain values, and drops them at the
//! end. There is no ambient mutable state and no cross-cycle identity.
//!
//! ### Total defaulting
//! The remote payload is produced by scrapers and third-party APIs, so any
//! single field can be absent or mis-typed on any given day. Field reads
//! never fail: an absent or malformed value collapses to the field's
//! sentinel (`"N/A"`, `0`, `0.0`, `""`). Only two conditions fail a whole
//! cycle: the payload not parsing at all, and the `prayer_times` anchor
//! section missing. See [`payload`].
//!
//! ### Injected collaborators
//! The network transport ([`acquire::Transport`]), wall clock
//! ([`wake::Clock`]), frame sink ([`renderer::FrameSink`]) and sleep timer
//! ([`cycle::SleepTimer`]) are all traits, so the whole cycle runs against
//! mocks on a development host.
//!
//! ## Core Types
//!
//! - [`PrayerTimes`]: the six daily times plus an optional location label
//! - [`WeatherSnapshot`]: current conditions
//! - [`ForecastEntry`]: one day of the short forecast strip
//! - [`DisplaySnapshot`]: everything one successful cycle renders
//! - [`CycleOutcome`]: the single success/failure decision point

use serde::{Deserialize, Serialize};

// Module declarations
pub mod acquire;
pub mod config;
pub mod cycle;
pub mod epd7in3f;
pub mod icons;
pub mod payload;
pub mod renderer;
pub mod wake;

/// Sentinel shown for any time-of-day or condition string the payload did
/// not provide.
pub const SENTINEL: &str = "N/A";

/// The six daily prayer times plus an optional location label.
///
/// Invariant: every field always holds a defined value. Fields start at the
/// [`SENTINEL`] (location starts empty) and are only ever overwritten with
/// actual payload strings, so the renderer never has to handle an unset
/// state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrayerTimes {
    /// Dawn prayer (e.g. "04:12")
    pub fajr: String,
    /// Sunrise
    pub shuruq: String,
    /// Midday prayer
    pub dhuhr: String,
    /// Afternoon prayer
    pub asr: String,
    /// Sunset prayer
    pub maghrib: String,
    /// Night prayer
    pub isha: String,
    /// Location label shown in the header, empty if the payload has none
    pub location: String,
}

impl Default for PrayerTimes {
    fn default() -> Self {
        PrayerTimes {
            fajr: SENTINEL.to_string(),
            shuruq: SENTINEL.to_string(),
            dhuhr: SENTINEL.to_string(),
            asr: SENTINEL.to_string(),
            maghrib: SENTINEL.to_string(),
            isha: SENTINEL.to_string(),
            location: String::new(),
        }
    }
}

impl PrayerTimes {
    /// Label/value pairs in display order, for row-by-row rendering.
    pub fn rows(&self) -> [(&'static str, &str); 6] {
        [
            ("Fajr", self.fajr.as_str()),
            ("Shuruq", self.shuruq.as_str()),
            ("Dhuhr", self.dhuhr.as_str()),
            ("Asr", self.asr.as_str()),
            ("Maghrib", self.maghrib.as_str()),
            ("Isha", self.isha.as_str()),
        ]
    }
}

/// Current weather conditions.
///
/// Same total-defaulting invariant as [`PrayerTimes`]: numeric fields
/// default to zero, strings to the sentinel (icon code to empty, since it is
/// never shown as text).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Temperature in °C, rounded by the data source
    pub temperature: i32,
    /// Apparent temperature in °C
    pub feels_like: i32,
    /// Relative humidity in percent
    pub humidity: i32,
    /// Condition label, e.g. "Clouds"
    pub condition: String,
    /// Wind speed in m/s
    pub wind_speed: f32,
    /// OpenWeatherMap icon code, e.g. "04d"
    pub icon: String,
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        WeatherSnapshot {
            temperature: 0,
            feels_like: 0,
            humidity: 0,
            condition: SENTINEL.to_string(),
            wind_speed: 0.0,
            icon: String::new(),
        }
    }
}

/// One day of the short forecast strip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Short date label, e.g. "Sat 30"
    pub date: String,
    /// Daily high in °C
    pub high: i32,
    /// Daily low in °C
    pub low: i32,
    /// Condition label used for pictogram classification
    pub condition: String,
}

impl Default for ForecastEntry {
    fn default() -> Self {
        ForecastEntry {
            date: SENTINEL.to_string(),
            high: 0,
            low: 0,
            condition: SENTINEL.to_string(),
        }
    }
}

/// Everything one successful cycle renders.
///
/// The forecast sequence is already capped at the configured card capacity
/// by the decoder; the renderer never re-truncates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub prayers: PrayerTimes,
    pub weather: WeatherSnapshot,
    pub forecast: Vec<ForecastEntry>,
    /// Payload production timestamp, shown as a footer when present
    pub updated: String,
}

/// The single per-cycle decision point consumed by the render dispatcher.
///
/// Exactly one of these is produced per cycle. `Failed` carries the closed
/// reason taxonomy; everything softer than these reasons has already been
/// absorbed by defaulting before an outcome exists.
#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome {
    Rendered(DisplaySnapshot),
    Failed(FailureReason),
}

/// Closed failure taxonomy surfaced on the error panel.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FailureReason {
    /// Could not establish a network link at all
    #[error("WiFi failed")]
    NetworkUnavailable,
    /// The request went out but did not produce a usable body
    #[error(transparent)]
    Acquire(#[from] acquire::AcquireError),
    /// The body could not be minimally parsed
    #[error(transparent)]
    Decode(#[from] payload::DecodeError),
}
