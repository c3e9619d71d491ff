//! # Defensive Payload Decoding
//!
//! This module turns the raw bytes fetched from the data source into a fully
//! defaulted [`DisplaySnapshot`]. The payload is an aggregated JSON document
//! produced by scrapers and third-party APIs, so its shape drifts: fields
//! come and go, and an upstream change should degrade a single region of the
//! display to "N/A", never blank the whole panel.
//!
//! ## Decode policy
//!
//! Exactly two conditions fail a decode:
//! - the bytes are not syntactically valid JSON ([`DecodeError::Syntax`])
//! - the mandatory `prayer_times` object is absent or not an object
//!   ([`DecodeError::MissingSection`])
//!
//! Everything else self-heals. Each individual field read goes through a
//! default-on-absence accessor that collapses a missing *or mis-typed* value
//! to the field's sentinel, mirroring the `doc["key"] | "N/A"` semantics of
//! the original firmware. The weather section is entirely optional, and its
//! `current` and `forecast` subsections decode independently of each other.
//!
//! ## Expected shape
//!
//! ```json
//! {
//!   "timestamp": "2026-08-29T06:00:12Z",
//!   "location": "Stuttgart",
//!   "prayer_times": { "fajr": "04:12", "shuruq": "...", ... },
//!   "weather": {
//!     "current": { "temperature": 21, "condition": "Clouds",
//!                  "wind_speed": 3.4, "icon": "04d", ... },
//!     "forecast": [ { "date": "Sat 30", "high": 24, "low": 14,
//!                     "condition": "Rain" }, ... ]
//!   }
//! }
//! ```

use crate::{DisplaySnapshot, ForecastEntry, PrayerTimes, WeatherSnapshot, SENTINEL};
use serde_json::Value;
use thiserror::Error;

/// The two ways a payload can fail to decode at all.
///
/// Anything softer than these (individual fields missing or mis-typed,
/// excess forecast entries) is absorbed by defaulting and never surfaces.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DecodeError {
    /// The bytes are not valid JSON
    #[error("JSON error")]
    Syntax {
        /// 1-based line of the first syntax error
        line: usize,
        /// 1-based column of the first syntax error
        column: usize,
    },
    /// A mandatory top-level object is absent or has the wrong shape
    #[error("No {0}")]
    MissingSection(&'static str),
}

/// Decode a fetched payload into a fully defaulted snapshot.
///
/// `forecast_capacity` caps the decoded forecast sequence; entries beyond it
/// are silently dropped, preserving the order of the first `capacity`
/// entries.
pub fn decode(bytes: &[u8], forecast_capacity: usize) -> Result<DisplaySnapshot, DecodeError> {
    let doc: Value = serde_json::from_slice(bytes).map_err(|e| DecodeError::Syntax {
        line: e.line(),
        column: e.column(),
    })?;

    // The one mandatory anchor: without prayer times there is nothing worth
    // showing, so this is a whole-cycle failure.
    let times = doc
        .get("prayer_times")
        .and_then(Value::as_object)
        .ok_or(DecodeError::MissingSection("prayer_times"))?;

    let prayers = PrayerTimes {
        fajr: str_or(times.get("fajr"), SENTINEL),
        shuruq: str_or(times.get("shuruq"), SENTINEL),
        dhuhr: str_or(times.get("dhuhr"), SENTINEL),
        asr: str_or(times.get("asr"), SENTINEL),
        maghrib: str_or(times.get("maghrib"), SENTINEL),
        isha: str_or(times.get("isha"), SENTINEL),
        // Location lives at the top level in the aggregated document, with a
        // per-section fallback kept for older payloads.
        location: match doc.get("location") {
            Some(v) => str_or(Some(v), ""),
            None => str_or(times.get("location"), ""),
        },
    };

    let weather_section = doc.get("weather");
    let current = weather_section.and_then(|w| w.get("current"));

    let weather = match current {
        Some(cur) => WeatherSnapshot {
            temperature: int_or(cur.get("temperature"), 0),
            feels_like: int_or(cur.get("feels_like"), 0),
            humidity: int_or(cur.get("humidity"), 0),
            condition: str_or(cur.get("condition"), SENTINEL),
            wind_speed: float_or(cur.get("wind_speed"), 0.0),
            icon: str_or(cur.get("icon"), ""),
        },
        // Weather present but no "current" subsection (or no weather at
        // all): current conditions stay at their sentinels. The forecast
        // below still decodes on its own.
        None => WeatherSnapshot::default(),
    };

    let forecast = weather_section
        .and_then(|w| w.get("forecast"))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .take(forecast_capacity)
                .map(|e| ForecastEntry {
                    date: str_or(e.get("date"), SENTINEL),
                    high: int_or(e.get("high"), 0),
                    low: int_or(e.get("low"), 0),
                    condition: str_or(e.get("condition"), SENTINEL),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(DisplaySnapshot {
        prayers,
        weather,
        forecast,
        updated: str_or(doc.get("timestamp"), ""),
    })
}

// -- Default-on-absence accessors --
//
// Each collapses "absent", "null" and "wrong type" to the given default
// immediately. No anomaly in an individual field can escape these.

fn str_or(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn int_or(value: Option<&Value>, default: i32) -> i32 {
    value
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(default)
}

fn float_or(value: Option<&Value>, default: f32) -> f32 {
    value
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPACITY: usize = 3;

    fn decode_str(json: &str) -> Result<DisplaySnapshot, DecodeError> {
        decode(json.as_bytes(), CAPACITY)
    }

    #[test]
    fn full_payload_decodes() {
        let snapshot = decode_str(
            r#"{
                "timestamp": "2026-08-29T06:00:12Z",
                "location": "Stuttgart",
                "prayer_times": {
                    "fajr": "04:12", "shuruq": "05:48", "dhuhr": "13:21",
                    "asr": "17:05", "maghrib": "20:51", "isha": "22:19"
                },
                "weather": {
                    "current": {
                        "temperature": 21, "feels_like": 20, "humidity": 56,
                        "condition": "Clouds", "wind_speed": 3.4, "icon": "04d"
                    },
                    "forecast": [
                        {"date": "Sat 30", "high": 24, "low": 14, "condition": "Rain"},
                        {"date": "Sun 31", "high": 22, "low": 13, "condition": "Clear"}
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.prayers.fajr, "04:12");
        assert_eq!(snapshot.prayers.isha, "22:19");
        assert_eq!(snapshot.prayers.location, "Stuttgart");
        assert_eq!(snapshot.weather.temperature, 21);
        assert_eq!(snapshot.weather.wind_speed, 3.4);
        assert_eq!(snapshot.weather.icon, "04d");
        assert_eq!(snapshot.forecast.len(), 2);
        assert_eq!(snapshot.forecast[1].date, "Sun 31");
        assert_eq!(snapshot.updated, "2026-08-29T06:00:12Z");
    }

    #[test]
    fn missing_prayer_times_section_fails() {
        let err = decode_str(r#"{"weather": {"current": {"temperature": 3}}}"#).unwrap_err();
        assert_eq!(err, DecodeError::MissingSection("prayer_times"));
    }

    #[test]
    fn non_object_prayer_times_fails() {
        // Mandatory section present but the wrong shape counts as missing
        let err = decode_str(r#"{"prayer_times": "04:12"}"#).unwrap_err();
        assert_eq!(err, DecodeError::MissingSection("prayer_times"));
    }

    #[test]
    fn syntax_error_reports_position() {
        let err = decode(b"{\"prayer_times\": ", CAPACITY).unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }));
        assert_eq!(err.to_string(), "JSON error");
    }

    #[test]
    fn absent_times_become_sentinels() {
        // Four of six present; the other two must resolve to "N/A"
        let snapshot = decode_str(
            r#"{"prayer_times": {
                "fajr": "04:12", "dhuhr": "13:21",
                "maghrib": "20:51", "isha": "22:19"
            }}"#,
        )
        .unwrap();

        assert_eq!(snapshot.prayers.fajr, "04:12");
        assert_eq!(snapshot.prayers.shuruq, SENTINEL);
        assert_eq!(snapshot.prayers.asr, SENTINEL);
        assert_eq!(snapshot.prayers.maghrib, "20:51");
    }

    #[test]
    fn mistyped_fields_become_sentinels() {
        let snapshot = decode_str(
            r#"{
                "prayer_times": {"fajr": 412, "dhuhr": null, "asr": ["13:10"]},
                "weather": {"current": {
                    "temperature": "21", "wind_speed": "fast", "condition": 7
                }}
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.prayers.fajr, SENTINEL);
        assert_eq!(snapshot.prayers.dhuhr, SENTINEL);
        assert_eq!(snapshot.prayers.asr, SENTINEL);
        assert_eq!(snapshot.weather.temperature, 0);
        assert_eq!(snapshot.weather.wind_speed, 0.0);
        assert_eq!(snapshot.weather.condition, SENTINEL);
    }

    #[test]
    fn out_of_range_numbers_become_defaults_not_wrapped() {
        // An i32-overflowing value is an anomaly like any other; it must
        // collapse to the default, not wrap around
        let snapshot = decode_str(
            r#"{
                "prayer_times": {},
                "weather": {"current": {"temperature": 99999999999, "humidity": -99999999999}}
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.weather.temperature, 0);
        assert_eq!(snapshot.weather.humidity, 0);
    }

    #[test]
    fn missing_weather_keeps_defaults() {
        let snapshot = decode_str(r#"{"prayer_times": {"fajr": "04:12"}}"#).unwrap();
        assert_eq!(snapshot.weather, WeatherSnapshot::default());
        assert!(snapshot.forecast.is_empty());
    }

    #[test]
    fn forecast_decodes_without_current_section() {
        let snapshot = decode_str(
            r#"{
                "prayer_times": {"fajr": "04:12"},
                "weather": {"forecast": [
                    {"date": "Sat 30", "high": 24, "low": 14, "condition": "Rain"}
                ]}
            }"#,
        )
        .unwrap();

        // Current conditions stay at sentinels, forecast populates anyway
        assert_eq!(snapshot.weather, WeatherSnapshot::default());
        assert_eq!(snapshot.forecast.len(), 1);
        assert_eq!(snapshot.forecast[0].condition, "Rain");
    }

    #[test]
    fn forecast_truncates_to_capacity_in_order() {
        let snapshot = decode_str(
            r#"{
                "prayer_times": {},
                "weather": {"forecast": [
                    {"date": "d1"}, {"date": "d2"}, {"date": "d3"},
                    {"date": "d4"}, {"date": "d5"}
                ]}
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.forecast.len(), CAPACITY);
        let dates: Vec<_> = snapshot.forecast.iter().map(|f| f.date.as_str()).collect();
        assert_eq!(dates, ["d1", "d2", "d3"]);
    }

    #[test]
    fn location_falls_back_to_section_field() {
        let snapshot =
            decode_str(r#"{"prayer_times": {"location": "Stuttgart Mitte"}}"#).unwrap();
        assert_eq!(snapshot.prayers.location, "Stuttgart Mitte");

        let snapshot = decode_str(r#"{"prayer_times": {}}"#).unwrap();
        assert!(snapshot.prayers.location.is_empty());
    }
}
