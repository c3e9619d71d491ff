//! # End-to-End Cycle Scenarios
//!
//! These tests drive a whole boot-to-sleep cycle through mock collaborators
//! and assert on the outcome, the rendered frame, and the scheduled sleep.
//! They cover the partial-failure paths that matter in the field: a dead
//! network, a payload that lost fields upstream, an over-long forecast, and
//! a clock that never synchronized.

use chrono::NaiveTime;
use prayer_display_lib::acquire::{AcquireError, ConnectError, Transport};
use prayer_display_lib::config::Config;
use prayer_display_lib::cycle::{CycleController, CycleState};
use prayer_display_lib::renderer::{self, BufferSink, Theme};
use prayer_display_lib::wake::Clock;
use prayer_display_lib::{CycleOutcome, FailureReason, SENTINEL};

/// Transport that always serves one canned response.
struct CannedTransport(Result<Vec<u8>, AcquireError>);

impl Transport for CannedTransport {
    fn connect(&mut self) -> Result<(), ConnectError> {
        Ok(())
    }

    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, AcquireError> {
        self.0.clone()
    }
}

struct FixedClock(Option<NaiveTime>);

impl Clock for FixedClock {
    fn synchronize(&mut self) -> bool {
        self.0.is_some()
    }
    fn now(&self) -> Option<NaiveTime> {
        self.0
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.source.retries = 0;
    config.source.retry_backoff_secs = 0;
    config
}

fn three_am() -> FixedClock {
    FixedClock(NaiveTime::from_hms_opt(3, 0, 0))
}

async fn run_cycle(
    config: &Config,
    transport: CannedTransport,
    clock: FixedClock,
) -> (prayer_display_lib::cycle::CycleResult, BufferSink) {
    let mut controller = CycleController::new(config, transport, clock);
    let mut sink = BufferSink::new(config.display.width, config.display.height);
    let result = controller.run(&mut sink).await;
    assert_eq!(controller.state(), CycleState::Sleeping);
    (result, sink)
}

/// Scenario A: the network request fails with a transport error. The error
/// layout identifies the transport failure and the sleep is still computed
/// normally from the clock.
#[tokio::test]
async fn transport_failure_renders_error_and_still_schedules() {
    let config = test_config();
    let (result, sink) = run_cycle(
        &config,
        CannedTransport(Err(AcquireError::Transport)),
        three_am(),
    )
    .await;

    let expected_reason = FailureReason::Acquire(AcquireError::Transport);
    assert_eq!(result.outcome, CycleOutcome::Failed(expected_reason.clone()));
    assert_eq!(expected_reason.to_string(), "HTTP transport error");

    // The flushed frame is exactly the error layout for that reason
    let theme = Theme::from_config(&config.display);
    let mut reference = BufferSink::new(config.display.width, config.display.height);
    renderer::render(
        &CycleOutcome::Failed(expected_reason),
        &theme,
        &mut reference,
    );
    assert_eq!(sink.bytes(), reference.bytes());

    // 03:00 -> 06:15 wake target, computed from the clock, not the fallback
    assert_eq!(result.sleep_seconds, 3 * 3600 + 15 * 60);
}

/// Scenario B: four of six prayer times present. The rendered snapshot
/// carries the literal four and the sentinel for the two absent ones.
#[tokio::test]
async fn partial_prayer_times_render_with_sentinels() {
    let config = test_config();
    let body = br#"{
        "prayer_times": {
            "fajr": "04:12", "dhuhr": "13:21",
            "maghrib": "20:51", "isha": "22:19"
        }
    }"#;
    let (result, _sink) = run_cycle(
        &config,
        CannedTransport(Ok(body.to_vec())),
        three_am(),
    )
    .await;

    let snapshot = match result.outcome {
        CycleOutcome::Rendered(snapshot) => snapshot,
        other => panic!("expected rendered outcome, got {other:?}"),
    };
    assert_eq!(snapshot.prayers.fajr, "04:12");
    assert_eq!(snapshot.prayers.dhuhr, "13:21");
    assert_eq!(snapshot.prayers.maghrib, "20:51");
    assert_eq!(snapshot.prayers.isha, "22:19");
    assert_eq!(snapshot.prayers.shuruq, SENTINEL);
    assert_eq!(snapshot.prayers.asr, SENTINEL);
}

/// Scenario C: five forecast entries against a card capacity of three.
/// Exactly the first three survive, in input order, with no error.
#[tokio::test]
async fn excess_forecast_entries_are_dropped() {
    let config = test_config();
    assert_eq!(config.display.forecast_cards, 3);
    let body = br#"{
        "prayer_times": {"fajr": "04:12"},
        "weather": {"forecast": [
            {"date": "Mon", "high": 20, "low": 10, "condition": "Clear"},
            {"date": "Tue", "high": 21, "low": 11, "condition": "Clouds"},
            {"date": "Wed", "high": 22, "low": 12, "condition": "Rain"},
            {"date": "Thu", "high": 23, "low": 13, "condition": "Snow"},
            {"date": "Fri", "high": 24, "low": 14, "condition": "Storm"}
        ]}
    }"#;
    let (result, _sink) = run_cycle(
        &config,
        CannedTransport(Ok(body.to_vec())),
        three_am(),
    )
    .await;

    let snapshot = match result.outcome {
        CycleOutcome::Rendered(snapshot) => snapshot,
        other => panic!("expected rendered outcome, got {other:?}"),
    };
    let dates: Vec<_> = snapshot.forecast.iter().map(|f| f.date.as_str()).collect();
    assert_eq!(dates, ["Mon", "Tue", "Wed"]);
}

/// Scenario D: the clock never synchronizes. The cycle still completes and
/// sleeps exactly one day.
#[tokio::test]
async fn unsynchronized_clock_sleeps_exactly_one_day() {
    let config = test_config();
    let body = br#"{"prayer_times": {"fajr": "04:12"}}"#;
    let (result, sink) = run_cycle(
        &config,
        CannedTransport(Ok(body.to_vec())),
        FixedClock(None),
    )
    .await;

    assert!(matches!(result.outcome, CycleOutcome::Rendered(_)));
    assert_eq!(result.sleep_seconds, 86_400);
    assert_eq!(sink.flush_count, 1);
}

/// A missing mandatory section fails the cycle with the decode reason and
/// its firmware-compatible error text.
#[tokio::test]
async fn missing_anchor_section_fails_the_cycle() {
    let config = test_config();
    let body = br#"{"weather": {"current": {"temperature": 18}}}"#;
    let (result, _sink) = run_cycle(
        &config,
        CannedTransport(Ok(body.to_vec())),
        three_am(),
    )
    .await;

    match result.outcome {
        CycleOutcome::Failed(reason) => {
            assert_eq!(reason.to_string(), "No prayer_times");
        }
        other => panic!("expected failed outcome, got {other:?}"),
    }
}
