//! # Acquisition-Render-Sleep Cycle Controller
//!
//! The one piece of real control flow in the system: a strict linear state
//! machine that sequences link establishment, the fetch (with its bounded
//! in-stage retry budget), the defensive decode, rendering, and wake
//! scheduling.
//!
//! Failure handling is early-exit-forward: a failed stage converts
//! immediately into the `Failed(reason)` outcome and control skips ahead to
//! the single convergence point at `Rendering`. Nothing ever retries a
//! prior stage, and every path reaches `Scheduling`, so the device always
//! re-wakes instead of hanging on a failure.
//!
//! Each cycle is run by a fresh controller; the terminal `Sleeping` state
//! hands the computed duration back to the caller, which owns the actual
//! sleep and the blank-slate restart.

use crate::acquire::{AcquireError, Transport};
use crate::config::Config;
use crate::renderer::{self, FrameSink, Theme};
use crate::wake::{self, Clock};
use crate::{payload, CycleOutcome, FailureReason};
use std::time::Duration;

/// The linear cycle states. `Sleeping` is terminal for a controller
/// instance; the next instance begins at `Booting` with no memory of this
/// one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleState {
    Booting,
    Connecting,
    Fetching,
    Decoding,
    Rendering,
    Scheduling,
    Sleeping,
}

/// The low-power timer collaborator: sleep, then the process instance
/// restarts from scratch.
pub trait SleepTimer {
    fn sleep_for(&mut self, seconds: u32);
}

/// Host timer: plain blocking sleep.
pub struct ThreadSleepTimer;

impl SleepTimer for ThreadSleepTimer {
    fn sleep_for(&mut self, seconds: u32) {
        std::thread::sleep(Duration::from_secs(seconds.into()));
    }
}

/// What one completed cycle produced: the outcome that was rendered and the
/// scheduled sleep.
#[derive(Clone, Debug)]
pub struct CycleResult {
    pub outcome: CycleOutcome,
    pub sleep_seconds: u32,
}

/// One boot-to-sleep run over injected collaborators.
pub struct CycleController<'a, T, C> {
    config: &'a Config,
    transport: T,
    clock: C,
    state: CycleState,
}

impl<'a, T: Transport, C: Clock> CycleController<'a, T, C> {
    pub fn new(config: &'a Config, transport: T, clock: C) -> Self {
        CycleController {
            config,
            transport,
            clock,
            state: CycleState::Booting,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    fn enter(&mut self, next: CycleState) {
        log::debug!("cycle state {:?} -> {next:?}", self.state);
        self.state = next;
    }

    /// Run the whole cycle: acquire, render, schedule. Returns the rendered
    /// outcome and the seconds to sleep before the next wake.
    pub async fn run<S: FrameSink>(&mut self, sink: &mut S) -> CycleResult {
        let outcome = self.acquire().await;

        self.enter(CycleState::Rendering);
        match &outcome {
            CycleOutcome::Rendered(_) => log::info!("rendering data layout"),
            CycleOutcome::Failed(reason) => log::info!("rendering error layout: {reason}"),
        }
        let theme = Theme::from_config(&self.config.display);
        renderer::render(&outcome, &theme, sink);

        self.enter(CycleState::Scheduling);
        let now = if self.clock.synchronize() {
            self.clock.now()
        } else {
            None
        };
        let sleep_seconds =
            wake::compute_sleep_seconds(self.config.wake.hour, self.config.wake.minute, now);
        log::info!("sleeping {sleep_seconds} s until next wake");

        self.enter(CycleState::Sleeping);
        CycleResult {
            outcome,
            sleep_seconds,
        }
    }

    /// The acquisition half of the pipeline: everything up to the single
    /// success/failure decision point.
    async fn acquire(&mut self) -> CycleOutcome {
        self.enter(CycleState::Connecting);
        if self.transport.connect().is_err() {
            // Straight to rendering; fetching and decoding are skipped
            return CycleOutcome::Failed(FailureReason::NetworkUnavailable);
        }

        self.enter(CycleState::Fetching);
        let bytes = match self.fetch_with_retry().await {
            Ok(bytes) => bytes,
            Err(e) => return CycleOutcome::Failed(FailureReason::Acquire(e)),
        };

        self.enter(CycleState::Decoding);
        match payload::decode(&bytes, self.config.display.forecast_cards) {
            Ok(snapshot) => CycleOutcome::Rendered(snapshot),
            Err(e) => CycleOutcome::Failed(FailureReason::Decode(e)),
        }
    }

    /// Single fetch plus the configured number of bounded retries.
    /// This is the only retry anywhere in the cycle.
    async fn fetch_with_retry(&self) -> Result<Vec<u8>, AcquireError> {
        let source = &self.config.source;
        let mut attempt: u32 = 0;
        loop {
            match self.transport.fetch(&source.url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < source.retries => {
                    attempt += 1;
                    log::warn!(
                        "fetch failed ({e}), retry {attempt}/{} in {} s",
                        source.retries,
                        source.retry_backoff_secs
                    );
                    tokio::time::sleep(Duration::from_secs(source.retry_backoff_secs)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
