//! The dashboard: mission state, telemetry window and the poll schedule.
//!
//! A [`Dashboard`] owns everything the display needs. Operator actions go
//! through it so that the poll schedule can be torn down and re-created
//! whenever `armed` or the mission status changes. The schedule is a spawned
//! task holding a [`CancellationToken`]; a fetch that completes after its
//! schedule was cancelled never touches the state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::mission::{Confirm, MissionState, MissionStatus, PowerMode};
use crate::readout::Readouts;
use crate::source::TelemetrySource;
use crate::telemetry::{TelemetryHistory, TelemetrySample};

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Polling is not permitted right now; no request was made.
    Skipped,
    /// A batch was received and replaced the telemetry window.
    Applied {
        /// Number of samples in the batch.
        samples: usize,
    },
    /// The request failed; the failure was logged and state left alone.
    Failed,
    /// A response arrived after its schedule was cancelled and was dropped.
    Discarded,
}

/// State shared between the operator and the poll task.
#[derive(Debug)]
struct DashboardState {
    mission: MissionState,
    history: TelemetryHistory,
    latest: Option<TelemetrySample>,
    /// Bumped on every reschedule; polls tagged with an older value are stale.
    generation: u64,
}

impl DashboardState {
    fn accepts(&self, generation: u64) -> bool {
        self.generation == generation && self.mission.should_poll()
    }

    fn apply_batch(&mut self, batch: Vec<TelemetrySample>) {
        self.history.replace_newest_first(batch);
        if let Some(latest) = self.history.latest() {
            self.latest = Some(latest.clone());
        }
    }
}

#[derive(Debug)]
struct Inner {
    source: Arc<dyn TelemetrySource>,
    state: Mutex<DashboardState>,
    updates: watch::Sender<u64>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.updates.send_modify(|n| *n = n.wrapping_add(1));
    }

    async fn poll(&self, generation: u64, cancel: &CancellationToken) -> PollOutcome {
        if !self.lock().accepts(generation) {
            trace!("Polling not permitted, skipping tick");
            return PollOutcome::Skipped;
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Schedule cancelled while fetching, dropping response");
                return PollOutcome::Discarded;
            }
            result = self.source.fetch_latest() => result,
        };

        match result {
            Ok(batch) => {
                let samples = batch.len();
                {
                    let mut state = self.lock();
                    if !state.accepts(generation) {
                        debug!(samples, "Stale telemetry response dropped");
                        return PollOutcome::Discarded;
                    }
                    state.apply_batch(batch);
                }
                self.notify();
                PollOutcome::Applied { samples }
            }
            Err(err) => {
                warn!(error = %err, source = %self.source.describe(), "Connection lost");
                PollOutcome::Failed
            }
        }
    }
}

/// Handle to the running poll task.
#[derive(Debug)]
struct ScheduledPoll {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ScheduledPoll {
    fn spawn(inner: Arc<Inner>, generation: u64, period: Duration) -> Self {
        let token = CancellationToken::new();
        let task = tokio::spawn(run_schedule(inner, generation, period, token.clone()));
        Self { token, task }
    }

    fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for ScheduledPoll {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_schedule(
    inner: Arc<Inner>,
    generation: u64,
    period: Duration,
    token: CancellationToken,
) {
    debug!(
        generation,
        interval_ms = period.as_millis(),
        "Starting poll schedule"
    );

    // First tick one period from now, like a browser interval.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        inner.poll(generation, &token).await;
    }

    debug!(generation, "Poll schedule stopped");
}

/// Everything the display needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Operator-controlled state.
    pub mission: MissionState,
    /// Most recent sample received, if any.
    pub latest: Option<TelemetrySample>,
    /// Number of samples in the telemetry window.
    pub window_len: usize,
    /// Derived display values.
    pub readouts: Readouts,
    /// Chart series, oldest-first.
    pub series: Vec<SeriesPoint>,
    /// System log, newest-first.
    pub log: Vec<TelemetrySample>,
}

/// One point of the engine temperature / fuel pressure chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// When the reading was taken.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Engine temperature in degrees Celsius.
    pub engine_temp: f64,
    /// Fuel tank pressure in bar.
    pub pressure_fuel: f64,
}

impl From<&TelemetrySample> for SeriesPoint {
    fn from(sample: &TelemetrySample) -> Self {
        Self {
            timestamp: sample.timestamp,
            engine_temp: sample.engine_temp,
            pressure_fuel: sample.pressure_fuel,
        }
    }
}

/// Mission-control dashboard.
///
/// Dropping the dashboard cancels its poll schedule.
#[derive(Debug)]
pub struct Dashboard {
    inner: Arc<Inner>,
    interval: Duration,
    mounted: bool,
    schedule: Option<ScheduledPoll>,
}

impl Dashboard {
    /// Create a dashboard polling `source` every `interval`, keeping at most
    /// `capacity` samples.
    ///
    /// The dashboard is not started; call [`Dashboard::start`] to allow the
    /// poll schedule to run.
    #[must_use]
    pub fn new(source: Arc<dyn TelemetrySource>, interval: Duration, capacity: usize) -> Self {
        let (updates, _) = watch::channel(0);
        let state = DashboardState {
            mission: MissionState::new(),
            history: TelemetryHistory::with_capacity(capacity),
            latest: None,
            generation: 0,
        };
        Self {
            inner: Arc::new(Inner {
                source,
                state: Mutex::new(state),
                updates,
            }),
            interval,
            mounted: false,
            schedule: None,
        }
    }

    /// Create a dashboard using the interval and capacity from `config`.
    #[must_use]
    pub fn from_config(source: Arc<dyn TelemetrySource>, config: &Config) -> Self {
        Self::new(source, config.poll_interval(), config.history.capacity)
    }

    /// Start the dashboard and schedule polling if the mission allows it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        if self.mounted {
            return;
        }
        info!(source = %self.inner.source.describe(), "Dashboard started");
        self.mounted = true;
        self.reschedule();
    }

    /// Stop the dashboard and cancel any pending poll.
    pub fn stop(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.cancel_schedule();
        info!("Dashboard stopped");
    }

    /// Check if a poll schedule is currently running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.schedule.as_ref().is_some_and(ScheduledPoll::is_active)
    }

    /// Poll interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Subscribe to change notifications.
    ///
    /// The value is a counter bumped whenever telemetry or mission state
    /// changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.updates.subscribe()
    }

    /// Run a single poll right now, outside the schedule.
    ///
    /// Does nothing unless the mission is armed and not aborted.
    pub async fn poll_once(&self) -> PollOutcome {
        let generation = self.inner.lock().generation;
        self.inner.poll(generation, &CancellationToken::new()).await
    }

    /// Arm the dashboard and mark the mission nominal.
    ///
    /// Returns `false` if the mission is aborted.
    pub fn launch(&mut self) -> bool {
        self.update_mission(MissionState::launch)
    }

    /// Abort the mission if `confirm` agrees.
    ///
    /// Returns `true` if the mission is aborted after the call.
    pub fn abort<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> bool {
        self.update_mission(|mission| mission.abort(confirm))
    }

    /// Return to the pre-launch state, clearing all telemetry.
    pub fn reset(&mut self) {
        {
            let mut state = self.inner.lock();
            state.mission.reset();
            state.history.clear();
            state.latest = None;
        }
        self.inner.notify();
        self.reschedule();
    }

    /// Switch between ground and internal power.
    pub fn toggle_power(&mut self) -> PowerMode {
        let mode = self.inner.lock().mission.toggle_power();
        self.inner.notify();
        mode
    }

    /// Open or close the propellant vent valves.
    pub fn toggle_vent(&mut self) -> bool {
        let venting = self.inner.lock().mission.toggle_vent();
        self.inner.notify();
        venting
    }

    /// Current operator-controlled state.
    #[must_use]
    pub fn mission(&self) -> MissionState {
        self.inner.lock().mission
    }

    /// Current mission status.
    #[must_use]
    pub fn status(&self) -> MissionStatus {
        self.inner.lock().mission.status
    }

    /// Most recent sample received, if any.
    #[must_use]
    pub fn latest(&self) -> Option<TelemetrySample> {
        self.inner.lock().latest.clone()
    }

    /// The telemetry window, oldest-first.
    #[must_use]
    pub fn history(&self) -> Vec<TelemetrySample> {
        self.inner.lock().history.to_vec()
    }

    /// Derived values for the current state.
    #[must_use]
    pub fn readouts(&self) -> Readouts {
        let state = self.inner.lock();
        Readouts::compute(
            state.latest.as_ref(),
            state.mission.status,
            state.history.len(),
        )
    }

    /// Capture everything needed to draw one frame.
    #[must_use]
    pub fn snapshot(&self, log_lines: usize) -> DashboardSnapshot {
        let state = self.inner.lock();
        DashboardSnapshot {
            mission: state.mission,
            latest: state.latest.clone(),
            window_len: state.history.len(),
            readouts: Readouts::compute(
                state.latest.as_ref(),
                state.mission.status,
                state.history.len(),
            ),
            series: state.history.iter().map(SeriesPoint::from).collect(),
            log: state.history.recent(log_lines).cloned().collect(),
        }
    }

    /// Apply `action` to the mission and reschedule if polling inputs changed.
    fn update_mission<T>(&mut self, action: impl FnOnce(&mut MissionState) -> T) -> T {
        let (result, changed) = {
            let mut state = self.inner.lock();
            let before = (state.mission.armed, state.mission.status);
            let result = action(&mut state.mission);
            (result, before != (state.mission.armed, state.mission.status))
        };
        if changed {
            self.inner.notify();
            self.reschedule();
        }
        result
    }

    fn cancel_schedule(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            schedule.token.cancel();
        }
    }

    /// Tear down the current schedule and start a new one if allowed.
    fn reschedule(&mut self) {
        self.cancel_schedule();

        let generation = {
            let mut state = self.inner.lock();
            state.generation = state.generation.wrapping_add(1);
            if !self.mounted || !state.mission.should_poll() {
                return;
            }
            state.generation
        };

        self.schedule = Some(ScheduledPoll::spawn(
            Arc::clone(&self.inner),
            generation,
            self.interval,
        ));
    }
}
