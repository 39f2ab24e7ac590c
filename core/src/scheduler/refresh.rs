//! Timer-driven refresh loop.
//!
//! One repeating timer triggers fetch cycles through the [`FetchState`]
//! guard. Ticks that land while a fetch is in flight are dropped rather than
//! queued, and nothing cancels a request once issued: a fetch started under
//! an old configuration still renders, using the viewshed limits current at
//! response time.

use crate::cards::build_cards;
use crate::payload::TelemetryPayload;
use crate::prelude::{
    ConfigResult, RefreshConfig, RenderSink, TelemetryError, TelemetryResult, TelemetrySource,
};
use crate::scheduler::guard::FetchState;
use crate::scheduler::status::{ConnectionStatus, SchedulerPhase, StatusReport};
use crate::telemetry::{FetchMetrics, LogManager, MetricsRecorder};
use crate::viewshed::ViewshedLimits;
use chrono::Utc;
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// What a trigger (tick, start or manual refresh) ended up doing.
#[derive(Debug)]
pub enum TickOutcome {
    /// A fetch was issued; the handle resolves once it has rendered.
    Started(JoinHandle<()>),
    /// A fetch was already in flight.
    Skipped,
    /// No endpoint is configured, nothing was fetched.
    Unconfigured,
}

impl TickOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, TickOutcome::Started(_))
    }

    /// Waits for the issued fetch, if any, to finish rendering.
    pub async fn settled(self) {
        if let TickOutcome::Started(handle) = self {
            if let Err(err) = handle.await {
                debug!("fetch task ended abnormally: {err}");
            }
        }
    }
}

struct FetchCycle<S, R> {
    source: S,
    sink: R,
    state: FetchState,
    config: Mutex<RefreshConfig>,
    limits: Mutex<ViewshedLimits>,
    status: Mutex<ConnectionStatus>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: TelemetrySource, R: RenderSink> FetchCycle<S, R> {
    fn trigger(self: &Arc<Self>) -> TickOutcome {
        if !self.source.is_configured() {
            self.sink.show_error(&TelemetryError::NotConfigured.to_string());
            return TickOutcome::Unconfigured;
        }

        if !self.state.try_begin() {
            self.metrics.record_skipped();
            debug!("fetch already in flight, dropping tick");
            return TickOutcome::Skipped;
        }

        self.metrics.record_started();
        self.sink.show_loading(true);
        self.sink.clear_error();

        let query = lock(&self.config).query();
        debug!("fetching {} h / {} nodes", query.hours, query.limit);
        let request = self.source.fetch(query);
        let cycle = Arc::clone(self);
        TickOutcome::Started(tokio::spawn(async move {
            let _in_flight = cycle.state.release_on_drop();
            let result = request.await;
            cycle.complete(result);
        }))
    }

    fn complete(&self, result: TelemetryResult<TelemetryPayload>) {
        match result {
            Ok(payload) => {
                let limits = *lock(&self.limits);
                let cards = build_cards(payload.nodes(), &limits, Utc::now());
                self.sink.render_nodes(&cards);
                *lock(&self.status) = ConnectionStatus::Connected;
                self.sink
                    .render_status(&StatusReport::connected(payload.node_count()));
                self.metrics.record_success();
                self.logger
                    .record(&format!("telemetry refreshed: {} nodes", payload.node_count()));
            }
            Err(err) => {
                self.sink
                    .show_error(&format!("Failed to fetch telemetry: {err}"));
                *lock(&self.status) = ConnectionStatus::Error;
                self.sink.render_status(&StatusReport::error());
                self.metrics.record_error();
                self.logger.warn(&format!("telemetry fetch failed: {err}"));
            }
        }
        self.sink.show_loading(false);
    }
}

/// Owns the refresh timer and the single-flight fetch guard.
///
/// Must be driven from inside a tokio runtime.
pub struct RefreshScheduler<S, R> {
    cycle: Arc<FetchCycle<S, R>>,
    timer: Option<JoinHandle<()>>,
}

impl<S: TelemetrySource, R: RenderSink> RefreshScheduler<S, R> {
    pub fn new(source: S, sink: R, limits: ViewshedLimits) -> Self {
        Self {
            cycle: Arc::new(FetchCycle {
                source,
                sink,
                state: FetchState::new(),
                config: Mutex::new(RefreshConfig::default()),
                limits: Mutex::new(limits),
                status: Mutex::new(ConnectionStatus::Connecting),
                metrics: MetricsRecorder::new(),
                logger: LogManager::for_target("meshcore::scheduler"),
            }),
            timer: None,
        }
    }

    /// Replaces any running timer, arms a new one when the interval is
    /// non-zero, and fetches once immediately.
    pub fn start(&mut self, config: RefreshConfig) -> TickOutcome {
        self.stop_timer();
        *lock(&self.cycle.config) = config;

        if config.interval_seconds > 0 {
            let period = Duration::from_secs(config.interval_seconds);
            self.timer = Some(arm_timer(Arc::clone(&self.cycle), period));
            self.cycle
                .logger
                .record(&format!("auto-refresh every {}s", config.interval_seconds));
        } else {
            self.cycle.logger.record("auto-refresh disabled (manual)");
        }

        self.cycle.trigger()
    }

    /// Same as [`start`](Self::start); partial periods are not carried over.
    pub fn reconfigure(&mut self, config: RefreshConfig) -> TickOutcome {
        self.start(config)
    }

    /// Timer callback. Dropped silently while a fetch is in flight.
    pub fn on_tick(&self) -> TickOutcome {
        self.cycle.trigger()
    }

    /// Swaps the time range and node limit used by later fetches. The
    /// interval and the timer's phase are kept.
    pub fn set_query_window(
        &self,
        time_range_hours: u32,
        max_nodes: u32,
    ) -> ConfigResult<RefreshConfig> {
        let mut config = lock(&self.cycle.config);
        let next = RefreshConfig::new(config.interval_seconds, time_range_hours, max_nodes)?;
        *config = next;
        Ok(next)
    }

    /// Manual refresh; leaves the timer alone.
    pub fn refresh(&self) -> TickOutcome {
        self.cycle.trigger()
    }

    /// Takes effect on the next render, including one already in flight.
    pub fn set_viewshed_limit(&self, limit_km: f64) -> ViewshedLimits {
        let mut limits = lock(&self.cycle.limits);
        *limits = ViewshedLimits {
            user_limit_km: ViewshedLimits::with_user_limit(limit_km).user_limit_km,
            ..*limits
        };
        *limits
    }

    /// Stops the timer. A pending request still completes and renders.
    pub fn destroy(&mut self) {
        self.stop_timer();
        let FetchMetrics {
            started,
            succeeded,
            failed,
            skipped_ticks,
        } = self.metrics();
        self.cycle.logger.record(&format!(
            "scheduler stopped: {started} fetches ({succeeded} ok, {failed} failed), {skipped_ticks} ticks skipped"
        ));
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.cycle.state.is_loading()
    }

    pub fn status(&self) -> ConnectionStatus {
        *lock(&self.cycle.status)
    }

    pub fn phase(&self) -> SchedulerPhase {
        if self.is_loading() {
            SchedulerPhase::Fetching
        } else if self.status() == ConnectionStatus::Error {
            SchedulerPhase::Error
        } else {
            SchedulerPhase::Idle
        }
    }

    pub fn config(&self) -> RefreshConfig {
        *lock(&self.cycle.config)
    }

    pub fn viewshed_limits(&self) -> ViewshedLimits {
        *lock(&self.cycle.limits)
    }

    pub fn metrics(&self) -> FetchMetrics {
        self.cycle.metrics.snapshot()
    }

    pub fn source(&self) -> &S {
        &self.cycle.source
    }

    pub fn sink(&self) -> &R {
        &self.cycle.sink
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl<S, R> Drop for RefreshScheduler<S, R> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

fn arm_timer<S: TelemetrySource, R: RenderSink>(
    cycle: Arc<FetchCycle<S, R>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let _ = cycle.trigger();
        }
    })
}
