//! The sampling loop.
//!
//! Each tick polls the sensors, appends the sample, forwards the pressure
//! to the secondary sensor, updates the snapshot, and every
//! `render_every` ticks hands a render to the [`RenderDispatcher`].
//! Nothing the renderer or presenter does can stop the loop; only sustained
//! sensor failure is fatal.

use std::future::Future;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use envlog_core::{BackoffConfig, SensorBus, SensorReader};
use envlog_store::Store;
use envlog_types::Sample;

use crate::config::{Config, OverlapPolicy};
use crate::dispatch::{DispatchOutcome, RenderDispatcher};
use crate::presenter::Presenter;
use crate::render::Renderer;

/// Source of "now" in Unix seconds.
pub trait Clock: Send {
    fn now(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

impl<F> Clock for F
where
    F: Fn() -> i64 + Send,
{
    fn now(&self) -> i64 {
        self()
    }
}

/// Scheduler errors. All of them end the loop.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Sensor failed {failures} times in a row, giving up: {last}")]
    SensorFailure {
        failures: u32,
        #[source]
        last: envlog_core::Error,
    },
}

/// Loop settings.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Time between ticks.
    pub interval: Duration,
    /// Dispatch a render every this many ticks.
    pub render_every: u64,
    /// Delay before the first tick.
    pub warmup: Duration,
    /// Consecutive sensor failures that end the loop.
    pub max_consecutive_failures: u32,
    /// Trailing window passed to the renderer.
    pub window_secs: i64,
    pub overlap: OverlapPolicy,
    /// Extra delay after a failed tick.
    pub backoff: BackoffConfig,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            render_every: 2,
            warmup: Duration::ZERO,
            max_consecutive_failures: 5,
            window_secs: 86_400,
            overlap: OverlapPolicy::Skip,
            backoff: BackoffConfig::default(),
        }
    }
}

impl SchedulerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.sampling.interval(),
            render_every: config.sampling.render_every.max(1),
            warmup: Duration::from_secs(config.sampling.warmup_secs),
            max_consecutive_failures: config.sampling.max_consecutive_failures.max(1),
            window_secs: config.render.window_secs,
            overlap: config.render.overlap,
            // Never back off for longer than a few intervals
            backoff: BackoffConfig::default().max_delay(config.sampling.interval() * 4),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// 1-based tick number.
    pub tick: u64,
    pub now: i64,
    /// The sample polled this tick, if the sensor had one.
    pub sample: Option<Sample>,
    /// Whether the sample was appended to the store.
    pub stored: bool,
    /// Set on render ticks.
    pub render: Option<DispatchOutcome>,
}

/// Fixed-interval sampling loop.
pub struct Scheduler<B, C = SystemClock> {
    reader: SensorReader<B>,
    store: Store,
    presenter: Presenter,
    renderer: Renderer,
    dispatcher: RenderDispatcher,
    clock: C,
    settings: SchedulerSettings,
    ticks: u64,
    consecutive_failures: u32,
}

impl<B: SensorBus> Scheduler<B, SystemClock> {
    pub fn new(
        reader: SensorReader<B>,
        store: Store,
        presenter: Presenter,
        renderer: Renderer,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            reader,
            store,
            presenter,
            renderer,
            dispatcher: RenderDispatcher::new(settings.overlap),
            clock: SystemClock,
            settings,
            ticks: 0,
            consecutive_failures: 0,
        }
    }
}

impl<B: SensorBus, C: Clock> Scheduler<B, C> {
    /// Replace the clock.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Scheduler<B, C2> {
        Scheduler {
            reader: self.reader,
            store: self.store,
            presenter: self.presenter,
            renderer: self.renderer,
            dispatcher: self.dispatcher,
            clock,
            settings: self.settings,
            ticks: self.ticks,
            consecutive_failures: self.consecutive_failures,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn dispatcher(&self) -> &RenderDispatcher {
        &self.dispatcher
    }

    pub fn reader(&self) -> &SensorReader<B> {
        &self.reader
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run one tick.
    ///
    /// Fails only when the sensor has now failed
    /// `max_consecutive_failures` times in a row.
    pub async fn tick(&mut self) -> Result<TickReport, SchedulerError> {
        self.dispatcher.reap().await;

        self.ticks += 1;
        let now = self.clock.now();
        let mut report = TickReport {
            tick: self.ticks,
            now,
            sample: None,
            stored: false,
            render: None,
        };

        let sensor_result = match self.poll(now).await {
            Ok(Some(sample)) => {
                let (stored, calibrated) = self.handle_sample(&sample).await;
                report.stored = stored;
                report.sample = Some(sample);
                calibrated
            }
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };

        match sensor_result {
            Ok(()) => {
                if self.consecutive_failures > 0 {
                    info!(
                        "Sensor recovered after {} failed tick(s)",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
            }
            Err(e) => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.settings.max_consecutive_failures {
                    error!(
                        "Sensor failed {} times in a row: {}",
                        self.consecutive_failures, e
                    );
                    return Err(SchedulerError::SensorFailure {
                        failures: self.consecutive_failures,
                        last: e,
                    });
                }
                warn!(
                    "Sensor failure: {} (attempt {} of {})",
                    e, self.consecutive_failures, self.settings.max_consecutive_failures
                );
            }
        }

        if self.ticks % self.settings.render_every.max(1) == 0 {
            report.render = Some(self.dispatch_render(now).await);
        }

        Ok(report)
    }

    async fn poll(&mut self, now: i64) -> envlog_core::Result<Option<Sample>> {
        let reading = self.reader.poll(now).await?;
        match reading {
            Some(reading) => Ok(Some(reading.into_sample()?)),
            None => {
                debug!("No fresh measurement at {}", now);
                Ok(None)
            }
        }
    }

    /// Append, calibrate and present one sample.
    ///
    /// Returns whether the sample was stored, and the calibration result.
    /// Calibration runs for every reading; a duplicate is not presented
    /// because the snapshot for that timestamp is already out.
    async fn handle_sample(&mut self, sample: &Sample) -> (bool, envlog_core::Result<()>) {
        let (stored, duplicate) = match self.store.append(sample) {
            Ok(()) => (true, false),
            Err(envlog_store::Error::DuplicateTimestamp(ts)) => {
                warn!("Dropping sample: one already stored for {}", ts);
                (false, true)
            }
            Err(e) => {
                error!("Failed to store sample for {}: {}", sample.timestamp, e);
                (false, false)
            }
        };

        let calibrated = self.reader.calibrate(sample.pressure_hpa).await;
        if let Err(e) = &calibrated {
            warn!("Failed to forward ambient pressure: {}", e);
        }

        if !duplicate && let Err(e) = self.presenter.emit(sample) {
            error!("Failed to present snapshot: {}", e);
        }

        (stored, calibrated)
    }

    async fn dispatch_render(&mut self, now: i64) -> DispatchOutcome {
        let renderer = self.renderer.clone();
        let window = self.settings.window_secs;
        let outcome = self
            .dispatcher
            .dispatch(move || renderer.render(now, window))
            .await;
        debug!("Render dispatch at tick {}: {:?}", self.ticks, outcome);
        outcome
    }

    /// Run until the sensor fails for good. Never returns `Ok`.
    pub async fn run(&mut self) -> Result<(), SchedulerError> {
        self.run_until(std::future::pending()).await
    }

    /// Run until `shutdown` completes or the sensor fails for good.
    ///
    /// Any in-flight render is joined before returning.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), SchedulerError>
    where
        F: Future<Output = ()>,
    {
        let result = tokio::select! {
            biased;
            () = shutdown => {
                info!("Shutdown requested");
                Ok(())
            }
            result = self.run_loop() => result,
        };

        if self.dispatcher.in_flight() {
            info!("Waiting for the running render to finish");
        }
        self.dispatcher.join().await;
        result
    }

    async fn run_loop(&mut self) -> Result<(), SchedulerError> {
        info!(
            "Sampling every {:?}, rendering every {} tick(s)",
            self.settings.interval, self.settings.render_every
        );

        if !self.settings.warmup.is_zero() {
            info!("Waiting {:?} for the first measurement", self.settings.warmup);
            tokio::time::sleep(self.settings.warmup).await;
        }

        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.tick().await?;

            if self.consecutive_failures > 0 {
                let delay = self
                    .settings
                    .backoff
                    .delay_for_attempt(self.consecutive_failures - 1);
                if !delay.is_zero() {
                    debug!("Backing off for {:?}", delay);
                    tokio::time::sleep(delay).await;
                    interval.reset();
                }
            }
        }
    }
}
