//! Scoped stage timing for the analysis pipeline.
//!
//! A [`TimingGuard`] records when a stage starts and, when dropped, logs how
//! long it ran under the `mukha::telemetry` target. Guards are inert unless
//! telemetry has been switched on with [`configure`] and the logger accepts
//! the requested level, so the cost on the hot path is a couple of atomic loads.

use std::{
    borrow::Cow,
    sync::atomic::{AtomicU8, Ordering},
    time::{Duration, Instant},
};

use log::{Level, LevelFilter, log, log_enabled};

pub const TELEMETRY_TARGET: &str = "mukha::telemetry";

/// Highest level telemetry may log at; `0` means telemetry is off.
static TELEMETRY_LEVEL: AtomicU8 = AtomicU8::new(0);

/// Logs the elapsed time of a stage when dropped.
pub struct TimingGuard {
    label: Cow<'static, str>,
    level: Level,
    start: Instant,
    active: bool,
}

impl TimingGuard {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if self.active {
            log!(
                target: TELEMETRY_TARGET,
                self.level,
                "{} completed in {:.2?}",
                self.label,
                self.start.elapsed()
            );
        }
    }
}

/// Start timing a stage. Logs on drop when telemetry allows `level`.
pub fn timing_guard(label: impl Into<Cow<'static, str>>, level: Level) -> TimingGuard {
    let active = telemetry_allows(level) && log_enabled!(target: TELEMETRY_TARGET, level);
    TimingGuard {
        label: label.into(),
        level,
        start: Instant::now(),
        active,
    }
}

/// Enable or disable telemetry and set its maximum level.
pub fn configure(enabled: bool, level: LevelFilter) {
    let value = if enabled { filter_rank(level) } else { 0 };
    TELEMETRY_LEVEL.store(value, Ordering::Relaxed);
}

pub fn telemetry_enabled() -> bool {
    TELEMETRY_LEVEL.load(Ordering::Relaxed) > 0
}

/// Returns `true` when telemetry is on and `level` is within its threshold.
pub fn telemetry_allows(level: Level) -> bool {
    let threshold = TELEMETRY_LEVEL.load(Ordering::Relaxed);
    threshold > 0 && filter_rank(level.to_level_filter()) <= threshold
}

fn filter_rank(filter: LevelFilter) -> u8 {
    match filter {
        LevelFilter::Off => 0,
        LevelFilter::Error => 1,
        LevelFilter::Warn => 2,
        LevelFilter::Info => 3,
        LevelFilter::Debug => 4,
        LevelFilter::Trace => 5,
    }
}
