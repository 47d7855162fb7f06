use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// One-second heartbeat for the scoring engine's countdown.
///
/// The runtime awaits [`tick`] as one branch of its select loop and only
/// forwards the tick to the engine while a run is in progress, so a tick
/// that lands after a reset or a finish mutates nothing.
///
/// [`tick`]: CountdownTimer::tick
#[derive(Debug)]
pub struct CountdownTimer {
    interval: Interval,
}

impl CountdownTimer {
    pub fn new() -> Self {
        let period = Duration::from_secs(1);
        // First tick a full second out; an immediate tick would shave a
        // second off the countdown.
        let mut interval = interval_at(Instant::now() + period, period);
        // A stalled task must not burst-deliver missed seconds.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Complete when the next whole second has passed.
    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }

    /// Restart the cadence, discarding any pending tick.
    pub fn reset(&mut self) {
        self.interval.reset();
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}
