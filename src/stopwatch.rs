use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopwatchState {
    Stopped,
    Running,
}

/// Elapsed-time tracker for a single revision.
///
/// Committed time lives in `accumulated`; while running, the live value is
/// derived from the captured start instant on every read, so how often the
/// caller redraws has no effect on the total.
#[derive(Debug, Clone)]
pub struct Stopwatch<C: Clock = SystemClock> {
    clock: C,
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl<C: Clock> Stopwatch<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            accumulated: Duration::ZERO,
            started_at: None,
        }
    }

    pub fn state(&self) -> StopwatchState {
        if self.started_at.is_some() {
            StopwatchState::Running
        } else {
            StopwatchState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn start(&mut self) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(self.clock.now());
        true
    }

    pub fn stop(&mut self) -> bool {
        let Some(started_at) = self.started_at.take() else {
            return false;
        };
        let window = self.clock.now().saturating_duration_since(started_at);
        self.accumulated = self.accumulated.saturating_add(window);
        true
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = None;
    }

    /// Seeds the committed total from persisted data. Ignored while running.
    pub fn set_time(&mut self, seconds: u64) -> bool {
        if self.started_at.is_some() {
            tracing::debug!(seconds, "ignoring set_time on a running stopwatch");
            return false;
        }
        self.accumulated = Duration::from_secs(seconds);
        true
    }

    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started_at) => {
                let window = self.clock.now().saturating_duration_since(started_at);
                self.accumulated.saturating_add(window)
            }
            None => self.accumulated,
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }

    pub fn committed_seconds(&self) -> u64 {
        self.accumulated.as_secs()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone)]
    pub struct ManualClock {
        origin: Instant,
        offset: Rc<Cell<Duration>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Rc::new(Cell::new(Duration::ZERO)),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.offset.set(self.offset.get() + by);
        }

        pub fn advance_secs(&self, secs: u64) {
            self.advance(Duration::from_secs(secs));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.origin + self.offset.get()
        }
    }
}
