//! Mock output pin that records every level change with its time.
//!
//! Timestamps come from [`tokio::time::Instant`], so under a paused test
//! clock the recorded durations are exact.

use crate::{
    Result,
    traits::{OutputPin, PinState},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct PinLog {
    level: PinState,
    transitions: Vec<(Instant, PinState)>,
}

/// Mock digital output.
///
/// ```
/// use doorlock_hardware::mock::MockPin;
/// use doorlock_hardware::traits::{OutputPin, PinState};
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut buzzer, handle) = MockPin::new("buzzer");
///     buzzer.set_high().await?;
///     assert_eq!(handle.level(), PinState::High);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockPin {
    name: &'static str,
    log: Arc<Mutex<PinLog>>,
}

impl MockPin {
    /// Create a pin that starts low.
    pub fn new(name: &'static str) -> (Self, MockPinHandle) {
        let log = Arc::new(Mutex::new(PinLog {
            level: PinState::Low,
            transitions: Vec::new(),
        }));
        let pin = Self {
            name,
            log: Arc::clone(&log),
        };
        (pin, MockPinHandle { name, log })
    }

    /// Pin name.
    pub fn name(&self) -> &str {
        self.name
    }
}

impl OutputPin for MockPin {
    async fn set_state(&mut self, state: PinState) -> Result<()> {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        if log.level != state {
            log.level = state;
            log.transitions.push((Instant::now(), state));
        }
        Ok(())
    }
}

/// Handle for observing a mock pin.
#[derive(Debug, Clone)]
pub struct MockPinHandle {
    name: &'static str,
    log: Arc<Mutex<PinLog>>,
}

impl MockPinHandle {
    fn log(&self) -> MutexGuard<'_, PinLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pin name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Current level.
    pub fn level(&self) -> PinState {
        self.log().level
    }

    /// Check whether the pin is driven high.
    pub fn is_high(&self) -> bool {
        self.level() == PinState::High
    }

    /// Level changes with their timestamps, oldest first.
    pub fn transitions(&self) -> Vec<(Instant, PinState)> {
        self.log().transitions.clone()
    }

    /// Lengths of every completed high period, oldest first.
    pub fn high_periods(&self) -> Vec<Duration> {
        let log = self.log();
        let mut periods = Vec::new();
        let mut rose_at = None;
        for (at, state) in &log.transitions {
            match state {
                PinState::High => rose_at = Some(*at),
                PinState::Low => {
                    if let Some(start) = rose_at.take() {
                        periods.push(at.duration_since(start));
                    }
                }
            }
        }
        periods
    }

    /// Number of times the pin was driven high.
    pub fn rising_edges(&self) -> usize {
        self.log()
            .transitions
            .iter()
            .filter(|(_, state)| *state == PinState::High)
            .count()
    }
}
