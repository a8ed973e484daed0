//! Countdown-backed delay and input timeout services.
//!
//! Two independent uses of the countdown hardware:
//!
//! - [`DelayTimer`] arms a one-shot countdown and waits for its completion
//!   flag. Delays longer than the compare register can express are issued
//!   as a series of countdowns.
//! - [`InputWatchdog`] runs a free-running countdown whose completion
//!   increments a tick counter. When the counter reaches its limit the
//!   watchdog fires; the HMI arms it around every key wait.
//!
//! Both run their countdown on a spawned tokio task standing in for the
//! interrupt context, so they need a tokio runtime. Under a paused test
//! clock (`start_paused = true`) delays complete instantly in wall time
//! while keeping exact virtual durations.

use crate::Result;
use crate::cell::{CallbackSlot, CompletionFlag};
use doorlock_core::config::TimerConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

struct CountdownShared {
    complete: CompletionFlag,
    on_complete: CallbackSlot,
}

/// Blocking millisecond/second delay primitive.
pub struct DelayTimer {
    config: TimerConfig,
    shared: Arc<CountdownShared>,
    countdown: Option<JoinHandle<()>>,
}

impl DelayTimer {
    /// Create a delay timer for the given countdown hardware.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            shared: Arc::new(CountdownShared {
                complete: CompletionFlag::new(),
                on_complete: CallbackSlot::new("delay countdown"),
            }),
            countdown: None,
        }
    }

    /// Register the countdown-complete callback.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::CallbackAlreadyRegistered` on a second call.
    pub fn register_callback(&self, callback: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.shared.on_complete.register(callback)
    }

    /// Sleep for `duration`.
    ///
    /// The duration is split into countdowns no longer than the configured
    /// maximum; each one is armed, awaited through the completion flag and
    /// the flag cleared before the next is armed.
    pub async fn delay(&mut self, duration: Duration) {
        let max = self.config.max_countdown();
        let mut remaining = duration;

        while !remaining.is_zero() {
            let chunk = remaining.min(max);
            self.arm(chunk);
            self.shared.complete.wait_and_clear().await;
            remaining -= chunk;
        }
    }

    fn arm(&mut self, duration: Duration) {
        if let Some(previous) = self.countdown.take() {
            previous.abort();
        }
        self.shared.complete.clear();

        trace!(
            "Countdown armed: {}ms (compare {})",
            duration.as_millis(),
            self.config.compare_value(duration.as_millis() as u64)
        );

        let shared = Arc::clone(&self.shared);
        self.countdown = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            shared.complete.set();
            shared.on_complete.invoke();
        }));
    }
}

impl Drop for DelayTimer {
    fn drop(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.abort();
        }
    }
}

impl std::fmt::Debug for DelayTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayTimer")
            .field("config", &self.config)
            .field("armed", &self.countdown.is_some())
            .finish()
    }
}

struct WatchdogShared {
    ticks: AtomicU32,
    fired: AtomicBool,
    notify: Notify,
    on_tick: CallbackSlot,
}

/// Accumulating input timeout.
///
/// ```
/// use doorlock_hardware::timer::InputWatchdog;
/// use std::time::Duration;
///
/// #[tokio::main(flavor = "current_thread", start_paused = true)]
/// async fn main() {
///     let mut watchdog = InputWatchdog::new(Duration::from_millis(32), 313);
///     watchdog.arm();
///     watchdog.expired().await;
///     assert!(watchdog.has_fired());
///     watchdog.disarm();
/// }
/// ```
pub struct InputWatchdog {
    tick: Duration,
    limit: u32,
    shared: Arc<WatchdogShared>,
    task: Option<JoinHandle<()>>,
}

impl InputWatchdog {
    /// Create a watchdog that fires after `limit` ticks of `tick`.
    pub fn new(tick: Duration, limit: u32) -> Self {
        Self {
            tick,
            limit,
            shared: Arc::new(WatchdogShared {
                ticks: AtomicU32::new(0),
                fired: AtomicBool::new(false),
                notify: Notify::new(),
                on_tick: CallbackSlot::new("input watchdog"),
            }),
            task: None,
        }
    }

    /// Register the per-tick callback.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::CallbackAlreadyRegistered` on a second call.
    pub fn register_callback(&self, callback: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.shared.on_tick.register(callback)
    }

    /// Total time after which an armed watchdog fires.
    pub fn timeout(&self) -> Duration {
        self.tick * self.limit
    }

    /// Reset the tick counter and start counting.
    pub fn arm(&mut self) {
        self.stop();
        self.shared.ticks.store(0, Ordering::Release);
        self.shared.fired.store(false, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let tick = self.tick;
        let limit = self.limit;
        self.task = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + tick;
            let mut interval = tokio::time::interval_at(start, tick);
            loop {
                interval.tick().await;
                let count = shared.ticks.fetch_add(1, Ordering::AcqRel) + 1;
                shared.on_tick.invoke();
                if count >= limit {
                    debug!("Input watchdog fired after {} ticks", count);
                    shared.fired.store(true, Ordering::Release);
                    shared.notify.notify_waiters();
                    break;
                }
            }
        }));
    }

    /// Stop counting and reset the tick counter.
    pub fn disarm(&mut self) {
        self.stop();
        self.shared.ticks.store(0, Ordering::Release);
    }

    /// Ticks accumulated since the last arm.
    pub fn elapsed_ticks(&self) -> u32 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    /// Check whether the watchdog fired since the last arm.
    pub fn has_fired(&self) -> bool {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// Wait until the armed watchdog fires.
    ///
    /// Never completes if the watchdog is not armed.
    pub async fn expired(&self) {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.has_fired() {
                return;
            }

            notified.await;
        }
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for InputWatchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for InputWatchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputWatchdog")
            .field("tick", &self.tick)
            .field("limit", &self.limit)
            .field("elapsed_ticks", &self.elapsed_ticks())
            .finish()
    }
}
