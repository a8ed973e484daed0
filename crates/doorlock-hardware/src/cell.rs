//! Interrupt-to-main-loop handoff primitives.
//!
//! Each node has exactly two asynchronous event sources: a byte arriving on
//! the serial line and a countdown completing. Both are modeled here as
//! explicitly synchronized cells that are written by the event side and read
//! by the node's sequential main loop.
//!
//! # Receive Contract
//!
//! [`SingleSlot`] retains **at most one unread byte**. A second arrival before
//! the first is consumed discards the first; the discard is counted and
//! logged. There is no queue and no backpressure.
//!
//! ```
//! use doorlock_hardware::cell::SingleSlot;
//!
//! let slot = SingleSlot::new("uart0 rx");
//! assert_eq!(slot.deposit(0x01), None);
//! assert_eq!(slot.deposit(0x02), Some(0x01)); // 0x01 is lost
//! assert_eq!(slot.take(), Some(0x02));
//! assert_eq!(slot.dropped(), 1);
//! ```

use crate::{HardwareError, Result};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use tokio::sync::Notify;
use tracing::warn;

type Callback = Box<dyn Fn() + Send + Sync>;

/// Marker stored in the slot when no byte is pending.
const EMPTY: u16 = 0x0100;

/// One completion callback per event source, registered once.
pub struct CallbackSlot {
    source: &'static str,
    callback: OnceLock<Callback>,
}

impl CallbackSlot {
    /// Create an empty slot for the named event source.
    pub const fn new(source: &'static str) -> Self {
        Self {
            source,
            callback: OnceLock::new(),
        }
    }

    /// Register the completion callback.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::CallbackAlreadyRegistered` if a callback was
    /// registered before. The first registration stays in place.
    pub fn register(&self, callback: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.callback
            .set(Box::new(callback))
            .map_err(|_| HardwareError::callback_already_registered(self.source))
    }

    /// Check whether a callback has been registered.
    pub fn is_registered(&self) -> bool {
        self.callback.get().is_some()
    }

    /// Run the registered callback, if any.
    pub fn invoke(&self) {
        if let Some(callback) = self.callback.get() {
            callback();
        }
    }
}

impl std::fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("source", &self.source)
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Single-byte receive holding cell.
///
/// Written only by the receive side of a line, read only by the owning
/// node's main loop.
#[derive(Debug)]
pub struct SingleSlot {
    value: AtomicU16,
    dropped: AtomicU64,
    closed: AtomicBool,
    notify: Notify,
    on_receive: CallbackSlot,
}

impl SingleSlot {
    /// Create an empty slot.
    pub fn new(source: &'static str) -> Self {
        Self {
            value: AtomicU16::new(EMPTY),
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            notify: Notify::new(),
            on_receive: CallbackSlot::new(source),
        }
    }

    /// Deposit a received byte, returning the unread byte it displaced.
    pub fn deposit(&self, byte: u8) -> Option<u8> {
        let previous = self.value.swap(u16::from(byte), Ordering::AcqRel);
        let displaced = (previous != EMPTY).then_some(previous as u8);

        if let Some(lost) = displaced {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Receive overrun on {}: 0x{:02X} overwritten by 0x{:02X}",
                self.on_receive.source, lost, byte
            );
        }

        self.notify.notify_waiters();
        self.on_receive.invoke();
        displaced
    }

    /// Consume the pending byte, if any.
    pub fn take(&self) -> Option<u8> {
        let value = self.value.swap(EMPTY, Ordering::AcqRel);
        (value != EMPTY).then_some(value as u8)
    }

    /// Look at the pending byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        let value = self.value.load(Ordering::Acquire);
        (value != EMPTY).then_some(value as u8)
    }

    /// Wait until a byte is available and consume it.
    ///
    /// Returns `None` once the slot is closed and drained.
    pub async fn recv(&self) -> Option<u8> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(byte) = self.take() {
                return Some(byte);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }

            notified.await;
        }
    }

    /// Mark the line as closed and wake any waiter.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Check whether the line has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of bytes discarded by overruns so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Register the byte-received callback.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::CallbackAlreadyRegistered` on a second call.
    pub fn register_callback(&self, callback: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.on_receive.register(callback)
    }
}

/// Completion flag set by a countdown and cleared by its waiter.
#[derive(Debug)]
pub struct CompletionFlag {
    set: AtomicBool,
    notify: Notify,
}

impl CompletionFlag {
    /// Create a cleared flag.
    pub fn new() -> Self {
        Self {
            set: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Set the flag and wake the waiter.
    pub fn set(&self) {
        self.set.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Clear the flag without waiting.
    pub fn clear(&self) {
        self.set.store(false, Ordering::Release);
    }

    /// Check the flag without clearing it.
    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Wait for the flag, then clear it.
    pub async fn wait_and_clear(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.set.swap(false, Ordering::AcqRel) {
                return;
            }

            notified.await;
        }
    }
}

impl Default for CompletionFlag {
    fn default() -> Self {
        Self::new()
    }
}
