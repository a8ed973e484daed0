//! Common test utilities for storage integration tests.

#![allow(dead_code)]

use doorlock_core::config::TimerConfig;
use doorlock_hardware::mock::{MockEeprom, MockEepromHandle};
use doorlock_hardware::timer::DelayTimer;
use doorlock_storage::{CredentialSlot, Eeprom};
use std::time::Duration;

/// Settle time used by every test.
pub const SETTLE: Duration = Duration::from_millis(10);

/// A blank slot on a mock EEPROM, its handle and a delay timer.
pub fn blank_slot() -> (CredentialSlot<MockEeprom>, MockEepromHandle, DelayTimer) {
    let (bus, handle) = MockEeprom::new();
    (
        CredentialSlot::new(Eeprom::new(bus)),
        handle,
        DelayTimer::new(TimerConfig::default()),
    )
}

/// Current-thread runtime with a paused clock, for use inside proptest.
pub fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}
