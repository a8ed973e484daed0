//! Hardware abstraction layer for the door lock nodes.
//!
//! The Control and HMI nodes talk to their peripherals only through the
//! traits in [`traits`]:
//!
//! - [`ByteChannel`]: the serial line between the two nodes.
//! - [`TwoWireBus`]: the bus controller in front of the EEPROM.
//! - [`KeypadDevice`], [`DisplayDevice`], [`OutputPin`]: keypad scan,
//!   character display, motor and buzzer drive.
//!
//! # Design
//!
//! - **Async-first**: all I/O uses native `async fn` in traits (Rust 1.90 +
//!   Edition 2024 RPITIT).
//! - **Thread-safe**: all traits require `Send + Sync` for use with Tokio.
//! - **Explicit event cells**: byte arrival and countdown completion are
//!   modeled in [`cell`] as single-slot cells, completion flags and
//!   register-once callbacks instead of shared globals.
//!
//! # Timing
//!
//! [`timer`] provides the blocking delay and the accumulating input
//! watchdog. Both run on tokio time, so tests can use a paused clock.
//!
//! # Mock Implementations
//!
//! [`mock`] holds in-process versions of every peripheral, each returned
//! with a handle for driving and observing it. The real UART transport is
//! available behind the `hardware-serial` feature.
//!
//! ```no_run
//! use doorlock_hardware::traits::{KeypadDevice, KeypadInput};
//! use doorlock_hardware::Result;
//!
//! async fn read_digit<K: KeypadDevice>(keypad: &mut K) -> Result<u8> {
//!     loop {
//!         if let KeypadInput::Digit(d) = keypad.read_input().await? {
//!             return Ok(d);
//!         }
//!     }
//! }
//! ```

pub mod cell;
pub mod devices;
pub mod error;
pub mod mock;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod timer;
pub mod traits;

pub use error::{HardwareError, Result};
pub use traits::{
    BusPhase, BusStatus, ByteChannel, DisplayDevice, KeypadDevice, KeypadInput, OutputPin, PinState,
    TwoWireBus,
};
