//! Core constants for the door lock controller.
//!
//! This module collects every fixed value shared by the Control and HMI
//! nodes: the credential geometry, the persistent slot layout, the reference
//! timings and the wire vocabulary sizes. Values that an installation may
//! want to tune are mirrored as defaults in [`crate::config::DeviceConfig`].
//!
//! # Persistent Slot Layout
//!
//! ```text
//! 0x000                0x100          0x105                  0x7FF
//! |--------------------|ccccc|--------------------------------|
//!                       ^^^^^
//!                       credential, one byte per digit
//! ```
//!
//! Unwritten EEPROM cells read back as [`SLOT_SENTINEL`]; the slot is
//! considered blank only when every byte holds it.
//!
//! # Usage
//!
//! ```
//! use doorlock_core::constants::*;
//!
//! assert_eq!(CREDENTIAL_LEN, 5);
//! assert!(CREDENTIAL_BASE_ADDRESS as usize + CREDENTIAL_LEN <= STORE_CAPACITY);
//! ```

// ============================================================================
// Credential
// ============================================================================

/// Number of digits in a credential.
pub const CREDENTIAL_LEN: usize = 5;

/// Largest value a credential digit may hold.
///
/// Digits come from the numeric keys of the keypad, so they can never
/// collide with [`SLOT_SENTINEL`].
pub const MAX_CREDENTIAL_DIGIT: u8 = 9;

/// Build-time root credential accepted by the root-override path.
pub const ROOT_CREDENTIAL: [u8; CREDENTIAL_LEN] = [2, 6, 4, 9, 5];

// ============================================================================
// Persistent Store
// ============================================================================

/// Value of an erased EEPROM cell.
pub const SLOT_SENTINEL: u8 = 0xFF;

/// Base address of the credential slot.
pub const CREDENTIAL_BASE_ADDRESS: u16 = 0x0100;

/// Size of the 11-bit store address space in bytes.
pub const STORE_CAPACITY: usize = 2048;

/// Highest addressable store location.
pub const MAX_STORE_ADDRESS: u16 = 0x07FF;

/// Fixed high nibble of the EEPROM device-select byte.
pub const EEPROM_DEVICE_ADDRESS: u8 = 0xA0;

// ============================================================================
// Reference Timings
// ============================================================================

/// Settle time after each EEPROM byte write (milliseconds).
pub const DEFAULT_WRITE_SETTLE_MS: u64 = 10;

/// Time the door motor runs forward (seconds).
pub const DEFAULT_DOOR_OPEN_SECS: u64 = 10;

/// Time the door motor runs in reverse (seconds).
pub const DEFAULT_DOOR_CLOSE_SECS: u64 = 10;

/// Time without a key press before the HMI restarts (seconds).
pub const DEFAULT_ENTRY_TIMEOUT_SECS: u64 = 10;

/// Period of one input watchdog tick (milliseconds).
///
/// Matches one overflow of an 8-bit timer clocked at F_CPU/1024 on an
/// 8 MHz part.
pub const DEFAULT_TIMEOUT_TICK_MS: u64 = 32;

/// Consecutive mismatches that trigger a lockout.
pub const DEFAULT_MAX_ATTEMPTS: u8 = 3;

/// Time the alarm stays asserted during a lockout (seconds).
pub const DEFAULT_LOCKOUT_SECS: u64 = 60;

/// Time the root key must stay held to open the root-override prompt (seconds).
pub const DEFAULT_ROOT_HOLD_SECS: u64 = 3;

/// Provisioning prompts offered before giving up on a new credential.
pub const DEFAULT_MAX_PROVISIONING_ROUNDS: u8 = 5;

// ============================================================================
// Serial Line
// ============================================================================

/// UART bit rate shared by both nodes.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

// ============================================================================
// Countdown Hardware
// ============================================================================

/// CPU clock feeding the countdown prescaler.
pub const DEFAULT_CPU_HZ: u32 = 8_000_000;

/// Countdown prescaler.
pub const DEFAULT_PRESCALER: u32 = 1024;

/// Compare ticks per millisecond at the default clock and prescaler.
///
/// The board firmware rounds 7.8125 up to 8, giving a 1 s compare value
/// of 8000.
pub const DEFAULT_TICKS_PER_MS: u32 = 8;

/// Longest single countdown the 16-bit compare register can express
/// at [`DEFAULT_TICKS_PER_MS`] (milliseconds).
pub const DEFAULT_MAX_COUNTDOWN_MS: u64 = 8000;

// ============================================================================
// Display
// ============================================================================

/// Rows on the character display.
pub const DISPLAY_ROWS: usize = 2;

/// Columns on the character display.
pub const DISPLAY_COLUMNS: usize = 16;
