//! Hardware device trait definitions.
//!
//! These traits are the contract between the two node state machines and
//! their I/O collaborators: the serial line, the two-wire bus, the keypad,
//! the character display and plain output pins. None of them carries
//! protocol logic; they move bytes, keys, text and pin levels.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-to-point, half-duplex byte link between the two nodes.
///
/// The receive side retains at most one unread byte (see
/// [`SingleSlot`](crate::cell::SingleSlot)); callers must alternate turns so
/// that a byte is consumed before the peer sends the next one.
pub trait ByteChannel: Send + Sync {
    /// Transmit one byte, returning once it has left the transmitter.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is disconnected.
    async fn send_byte(&mut self, byte: u8) -> Result<()>;

    /// Wait for the next received byte and consume it.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is disconnected.
    async fn receive_byte(&mut self) -> Result<u8>;
}

/// Two-wire bus controller status, as reported after each phase.
///
/// Codes are the upper five bits of the controller's status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusStatus {
    /// START condition transmitted (0x08).
    Start,
    /// Repeated START condition transmitted (0x10).
    RepeatedStart,
    /// Device select with write intent acknowledged (0x18).
    SelectWriteAck,
    /// Device select with write intent not acknowledged (0x20).
    SelectWriteNack,
    /// Data byte transmitted and acknowledged (0x28).
    DataSentAck,
    /// Data byte transmitted, not acknowledged (0x30).
    DataSentNack,
    /// Arbitration lost (0x38).
    ArbitrationLost,
    /// Device select with read intent acknowledged (0x40).
    SelectReadAck,
    /// Device select with read intent not acknowledged (0x48).
    SelectReadNack,
    /// Data byte received, acknowledgment returned (0x50).
    DataReceivedAck,
    /// Data byte received, no acknowledgment returned (0x58).
    DataReceivedNack,
    /// No relevant state information (0xF8).
    Idle,
    /// Illegal START/STOP, bus error (0x00).
    BusFault,
    /// Any other status code.
    Other(u8),
}

impl BusStatus {
    /// Decode a raw status register value (prescaler bits are masked off).
    pub fn from_register(register: u8) -> Self {
        match register & 0xF8 {
            0x08 => Self::Start,
            0x10 => Self::RepeatedStart,
            0x18 => Self::SelectWriteAck,
            0x20 => Self::SelectWriteNack,
            0x28 => Self::DataSentAck,
            0x30 => Self::DataSentNack,
            0x38 => Self::ArbitrationLost,
            0x40 => Self::SelectReadAck,
            0x48 => Self::SelectReadNack,
            0x50 => Self::DataReceivedAck,
            0x58 => Self::DataReceivedNack,
            0xF8 => Self::Idle,
            0x00 => Self::BusFault,
            other => Self::Other(other),
        }
    }

    /// Raw status code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Start => 0x08,
            Self::RepeatedStart => 0x10,
            Self::SelectWriteAck => 0x18,
            Self::SelectWriteNack => 0x20,
            Self::DataSentAck => 0x28,
            Self::DataSentNack => 0x30,
            Self::ArbitrationLost => 0x38,
            Self::SelectReadAck => 0x40,
            Self::SelectReadNack => 0x48,
            Self::DataReceivedAck => 0x50,
            Self::DataReceivedNack => 0x58,
            Self::Idle => 0xF8,
            Self::BusFault => 0x00,
            Self::Other(code) => *code,
        }
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:02X})", self, self.code())
    }
}

/// Phase of a store transaction on the two-wire bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusPhase {
    /// Initial START.
    Start,
    /// Device select with write intent.
    SelectWrite,
    /// Low address byte.
    Address,
    /// Data byte of a write.
    WriteData,
    /// Repeated START of a read.
    RepeatedStart,
    /// Device select with read intent.
    SelectRead,
    /// Data byte of a read.
    ReadData,
}

impl BusPhase {
    /// Status the controller reports when this phase succeeds.
    pub fn success_status(&self) -> BusStatus {
        match self {
            BusPhase::Start => BusStatus::Start,
            BusPhase::SelectWrite => BusStatus::SelectWriteAck,
            BusPhase::Address | BusPhase::WriteData => BusStatus::DataSentAck,
            BusPhase::RepeatedStart => BusStatus::RepeatedStart,
            BusPhase::SelectRead => BusStatus::SelectReadAck,
            BusPhase::ReadData => BusStatus::DataReceivedNack,
        }
    }
}

impl fmt::Display for BusPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BusPhase::Start => "start",
            BusPhase::SelectWrite => "select-write",
            BusPhase::Address => "address",
            BusPhase::WriteData => "write-data",
            BusPhase::RepeatedStart => "repeated-start",
            BusPhase::SelectRead => "select-read",
            BusPhase::ReadData => "read-data",
        };
        f.write_str(name)
    }
}

/// Byte-level primitives of a two-wire bus controller in master mode.
///
/// Every primitive returns once the controller flags the phase complete;
/// the outcome of the phase is then read from [`TwoWireBus::status`].
/// Transaction sequencing and status checking live in the store driver.
pub trait TwoWireBus: Send + Sync {
    /// Program the clock divider (bit-rate register, zero prescaler).
    fn set_bit_rate(&mut self, register: u8);

    /// Assert a START (or repeated START inside a transaction).
    async fn start(&mut self) -> Result<()>;

    /// Assert a STOP. Does not wait for a status.
    async fn stop(&mut self) -> Result<()>;

    /// Transmit one byte.
    async fn write(&mut self, byte: u8) -> Result<()>;

    /// Receive one byte and acknowledge it (more bytes wanted).
    async fn read_with_ack(&mut self) -> Result<u8>;

    /// Receive one byte and withhold the acknowledgment (last byte).
    async fn read_with_nack(&mut self) -> Result<u8>;

    /// Status of the last completed phase.
    fn status(&self) -> BusStatus;
}

/// Input from the keypad.
///
/// The HMI uses a 4x4 calculator-style keypad: ten digits, four
/// arithmetic keys, `=` and the clear key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum KeypadInput {
    /// Numeric digit (0-9).
    Digit(u8),

    /// `+` key.
    Plus,

    /// `-` key.
    Minus,

    /// `*` key.
    Multiply,

    /// `/` key.
    Divide,

    /// `=` key.
    Equals,

    /// ON/C key.
    Clear,
}

impl KeypadInput {
    /// Create a digit input.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::traits::KeypadInput;
    ///
    /// let input = KeypadInput::digit(5).unwrap();
    /// assert_eq!(input.as_digit(), Some(5));
    ///
    /// assert!(KeypadInput::digit(10).is_err());
    /// ```
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(crate::error::HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {}",
                d
            )));
        }
        Ok(Self::Digit(d))
    }

    /// Map a key label to an input.
    ///
    /// ```
    /// use doorlock_hardware::traits::KeypadInput;
    ///
    /// assert_eq!(KeypadInput::from_char('7'), Some(KeypadInput::Digit(7)));
    /// assert_eq!(KeypadInput::from_char('='), Some(KeypadInput::Equals));
    /// assert_eq!(KeypadInput::from_char('x'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => c.to_digit(10).map(|d| Self::Digit(d as u8)),
            '+' => Some(Self::Plus),
            '-' => Some(Self::Minus),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            '=' => Some(Self::Equals),
            'c' | 'C' => Some(Self::Clear),
            _ => None,
        }
    }

    /// Check if this input is a digit.
    pub fn is_digit(&self) -> bool {
        matches!(self, Self::Digit(_))
    }

    /// Get the digit value if this is a digit input.
    pub fn as_digit(&self) -> Option<u8> {
        match self {
            Self::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

/// Keypad device abstraction.
pub trait KeypadDevice: Send + Sync {
    /// Wait for the next key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected.
    async fn read_input(&mut self) -> Result<KeypadInput>;

    /// Scan whether `key` is held down right now.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected.
    async fn is_held(&mut self, key: KeypadInput) -> Result<bool>;
}

/// Character display abstraction (2 rows x 16 columns on the HMI).
pub trait DisplayDevice: Send + Sync {
    /// Blank the whole display.
    async fn clear(&mut self) -> Result<()>;

    /// Write `text` starting at `row`, `column`. Text past the last column
    /// is clipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `row` is out of range or the device is
    /// disconnected.
    async fn write_at(&mut self, row: usize, column: usize, text: &str) -> Result<()>;
}

/// Logic level of an output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinState {
    /// Driven low.
    Low,
    /// Driven high.
    High,
}

/// Single digital output (motor driver input, buzzer).
pub trait OutputPin: Send + Sync {
    /// Drive the pin to `state`.
    async fn set_state(&mut self, state: PinState) -> Result<()>;

    /// Drive the pin high.
    async fn set_high(&mut self) -> Result<()> {
        self.set_state(PinState::High).await
    }

    /// Drive the pin low.
    async fn set_low(&mut self) -> Result<()> {
        self.set_state(PinState::Low).await
    }
}
