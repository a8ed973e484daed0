//! Error types for the command protocol.

use crate::Opcode;
use doorlock_hardware::HardwareError;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while framing or exchanging commands.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A command byte outside the opcode set was received.
    #[error("Unknown opcode: 0x{byte:02X}")]
    UnknownOpcode { byte: u8 },

    /// A valid opcode arrived where a different one was required.
    #[error("Unexpected opcode {actual}, expected {expected}")]
    UnexpectedOpcode {
        expected: &'static str,
        actual: Opcode,
    },

    /// The byte channel failed.
    #[error("Transport error: {0}")]
    Hardware(#[from] HardwareError),
}

impl ProtocolError {
    /// Create an unexpected opcode error.
    pub fn unexpected(expected: &'static str, actual: Opcode) -> Self {
        Self::UnexpectedOpcode { expected, actual }
    }
}
