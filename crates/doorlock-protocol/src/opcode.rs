//! Opcode definitions for the inter-node command protocol.
//!
//! Every command byte on the serial line is either the handshake token or
//! one of the opcodes below. The token is distinct from all opcodes, so a
//! byte can always be classified without context.
//!
//! # Opcodes
//!
//! | Byte   | Opcode               | Sent by | Meaning                           |
//! |--------|----------------------|---------|-----------------------------------|
//! | `0x01` | handshake token      | both    | turn synchronization              |
//! | `0x02` | `CheckCredential`    | HMI     | compare the next 5 bytes          |
//! | `0x03` | `Match`              | Control | credential matched                |
//! | `0x04` | `Mismatch`           | Control | credential did not match          |
//! | `0x05` | `SetCredential`      | HMI     | store the next 5 bytes            |
//! | `0x06` | `OpenDoor`           | HMI     | run the door cycle                |
//! | `0x07` | `CredentialFound`    | Control | a credential is stored            |
//! | `0x08` | `CredentialNotFound` | Control | the slot is blank / store failed  |
//!
//! `CredentialFound` doubles as the HMI's status query after a restart;
//! Control answers it with its current slot status.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Turn-synchronization byte, distinct from every opcode.
pub const HANDSHAKE_TOKEN: u8 = 0x01;

/// Command protocol opcodes.
///
/// # Examples
///
/// ```
/// use doorlock_protocol::Opcode;
///
/// let op = Opcode::parse(0x02).unwrap();
/// assert_eq!(op, Opcode::CheckCredential);
/// assert_eq!(op.code(), 0x02);
///
/// assert!(Opcode::parse(0x01).is_err()); // handshake token
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    CheckCredential = 0x02,
    Match = 0x03,
    Mismatch = 0x04,
    SetCredential = 0x05,
    OpenDoor = 0x06,
    CredentialFound = 0x07,
    CredentialNotFound = 0x08,
}

impl Opcode {
    /// Every opcode, in wire order.
    pub const ALL: [Opcode; 7] = [
        Opcode::CheckCredential,
        Opcode::Match,
        Opcode::Mismatch,
        Opcode::SetCredential,
        Opcode::OpenDoor,
        Opcode::CredentialFound,
        Opcode::CredentialNotFound,
    ];

    /// Decode a command byte.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnknownOpcode` for any byte outside the
    /// opcode set, including the handshake token.
    pub fn parse(byte: u8) -> Result<Self> {
        match byte {
            0x02 => Ok(Opcode::CheckCredential),
            0x03 => Ok(Opcode::Match),
            0x04 => Ok(Opcode::Mismatch),
            0x05 => Ok(Opcode::SetCredential),
            0x06 => Ok(Opcode::OpenDoor),
            0x07 => Ok(Opcode::CredentialFound),
            0x08 => Ok(Opcode::CredentialNotFound),
            _ => Err(ProtocolError::UnknownOpcode { byte }),
        }
    }

    /// Wire byte of this opcode.
    #[inline]
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Returns `true` for opcodes the HMI sends to start an exchange.
    #[inline]
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Opcode::CheckCredential | Opcode::SetCredential | Opcode::OpenDoor
        )
    }

    /// Returns `true` for opcodes Control sends to close an exchange.
    #[inline]
    pub fn is_reply(&self) -> bool {
        !self.is_request()
    }

    /// Number of payload bytes that follow this opcode.
    pub fn payload_len(&self) -> usize {
        match self {
            Opcode::CheckCredential | Opcode::SetCredential => {
                doorlock_core::constants::CREDENTIAL_LEN
            }
            _ => 0,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self> {
        Self::parse(byte)
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op.code()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::CheckCredential => "check-credential",
            Opcode::Match => "match",
            Opcode::Mismatch => "mismatch",
            Opcode::SetCredential => "set-credential",
            Opcode::OpenDoor => "open-door",
            Opcode::CredentialFound => "credential-found",
            Opcode::CredentialNotFound => "credential-not-found",
        };
        write!(f, "{}(0x{:02X})", name, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x02, Opcode::CheckCredential)]
    #[case(0x03, Opcode::Match)]
    #[case(0x04, Opcode::Mismatch)]
    #[case(0x05, Opcode::SetCredential)]
    #[case(0x06, Opcode::OpenDoor)]
    #[case(0x07, Opcode::CredentialFound)]
    #[case(0x08, Opcode::CredentialNotFound)]
    fn test_parse_known_opcodes(#[case] byte: u8, #[case] expected: Opcode) {
        assert_eq!(Opcode::parse(byte).unwrap(), expected);
        assert_eq!(expected.code(), byte);
    }

    #[rstest]
    #[case(0x00)]
    #[case(HANDSHAKE_TOKEN)]
    #[case(0x09)]
    #[case(0xFF)]
    fn test_parse_rejects_unknown(#[case] byte: u8) {
        assert!(matches!(
            Opcode::parse(byte),
            Err(ProtocolError::UnknownOpcode { byte: b }) if b == byte
        ));
    }

    #[test]
    fn test_token_distinct_from_all_opcodes() {
        assert!(Opcode::ALL.iter().all(|op| op.code() != HANDSHAKE_TOKEN));
    }

    #[test]
    fn test_request_and_reply_partition() {
        let requests: Vec<_> = Opcode::ALL.iter().filter(|op| op.is_request()).collect();
        assert_eq!(requests.len(), 3);
        assert!(Opcode::Match.is_reply());
        assert!(Opcode::CredentialNotFound.is_reply());
    }

    #[test]
    fn test_payload_lengths() {
        assert_eq!(Opcode::CheckCredential.payload_len(), 5);
        assert_eq!(Opcode::SetCredential.payload_len(), 5);
        assert_eq!(Opcode::OpenDoor.payload_len(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::OpenDoor.to_string(), "open-door(0x06)");
    }
}
