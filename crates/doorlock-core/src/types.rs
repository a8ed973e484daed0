use crate::{
    Result,
    constants::{CREDENTIAL_LEN, MAX_CREDENTIAL_DIGIT},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-length credential (5 keypad digits).
///
/// The value is compared as plain bytes. `Debug` and `Display` redact the
/// digits so a credential never ends up in a log line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Credential(pub(crate) [u8; CREDENTIAL_LEN]);

impl Credential {
    /// Create a credential from keypad digits.
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` if any digit is above 9.
    pub fn new(digits: [u8; CREDENTIAL_LEN]) -> Result<Self> {
        if let Some(pos) = digits.iter().position(|d| *d > MAX_CREDENTIAL_DIGIT) {
            return Err(Error::InvalidCredential(format!(
                "digit {} at position {pos} is not 0-{MAX_CREDENTIAL_DIGIT}",
                digits[pos]
            )));
        }
        Ok(Self(digits))
    }

    /// Create a credential from a byte slice received over the wire.
    ///
    /// # Errors
    /// Returns `Error::CredentialLength` on a short or long slice and
    /// `Error::InvalidCredential` on a non-digit byte.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let digits: [u8; CREDENTIAL_LEN] =
            bytes.try_into().map_err(|_| Error::CredentialLength {
                expected: CREDENTIAL_LEN,
                actual: bytes.len(),
            })?;
        Self::new(digits)
    }

    /// Raw digit bytes, in entry order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CREDENTIAL_LEN] {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(*****)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", "*".repeat(CREDENTIAL_LEN))
    }
}

impl TryFrom<Vec<u8>> for Credential {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_slice(&bytes)
    }
}

impl From<Credential> for Vec<u8> {
    fn from(credential: Credential) -> Self {
        credential.0.to_vec()
    }
}

/// Which node of the device a component runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Holds the credential and drives the door motor.
    Control,
    /// Reads the keypad and drives the display.
    Hmi,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NodeRole::Control => write!(f, "control"),
            NodeRole::Hmi => write!(f, "hmi"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_credential_valid() {
        let credential = Credential::new([2, 6, 4, 9, 5]).unwrap();
        assert_eq!(credential.as_bytes(), &[2, 6, 4, 9, 5]);
    }

    #[rstest]
    #[case([10, 0, 0, 0, 0])]
    #[case([0, 0, 0, 0, 0xFF])]
    #[case([1, 2, 3, 42, 4])]
    fn test_credential_rejects_non_digits(#[case] digits: [u8; CREDENTIAL_LEN]) {
        assert!(matches!(
            Credential::new(digits),
            Err(Error::InvalidCredential(_))
        ));
    }

    #[rstest]
    #[case(&[1, 2, 3, 4])]
    #[case(&[1, 2, 3, 4, 5, 6])]
    #[case(&[])]
    fn test_credential_from_slice_wrong_length(#[case] bytes: &[u8]) {
        assert!(matches!(
            Credential::from_slice(bytes),
            Err(Error::CredentialLength { expected: 5, .. })
        ));
    }

    #[test]
    fn test_credential_is_redacted() {
        let credential = Credential::new([2, 6, 4, 9, 5]).unwrap();
        assert_eq!(format!("{credential:?}"), "Credential(*****)");
        assert_eq!(credential.to_string(), "*****");
    }

    #[test]
    fn test_credential_serde() {
        let credential: Credential = serde_json::from_str("[1,2,3,4,5]").unwrap();
        assert_eq!(credential.as_bytes(), &[1, 2, 3, 4, 5]);
        assert_eq!(serde_json::to_string(&credential).unwrap(), "[1,2,3,4,5]");
        assert!(serde_json::from_str::<Credential>("[1,2,3]").is_err());
    }

    #[test]
    fn test_node_role_display() {
        assert_eq!(NodeRole::Control.to_string(), "control");
        assert_eq!(NodeRole::Hmi.to_string(), "hmi");
    }
}
