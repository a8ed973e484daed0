//! Error types for hardware operations.
//!
//! This module defines error types specific to the I/O collaborators of both
//! nodes: the serial line, the two-wire bus, the keypad, the display and the
//! output pins.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from or passed to a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// A completion callback was already registered for this source.
    #[error("Callback already registered for {source_name}")]
    CallbackAlreadyRegistered { source_name: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new callback registration error.
    pub fn callback_already_registered(source_name: impl Into<String>) -> Self {
        Self::CallbackAlreadyRegistered {
            source_name: source_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("uart0");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: uart0");
    }

    #[test]
    fn test_invalid_data_error() {
        let error = HardwareError::invalid_data("Digit must be 0-9, got 12");
        assert!(matches!(error, HardwareError::InvalidData { .. }));
        assert_eq!(error.to_string(), "Invalid data: Digit must be 0-9, got 12");
    }

    #[test]
    fn test_callback_already_registered_error() {
        let error = HardwareError::callback_already_registered("uart0 rx");
        assert_eq!(
            error.to_string(),
            "Callback already registered for uart0 rx"
        );
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            HardwareError::disconnected("Device1"),
            HardwareError::communication("framing"),
            HardwareError::configuration("bad baud"),
        ];

        for error in errors {
            let _ = format!("{}", error);
            let _ = format!("{:?}", error);
        }
    }
}
