use doorlock_hardware::HardwareError;
use doorlock_protocol::ProtocolError;
use doorlock_storage::StorageError;
use thiserror::Error;

/// Errors that stop the Control node.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Core(#[from] doorlock_core::Error),
}

/// Errors that stop the HMI node.
#[derive(Error, Debug)]
pub enum HmiError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Core(#[from] doorlock_core::Error),
}

/// First error raised by either node of an emulated system.
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Control node stopped: {0}")]
    Control(#[from] ControlError),

    #[error("HMI node stopped: {0}")]
    Hmi(#[from] HmiError),
}

impl ControlError {
    /// Check if the error means the serial line went away.
    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            ControlError::Protocol(ProtocolError::Hardware(HardwareError::Disconnected { .. }))
                | ControlError::Hardware(HardwareError::Disconnected { .. })
        )
    }
}

impl HmiError {
    /// Check if the error means the serial line or keypad went away.
    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            HmiError::Protocol(ProtocolError::Hardware(HardwareError::Disconnected { .. }))
                | HmiError::Hardware(HardwareError::Disconnected { .. })
        )
    }
}

pub type ControlResult<T> = std::result::Result<T, ControlError>;
pub type HmiResult<T> = std::result::Result<T, HmiError>;
