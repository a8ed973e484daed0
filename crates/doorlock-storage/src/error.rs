use doorlock_hardware::{BusPhase, BusStatus, HardwareError};
use thiserror::Error;

/// Errors raised by the persistent store and the credential slot on top
/// of it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The bus reported an unexpected status during a transaction phase.
    #[error("Bus error in {phase} phase: expected {expected}, got {actual}")]
    Bus {
        phase: BusPhase,
        expected: BusStatus,
        actual: BusStatus,
    },

    /// Address outside the store's 11-bit address space.
    #[error("Address 0x{address:04X} out of range (max 0x{max:04X})")]
    AddressOutOfRange { address: u32, max: u16 },

    /// A byte read back after provisioning differs from what was written.
    #[error("Read-back mismatch at offset {offset}")]
    VerifyFailed { offset: usize },

    /// Bus controller failure below the transaction level.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

impl StorageError {
    /// Returns `true` if this error came from a bus status check.
    pub fn is_bus_error(&self) -> bool {
        matches!(self, Self::Bus { .. })
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
