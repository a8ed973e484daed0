//! Persistent credential storage for the Control node.
//!
//! Two layers:
//!
//! - [`Eeprom`]: status-checked single-byte write and read transactions on
//!   a two-wire bus.
//! - [`CredentialSlot`]: the fixed five-cell credential slot on top of it,
//!   with the blank check, the early-exit comparison and write-then-verify
//!   provisioning.
//!
//! # Examples
//!
//! ```
//! use doorlock_core::Credential;
//! use doorlock_core::config::TimerConfig;
//! use doorlock_hardware::mock::MockEeprom;
//! use doorlock_hardware::timer::DelayTimer;
//! use doorlock_storage::{CredentialSlot, Eeprom, Verification};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (bus, _handle) = MockEeprom::new();
//!     let mut slot = CredentialSlot::new(Eeprom::new(bus));
//!     let mut timer = DelayTimer::new(TimerConfig::default());
//!
//!     assert!(!slot.has_credential().await?);
//!
//!     let credential = Credential::new([2, 6, 4, 9, 5])?;
//!     slot.provision(&credential, &mut timer, Duration::from_millis(10)).await?;
//!
//!     assert_eq!(slot.verify(&[2, 6, 4, 9, 5]).await?, Verification::Match);
//!     Ok(())
//! }
//! ```

pub mod eeprom;
pub mod error;
pub mod slot;

pub use eeprom::{Eeprom, device_select};
pub use error::{StorageError, StorageResult};
pub use slot::{CredentialSlot, Verification};
