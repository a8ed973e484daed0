//! The persistent credential slot.
//!
//! Five consecutive EEPROM cells starting at the configured base hold the
//! credential digits. A cell holding `0xFF` has never been written; since
//! digits never equal `0xFF`, a slot of all sentinels means "no
//! credential".
//!
//! # Provisioning
//!
//! Provisioning is write, then verify, then commit:
//!
//! 1. write each digit to its offset, waiting the settle time after each
//!    write so the device finishes its internal write cycle;
//! 2. read every cell back and compare with what was written;
//! 3. only a clean read-back counts as committed. The caller reports the
//!    outcome to the HMI.
//!
//! A bus error or read-back mismatch leaves the slot in an unknown state.
//! Callers take a [`snapshot`](CredentialSlot::snapshot) before writing and
//! [`restore`](CredentialSlot::restore) it on failure, so the stored
//! credential only changes on a clean commit.

use crate::eeprom::Eeprom;
use crate::error::{StorageError, StorageResult};
use doorlock_core::config::BusConfig;
use doorlock_core::constants::{CREDENTIAL_BASE_ADDRESS, CREDENTIAL_LEN, SLOT_SENTINEL};
use doorlock_core::Credential;
use doorlock_hardware::TwoWireBus;
use doorlock_hardware::timer::DelayTimer;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of comparing a candidate credential with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verification {
    /// Every digit matched.
    Match,
    /// First differing digit.
    Mismatch { position: usize },
}

impl Verification {
    /// Returns `true` for [`Verification::Match`].
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Credential slot over an EEPROM.
#[derive(Debug)]
pub struct CredentialSlot<B> {
    eeprom: Eeprom<B>,
    base: u16,
}

impl<B: TwoWireBus> CredentialSlot<B> {
    /// Slot at the default base address.
    pub fn new(eeprom: Eeprom<B>) -> Self {
        Self {
            eeprom,
            base: CREDENTIAL_BASE_ADDRESS,
        }
    }

    /// Slot at the base address from the bus config.
    pub fn with_config(bus: B, config: &BusConfig) -> Self {
        Self {
            eeprom: Eeprom::with_config(bus, config),
            base: config.credential_base,
        }
    }

    /// First address of the slot.
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Access the EEPROM driver.
    pub fn eeprom_mut(&mut self) -> &mut Eeprom<B> {
        &mut self.eeprom
    }

    fn address(&self, offset: usize) -> u16 {
        self.base + offset as u16
    }

    /// Check whether a credential is stored.
    ///
    /// Reads cell by cell and stops at the first non-sentinel byte.
    pub async fn has_credential(&mut self) -> StorageResult<bool> {
        for offset in 0..CREDENTIAL_LEN {
            let byte = self.eeprom.read(self.address(offset)).await?;
            if byte != SLOT_SENTINEL {
                debug!("Credential slot occupied (offset {})", offset);
                return Ok(true);
            }
        }
        debug!("Credential slot blank");
        Ok(false)
    }

    /// Compare `candidate` with the stored credential.
    ///
    /// Store cells are read one at a time; reading stops at the first
    /// mismatch, so no cell past it is touched.
    pub async fn verify(&mut self, candidate: &[u8]) -> StorageResult<Verification> {
        for position in 0..CREDENTIAL_LEN {
            let stored = self.eeprom.read(self.address(position)).await?;
            if candidate.get(position) != Some(&stored) {
                debug!("Credential mismatch at position {}", position);
                return Ok(Verification::Mismatch { position });
            }
        }
        Ok(Verification::Match)
    }

    /// Store `credential`: write every digit, settle, read back.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Bus` if any write or read-back transaction
    /// fails, or `StorageError::VerifyFailed` if a cell reads back
    /// different from what was written.
    pub async fn provision(
        &mut self,
        credential: &Credential,
        timer: &mut DelayTimer,
        settle: Duration,
    ) -> StorageResult<()> {
        self.write_cells(credential.as_bytes(), timer, settle).await?;
        self.check_cells(credential.as_bytes()).await?;

        info!("Credential committed at 0x{:04X}", self.base);
        Ok(())
    }

    /// Read every cell of the slot.
    pub async fn snapshot(&mut self) -> StorageResult<[u8; CREDENTIAL_LEN]> {
        let mut cells = [SLOT_SENTINEL; CREDENTIAL_LEN];
        for (offset, cell) in cells.iter_mut().enumerate() {
            *cell = self.eeprom.read(self.address(offset)).await?;
        }
        Ok(cells)
    }

    /// Put back cells taken with [`snapshot`](Self::snapshot) and read them
    /// back.
    ///
    /// # Errors
    ///
    /// Same as [`provision`](Self::provision).
    pub async fn restore(
        &mut self,
        cells: &[u8; CREDENTIAL_LEN],
        timer: &mut DelayTimer,
        settle: Duration,
    ) -> StorageResult<()> {
        self.write_cells(cells, timer, settle).await?;
        self.check_cells(cells).await?;
        info!("Credential slot restored");
        Ok(())
    }

    async fn write_cells(
        &mut self,
        cells: &[u8; CREDENTIAL_LEN],
        timer: &mut DelayTimer,
        settle: Duration,
    ) -> StorageResult<()> {
        for (offset, cell) in cells.iter().enumerate() {
            self.eeprom.write(self.address(offset), *cell).await?;
            timer.delay(settle).await;
        }
        Ok(())
    }

    async fn check_cells(&mut self, cells: &[u8; CREDENTIAL_LEN]) -> StorageResult<()> {
        for (offset, cell) in cells.iter().enumerate() {
            let stored = self.eeprom.read(self.address(offset)).await?;
            if stored != *cell {
                return Err(StorageError::VerifyFailed { offset });
            }
        }
        Ok(())
    }
}
