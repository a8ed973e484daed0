//! Single-byte transaction driver for a 24C16-class EEPROM.
//!
//! The store has an 11-bit address space. The upper three address bits
//! travel in the device-select byte, the lower eight in the address byte:
//!
//! ```text
//! device select:  1 0 1 0 A10 A9 A8 R/W
//! address byte:   A7 .. A0
//! ```
//!
//! # Transactions
//!
//! ```text
//! write:  START  SLA+W  ADDR  DATA  STOP
//!         0x08   0x18   0x28  0x28
//!
//! read:   START  SLA+W  ADDR  REP-START  SLA+R  DATA(NACK)  STOP
//!         0x08   0x18   0x28  0x10       0x40   0x58
//! ```
//!
//! The status register is checked after every phase. The first unexpected
//! status aborts the transaction with [`StorageError::Bus`]; the bus is
//! released with a STOP and nothing is retried.

use crate::error::{StorageError, StorageResult};
use doorlock_core::config::BusConfig;
use doorlock_core::constants::{EEPROM_DEVICE_ADDRESS, MAX_STORE_ADDRESS};
use doorlock_hardware::{BusPhase, TwoWireBus};
use tracing::{trace, warn};

/// Device-select byte for `address`, write intent unless `read` is set.
///
/// ```
/// use doorlock_storage::eeprom::device_select;
///
/// assert_eq!(device_select(0xA0, 0x0100, false), 0xA2);
/// assert_eq!(device_select(0xA0, 0x0100, true), 0xA3);
/// assert_eq!(device_select(0xA0, 0x07FF, false), 0xAE);
/// ```
pub fn device_select(device_address: u8, address: u16, read: bool) -> u8 {
    let block = ((address & 0x0700) >> 7) as u8;
    device_address | block | u8::from(read)
}

/// EEPROM transaction driver over a two-wire bus.
#[derive(Debug)]
pub struct Eeprom<B> {
    bus: B,
    device_address: u8,
}

impl<B: TwoWireBus> Eeprom<B> {
    /// Driver for a device at the default address.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            device_address: EEPROM_DEVICE_ADDRESS,
        }
    }

    /// Driver configured from the bus section of the device config.
    pub fn with_config(bus: B, config: &BusConfig) -> Self {
        Self {
            bus,
            device_address: config.device_address,
        }
    }

    /// Access the underlying bus.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Write one byte.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AddressOutOfRange` before touching the bus if
    /// `address` exceeds the 11-bit space, or `StorageError::Bus` at the
    /// first phase with an unexpected status.
    pub async fn write(&mut self, address: u16, byte: u8) -> StorageResult<()> {
        check_address(address)?;
        trace!("EEPROM write @0x{:04X}", address);

        let result = self.write_phases(address, byte).await;
        self.bus.stop().await?;
        result
    }

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Same as [`write`](Self::write).
    pub async fn read(&mut self, address: u16) -> StorageResult<u8> {
        check_address(address)?;
        trace!("EEPROM read @0x{:04X}", address);

        let result = self.read_phases(address).await;
        self.bus.stop().await?;
        result
    }

    async fn write_phases(&mut self, address: u16, byte: u8) -> StorageResult<()> {
        self.bus.start().await?;
        self.expect(BusPhase::Start)?;

        self.bus
            .write(device_select(self.device_address, address, false))
            .await?;
        self.expect(BusPhase::SelectWrite)?;

        self.bus.write(address as u8).await?;
        self.expect(BusPhase::Address)?;

        self.bus.write(byte).await?;
        self.expect(BusPhase::WriteData)
    }

    async fn read_phases(&mut self, address: u16) -> StorageResult<u8> {
        self.bus.start().await?;
        self.expect(BusPhase::Start)?;

        self.bus
            .write(device_select(self.device_address, address, false))
            .await?;
        self.expect(BusPhase::SelectWrite)?;

        self.bus.write(address as u8).await?;
        self.expect(BusPhase::Address)?;

        self.bus.start().await?;
        self.expect(BusPhase::RepeatedStart)?;

        self.bus
            .write(device_select(self.device_address, address, true))
            .await?;
        self.expect(BusPhase::SelectRead)?;

        let byte = self.bus.read_with_nack().await?;
        self.expect(BusPhase::ReadData)?;
        Ok(byte)
    }

    fn expect(&self, phase: BusPhase) -> StorageResult<()> {
        let expected = phase.success_status();
        let actual = self.bus.status();
        if actual == expected {
            return Ok(());
        }

        warn!("EEPROM {} phase failed: expected {}, got {}", phase, expected, actual);
        Err(StorageError::Bus {
            phase,
            expected,
            actual,
        })
    }
}

fn check_address(address: u16) -> StorageResult<()> {
    if address > MAX_STORE_ADDRESS {
        return Err(StorageError::AddressOutOfRange {
            address: u32::from(address),
            max: MAX_STORE_ADDRESS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_hardware::BusStatus;
    use doorlock_hardware::mock::MockEeprom;
    use rstest::rstest;

    #[rstest]
    #[case(0x0000, 0xA0)]
    #[case(0x00FF, 0xA0)]
    #[case(0x0100, 0xA2)]
    #[case(0x0104, 0xA2)]
    #[case(0x0400, 0xA8)]
    #[case(0x07FF, 0xAE)]
    fn test_device_select_folds_high_bits(#[case] address: u16, #[case] expected: u8) {
        assert_eq!(device_select(0xA0, address, false), expected);
        assert_eq!(device_select(0xA0, address, true), expected | 1);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (bus, handle) = MockEeprom::new();
        let mut eeprom = Eeprom::new(bus);

        eeprom.write(0x0102, 4).await.unwrap();

        assert_eq!(eeprom.read(0x0102).await.unwrap(), 4);
        assert_eq!(handle.dump(0x0102, 1), vec![4]);
    }

    #[tokio::test]
    async fn test_blank_cell_reads_sentinel() {
        let (bus, _handle) = MockEeprom::new();
        let mut eeprom = Eeprom::new(bus);
        assert_eq!(eeprom.read(0x0100).await.unwrap(), 0xFF);
    }

    #[tokio::test]
    async fn test_address_out_of_range_never_touches_bus() {
        let (bus, handle) = MockEeprom::new();
        let mut eeprom = Eeprom::new(bus);

        let result = eeprom.write(0x0800, 1).await;

        assert!(matches!(
            result,
            Err(StorageError::AddressOutOfRange { address: 0x0800, .. })
        ));
        assert_eq!(handle.stop_count(), 0);
    }

    #[rstest]
    #[case(BusPhase::Start, BusStatus::Start, BusStatus::ArbitrationLost)]
    #[case(BusPhase::SelectWrite, BusStatus::SelectWriteAck, BusStatus::SelectWriteNack)]
    #[case(BusPhase::Address, BusStatus::DataSentAck, BusStatus::DataSentNack)]
    #[case(BusPhase::WriteData, BusStatus::DataSentAck, BusStatus::DataSentNack)]
    #[tokio::test]
    async fn test_write_phase_failure_reported(
        #[case] phase: BusPhase,
        #[case] expected: BusStatus,
        #[case] actual: BusStatus,
    ) {
        let (bus, handle) = MockEeprom::new();
        handle.fail_on(phase, 0);
        let mut eeprom = Eeprom::new(bus);

        let err = eeprom.write(0x0100, 7).await.unwrap_err();

        match err {
            StorageError::Bus {
                phase: p,
                expected: e,
                actual: a,
            } => {
                assert_eq!(p, phase);
                assert_eq!(e, expected);
                assert_eq!(a, actual);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(handle.dump(0x0100, 1), vec![0xFF]);
        // Bus released after the abort.
        assert_eq!(handle.stop_count(), 1);
    }

    #[rstest]
    #[case(BusPhase::RepeatedStart)]
    #[case(BusPhase::SelectRead)]
    #[case(BusPhase::ReadData)]
    #[tokio::test]
    async fn test_read_phase_failure_reported(#[case] phase: BusPhase) {
        let (bus, handle) = MockEeprom::new();
        handle.fail_on(phase, 0);
        let mut eeprom = Eeprom::new(bus);

        let err = eeprom.read(0x0100).await.unwrap_err();

        assert!(matches!(err, StorageError::Bus { phase: p, .. } if p == phase));
        assert!(err.is_bus_error());
    }

    #[tokio::test]
    async fn test_custom_device_address() {
        let (bus, handle) = MockEeprom::with_device_address(0xB0);
        let config = BusConfig {
            device_address: 0xB0,
            ..BusConfig::default()
        };
        let mut eeprom = Eeprom::with_config(bus, &config);

        eeprom.write(0x0010, 3).await.unwrap();
        assert_eq!(handle.dump(0x0010, 1), vec![3]);
    }
}
