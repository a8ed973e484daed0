//! Mock two-wire bus with a 24C16-class EEPROM attached.
//!
//! The mock follows the controller's status codes phase by phase, so the
//! store driver sees exactly what real hardware would report. Writes are
//! buffered and committed to the cell array on STOP, like the device's
//! internal write cycle.
//!
//! Faults can be injected per phase through [`MockEepromHandle::fail_on`]:
//! the selected phase then reports a NACK (or arbitration loss for START)
//! instead of its success status.

use crate::{
    Result,
    traits::{BusPhase, BusStatus, TwoWireBus},
};
use doorlock_core::constants::{EEPROM_DEVICE_ADDRESS, SLOT_SENTINEL, STORE_CAPACITY};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn failure_status(phase: BusPhase) -> BusStatus {
    match phase {
        BusPhase::Start | BusPhase::RepeatedStart => BusStatus::ArbitrationLost,
        BusPhase::SelectWrite => BusStatus::SelectWriteNack,
        BusPhase::Address | BusPhase::WriteData => BusStatus::DataSentNack,
        BusPhase::SelectRead => BusStatus::SelectReadNack,
        BusPhase::ReadData => BusStatus::DataReceivedAck,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Idle,
    Started,
    SelectedWrite { block: u16 },
    Addressed { address: u16 },
    SelectedRead,
}

#[derive(Debug, Clone, Copy)]
struct Fault {
    phase: BusPhase,
    skip: usize,
}

#[derive(Debug)]
struct EepromState {
    cells: Vec<u8>,
    pointer: u16,
    transfer: Transfer,
    in_transaction: bool,
    pending: Vec<(u16, u8)>,
    status: BusStatus,
    faults: Vec<Fault>,
    read_log: Vec<u16>,
    write_log: Vec<u16>,
    stops: usize,
    write_protected: bool,
    bit_rate: Option<u8>,
}

impl EepromState {
    fn new() -> Self {
        Self {
            cells: vec![SLOT_SENTINEL; STORE_CAPACITY],
            pointer: 0,
            transfer: Transfer::Idle,
            in_transaction: false,
            pending: Vec::new(),
            status: BusStatus::Idle,
            faults: Vec::new(),
            read_log: Vec::new(),
            write_log: Vec::new(),
            stops: 0,
            write_protected: false,
            bit_rate: None,
        }
    }

    /// Consume a matching injected fault, if one is due.
    fn take_fault(&mut self, phase: BusPhase) -> bool {
        let Some(index) = self.faults.iter().position(|f| f.phase == phase) else {
            return false;
        };
        if self.faults[index].skip > 0 {
            self.faults[index].skip -= 1;
            return false;
        }
        self.faults.remove(index);
        true
    }

    /// Report the phase outcome; an injected fault aborts the transfer.
    fn complete(&mut self, phase: BusPhase) -> bool {
        if self.take_fault(phase) {
            self.status = failure_status(phase);
            self.transfer = Transfer::Idle;
            return false;
        }
        self.status = phase.success_status();
        true
    }
}

/// Mock EEPROM on a two-wire bus.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockEeprom;
/// use doorlock_hardware::traits::{BusStatus, TwoWireBus};
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut bus, handle) = MockEeprom::new();
///     handle.load(0x0100, &[1, 2, 3]);
///
///     bus.start().await?;
///     assert_eq!(bus.status(), BusStatus::Start);
///     bus.write(0xA2).await?; // block 1, write intent
///     assert_eq!(bus.status(), BusStatus::SelectWriteAck);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockEeprom {
    device_address: u8,
    state: Arc<Mutex<EepromState>>,
}

impl MockEeprom {
    /// Create a blank (all `0xFF`) device at the default address.
    pub fn new() -> (Self, MockEepromHandle) {
        Self::with_device_address(EEPROM_DEVICE_ADDRESS)
    }

    /// Create a blank device answering to `device_address`.
    pub fn with_device_address(device_address: u8) -> (Self, MockEepromHandle) {
        let state = Arc::new(Mutex::new(EepromState::new()));
        let bus = Self {
            device_address,
            state: Arc::clone(&state),
        };
        (bus, MockEepromHandle { state })
    }

    fn state(&self) -> MutexGuard<'_, EepromState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TwoWireBus for MockEeprom {
    fn set_bit_rate(&mut self, register: u8) {
        self.state().bit_rate = Some(register);
    }

    async fn start(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.in_transaction {
            if state.complete(BusPhase::RepeatedStart) {
                state.transfer = Transfer::Started;
            }
        } else if state.complete(BusPhase::Start) {
            state.in_transaction = true;
            state.transfer = Transfer::Started;
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let mut state = self.state();
        let pending = std::mem::take(&mut state.pending);
        if !state.write_protected {
            for (address, byte) in pending {
                state.cells[usize::from(address)] = byte;
            }
        }
        state.transfer = Transfer::Idle;
        state.in_transaction = false;
        state.status = BusStatus::Idle;
        state.stops += 1;
        Ok(())
    }

    async fn write(&mut self, byte: u8) -> Result<()> {
        let device_address = self.device_address;
        let mut state = self.state();

        match state.transfer {
            Transfer::Started => {
                if byte & 0xF0 != device_address {
                    state.status = if byte & 0x01 == 0 {
                        BusStatus::SelectWriteNack
                    } else {
                        BusStatus::SelectReadNack
                    };
                    state.transfer = Transfer::Idle;
                    return Ok(());
                }
                let block = u16::from((byte >> 1) & 0x07);
                if byte & 0x01 == 0 {
                    if state.complete(BusPhase::SelectWrite) {
                        state.transfer = Transfer::SelectedWrite { block };
                    }
                } else if state.complete(BusPhase::SelectRead) {
                    state.transfer = Transfer::SelectedRead;
                }
            }
            Transfer::SelectedWrite { block } => {
                if state.complete(BusPhase::Address) {
                    let address = (block << 8) | u16::from(byte);
                    state.pointer = address;
                    state.transfer = Transfer::Addressed { address };
                }
            }
            Transfer::Addressed { address } => {
                if state.complete(BusPhase::WriteData) {
                    state.pending.push((address, byte));
                    state.write_log.push(address);
                    let next = (address + 1) % STORE_CAPACITY as u16;
                    state.pointer = next;
                    state.transfer = Transfer::Addressed { address: next };
                }
            }
            Transfer::Idle | Transfer::SelectedRead => {
                state.status = BusStatus::BusFault;
            }
        }
        Ok(())
    }

    async fn read_with_ack(&mut self) -> Result<u8> {
        let mut state = self.state();
        if state.transfer != Transfer::SelectedRead {
            state.status = BusStatus::BusFault;
            return Ok(SLOT_SENTINEL);
        }
        let address = state.pointer;
        let byte = state.cells[usize::from(address)];
        state.read_log.push(address);
        state.pointer = (address + 1) % STORE_CAPACITY as u16;
        state.status = BusStatus::DataReceivedAck;
        Ok(byte)
    }

    async fn read_with_nack(&mut self) -> Result<u8> {
        let mut state = self.state();
        if state.transfer != Transfer::SelectedRead {
            state.status = BusStatus::BusFault;
            return Ok(SLOT_SENTINEL);
        }
        let address = state.pointer;
        let byte = state.cells[usize::from(address)];
        state.read_log.push(address);
        state.pointer = (address + 1) % STORE_CAPACITY as u16;
        if state.complete(BusPhase::ReadData) {
            state.transfer = Transfer::Idle;
        }
        Ok(byte)
    }

    fn status(&self) -> BusStatus {
        self.state().status
    }
}

/// Handle for inspecting and steering a mock EEPROM.
#[derive(Debug, Clone)]
pub struct MockEepromHandle {
    state: Arc<Mutex<EepromState>>,
}

impl MockEepromHandle {
    fn state(&self) -> MutexGuard<'_, EepromState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Preload cells starting at `address`, bypassing the bus.
    pub fn load(&self, address: u16, bytes: &[u8]) {
        let mut state = self.state();
        for (offset, byte) in bytes.iter().enumerate() {
            let cell = (usize::from(address) + offset) % STORE_CAPACITY;
            state.cells[cell] = *byte;
        }
    }

    /// Read `len` committed cells starting at `address`, bypassing the bus.
    pub fn dump(&self, address: u16, len: usize) -> Vec<u8> {
        let state = self.state();
        (0..len)
            .map(|offset| state.cells[(usize::from(address) + offset) % STORE_CAPACITY])
            .collect()
    }

    /// Make the `occurrence`-th future `phase` (0 = next) report a failure.
    pub fn fail_on(&self, phase: BusPhase, occurrence: usize) {
        self.state().faults.push(Fault {
            phase,
            skip: occurrence,
        });
    }

    /// Drive the write-protect pin. Protected writes are acknowledged on
    /// the bus but never reach the cells.
    pub fn set_write_protect(&self, protected: bool) {
        self.state().write_protected = protected;
    }

    /// Drop all injected faults that have not triggered yet.
    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }

    /// Addresses read over the bus, in order.
    pub fn read_log(&self) -> Vec<u16> {
        self.state().read_log.clone()
    }

    /// Addresses written over the bus, in order (committed or not).
    pub fn write_log(&self) -> Vec<u16> {
        self.state().write_log.clone()
    }

    /// Forget the read and write logs.
    pub fn clear_logs(&self) {
        let mut state = self.state();
        state.read_log.clear();
        state.write_log.clear();
    }

    /// Bit-rate register value the controller was programmed with.
    pub fn bit_rate(&self) -> Option<u8> {
        self.state().bit_rate
    }

    /// Number of STOP conditions seen.
    pub fn stop_count(&self) -> usize {
        self.state().stops
    }
}
