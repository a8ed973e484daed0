//! Shared helpers for whole-system scenarios.
//!
//! Every scenario runs on a paused clock: the script queues key presses,
//! then sleeps; tokio advances virtual time whenever both nodes are idle.
//!
//! A scenario calls [`drive`] (or [`idle`]) exactly once. Each call starts
//! `EmulatedSystem::run` afresh, which boots both nodes again, so a
//! multi-step scenario puts all of its steps in one script and checks
//! intermediate results through the handles.

#![allow(dead_code)]

use doorlock_core::DeviceConfig;
use doorlock_emulator::{ControlState, EmulatedSystem, HmiState, SystemHandles};
use doorlock_hardware::KeypadInput;
use std::future::Future;
use std::time::Duration;

pub const STORED: [u8; 5] = [2, 6, 4, 9, 5];
pub const SLOT_BASE: u16 = 0x0100;

/// System with a blank slot.
pub fn blank_system(config: &DeviceConfig) -> (EmulatedSystem, SystemHandles) {
    EmulatedSystem::new(config)
}

/// System whose slot already holds `digits`.
pub fn provisioned_system(digits: [u8; 5]) -> (EmulatedSystem, SystemHandles) {
    let (system, handles) = EmulatedSystem::new(&DeviceConfig::default());
    handles.eeprom.load(SLOT_BASE, &digits);
    (system, handles)
}

/// Run both nodes alongside `script` until the script finishes.
pub async fn drive<F: Future>(system: &mut EmulatedSystem, script: F) -> F::Output {
    let run = system.run();
    tokio::pin!(run);
    tokio::select! {
        biased;
        output = script => output,
        result = &mut run => panic!("system stopped: {result:?}"),
    }
}

/// Let the system run on its own for `duration` of virtual time.
pub async fn idle(system: &mut EmulatedSystem, duration: Duration) {
    drive(system, tokio::time::sleep(duration)).await;
}

pub async fn press(handles: &SystemHandles, key: KeypadInput) {
    handles.keypad.send_input(key).await.unwrap();
}

pub async fn type_digits(handles: &SystemHandles, digits: &[u8]) {
    handles.keypad.send_digits(digits).await.unwrap();
}

/// Slot contents as currently stored.
pub fn stored(handles: &SystemHandles) -> Vec<u8> {
    handles.eeprom.dump(SLOT_BASE, 5)
}

/// Both nodes booted once: one boot token from the HMI, one slot report
/// from Control.
pub fn assert_booted_once(system: &EmulatedSystem, handles: &SystemHandles) {
    assert_eq!(system.control.machine().visits(ControlState::BootstrapCheck), 1);
    assert_eq!(system.hmi.machine().visits(HmiState::Boot), 0);
    assert_eq!(handles.hmi_line.sent().first(), Some(&0x01));
}

/// Neither end of the serial line lost a byte to an overrun.
pub fn assert_no_overruns(handles: &SystemHandles) {
    assert_eq!(handles.control_line.dropped(), 0, "control rx overrun");
    assert_eq!(handles.hmi_line.dropped(), 0, "hmi rx overrun");
}
