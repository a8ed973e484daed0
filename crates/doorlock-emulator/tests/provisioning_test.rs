//! Bootstrap, change and root-override provisioning across both nodes.

mod common;

use common::*;
use doorlock_core::DeviceConfig;
use doorlock_emulator::{ControlState, HmiState};
use doorlock_hardware::{BusPhase, KeypadInput};
use doorlock_protocol::{HANDSHAKE_TOKEN, Opcode};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_blank_slot_forces_provisioning_first() {
    let (mut system, handles) = blank_system(&DeviceConfig::default());
    type_digits(&handles, &[1, 2, 3, 4, 5]).await;
    type_digits(&handles, &[1, 2, 3, 4, 5]).await;

    idle(&mut system, Duration::from_secs(30)).await;

    assert_eq!(stored(&handles), vec![1, 2, 3, 4, 5]);
    assert_eq!(handles.hmi_line.sent()[0], HANDSHAKE_TOKEN);
    assert_eq!(
        handles.control_line.sent()[0],
        Opcode::CredentialNotFound.code()
    );
    assert!(handles.display.contains("Enter New PASS"));
    assert!(handles.display.contains("ReEnter PASS"));
    assert!(handles.display.contains("Confirmed"));
    assert_eq!(system.hmi.state(), HmiState::MainMenu);
    assert_eq!(system.control.state(), ControlState::AwaitingCommand);
    assert_no_overruns(&handles);
}

#[tokio::test(start_paused = true)]
async fn test_reentry_mismatch_restarts_prompt() {
    let (mut system, handles) = blank_system(&DeviceConfig::default());
    type_digits(&handles, &[1, 2, 3, 4, 5]).await;
    type_digits(&handles, &[1, 2, 3, 4, 6]).await;
    type_digits(&handles, &[7, 7, 7, 7, 7]).await;
    type_digits(&handles, &[7, 7, 7, 7, 7]).await;

    idle(&mut system, Duration::from_secs(30)).await;

    assert_eq!(handles.display.count("PASS not matched"), 1);
    assert_eq!(handles.display.count("Enter New PASS"), 2);
    assert_eq!(stored(&handles), vec![7, 7, 7, 7, 7]);
    assert_eq!(system.control.machine().visits(ControlState::AwaitingCommand), 1);
}

#[tokio::test(start_paused = true)]
async fn test_bus_fault_reported_and_retried() {
    let (mut system, handles) = blank_system(&DeviceConfig::default());
    handles.eeprom.fail_on(BusPhase::WriteData, 1);
    type_digits(&handles, &[1, 1, 1, 1, 1]).await;
    type_digits(&handles, &[1, 1, 1, 1, 1]).await;
    type_digits(&handles, &[2, 2, 2, 2, 2]).await;
    type_digits(&handles, &[2, 2, 2, 2, 2]).await;

    idle(&mut system, Duration::from_secs(40)).await;

    assert_eq!(handles.display.count("Confirmed"), 2);
    assert_eq!(stored(&handles), vec![2, 2, 2, 2, 2]);
    assert_eq!(system.hmi.state(), HmiState::MainMenu);
    assert_eq!(system.control.state(), ControlState::AwaitingCommand);
    assert_no_overruns(&handles);
}

#[tokio::test(start_paused = true)]
async fn test_unwritable_store_gives_up_and_restarts() {
    let (mut system, handles) = blank_system(&DeviceConfig::default());
    handles.eeprom.set_write_protect(true);
    for _ in 0..10 {
        type_digits(&handles, &[1, 1, 1, 1, 1]).await;
    }

    idle(&mut system, Duration::from_secs(35)).await;

    assert_eq!(handles.display.count("Confirmed"), 5);
    assert_eq!(system.hmi.restarts(), 1);
    assert_eq!(system.hmi.state(), HmiState::Provisioning);
    assert!(system.control.is_provisioning_forced());
}

#[tokio::test(start_paused = true)]
async fn test_change_credential() {
    let (mut system, handles) = provisioned_system(STORED);
    press(&handles, KeypadInput::Plus).await;
    type_digits(&handles, &STORED).await;
    type_digits(&handles, &[1, 1, 2, 2, 3]).await;
    type_digits(&handles, &[1, 1, 2, 2, 3]).await;

    idle(&mut system, Duration::from_secs(30)).await;

    assert_eq!(stored(&handles), vec![1, 1, 2, 2, 3]);
    assert!(handles.display.contains("Enter Old PASS"));
    assert_eq!(system.hmi.state(), HmiState::MainMenu);
    assert_no_overruns(&handles);
}

#[tokio::test(start_paused = true)]
async fn test_failed_change_keeps_old_credential() {
    let (mut system, handles) = provisioned_system(STORED);
    handles.eeprom.set_write_protect(true);
    press(&handles, KeypadInput::Plus).await;
    type_digits(&handles, &STORED).await;
    for _ in 0..10 {
        type_digits(&handles, &[1, 1, 1, 1, 1]).await;
    }
    press(&handles, KeypadInput::Minus).await;
    type_digits(&handles, &STORED).await;

    idle(&mut system, Duration::from_secs(70)).await;

    assert_eq!(handles.display.count("Confirmed"), 5);
    assert_eq!(stored(&handles), STORED.to_vec());
    assert_eq!(handles.motor_a.rising_edges(), 1);
    assert_eq!(system.hmi.machine().visits(HmiState::Provisioning), 1);
    assert_eq!(system.hmi.state(), HmiState::MainMenu);
    assert_eq!(system.control.state(), ControlState::AwaitingCommand);
    assert!(!system.control.is_provisioning_forced());
    assert_booted_once(&system, &handles);
}

#[tokio::test(start_paused = true)]
async fn test_root_override_skips_old_credential_check() {
    let (mut system, handles) = provisioned_system([9, 9, 9, 9, 9]);
    handles.keypad.hold(KeypadInput::Equals).await.unwrap();
    type_digits(&handles, &[2, 6, 4, 9, 5]).await;
    type_digits(&handles, &[3, 1, 4, 1, 5]).await;
    type_digits(&handles, &[3, 1, 4, 1, 5]).await;

    idle(&mut system, Duration::from_secs(30)).await;
    handles.keypad.release();

    assert_eq!(stored(&handles), vec![3, 1, 4, 1, 5]);
    assert!(handles.display.contains("Enter Root PASS"));
    assert!(!handles.display.contains("Enter Old PASS"));
    assert_eq!(system.control.machine().visits(ControlState::Verifying), 0);
    assert_eq!(system.hmi.machine().visits(HmiState::EnteringRoot), 1);
}

#[tokio::test(start_paused = true)]
async fn test_root_key_tap_is_ignored() {
    let (mut system, handles) = provisioned_system(STORED);
    press(&handles, KeypadInput::Equals).await;
    type_digits(&handles, &[2, 6, 4, 9, 5]).await;

    idle(&mut system, Duration::from_secs(10)).await;

    assert_eq!(system.hmi.machine().visits(HmiState::EnteringRoot), 0);
    assert_eq!(system.hmi.state(), HmiState::MainMenu);
    assert_eq!(stored(&handles), STORED.to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_wrong_root_digit_returns_to_menu() {
    let (mut system, handles) = provisioned_system(STORED);
    handles.keypad.hold(KeypadInput::Equals).await.unwrap();
    type_digits(&handles, &[2, 6, 0]).await;

    idle(&mut system, Duration::from_secs(10)).await;
    handles.keypad.release();

    assert_eq!(system.hmi.state(), HmiState::MainMenu);
    assert_eq!(system.hmi.machine().visits(HmiState::Provisioning), 0);
    assert_eq!(handles.display.count("*"), 3);
}
