//! Nodes wired to mock peripherals.
//!
//! [`EmulatedSystem`] runs both nodes in one process over a mock serial
//! line. [`emulated_control`] and [`emulated_hmi`] build a single node over
//! any [`AnyByteChannel`], so one node can face a peer on a real port.
//!
//! ```no_run
//! use doorlock_core::DeviceConfig;
//! use doorlock_emulator::EmulatedSystem;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (mut system, handles) = EmulatedSystem::new(&DeviceConfig::default());
//!     handles.keypad.send_digits(&[1, 2, 3, 4, 5]).await.unwrap();
//!     let err = system.run().await.unwrap_err();
//!     eprintln!("{err}");
//! }
//! ```

use crate::control::ControlNode;
use crate::error::EmulatorError;
use crate::hmi::HmiNode;
use doorlock_core::DeviceConfig;
use doorlock_hardware::devices::AnyByteChannel;
use doorlock_hardware::mock::{
    LineMonitor, MockDisplay, MockDisplayHandle, MockEeprom, MockEepromHandle, MockKeypad,
    MockKeypadHandle, MockPin, MockPinHandle, MockSerialLink,
};
use tracing::info;

pub type EmulatedControl = ControlNode<AnyByteChannel, MockEeprom, MockPin>;
pub type EmulatedHmi = HmiNode<AnyByteChannel, MockKeypad, MockDisplay, MockPin>;

/// Peripherals of a Control node built by [`emulated_control`].
#[derive(Debug, Clone)]
pub struct ControlHandles {
    pub motor_a: MockPinHandle,
    pub motor_b: MockPinHandle,
    pub eeprom: MockEepromHandle,
}

/// Peripherals of an HMI node built by [`emulated_hmi`].
#[derive(Debug, Clone)]
pub struct HmiHandles {
    pub keypad: MockKeypadHandle,
    pub display: MockDisplayHandle,
    pub buzzer: MockPinHandle,
}

/// Control node on `channel` with a blank mock EEPROM and mock motor pins.
pub fn emulated_control(
    channel: AnyByteChannel,
    config: &DeviceConfig,
) -> (EmulatedControl, ControlHandles) {
    let (bus, eeprom) = MockEeprom::with_device_address(config.bus.device_address);
    let (motor_a, motor_a_handle) = MockPin::new("motor a");
    let (motor_b, motor_b_handle) = MockPin::new("motor b");
    let node = ControlNode::new(channel, bus, motor_a, motor_b, config);
    let handles = ControlHandles {
        motor_a: motor_a_handle,
        motor_b: motor_b_handle,
        eeprom,
    };
    (node, handles)
}

/// HMI node on `channel` with a mock keypad, display and buzzer.
pub fn emulated_hmi(channel: AnyByteChannel, config: &DeviceConfig) -> (EmulatedHmi, HmiHandles) {
    let (keypad, keypad_handle) = MockKeypad::new();
    let (display, display_handle) = MockDisplay::new();
    let (buzzer, buzzer_handle) = MockPin::new("buzzer");
    let node = HmiNode::new(channel, keypad, display, buzzer, config);
    let handles = HmiHandles {
        keypad: keypad_handle,
        display: display_handle,
        buzzer: buzzer_handle,
    };
    (node, handles)
}

/// Handles for driving and observing an [`EmulatedSystem`].
#[derive(Debug, Clone)]
pub struct SystemHandles {
    pub keypad: MockKeypadHandle,
    pub display: MockDisplayHandle,
    pub buzzer: MockPinHandle,
    pub motor_a: MockPinHandle,
    pub motor_b: MockPinHandle,
    pub eeprom: MockEepromHandle,
    /// Traffic seen by the Control end of the serial line.
    pub control_line: LineMonitor,
    /// Traffic seen by the HMI end of the serial line.
    pub hmi_line: LineMonitor,
}

/// Control and HMI nodes sharing one mock serial line.
#[derive(Debug)]
pub struct EmulatedSystem {
    pub control: EmulatedControl,
    pub hmi: EmulatedHmi,
}

impl EmulatedSystem {
    /// Build both nodes over fresh mocks. The EEPROM starts blank.
    pub fn new(config: &DeviceConfig) -> (Self, SystemHandles) {
        let (control_port, hmi_port) = MockSerialLink::pair();
        let control_line = control_port.monitor();
        let hmi_line = hmi_port.monitor();

        let (control, control_handles) = emulated_control(control_port.into(), config);
        let (hmi, hmi_handles) = emulated_hmi(hmi_port.into(), config);

        let handles = SystemHandles {
            keypad: hmi_handles.keypad,
            display: hmi_handles.display,
            buzzer: hmi_handles.buzzer,
            motor_a: control_handles.motor_a,
            motor_b: control_handles.motor_b,
            eeprom: control_handles.eeprom,
            control_line,
            hmi_line,
        };

        (Self { control, hmi }, handles)
    }

    /// Run both nodes until one of them stops.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever node stopped first.
    pub async fn run(&mut self) -> Result<(), EmulatorError> {
        info!("Emulated door lock starting");
        tokio::select! {
            result = self.control.run() => result.map_err(EmulatorError::from),
            result = self.hmi.run() => result.map_err(EmulatorError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ControlState, HmiState};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_with_stored_credential() {
        let (mut system, handles) = EmulatedSystem::new(&DeviceConfig::default());
        handles.eeprom.load(0x0100, &[2, 6, 4, 9, 5]);

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            result = system.run() => panic!("system stopped: {result:?}"),
        }

        assert_eq!(system.control.state(), ControlState::AwaitingCommand);
        assert_eq!(system.hmi.state(), HmiState::MainMenu);
        assert_eq!(handles.display.row(0), "+ : Change PASS");
        assert_eq!(handles.display.row(1), "- : Open Door");
    }

    #[tokio::test]
    async fn test_dropped_keypad_stops_hmi() {
        let (mut system, handles) = EmulatedSystem::new(&DeviceConfig::default());
        handles.eeprom.load(0x0100, &[2, 6, 4, 9, 5]);
        drop(handles);

        let err = system.run().await.unwrap_err();

        assert!(matches!(err, EmulatorError::Hmi(ref e) if e.is_disconnected()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_separately_built_nodes_talk_over_one_line() {
        let config = DeviceConfig::default();
        let (control_port, hmi_port) = MockSerialLink::pair();
        let (mut control, control_handles) = emulated_control(control_port.into(), &config);
        let (mut hmi, hmi_handles) = emulated_hmi(hmi_port.into(), &config);
        control_handles.eeprom.load(0x0100, &[2, 6, 4, 9, 5]);

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            result = control.run() => panic!("control stopped: {result:?}"),
            result = hmi.run() => panic!("hmi stopped: {result:?}"),
        }

        assert_eq!(control.state(), ControlState::AwaitingCommand);
        assert_eq!(hmi.state(), HmiState::MainMenu);
        assert_eq!(hmi_handles.display.row(1), "- : Open Door");
    }
}
