//! Common test utilities for protocol integration tests.
//!
//! Helpers build a connected pair of links over the mock serial line and
//! keep the line monitors around so tests can assert on the exact bytes
//! each side transmitted.

#![allow(dead_code)]

use doorlock_core::NodeRole;
use doorlock_hardware::mock::{LineMonitor, MockSerialLink, MockSerialPort};
use doorlock_protocol::CommandLink;

/// Connected Control/HMI links plus a monitor for each side's output.
pub struct LinkPair {
    pub control: CommandLink<MockSerialPort>,
    pub hmi: CommandLink<MockSerialPort>,
    pub control_tx: LineMonitor,
    pub hmi_tx: LineMonitor,
}

/// Create a connected link pair.
pub fn link_pair() -> LinkPair {
    let (control, hmi) = MockSerialLink::pair();
    let control_tx = control.monitor();
    let hmi_tx = hmi.monitor();

    LinkPair {
        control: CommandLink::new(control, NodeRole::Control),
        hmi: CommandLink::new(hmi, NodeRole::Hmi),
        control_tx,
        hmi_tx,
    }
}

/// Assert that neither side lost a byte to a receive overrun.
pub fn assert_no_overruns(control_tx: &LineMonitor, hmi_tx: &LineMonitor) {
    assert_eq!(control_tx.dropped(), 0, "control rx overrun");
    assert_eq!(hmi_tx.dropped(), 0, "hmi rx overrun");
}
