//! Door lock node logic.
//!
//! This crate contains the two state machines of the door lock and the
//! glue that runs them together:
//!
//! - [`control`]: the Control node, which owns the credential slot and the
//!   door motor and answers requests from the HMI.
//! - [`hmi`]: the HMI node, which prompts on the display, reads the keypad
//!   under an input watchdog and enforces the lockout policy.
//! - [`system`]: nodes over mock peripherals, both on one mock line or one
//!   at a time on any serial line, as used by the CLI and the integration
//!   tests.
//!
//! Both nodes are generic over the traits in `doorlock-hardware`, so the
//! same code runs against mocks or real peripherals.

pub mod control;
pub mod error;
pub mod hmi;
pub mod state_machine;
pub mod system;

pub use control::{ControlEvent, ControlNode, ControlState, DoorMotor, MotorDrive};
pub use error::{ControlError, ControlResult, EmulatorError, HmiError, HmiResult};
pub use hmi::{AttemptCounter, HmiNode, HmiState, Operation};
pub use state_machine::{MAX_HISTORY_SIZE, NodeState, StateMachine, StateTransition};
pub use system::{
    ControlHandles, EmulatedControl, EmulatedHmi, EmulatedSystem, HmiHandles, SystemHandles,
    emulated_control, emulated_hmi,
};
