//! Mock device implementations for testing and development.
//!
//! Every mock is created as a `(device, handle)` pair: the device moves into
//! a node, the cloneable handle stays with the test or front end to drive
//! input and observe output.

pub mod display;
pub mod eeprom;
pub mod keypad;
pub mod pin;
pub mod serial;

pub use display::{MockDisplay, MockDisplayHandle};
pub use eeprom::{MockEeprom, MockEepromHandle};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use pin::{MockPin, MockPinHandle};
pub use serial::{LineMonitor, MockSerialLink, MockSerialPort};
