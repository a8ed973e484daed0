//! Mock keypad implementation for testing and development.
//!
//! Key presses are queued through a [`MockKeypadHandle`]. The handle can
//! also keep a key held down, which is what the root override sequence
//! checks for after its hold delay.

use crate::{
    HardwareError, Result,
    traits::{KeypadDevice, KeypadInput},
};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Mock keypad device for testing and development.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockKeypad;
/// use doorlock_hardware::traits::{KeypadDevice, KeypadInput};
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///
///     handle.send_input(KeypadInput::Plus).await?;
///     handle.send_digits(&[1, 2]).await?;
///
///     assert_eq!(keypad.read_input().await?, KeypadInput::Plus);
///     assert_eq!(keypad.read_input().await?, KeypadInput::Digit(1));
///     assert_eq!(keypad.read_input().await?, KeypadInput::Digit(2));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    input_rx: mpsc::Receiver<KeypadInput>,
    held: Arc<Mutex<Option<KeypadInput>>>,
}

impl MockKeypad {
    /// Create a new mock keypad and the handle that drives it.
    pub fn new() -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::channel(64);
        let held = Arc::new(Mutex::new(None));

        let keypad = Self {
            input_rx,
            held: Arc::clone(&held),
        };
        let handle = MockKeypadHandle { input_tx, held };

        (keypad, handle)
    }
}

impl KeypadDevice for MockKeypad {
    async fn read_input(&mut self) -> Result<KeypadInput> {
        self.input_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("keypad input channel"))
    }

    async fn is_held(&mut self, key: KeypadInput) -> Result<bool> {
        let held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(*held == Some(key))
    }
}

/// Handle for controlling a mock keypad. Cloneable across tasks.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    input_tx: mpsc::Sender<KeypadInput>,
    held: Arc<Mutex<Option<KeypadInput>>>,
}

impl MockKeypadHandle {
    /// Queue one key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub async fn send_input(&self, input: KeypadInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| HardwareError::disconnected("keypad input channel"))
    }

    /// Queue a sequence of digit presses.
    ///
    /// # Errors
    ///
    /// Returns an error if any digit is greater than 9 or the keypad has
    /// been dropped.
    pub async fn send_digits(&self, digits: &[u8]) -> Result<()> {
        for &digit in digits {
            self.send_input(KeypadInput::digit(digit)?).await?;
        }
        Ok(())
    }

    /// Press `key` and keep it held until [`release`](Self::release).
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub async fn hold(&self, key: KeypadInput) -> Result<()> {
        self.set_held(Some(key));
        self.send_input(key).await
    }

    /// Release any held key.
    pub fn release(&self) {
        self.set_held(None);
    }

    /// Key currently held down, if any.
    pub fn held(&self) -> Option<KeypadInput> {
        *self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_held(&self, key: Option<KeypadInput>) {
        *self.held.lock().unwrap_or_else(PoisonError::into_inner) = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_keypad_sequence() {
        let (mut keypad, handle) = MockKeypad::new();

        tokio::spawn(async move {
            handle.send_input(KeypadInput::Minus).await.unwrap();
            handle.send_digits(&[4, 2]).await.unwrap();
        });

        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Minus);
        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Digit(4));
        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Digit(2));
    }

    #[tokio::test]
    async fn test_send_digits_rejects_invalid_digit() {
        let (_keypad, handle) = MockKeypad::new();
        assert!(handle.send_digits(&[1, 10]).await.is_err());
    }

    #[tokio::test]
    async fn test_hold_and_release() {
        let (mut keypad, handle) = MockKeypad::new();

        handle.hold(KeypadInput::Equals).await.unwrap();
        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Equals);
        assert!(keypad.is_held(KeypadInput::Equals).await.unwrap());
        assert!(!keypad.is_held(KeypadInput::Plus).await.unwrap());

        handle.release();
        assert!(!keypad.is_held(KeypadInput::Equals).await.unwrap());
        assert_eq!(handle.held(), None);
    }

    #[tokio::test]
    async fn test_mock_keypad_closed_channel() {
        let (mut keypad, handle) = MockKeypad::new();
        drop(handle);

        assert!(matches!(
            keypad.read_input().await,
            Err(HardwareError::Disconnected { .. })
        ));
    }
}
