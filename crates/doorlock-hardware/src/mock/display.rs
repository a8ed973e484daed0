//! Mock character display.
//!
//! A fixed grid of ASCII cells (2 x 16 by default). Writes past the last
//! column are clipped, like the real controller's visible window. Every
//! change publishes the full frame to a [`tokio::sync::watch`] channel so
//! the terminal front end can redraw it.

use crate::{
    HardwareError, Result,
    traits::DisplayDevice,
};
use doorlock_core::constants::{DISPLAY_COLUMNS, DISPLAY_ROWS};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

#[derive(Debug)]
struct Screen {
    cells: Vec<Vec<u8>>,
    writes: Vec<String>,
}

impl Screen {
    fn rows(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| String::from_utf8_lossy(row).into_owned())
            .collect()
    }
}

/// Mock display device.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockDisplay;
/// use doorlock_hardware::traits::DisplayDevice;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut display, handle) = MockDisplay::new();
///
///     display.write_at(0, 0, "Enter  PASS").await?;
///     display.write_at(1, 0, "*").await?;
///
///     assert_eq!(handle.row(0), "Enter  PASS");
///     assert_eq!(handle.row(1), "*");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    rows: usize,
    columns: usize,
    screen: Arc<Mutex<Screen>>,
    frames: watch::Sender<Vec<String>>,
}

impl MockDisplay {
    /// Create a blank display with the HMI's geometry.
    pub fn new() -> (Self, MockDisplayHandle) {
        Self::with_size(DISPLAY_ROWS, DISPLAY_COLUMNS)
    }

    /// Create a blank display of `rows` x `columns`.
    pub fn with_size(rows: usize, columns: usize) -> (Self, MockDisplayHandle) {
        let screen = Arc::new(Mutex::new(Screen {
            cells: vec![vec![b' '; columns]; rows],
            writes: Vec::new(),
        }));
        let (frames, frame_rx) = watch::channel(vec![" ".repeat(columns); rows]);

        let display = Self {
            rows,
            columns,
            screen: Arc::clone(&screen),
            frames,
        };
        let handle = MockDisplayHandle { screen, frame_rx };

        (display, handle)
    }

    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, screen: &Screen) {
        self.frames.send_replace(screen.rows());
    }
}

impl DisplayDevice for MockDisplay {
    async fn clear(&mut self) -> Result<()> {
        let mut screen = self.screen();
        for row in &mut screen.cells {
            row.fill(b' ');
        }
        self.publish(&screen);
        Ok(())
    }

    async fn write_at(&mut self, row: usize, column: usize, text: &str) -> Result<()> {
        if row >= self.rows {
            return Err(HardwareError::invalid_data(format!(
                "Row {} out of range (display has {} rows)",
                row, self.rows
            )));
        }
        if !text.is_ascii() {
            return Err(HardwareError::invalid_data(format!(
                "Display accepts ASCII only: {:?}",
                text
            )));
        }

        let mut screen = self.screen();
        let columns = self.columns;
        for (offset, byte) in text.bytes().enumerate() {
            let col = column + offset;
            if col >= columns {
                break;
            }
            screen.cells[row][col] = byte;
        }
        screen.writes.push(text.to_string());
        self.publish(&screen);
        Ok(())
    }
}

/// Handle for observing a mock display.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    screen: Arc<Mutex<Screen>>,
    frame_rx: watch::Receiver<Vec<String>>,
}

impl MockDisplayHandle {
    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Row contents with trailing blanks trimmed. Empty if out of range.
    pub fn row(&self, index: usize) -> String {
        self.screen()
            .rows()
            .get(index)
            .map(|row| row.trim_end().to_string())
            .unwrap_or_default()
    }

    /// Every text written since creation, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.screen().writes.clone()
    }

    /// Check whether `text` was ever written.
    pub fn contains(&self, text: &str) -> bool {
        self.screen().writes.iter().any(|written| written == text)
    }

    /// Number of times `text` was written.
    pub fn count(&self, text: &str) -> usize {
        self.screen()
            .writes
            .iter()
            .filter(|written| *written == text)
            .count()
    }

    /// Subscribe to full-frame updates.
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.frame_rx.clone()
    }
}
