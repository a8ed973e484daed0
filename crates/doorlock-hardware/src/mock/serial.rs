//! Mock serial line connecting two nodes in one process.
//!
//! [`MockSerialLink::pair`] returns two cross-wired ports. Each port's
//! receive side is a [`SingleSlot`]: a byte sent by one port lands in the
//! other's slot, overwriting any byte still unread there.

use crate::{HardwareError, Result, cell::SingleSlot, traits::ByteChannel};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// Factory for cross-wired mock serial ports.
#[derive(Debug)]
pub struct MockSerialLink;

impl MockSerialLink {
    /// Create two ports wired TX→RX in both directions.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::mock::MockSerialLink;
    /// use doorlock_hardware::traits::ByteChannel;
    ///
    /// #[tokio::main]
    /// async fn main() -> doorlock_hardware::Result<()> {
    ///     let (mut control, mut hmi) = MockSerialLink::pair();
    ///
    ///     hmi.send_byte(0x01).await?;
    ///     assert_eq!(control.receive_byte().await?, 0x01);
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn pair() -> (MockSerialPort, MockSerialPort) {
        Self::named_pair("control uart", "hmi uart")
    }

    /// Create a pair with custom port names (used in log lines).
    pub fn named_pair(a: &'static str, b: &'static str) -> (MockSerialPort, MockSerialPort) {
        let a_rx = Arc::new(SingleSlot::new(a));
        let b_rx = Arc::new(SingleSlot::new(b));

        let port_a = MockSerialPort::new(a, Arc::clone(&a_rx), Arc::clone(&b_rx));
        let port_b = MockSerialPort::new(b, b_rx, a_rx);

        (port_a, port_b)
    }
}

/// One end of a mock serial line.
#[derive(Debug)]
pub struct MockSerialPort {
    name: &'static str,
    rx: Arc<SingleSlot>,
    tx: Arc<SingleSlot>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockSerialPort {
    fn new(name: &'static str, rx: Arc<SingleSlot>, tx: Arc<SingleSlot>) -> Self {
        Self {
            name,
            rx,
            tx,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Port name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Monitor for this port, usable after the port moves into a node.
    pub fn monitor(&self) -> LineMonitor {
        LineMonitor {
            rx: Arc::clone(&self.rx),
            sent: Arc::clone(&self.sent),
        }
    }

    /// Register the byte-received callback of this port.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::CallbackAlreadyRegistered` on a second call.
    pub fn register_receive_callback(
        &self,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Result<()> {
        self.rx.register_callback(callback)
    }
}

impl ByteChannel for MockSerialPort {
    async fn send_byte(&mut self, byte: u8) -> Result<()> {
        if self.tx.is_closed() {
            return Err(HardwareError::disconnected(self.name));
        }

        trace!("{} tx 0x{:02X}", self.name, byte);
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(byte);
        self.tx.deposit(byte);
        // Give the receiving node a chance to run before the next byte.
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn receive_byte(&mut self) -> Result<u8> {
        let byte = self
            .rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.name))?;
        trace!("{} rx 0x{:02X}", self.name, byte);
        Ok(byte)
    }
}

impl Drop for MockSerialPort {
    fn drop(&mut self) {
        // The peer sees a disconnected line once it drains its slot.
        self.tx.close();
        self.rx.close();
    }
}

/// Read-only view of a mock port's traffic.
#[derive(Debug, Clone)]
pub struct LineMonitor {
    rx: Arc<SingleSlot>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl LineMonitor {
    /// Every byte the port has transmitted, in order.
    pub fn sent(&self) -> Vec<u8> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bytes lost to receive overruns on this port.
    pub fn dropped(&self) -> u64 {
        self.rx.dropped()
    }

    /// Byte waiting in this port's receive slot, if any.
    pub fn pending(&self) -> Option<u8> {
        self.rx.peek()
    }
}
