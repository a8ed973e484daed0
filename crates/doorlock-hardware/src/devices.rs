//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn ByteChannel>`
//! is not available. The emulated nodes are built over [`AnyByteChannel`]:
//! the in-process system hands them mock ports, and `doorlock --role`
//! hands a single node a host UART.
//!
//! ```
//! use doorlock_hardware::devices::AnyByteChannel;
//! use doorlock_hardware::mock::MockSerialLink;
//! use doorlock_hardware::traits::ByteChannel;
//!
//! #[tokio::main]
//! async fn main() -> doorlock_hardware::Result<()> {
//!     let (control, hmi) = MockSerialLink::pair();
//!     let mut control = AnyByteChannel::Mock(control);
//!     let mut hmi = AnyByteChannel::Mock(hmi);
//!
//!     hmi.send_byte(0x01).await?;
//!     assert_eq!(control.receive_byte().await?, 0x01);
//!     Ok(())
//! }
//! ```

use crate::Result;
use crate::mock::MockSerialPort;
#[cfg(feature = "hardware-serial")]
use crate::serial::SerialPortChannel;
use crate::traits::ByteChannel;

/// Serial line selected at run time.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyByteChannel {
    /// In-process mock line.
    Mock(MockSerialPort),

    /// Host UART.
    #[cfg(feature = "hardware-serial")]
    Serial(SerialPortChannel),
}

impl AnyByteChannel {
    /// Short name of the backing line, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mock(_) => "mock",
            #[cfg(feature = "hardware-serial")]
            Self::Serial(_) => "serial",
        }
    }
}

impl ByteChannel for AnyByteChannel {
    async fn send_byte(&mut self, byte: u8) -> Result<()> {
        match self {
            Self::Mock(channel) => channel.send_byte(byte).await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(channel) => channel.send_byte(byte).await,
        }
    }

    async fn receive_byte(&mut self) -> Result<u8> {
        match self {
            Self::Mock(channel) => channel.receive_byte().await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(channel) => channel.receive_byte().await,
        }
    }
}

impl From<MockSerialPort> for AnyByteChannel {
    fn from(port: MockSerialPort) -> Self {
        Self::Mock(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSerialLink;

    #[tokio::test]
    async fn test_dispatch_to_mock() {
        let (a, b) = MockSerialLink::pair();
        let mut a = AnyByteChannel::from(a);
        let mut b = AnyByteChannel::from(b);

        a.send_byte(0x06).await.unwrap();
        assert_eq!(b.receive_byte().await.unwrap(), 0x06);
        assert_eq!(a.kind(), "mock");
    }
}
