//! Host UART transport using the `serialport` crate.
//!
//! Frame format is fixed at 8 data bits, no parity, one stop bit. The port
//! handle is blocking, so reads and writes run on tokio's blocking pool.
//! Reads poll with a short port timeout so a pending receive never holds
//! the port lock for long.

use crate::{HardwareError, Result, traits::ByteChannel};
use doorlock_core::config::SerialConfig;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, trace};

const READ_POLL: Duration = Duration::from_millis(50);

/// Serial line over a host UART.
pub struct SerialPortChannel {
    path: String,
    port: Arc<Mutex<Box<dyn SerialPort>>>,
}

impl SerialPortChannel {
    /// Open the port named in `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no port path is set, or a
    /// communication error if the port cannot be opened.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let path = config
            .port
            .clone()
            .ok_or_else(|| HardwareError::configuration("serial port path not set"))?;

        let port = serialport::new(&path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(READ_POLL)
            .open()
            .map_err(|e| HardwareError::communication(format!("{}: {}", path, e)))?;

        debug!("Opened {} at {} baud", path, config.baud_rate);

        Ok(Self {
            path,
            port: Arc::new(Mutex::new(port)),
        })
    }

    /// Port path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for SerialPortChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortChannel")
            .field("path", &self.path)
            .finish()
    }
}

fn join_error(e: tokio::task::JoinError) -> HardwareError {
    HardwareError::communication(format!("serial worker failed: {}", e))
}

impl ByteChannel for SerialPortChannel {
    async fn send_byte(&mut self, byte: u8) -> Result<()> {
        let port = Arc::clone(&self.port);
        tokio::task::spawn_blocking(move || {
            let mut port = port.lock().unwrap_or_else(PoisonError::into_inner);
            port.write_all(&[byte])?;
            port.flush()
        })
        .await
        .map_err(join_error)??;

        trace!("{} tx 0x{:02X}", self.path, byte);
        Ok(())
    }

    async fn receive_byte(&mut self) -> Result<u8> {
        loop {
            let port = Arc::clone(&self.port);
            let received = tokio::task::spawn_blocking(move || {
                let mut buf = [0u8; 1];
                let mut port = port.lock().unwrap_or_else(PoisonError::into_inner);
                match port.read(&mut buf) {
                    Ok(1) => Ok(Some(buf[0])),
                    Ok(_) => Ok(None),
                    Err(e) if e.kind() == ErrorKind::TimedOut => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(join_error)??;

            if let Some(byte) = received {
                trace!("{} rx 0x{:02X}", self.path, byte);
                return Ok(byte);
            }
        }
    }
}
