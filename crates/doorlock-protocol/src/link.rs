//! Handshake-framed command exchange over a byte channel.
//!
//! # Wire Exchange
//!
//! Every exchange is strictly alternating: a node only transmits after it
//! has consumed the peer's previous byte, so the single-slot receiver never
//! overruns.
//!
//! ```text
//! turn:      initiator  TOKEN ─────────►
//!            responder          ◄───────── TOKEN
//!            initiator  OPCODE ────────►
//! payload:   receiver           ◄───────── TOKEN      (once per byte)
//!            sender     BYTE ──────────►
//! reply:     responder          ◄───────── OPCODE
//! ```
//!
//! Payload bytes are pulled by the receiver: it sends a token when it is
//! ready for the next byte and the sender answers with exactly one byte.
//!
//! Bytes other than the token that arrive while a node waits for a token
//! are discarded and counted.

use crate::{
    HANDSHAKE_TOKEN, Opcode,
    error::{ProtocolError, Result},
};
use doorlock_core::NodeRole;
use doorlock_hardware::ByteChannel;
use tracing::{debug, trace, warn};

/// One node's end of the command protocol.
///
/// Not reentrant: one exchange at a time, driven by the owning node.
///
/// # Examples
///
/// ```
/// use doorlock_core::NodeRole;
/// use doorlock_hardware::mock::MockSerialLink;
/// use doorlock_protocol::{CommandLink, Opcode};
///
/// #[tokio::main]
/// async fn main() -> doorlock_protocol::Result<()> {
///     let (control, hmi) = MockSerialLink::pair();
///     let mut control = CommandLink::new(control, NodeRole::Control);
///     let mut hmi = CommandLink::new(hmi, NodeRole::Hmi);
///
///     let (sent, received) = tokio::join!(
///         hmi.request(Opcode::OpenDoor),
///         control.accept_request(),
///     );
///     sent?;
///     assert_eq!(received?, Opcode::OpenDoor);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct CommandLink<C> {
    channel: C,
    role: NodeRole,
    discarded: u64,
}

impl<C: ByteChannel> CommandLink<C> {
    /// Wrap `channel` as the `role` end of the link.
    pub fn new(channel: C, role: NodeRole) -> Self {
        Self {
            channel,
            role,
            discarded: 0,
        }
    }

    /// Role of this end.
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Bytes discarded while waiting for a token.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Access the underlying channel.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Transmit the handshake token.
    pub async fn send_ready(&mut self) -> Result<()> {
        self.channel.send_byte(HANDSHAKE_TOKEN).await?;
        Ok(())
    }

    /// Block until the handshake token arrives, discarding anything else.
    pub async fn wait_ready(&mut self) -> Result<()> {
        loop {
            let byte = self.channel.receive_byte().await?;
            if byte == HANDSHAKE_TOKEN {
                return Ok(());
            }
            self.discarded += 1;
            warn!("{} discarded 0x{:02X} while waiting for token", self.role, byte);
        }
    }

    /// Initiator side of a turn: send the token, wait for it to come back.
    pub async fn send_ready_and_wait_ack(&mut self) -> Result<()> {
        self.send_ready().await?;
        self.wait_ready().await
    }

    /// Responder side of a turn: wait for the token, echo it.
    pub async fn wait_ready_and_ack(&mut self) -> Result<()> {
        self.wait_ready().await?;
        self.send_ready().await
    }

    /// Transmit an opcode.
    pub async fn send(&mut self, opcode: Opcode) -> Result<()> {
        trace!("{} -> {}", self.role, opcode);
        self.channel.send_byte(opcode.code()).await?;
        Ok(())
    }

    /// Receive and decode one opcode.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnknownOpcode` if the byte is not an opcode.
    pub async fn recv_opcode(&mut self) -> Result<Opcode> {
        let byte = self.channel.receive_byte().await?;
        let opcode = Opcode::parse(byte)?;
        trace!("{} <- {}", self.role, opcode);
        Ok(opcode)
    }

    /// Send payload bytes, each one only after the receiver asks for it.
    pub async fn send_payload(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.wait_ready().await?;
            self.channel.send_byte(byte).await?;
        }
        Ok(())
    }

    /// Pull `len` payload bytes, one token per byte.
    pub async fn recv_payload(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            self.send_ready().await?;
            bytes.push(self.channel.receive_byte().await?);
        }
        Ok(bytes)
    }

    /// Open an exchange: one handshake turn, then the request opcode.
    pub async fn request(&mut self, opcode: Opcode) -> Result<()> {
        debug!("{} requests {}", self.role, opcode);
        self.send_ready_and_wait_ack().await?;
        self.send(opcode).await
    }

    /// Accept the next exchange and return its request opcode.
    pub async fn accept_request(&mut self) -> Result<Opcode> {
        self.wait_ready_and_ack().await?;
        let opcode = self.recv_opcode().await?;
        debug!("{} accepted {}", self.role, opcode);
        Ok(opcode)
    }

    /// Receive a reply that must be one of `allowed`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnexpectedOpcode` for any other opcode.
    pub async fn expect_reply(
        &mut self,
        allowed: &[Opcode],
        expected: &'static str,
    ) -> Result<Opcode> {
        let opcode = self.recv_opcode().await?;
        if allowed.contains(&opcode) {
            Ok(opcode)
        } else {
            Err(ProtocolError::unexpected(expected, opcode))
        }
    }

    /// HMI side of the boot exchange: send the token, return the slot
    /// status the peer answers with.
    ///
    /// A peer that already finished its own boot treats the token as the
    /// start of a turn and echoes it. The turn is then completed with a
    /// status request (`CredentialFound`), which the peer answers the same
    /// way.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnexpectedOpcode` if the answer is neither
    /// `CredentialFound` nor `CredentialNotFound`.
    pub async fn boot_exchange(&mut self) -> Result<Opcode> {
        self.send_ready().await?;
        let byte = self.channel.receive_byte().await?;

        let opcode = if byte == HANDSHAKE_TOKEN {
            debug!("{} peer already running, requesting status", self.role);
            self.send(Opcode::CredentialFound).await?;
            self.recv_opcode().await?
        } else {
            Opcode::parse(byte)?
        };

        match opcode {
            Opcode::CredentialFound | Opcode::CredentialNotFound => Ok(opcode),
            other => Err(ProtocolError::unexpected("found or not-found", other)),
        }
    }
}
