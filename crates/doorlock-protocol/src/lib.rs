//! Command protocol between the HMI and Control nodes.
//!
//! The protocol frames a closed set of one-byte [`Opcode`]s behind a
//! handshake token on the serial line. [`CommandLink`] wraps a
//! [`ByteChannel`](doorlock_hardware::ByteChannel) and provides both the
//! initiator and the responder side of every exchange, so each node uses
//! the same type.
//!
//! # Exchanges
//!
//! | Exchange | Bytes on the line                                           |
//! |----------|-------------------------------------------------------------|
//! | boot     | H:TOKEN  C:found / not-found                                |
//! | check    | H:TOKEN C:TOKEN H:check (C:TOKEN H:digit)x5 C:match / mismatch |
//! | set      | H:TOKEN C:TOKEN H:set (C:TOKEN H:digit)x5 C:found / not-found |
//! | open     | H:TOKEN C:TOKEN H:open                                      |
//! | status   | H:TOKEN C:TOKEN H:found C:found / not-found                 |

pub mod error;
pub mod link;
pub mod opcode;

pub use error::{ProtocolError, Result};
pub use link::CommandLink;
pub use opcode::{HANDSHAKE_TOKEN, Opcode};
