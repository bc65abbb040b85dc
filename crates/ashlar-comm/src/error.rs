//! Error types for the communication layer.

use ashlar_core::BlockId;
use std::error::Error;
use std::fmt;

/// Errors from transport sends and receive-state bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommError {
    /// No channel is registered for the destination block.
    UnknownPeer {
        /// The destination that has no channel.
        to: BlockId,
    },
    /// The destination's receive side has been dropped.
    Disconnected {
        /// The destination whose channel is gone.
        to: BlockId,
    },
    /// A receive poll ran before `start_receiving` armed the cycle.
    NotArmed,
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPeer { to } => write!(f, "no transport peer for block {to}"),
            Self::Disconnected { to } => {
                write!(f, "transport to block {to} is disconnected")
            }
            Self::NotArmed => {
                write!(f, "receive polled before start_receiving armed the cycle")
            }
        }
    }
}

impl Error for CommError {}
