use nat_stun::error::{EncodeError, ParsePacketErr};
use std::io;
use thiserror::Error;

/// Everything that aborts a discovery run.
///
/// A probe that gets no reply is not an error, see
/// [`Transport::send_and_await`](crate::channel::Transport::send_and_await).
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("protocol fault: {0}")]
    ProtocolFault(String),

    #[error("channel closed while waiting for a reply")]
    Cancelled,
}

impl From<ParsePacketErr> for ProbeError {
    fn from(e: ParsePacketErr) -> Self {
        ProbeError::ProtocolFault(e.to_string())
    }
}

impl From<EncodeError> for ProbeError {
    fn from(e: EncodeError) -> Self {
        ProbeError::InvalidArgument(e.0)
    }
}
