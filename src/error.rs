use crate::pipeline::ConnectionState;
use crate::protocol::frames::ConnectionCloseFrame;
use thiserror::Error;

/// Transport error code signalling a peer protocol violation (draft-18 §20).
pub const PROTOCOL_VIOLATION: u16 = 0x0a;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// An ACK block whose bounds are inverted, or whose ranges underflow the
    ///  packet number space.
    #[error("malformed ack block [{smallest}, {largest}]")]
    MalformedAck { smallest: u64, largest: u64 },
    /// A packet carrying application data arrived while the connection does
    ///  not admit data frames yet.
    #[error("packet not admissible in connection state {state:?}")]
    FatalState { state: ConnectionState },
    #[error("connection is closed")]
    ConnectionClosed,
    #[error("unsupported frame type {type_byte:#04x}")]
    UnsupportedFrame { type_byte: u8 },
    #[error("truncated frame")]
    Truncated,
    #[error("reason phrase is not valid UTF-8")]
    InvalidReason,
}

impl TransportError {
    /// Maps a violation caused by peer input to the CONNECTION_CLOSE frame
    ///  that terminates the connection. Local failures (closed connection)
    ///  have no peer-facing close and return None.
    pub fn close_frame(&self) -> Option<ConnectionCloseFrame> {
        let triggering_frame_type = match self {
            TransportError::MalformedAck { .. } => crate::protocol::frames::FRAME_TYPE_ACK as u64,
            TransportError::UnsupportedFrame { type_byte } => *type_byte as u64,
            TransportError::FatalState { .. }
            | TransportError::Truncated
            | TransportError::InvalidReason => 0,
            TransportError::ConnectionClosed => return None,
        };

        Some(ConnectionCloseFrame::transport(
            PROTOCOL_VIOLATION,
            triggering_frame_type,
            &self.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_frame_for_malformed_ack() {
        let err = TransportError::MalformedAck { smallest: 8, largest: 3 };

        let frame = err.close_frame().unwrap();
        assert_eq!(frame.error_code(), PROTOCOL_VIOLATION);
        assert_eq!(frame.triggering_frame_type(), 0x02);
        assert!(frame.reason().contains("malformed ack block"));
    }

    #[test]
    fn test_no_close_frame_for_local_errors() {
        assert_eq!(TransportError::ConnectionClosed.close_frame(), None);
    }
}
