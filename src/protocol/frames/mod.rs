//! Frame variants and their wire codecs. The set of variants is closed:
//!  every dispatch in the reliability core is an exhaustive match, and a
//!  frame type this endpoint does not implement fails parsing explicitly
//!  rather than being skipped.

mod ack;
mod connection_close;
mod crypto;
mod reset_stream;
mod stream;

pub use ack::{AckBlock, AckFrame, FRAME_TYPE_ACK};
pub use connection_close::ConnectionCloseFrame;
pub use crypto::CryptoFrame;
pub use reset_stream::ResetStreamFrame;
pub use stream::StreamFrame;

use crate::error::TransportError;
use bytes::{Buf, BufMut, BytesMut};

const FRAME_TYPE_PADDING: u8 = 0x00;
const FRAME_TYPE_PING: u8 = 0x01;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Padding,
    Ping,
    Ack(AckFrame),
    ResetStream(ResetStreamFrame),
    Crypto(CryptoFrame),
    Stream(StreamFrame),
    ConnectionClose(ConnectionCloseFrame),
}

impl Frame {
    /// Whether this frame obliges the peer to respond with an ACK. ACK and
    ///  PADDING are pure state, and CONNECTION_CLOSE terminates the
    ///  conversation, so none of the three elicits.
    pub fn is_ack_eliciting(&self) -> bool {
        !matches!(self, Frame::Ack(_) | Frame::Padding | Frame::ConnectionClose(_))
    }

    pub fn ser(&self, buf: &mut BytesMut) {
        match self {
            Frame::Padding => buf.put_u8(FRAME_TYPE_PADDING),
            Frame::Ping => buf.put_u8(FRAME_TYPE_PING),
            Frame::Ack(f) => f.ser(buf),
            Frame::ResetStream(f) => f.ser(buf),
            Frame::Crypto(f) => f.ser(buf),
            Frame::Stream(f) => f.ser(buf),
            Frame::ConnectionClose(f) => f.ser(buf),
        }
    }

    pub fn deser(buf: &mut impl Buf) -> Result<Frame, TransportError> {
        if !buf.has_remaining() {
            return Err(TransportError::Truncated);
        }

        // dispatch on the type byte without consuming it - each codec reads
        //  its own type byte
        match buf.chunk()[0] {
            FRAME_TYPE_PADDING => {
                buf.advance(1);
                Ok(Frame::Padding)
            }
            FRAME_TYPE_PING => {
                buf.advance(1);
                Ok(Frame::Ping)
            }
            0x02 | 0x03 => AckFrame::deser(buf).map(Frame::Ack),
            0x04 => ResetStreamFrame::deser(buf).map(Frame::ResetStream),
            0x06 => CryptoFrame::deser(buf).map(Frame::Crypto),
            0x08..=0x0f => StreamFrame::deser(buf).map(Frame::Stream),
            0x1c | 0x1d => ConnectionCloseFrame::deser(buf).map(Frame::ConnectionClose),
            type_byte => Err(TransportError::UnsupportedFrame { type_byte }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rstest::rstest;

    #[rstest]
    #[case::padding(Frame::Padding, false)]
    #[case::ping(Frame::Ping, true)]
    #[case::ack(Frame::Ack(AckFrame::new(0, vec![AckBlock::from_raw(1, 1)])), false)]
    #[case::crypto(Frame::Crypto(CryptoFrame::new(0, Bytes::new())), true)]
    #[case::stream(Frame::Stream(StreamFrame::new(4, 0, false, Bytes::new())), true)]
    #[case::reset_stream(Frame::ResetStream(ResetStreamFrame::new(4, 0, 0)), true)]
    #[case::connection_close(Frame::ConnectionClose(ConnectionCloseFrame::application(0, "bye")), false)]
    fn test_ack_eliciting(#[case] frame: Frame, #[case] expected: bool) {
        assert_eq!(frame.is_ack_eliciting(), expected);
    }

    #[rstest]
    #[case::padding(Frame::Padding)]
    #[case::ping(Frame::Ping)]
    #[case::ack(Frame::Ack(AckFrame::new(45, vec![AckBlock::from_raw(7, 8)])))]
    #[case::crypto(Frame::Crypto(CryptoFrame::new(3, Bytes::from_static(&[1, 2]))))]
    #[case::stream(Frame::Stream(StreamFrame::new(4, 8, true, Bytes::from_static(b"x"))))]
    #[case::reset_stream(Frame::ResetStream(ResetStreamFrame::new(4, 1, 2)))]
    #[case::close(Frame::ConnectionClose(ConnectionCloseFrame::transport(0x0a, 0x02, "nope")))]
    fn test_dispatch_roundtrip(#[case] frame: Frame) {
        let mut buf = BytesMut::new();
        frame.ser(&mut buf);
        assert_eq!(Frame::deser(&mut buf.freeze()).unwrap(), frame);
    }

    #[test]
    fn test_unknown_type_byte() {
        let bytes = vec![0x42];
        assert_eq!(
            Frame::deser(&mut bytes.as_slice()),
            Err(TransportError::UnsupportedFrame { type_byte: 0x42 })
        );
    }

    #[test]
    fn test_sequence_of_frames() {
        let mut buf = BytesMut::new();
        Frame::Ping.ser(&mut buf);
        Frame::Stream(StreamFrame::new(4, 0, false, Bytes::from_static(b"hi"))).ser(&mut buf);
        Frame::Padding.ser(&mut buf);

        let mut read_buf = buf.freeze();
        assert_eq!(Frame::deser(&mut read_buf).unwrap(), Frame::Ping);
        assert!(matches!(Frame::deser(&mut read_buf).unwrap(), Frame::Stream(_)));
        assert_eq!(Frame::deser(&mut read_buf).unwrap(), Frame::Padding);
        assert!(!read_buf.has_remaining());
    }
}
