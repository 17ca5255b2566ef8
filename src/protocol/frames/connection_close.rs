use crate::error::TransportError;
use crate::protocol::varint::{put_varint, try_get_varint};
use bytes::{Buf, BufMut, BytesMut};

const FRAME_TYPE_TRANSPORT_CLOSE: u8 = 0x1c;
const FRAME_TYPE_APPLICATION_CLOSE: u8 = 0x1d;

/// CONNECTION_CLOSE in both its transport (0x1c) and application (0x1d)
///  flavours. Only the transport flavour carries the frame type that
///  triggered the close.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionCloseFrame {
    application: bool,
    error_code: u16,
    triggering_frame_type: u64,
    reason: String,
}

impl ConnectionCloseFrame {
    pub fn transport(error_code: u16, triggering_frame_type: u64, reason: &str) -> ConnectionCloseFrame {
        ConnectionCloseFrame {
            application: false,
            error_code,
            triggering_frame_type,
            reason: reason.to_string(),
        }
    }

    pub fn application(error_code: u16, reason: &str) -> ConnectionCloseFrame {
        ConnectionCloseFrame {
            application: true,
            error_code,
            triggering_frame_type: 0,
            reason: reason.to_string(),
        }
    }

    pub fn is_application(&self) -> bool {
        self.application
    }

    pub fn error_code(&self) -> u16 {
        self.error_code
    }

    pub fn triggering_frame_type(&self) -> u64 {
        self.triggering_frame_type
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn ser(&self, buf: &mut BytesMut) {
        if self.application {
            buf.put_u8(FRAME_TYPE_APPLICATION_CLOSE);
        } else {
            buf.put_u8(FRAME_TYPE_TRANSPORT_CLOSE);
        }

        buf.put_u16(self.error_code);
        if !self.application {
            put_varint(buf, self.triggering_frame_type);
        }
        put_varint(buf, self.reason.len() as u64);
        buf.put_slice(self.reason.as_bytes());
    }

    pub fn deser(buf: &mut impl Buf) -> Result<ConnectionCloseFrame, TransportError> {
        if !buf.has_remaining() {
            return Err(TransportError::Truncated);
        }
        let application = match buf.get_u8() {
            FRAME_TYPE_TRANSPORT_CLOSE => false,
            FRAME_TYPE_APPLICATION_CLOSE => true,
            type_byte => return Err(TransportError::UnsupportedFrame { type_byte }),
        };

        if buf.remaining() < 2 {
            return Err(TransportError::Truncated);
        }
        let error_code = buf.get_u16();

        let triggering_frame_type = if application { 0 } else { try_get_varint(buf)? };

        let reason_len = try_get_varint(buf)? as usize;
        if buf.remaining() < reason_len {
            return Err(TransportError::Truncated);
        }
        let mut reason_bytes = vec![0u8; reason_len];
        buf.copy_to_slice(&mut reason_bytes);
        let reason = String::from_utf8(reason_bytes)
            .map_err(|_| TransportError::InvalidReason)?;

        Ok(ConnectionCloseFrame { application, error_code, triggering_frame_type, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::transport(
        ConnectionCloseFrame::transport(0x0a, 0x02, "bad"),
        vec![0x1c, 0x00, 0x0a, 0x02, 3, b'b', b'a', b'd'])]
    #[case::transport_no_reason(
        ConnectionCloseFrame::transport(0x01, 0, ""),
        vec![0x1c, 0x00, 0x01, 0, 0])]
    #[case::application(
        ConnectionCloseFrame::application(7, "done"),
        vec![0x1d, 0x00, 0x07, 4, b'd', b'o', b'n', b'e'])]
    fn test_roundtrip(#[case] frame: ConnectionCloseFrame, #[case] expected: Vec<u8>) {
        let mut buf = BytesMut::new();
        frame.ser(&mut buf);
        assert_eq!(buf.as_ref(), expected.as_slice());

        assert_eq!(ConnectionCloseFrame::deser(&mut buf.freeze()).unwrap(), frame);
    }

    #[test]
    fn test_invalid_utf8_reason() {
        let bytes = vec![0x1d, 0x00, 0x07, 2, 0xff, 0xfe];
        assert_eq!(
            ConnectionCloseFrame::deser(&mut bytes.as_slice()),
            Err(TransportError::InvalidReason)
        );
    }

    #[test]
    fn test_truncated_reason() {
        let bytes = vec![0x1c, 0x00, 0x0a, 0x02, 5, b'b'];
        assert_eq!(
            ConnectionCloseFrame::deser(&mut bytes.as_slice()),
            Err(TransportError::Truncated)
        );
    }
}
