use crate::error::TransportError;
use crate::protocol::varint::{put_varint, try_get_varint};
use bytes::{Buf, BufMut, Bytes, BytesMut};

const FRAME_TYPE_CRYPTO: u8 = 0x06;

/// A slice of the TLS handshake byte stream at a given offset. Produced and
///  consumed by the handshake machinery; the reliability core only buffers
///  and resends it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CryptoFrame {
    offset: u64,
    data: Bytes,
}

impl CryptoFrame {
    pub fn new(offset: u64, data: Bytes) -> CryptoFrame {
        CryptoFrame { offset, data }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn ser(&self, buf: &mut BytesMut) {
        buf.put_u8(FRAME_TYPE_CRYPTO);
        put_varint(buf, self.offset);
        put_varint(buf, self.data.len() as u64);
        buf.put_slice(&self.data);
    }

    pub fn deser(buf: &mut impl Buf) -> Result<CryptoFrame, TransportError> {
        if !buf.has_remaining() {
            return Err(TransportError::Truncated);
        }
        match buf.get_u8() {
            FRAME_TYPE_CRYPTO => {}
            type_byte => return Err(TransportError::UnsupportedFrame { type_byte }),
        }

        let offset = try_get_varint(buf)?;
        let len = try_get_varint(buf)? as usize;
        if buf.remaining() < len {
            return Err(TransportError::Truncated);
        }
        Ok(CryptoFrame { offset, data: buf.copy_to_bytes(len) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let frame = CryptoFrame::new(64, Bytes::from_static(&[1, 2, 3]));

        let mut buf = BytesMut::new();
        frame.ser(&mut buf);
        assert_eq!(buf.as_ref(), &[0x06, 0x40, 0x40, 3, 1, 2, 3]);

        assert_eq!(CryptoFrame::deser(&mut buf.freeze()).unwrap(), frame);
    }

    #[test]
    fn test_truncated_data() {
        let bytes = vec![0x06, 0, 5, 1, 2];
        assert_eq!(CryptoFrame::deser(&mut bytes.as_slice()), Err(TransportError::Truncated));
    }
}
