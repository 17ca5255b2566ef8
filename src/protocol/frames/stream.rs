use crate::error::TransportError;
use crate::protocol::varint::{put_varint, try_get_varint};
use bytes::{Buf, BufMut, Bytes, BytesMut};

const FRAME_TYPE_STREAM_BASE: u8 = 0x08;
const FLAG_OFF: u8 = 0x04;
const FLAG_LEN: u8 = 0x02;
const FLAG_FIN: u8 = 0x01;

/// Application data on one stream. The OFF and LEN bits of the type byte
///  toggle the presence of the offset and length fields; this codec always
///  writes an explicit length so frames can be packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamFrame {
    stream_id: u64,
    offset: u64,
    fin: bool,
    data: Bytes,
}

impl StreamFrame {
    pub fn new(stream_id: u64, offset: u64, fin: bool, data: Bytes) -> StreamFrame {
        StreamFrame { stream_id, offset, fin, data }
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_fin(&self) -> bool {
        self.fin
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn ser(&self, buf: &mut BytesMut) {
        let mut type_byte = FRAME_TYPE_STREAM_BASE | FLAG_LEN;
        if self.offset > 0 {
            type_byte |= FLAG_OFF;
        }
        if self.fin {
            type_byte |= FLAG_FIN;
        }
        buf.put_u8(type_byte);

        put_varint(buf, self.stream_id);
        if self.offset > 0 {
            put_varint(buf, self.offset);
        }
        put_varint(buf, self.data.len() as u64);
        buf.put_slice(&self.data);
    }

    pub fn deser(buf: &mut impl Buf) -> Result<StreamFrame, TransportError> {
        if !buf.has_remaining() {
            return Err(TransportError::Truncated);
        }
        let type_byte = buf.get_u8();
        if type_byte & !0x07 != FRAME_TYPE_STREAM_BASE {
            return Err(TransportError::UnsupportedFrame { type_byte });
        }

        let stream_id = try_get_varint(buf)?;
        let offset = if type_byte & FLAG_OFF != 0 { try_get_varint(buf)? } else { 0 };
        let len = if type_byte & FLAG_LEN != 0 {
            try_get_varint(buf)? as usize
        } else {
            // without LEN the frame extends to the end of the packet
            buf.remaining()
        };
        if buf.remaining() < len {
            return Err(TransportError::Truncated);
        }

        Ok(StreamFrame {
            stream_id,
            offset,
            fin: type_byte & FLAG_FIN != 0,
            data: buf.copy_to_bytes(len),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_offset(StreamFrame::new(4, 0, false, Bytes::from_static(b"hi")),
        vec![0x0a, 4, 2, b'h', b'i'])]
    #[case::with_offset(StreamFrame::new(4, 10, false, Bytes::from_static(b"hi")),
        vec![0x0e, 4, 10, 2, b'h', b'i'])]
    #[case::fin(StreamFrame::new(4, 10, true, Bytes::from_static(b"")),
        vec![0x0f, 4, 10, 0])]
    fn test_roundtrip(#[case] frame: StreamFrame, #[case] expected: Vec<u8>) {
        let mut buf = BytesMut::new();
        frame.ser(&mut buf);
        assert_eq!(buf.as_ref(), expected.as_slice());

        assert_eq!(StreamFrame::deser(&mut buf.freeze()).unwrap(), frame);
    }

    #[test]
    fn test_deser_without_len_takes_rest() {
        // type 0x08: neither OFF nor LEN nor FIN
        let bytes = vec![0x08, 4, b'h', b'i'];
        let frame = StreamFrame::deser(&mut bytes.as_slice()).unwrap();

        assert_eq!(frame.stream_id(), 4);
        assert_eq!(frame.offset(), 0);
        assert_eq!(frame.data().as_ref(), b"hi");
        assert!(!frame.is_fin());
    }

    #[test]
    fn test_truncated_data() {
        let bytes = vec![0x0a, 4, 5, b'h'];
        assert_eq!(StreamFrame::deser(&mut bytes.as_slice()), Err(TransportError::Truncated));
    }
}
