use crate::error::TransportError;
use crate::protocol::varint::{put_varint, try_get_varint};
use bytes::{Buf, BufMut, BytesMut};

const FRAME_TYPE_RESET_STREAM: u8 = 0x04;

/// Abrupt termination of one stream's send direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResetStreamFrame {
    stream_id: u64,
    error_code: u16,
    final_offset: u64,
}

impl ResetStreamFrame {
    pub fn new(stream_id: u64, error_code: u16, final_offset: u64) -> ResetStreamFrame {
        ResetStreamFrame { stream_id, error_code, final_offset }
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn error_code(&self) -> u16 {
        self.error_code
    }

    pub fn final_offset(&self) -> u64 {
        self.final_offset
    }

    pub fn ser(&self, buf: &mut BytesMut) {
        buf.put_u8(FRAME_TYPE_RESET_STREAM);
        put_varint(buf, self.stream_id);
        buf.put_u16(self.error_code);
        put_varint(buf, self.final_offset);
    }

    pub fn deser(buf: &mut impl Buf) -> Result<ResetStreamFrame, TransportError> {
        if !buf.has_remaining() {
            return Err(TransportError::Truncated);
        }
        match buf.get_u8() {
            FRAME_TYPE_RESET_STREAM => {}
            type_byte => return Err(TransportError::UnsupportedFrame { type_byte }),
        }

        let stream_id = try_get_varint(buf)?;
        if buf.remaining() < 2 {
            return Err(TransportError::Truncated);
        }
        let error_code = buf.get_u16();
        let final_offset = try_get_varint(buf)?;

        Ok(ResetStreamFrame { stream_id, error_code, final_offset })
    }
}
