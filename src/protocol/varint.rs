use crate::error::TransportError;
use bytes::{Buf, BufMut};

/// The largest value representable as a QUIC variable-length integer (62 bits).
pub const MAX: u64 = (1 << 62) - 1;

/// Write a QUIC variable-length integer: a 2-bit length prefix in the first
///  byte selects a 1, 2, 4 or 8 byte big-endian encoding.
///
/// Panics if `value` exceeds [`MAX`] - packet numbers, stream ids and frame
///  lengths are all bounded well below 2^62.
pub fn put_varint(buf: &mut impl BufMut, value: u64) {
    match value {
        0..=0x3f => buf.put_u8(value as u8),
        0x40..=0x3fff => buf.put_u16(value as u16 | 0x4000),
        0x4000..=0x3fff_ffff => buf.put_u32(value as u32 | 0x8000_0000),
        0x4000_0000..=MAX => buf.put_u64(value | 0xc000_0000_0000_0000),
        _ => panic!("value {} exceeds the varint range", value),
    }
}

pub fn try_get_varint(buf: &mut impl Buf) -> Result<u64, TransportError> {
    if !buf.has_remaining() {
        return Err(TransportError::Truncated);
    }

    let first = buf.get_u8();
    let mut value = u64::from(first & 0x3f);

    // the prefix encodes the total length as 1 << prefix
    let num_continuation_bytes = (1usize << (first >> 6)) - 1;
    if buf.remaining() < num_continuation_bytes {
        return Err(TransportError::Truncated);
    }
    for _ in 0..num_continuation_bytes {
        value = (value << 8) | u64::from(buf.get_u8());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, vec![0x00])]
    #[case::one_byte_max(63, vec![0x3f])]
    #[case::two_bytes_min(64, vec![0x40, 0x40])]
    #[case::draft_example_two_bytes(15_293, vec![0x7b, 0xbd])]
    #[case::two_bytes_max(16_383, vec![0x7f, 0xff])]
    #[case::four_bytes_min(16_384, vec![0x80, 0x00, 0x40, 0x00])]
    #[case::draft_example_four_bytes(494_878_333, vec![0x9d, 0x7f, 0x3e, 0x7d])]
    #[case::four_bytes_max(1_073_741_823, vec![0xbf, 0xff, 0xff, 0xff])]
    #[case::eight_bytes_min(1_073_741_824, vec![0xc0, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00])]
    #[case::draft_example_eight_bytes(151_288_809_941_952_652, vec![0xc2, 0x19, 0x7c, 0x5e, 0xff, 0x14, 0xe8, 0x8c])]
    #[case::max(MAX, vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff])]
    fn test_roundtrip(#[case] value: u64, #[case] expected: Vec<u8>) {
        let mut buf = BytesMut::new();
        put_varint(&mut buf, value);
        assert_eq!(buf.as_ref(), expected.as_slice());

        let mut read_buf = buf.freeze();
        assert_eq!(try_get_varint(&mut read_buf).unwrap(), value);
        assert!(!read_buf.has_remaining());
    }

    #[rstest]
    #[case::empty(vec![])]
    #[case::missing_continuation_two(vec![0x40])]
    #[case::missing_continuation_four(vec![0x80, 0x00])]
    #[case::missing_continuation_eight(vec![0xc0, 0x00, 0x00])]
    fn test_truncated(#[case] bytes: Vec<u8>) {
        let mut buf = bytes.as_slice();
        assert_eq!(try_get_varint(&mut buf), Err(TransportError::Truncated));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range() {
        put_varint(&mut BytesMut::new(), MAX + 1);
    }
}
