use crate::error::TransportError;
use crate::protocol::packet_number::PacketNumber;
use crate::protocol::varint::{put_varint, try_get_varint};
use bytes::{Buf, BufMut, BytesMut};

pub const FRAME_TYPE_ACK: u8 = 0x02;
const FRAME_TYPE_ACK_ECN: u8 = 0x03;

/// A closed interval `[smallest, largest]` of acknowledged packet numbers,
///  both bounds inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AckBlock {
    smallest: PacketNumber,
    largest: PacketNumber,
}

impl AckBlock {
    pub fn new(smallest: PacketNumber, largest: PacketNumber) -> AckBlock {
        AckBlock { smallest, largest }
    }

    pub fn from_raw(smallest: u64, largest: u64) -> AckBlock {
        AckBlock::new(PacketNumber::from_raw(smallest), PacketNumber::from_raw(largest))
    }

    pub fn smallest(&self) -> PacketNumber {
        self.smallest
    }

    pub fn largest(&self) -> PacketNumber {
        self.largest
    }

    /// A peer may emit inverted bounds; the reliability core refuses such
    ///  blocks as a protocol violation rather than guessing an intent.
    pub fn is_well_formed(&self) -> bool {
        self.smallest <= self.largest
    }
}

/// An ACK frame: the encoded ack delay plus an ascending list of disjoint
///  [`AckBlock`]s. The wire format carries blocks largest-first; the codec
///  reverses on the way in and out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AckFrame {
    ack_delay: u64,
    blocks: Vec<AckBlock>,
}

impl AckFrame {
    pub fn new(ack_delay: u64, blocks: Vec<AckBlock>) -> AckFrame {
        assert!(!blocks.is_empty(), "an ACK frame must acknowledge at least one packet");
        AckFrame { ack_delay, blocks }
    }

    /// The ack delay, already scaled down by the sender's ack_delay_exponent.
    pub fn ack_delay(&self) -> u64 {
        self.ack_delay
    }

    /// Blocks in ascending order of packet number.
    pub fn blocks(&self) -> &[AckBlock] {
        &self.blocks
    }

    pub fn ser(&self, buf: &mut BytesMut) {
        let mut descending = self.blocks.iter().rev();
        let first = descending.next()
            .expect("construction enforces at least one block");

        buf.put_u8(FRAME_TYPE_ACK);
        put_varint(buf, first.largest().to_raw());
        put_varint(buf, self.ack_delay);
        put_varint(buf, (self.blocks.len() - 1) as u64);
        put_varint(buf, first.largest().to_raw() - first.smallest().to_raw());

        let mut previous_smallest = first.smallest().to_raw();
        for block in descending {
            // gap and range per draft-18 §19.3: both are offsets minus the
            //  implied one-packet steps
            put_varint(buf, previous_smallest - block.largest().to_raw() - 2);
            put_varint(buf, block.largest().to_raw() - block.smallest().to_raw());
            previous_smallest = block.smallest().to_raw();
        }
    }

    pub fn deser(buf: &mut impl Buf) -> Result<AckFrame, TransportError> {
        if !buf.has_remaining() {
            return Err(TransportError::Truncated);
        }
        match buf.get_u8() {
            FRAME_TYPE_ACK => {}
            // ECN counts are congestion signalling, which this endpoint does
            //  not negotiate
            FRAME_TYPE_ACK_ECN => {
                return Err(TransportError::UnsupportedFrame { type_byte: FRAME_TYPE_ACK_ECN })
            }
            type_byte => return Err(TransportError::UnsupportedFrame { type_byte }),
        }

        let largest = try_get_varint(buf)?;
        let ack_delay = try_get_varint(buf)?;
        let additional_block_count = try_get_varint(buf)?;
        let first_range = try_get_varint(buf)?;

        let smallest = largest.checked_sub(first_range)
            .ok_or(TransportError::MalformedAck { smallest: 0, largest })?;

        let mut descending = vec![AckBlock::from_raw(smallest, largest)];
        let mut previous_smallest = smallest;
        for _ in 0..additional_block_count {
            let gap = try_get_varint(buf)?;
            let range = try_get_varint(buf)?;

            let block_largest = previous_smallest
                .checked_sub(gap)
                .and_then(|n| n.checked_sub(2))
                .ok_or(TransportError::MalformedAck { smallest: 0, largest: previous_smallest })?;
            let block_smallest = block_largest.checked_sub(range)
                .ok_or(TransportError::MalformedAck { smallest: 0, largest: block_largest })?;

            descending.push(AckBlock::from_raw(block_smallest, block_largest));
            previous_smallest = block_smallest;
        }

        descending.reverse();
        Ok(AckFrame { ack_delay, blocks: descending })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::single_packet(45, vec![AckBlock::from_raw(2, 2)], vec![0x02, 2, 45, 0, 0])]
    #[case::two_byte_delay(67, vec![AckBlock::from_raw(2, 2)], vec![0x02, 2, 0x40, 67, 0, 0])]
    #[case::single_range(0, vec![AckBlock::from_raw(1, 2)], vec![0x02, 2, 0, 0, 1])]
    #[case::three_blocks(5, vec![AckBlock::from_raw(1, 3), AckBlock::from_raw(5, 6), AckBlock::from_raw(9, 9)],
        // largest-first on the wire: [9,9] then gap 1 to [5,6] then gap 0 to [1,3]
        vec![0x02, 9, 5, 2, 0, 1, 1, 0, 2])]
    fn test_roundtrip(#[case] ack_delay: u64, #[case] blocks: Vec<AckBlock>, #[case] expected: Vec<u8>) {
        let frame = AckFrame::new(ack_delay, blocks.clone());

        let mut buf = BytesMut::new();
        frame.ser(&mut buf);
        assert_eq!(buf.as_ref(), expected.as_slice());

        let parsed = AckFrame::deser(&mut buf.freeze()).unwrap();
        assert_eq!(parsed.ack_delay(), ack_delay);
        assert_eq!(parsed.blocks(), blocks.as_slice());
    }

    #[test]
    fn test_ecn_rejected() {
        let bytes = vec![0x03, 2, 0, 0, 0];
        assert_eq!(
            AckFrame::deser(&mut bytes.as_slice()),
            Err(TransportError::UnsupportedFrame { type_byte: 0x03 })
        );
    }

    #[rstest]
    #[case::first_range_underflow(vec![0x02, 2, 0, 0, 3])]
    #[case::gap_underflow(vec![0x02, 2, 0, 1, 0, 5, 0])]
    fn test_underflow_is_malformed(#[case] bytes: Vec<u8>) {
        assert!(matches!(
            AckFrame::deser(&mut bytes.as_slice()),
            Err(TransportError::MalformedAck { .. })
        ));
    }

    #[test]
    fn test_truncated() {
        let bytes = vec![0x02, 9, 5, 2, 0, 1];
        assert_eq!(AckFrame::deser(&mut bytes.as_slice()), Err(TransportError::Truncated));
    }

    #[test]
    fn test_well_formedness() {
        assert!(AckBlock::from_raw(2, 7).is_well_formed());
        assert!(AckBlock::from_raw(2, 2).is_well_formed());
        assert!(!AckBlock::from_raw(7, 2).is_well_formed());
    }
}
