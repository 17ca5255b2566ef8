use crate::protocol::frames::AckBlock;
use crate::protocol::packet::{EncryptionLevel, Packet};
use crate::protocol::packet_number::PacketNumber;
use std::collections::BTreeMap;

/// One buffered outbound packet, waiting for acknowledgment.
pub(crate) struct SentPacket {
    pub packet: Packet,
    pub sent_at_nanos: u64,
}

/// The sent-packet registry: every ack-eliciting outbound packet, keyed by
///  packet number, until it is acknowledged or declared lost.
///
/// Also the home of the LargestAcked watermark. The watermark advances for
///  every packet number appearing in a received ACK block, whether or not
///  that number is (still) buffered - peers may ack speculatively or
///  repeatedly.
pub(crate) struct PacketBuffer {
    buffer: BTreeMap<PacketNumber, SentPacket>,
    largest_acked: PacketNumber,
}

impl PacketBuffer {
    pub fn new() -> PacketBuffer {
        PacketBuffer {
            buffer: BTreeMap::new(),
            largest_acked: PacketNumber::MIN,
        }
    }

    pub fn insert(&mut self, packet: Packet, sent_at_nanos: u64) {
        self.buffer.insert(packet.packet_number(), SentPacket { packet, sent_at_nanos });
    }

    /// Removes every buffered packet number within the block, returning the
    ///  numbers actually removed. The expansion is a deliberate per-number
    ///  loop - QUIC ack blocks are small in practice, and removal must be
    ///  idempotent per number.
    pub fn remove_range(&mut self, block: &AckBlock) -> Vec<PacketNumber> {
        let mut removed = Vec::new();
        for raw in block.smallest().to_raw()..=block.largest().to_raw() {
            let pn = PacketNumber::from_raw(raw);
            if self.buffer.remove(&pn).is_some() {
                removed.push(pn);
            }
        }
        removed
    }

    pub fn remove(&mut self, packet_number: PacketNumber) -> Option<SentPacket> {
        self.buffer.remove(&packet_number)
    }

    /// Advances the LargestAcked watermark; never regresses.
    pub fn note_acked(&mut self, packet_number: PacketNumber) {
        self.largest_acked = self.largest_acked.max(packet_number);
    }

    pub fn largest_acked(&self) -> PacketNumber {
        self.largest_acked
    }

    /// Packet numbers whose entries have been in flight for longer than
    ///  `threshold_nanos` at time `now_nanos`.
    pub fn expired(&self, now_nanos: u64, threshold_nanos: u64) -> Vec<PacketNumber> {
        self.buffer.iter()
            .filter(|(_, sent)| now_nanos.saturating_sub(sent.sent_at_nanos) > threshold_nanos)
            .map(|(&pn, _)| pn)
            .collect()
    }

    /// Retires all entries of one key epoch, e.g. when that epoch's keys are
    ///  discarded. Returns the retired numbers.
    pub fn drain_level(&mut self, level: EncryptionLevel) -> Vec<PacketNumber> {
        let drained = self.buffer.iter()
            .filter(|(_, sent)| sent.packet.encryption_level() == level)
            .map(|(&pn, _)| pn)
            .collect::<Vec<_>>();
        for pn in &drained {
            self.buffer.remove(pn);
        }
        drained
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    #[cfg(test)]
    pub fn packet_numbers(&self) -> Vec<PacketNumber> {
        self.buffer.keys().cloned().collect()
    }
}
