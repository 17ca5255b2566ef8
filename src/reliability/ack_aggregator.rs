use crate::protocol::frames::AckBlock;
use crate::protocol::packet::{Packet, PacketType};
use crate::protocol::packet_number::PacketNumber;
use std::collections::BTreeMap;

/// The received-packet-number set: absorbs incoming packet numbers and
///  drains them as minimal ascending [`AckBlock`] runs.
///
/// Each pending number keeps its arrival timestamp; the ack delay reported
///  on a flush is measured from the arrival of the numerically largest
///  pending number, not of the most recently received one.
pub(crate) struct AckAggregator {
    pending: BTreeMap<PacketNumber, u64>,
    capacity: usize,
}

impl AckAggregator {
    pub fn new(capacity: usize) -> AckAggregator {
        AckAggregator {
            pending: BTreeMap::new(),
            capacity,
        }
    }

    /// Records a received packet number. Duplicates are idempotent and keep
    ///  the first arrival time. Returns true when the set has reached its
    ///  capacity: the caller must flush now instead of dropping numbers.
    pub fn record(&mut self, packet_number: PacketNumber, arrival_nanos: u64) -> bool {
        self.pending.entry(packet_number).or_insert(arrival_nanos);
        self.pending.len() >= self.capacity
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Drains the pending set into a minimal list of disjoint ascending
    ///  blocks, plus the arrival time of the largest pending number. None
    ///  if nothing is pending.
    pub fn drain(&mut self) -> Option<(Vec<AckBlock>, u64)> {
        let pending = std::mem::take(&mut self.pending);
        let (_, &largest_arrival_nanos) = pending.last_key_value()?;

        let mut blocks = Vec::new();
        let mut run: Option<(u64, u64)> = None;
        for pn in pending.keys() {
            let pn = pn.to_raw();
            match run {
                None => run = Some((pn, pn)),
                Some((lower, upper)) if pn == upper + 1 => run = Some((lower, pn)),
                Some((lower, upper)) => {
                    blocks.push(AckBlock::from_raw(lower, upper));
                    run = Some((pn, pn));
                }
            }
        }
        if let Some((lower, upper)) = run {
            blocks.push(AckBlock::from_raw(lower, upper));
        }

        Some((blocks, largest_arrival_nanos))
    }

    /// The standalone-flush policy: Initial packets are answered together
    ///  with the handshake response, and acks never elicit acks. Everything
    ///  else that elicits gets acknowledged right away.
    pub fn should_flush(packet: &Packet) -> bool {
        packet.packet_type() != PacketType::Initial && packet.payload().is_ack_eliciting()
    }
}
