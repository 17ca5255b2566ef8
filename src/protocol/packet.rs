use crate::protocol::connection_id::ConnectionId;
use crate::protocol::frames::Frame;
use crate::protocol::packet_number::PacketNumber;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PacketType {
    Initial,
    ZeroRtt,
    Handshake,
    Retry,
    Short,
}

/// The key epoch a packet was protected under. Retired buffered packets must
///  never be resent under a different epoch's keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EncryptionLevel {
    Initial,
    Handshake,
    OneRtt,
}

impl PacketType {
    pub fn encryption_level(&self) -> EncryptionLevel {
        match self {
            PacketType::Initial | PacketType::Retry => EncryptionLevel::Initial,
            PacketType::Handshake => EncryptionLevel::Handshake,
            PacketType::ZeroRtt | PacketType::Short => EncryptionLevel::OneRtt,
        }
    }
}

/// The ordered frame sequence of one packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    frames: Vec<Frame>,
}

impl Payload {
    pub fn new(frames: Vec<Frame>) -> Payload {
        Payload { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_ack_eliciting(&self) -> bool {
        self.frames.iter().any(Frame::is_ack_eliciting)
    }

    pub fn has_application_data(&self) -> bool {
        self.frames.iter()
            .any(|f| matches!(f, Frame::Stream(_) | Frame::ResetStream(_)))
    }
}

/// An immutable record of one transmitted or received packet. Connection ids
///  are optional on some packet types and therefore Option-typed; there is
///  no sentinel id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    packet_type: PacketType,
    destination_id: Option<ConnectionId>,
    source_id: Option<ConnectionId>,
    packet_number: PacketNumber,
    payload: Payload,
}

impl Packet {
    pub fn new(
        packet_type: PacketType,
        destination_id: Option<ConnectionId>,
        source_id: Option<ConnectionId>,
        packet_number: PacketNumber,
        payload: Payload,
    ) -> Packet {
        Packet { packet_type, destination_id, source_id, packet_number, payload }
    }

    /// A short-header packet: no source id on the wire.
    pub fn short(
        destination_id: Option<ConnectionId>,
        packet_number: PacketNumber,
        payload: Payload,
    ) -> Packet {
        Packet::new(PacketType::Short, destination_id, None, packet_number, payload)
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn destination_id(&self) -> Option<&ConnectionId> {
        self.destination_id.as_ref()
    }

    pub fn source_id(&self) -> Option<&ConnectionId> {
        self.source_id.as_ref()
    }

    pub fn packet_number(&self) -> PacketNumber {
        self.packet_number
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn encryption_level(&self) -> EncryptionLevel {
        self.packet_type.encryption_level()
    }

    /// Returns this packet extended by one frame at the end of the payload.
    pub fn with_frame(mut self, frame: Frame) -> Packet {
        self.payload.frames.push(frame);
        self
    }
}
