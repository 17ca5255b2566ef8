use crate::pipeline::{ConnectionState, FrameSender, PacketSender, PipelineContext};
use crate::protocol::connection_id::ConnectionId;
use crate::protocol::frames::Frame;
use crate::protocol::packet::{EncryptionLevel, Packet, PacketType, Payload};
use crate::protocol::packet_number::PacketNumber;
use crate::reliability::PacketBufferManager;
use anyhow::bail;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use std::sync::{Arc, Weak};
use tracing::{debug, error, trace};

/// The frame egress stage: wraps a single frame into a packet of the frame's
///  key epoch under the next outbound packet number and feeds it back into
///  the reliability middleware via `before_send`. The middleware buffers the
///  fresh packet again if it elicits an ack, then forwards it to the
///  transport tail - so content lost a second time is detected like any
///  other in-flight packet.
///
/// Used for standalone acks and for frames resent by loss detection. A frame
///  resent at the Initial or Handshake epoch comes back out as a long-header
///  packet of that epoch; only 1-RTT frames become short-header packets.
pub struct PacketEgress {
    destination_id: ConnectionId,
    source_id: Option<ConnectionId>,
    tail: TransportTail,
    reliability: StdMutex<Weak<PacketBufferManager>>,
    last_packet_number: AtomicU64,
}

/// The stage behind reliability: hands finished packets to the datagram
///  transport. Only the forward path reaches it - ingress gating and ack
///  flushing happen upstream, so `state` and `send_frame` are never consulted
///  on packets coming through here.
struct TransportTail {
    peer_addr: SocketAddr,
    packet_sender: Arc<dyn PacketSender>,
}

#[async_trait]
impl PipelineContext for TransportTail {
    fn state(&self) -> ConnectionState {
        ConnectionState::Ready
    }

    async fn send_frame(&self, _frame: Frame) {}

    async fn next(&self, packet: Packet) {
        trace!("sending packet {} to {:?}", packet.packet_number(), self.peer_addr);
        if let Err(e) = self.packet_sender.send(packet, self.peer_addr).await {
            error!("error sending packet to {:?}: {}", self.peer_addr, e);
        }
    }
}

impl PacketEgress {
    /// Packets addressed to the peer always carry its connection id; a
    ///  connection that has not negotiated one cannot synthesize them.
    pub fn new(
        destination_id: Option<ConnectionId>,
        source_id: Option<ConnectionId>,
        peer_addr: SocketAddr,
        packet_sender: Arc<dyn PacketSender>,
    ) -> anyhow::Result<PacketEgress> {
        let Some(destination_id) = destination_id else {
            bail!("cannot synthesize packets without a destination connection id");
        };

        Ok(PacketEgress {
            destination_id,
            source_id,
            tail: TransportTail { peer_addr, packet_sender },
            reliability: StdMutex::new(Weak::new()),
            last_packet_number: AtomicU64::new(0),
        })
    }

    /// Wires this egress back into the reliability middleware. Bound after
    ///  construction because the middleware itself is built on top of this
    ///  egress; held weakly so a dropped connection tears down cleanly.
    pub fn bind_reliability(&self, reliability: &Arc<PacketBufferManager>) {
        *self.reliability.lock().expect("reliability binding lock poisoned") =
            Arc::downgrade(reliability);
    }

    fn next_packet_number(&self) -> PacketNumber {
        PacketNumber::from_raw(self.last_packet_number.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn synthesize(&self, frame: Frame, level: EncryptionLevel) -> Packet {
        let packet_number = self.next_packet_number();
        let payload = Payload::new(vec![frame]);
        match level {
            EncryptionLevel::Initial => Packet::new(
                PacketType::Initial,
                Some(self.destination_id.clone()),
                self.source_id.clone(),
                packet_number,
                payload,
            ),
            EncryptionLevel::Handshake => Packet::new(
                PacketType::Handshake,
                Some(self.destination_id.clone()),
                self.source_id.clone(),
                packet_number,
                payload,
            ),
            EncryptionLevel::OneRtt => {
                Packet::short(Some(self.destination_id.clone()), packet_number, payload)
            }
        }
    }
}

#[async_trait]
impl FrameSender for PacketEgress {
    async fn send(&self, frame: Frame, level: EncryptionLevel) {
        let packet = self.synthesize(frame, level);
        trace!("synthesized {:?} packet {} to {:?}", packet.packet_type(), packet.packet_number(), self.tail.peer_addr);

        let reliability = self.reliability.lock()
            .expect("reliability binding lock poisoned")
            .upgrade();
        match reliability {
            Some(reliability) => {
                if let Err(e) = reliability.before_send(packet, &self.tail).await {
                    debug!("dropping synthesized packet: {}", e);
                }
            }
            None => {
                // not (or no longer) wired to a reliability stage
                self.tail.next(packet).await;
            }
        }
    }
}
