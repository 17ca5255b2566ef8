use crate::protocol::frames::Frame;
use crate::protocol::packet::{EncryptionLevel, Packet};
use crate::protocol::packet_number::PacketNumber;
use async_trait::async_trait;
use std::net::SocketAddr;

#[cfg(test)] use mockall::automock;

/// Connection lifecycle as the reliability core sees it. Only `Ready`
///  admits application data frames; everything before that is handshake
///  territory, everything after is teardown.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Started,
    BeforeHello,
    BeforeHandshake,
    Ready,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn admits_application_data(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }
}

/// The ingress-side seam: the stage handing packets to the reliability core
///  and accepting its output.
///
/// `send_frame` enqueues a frame for the next outbound packet - the egress
///  stage wraps it in a short-header packet under the next outbound packet
///  number. `next` forwards an ingress packet to the stage beyond
///  reliability (flow control, stream demux).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PipelineContext: Send + Sync + 'static {
    fn state(&self) -> ConnectionState;

    async fn send_frame(&self, frame: Frame);

    async fn next(&self, packet: Packet);
}

/// The egress-side seam used by loss detection: submitting a frame triggers
///  synthesis of a new outbound packet carrying it under a fresh packet
///  number, protected under the same key epoch the frame was originally
///  sent with. A frame must never migrate to a newer epoch on resend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FrameSender: Send + Sync + 'static {
    async fn send(&self, frame: Frame, level: EncryptionLevel);
}

/// Notified once per packet number when a buffered packet is acknowledged.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AckListener: Send + Sync + 'static {
    async fn on_ack(&self, packet_number: PacketNumber);
}

/// The datagram transport. Opaque to the reliability core; consumed by the
///  egress stage.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PacketSender: Send + Sync + 'static {
    async fn send(&self, packet: Packet, to: SocketAddr) -> anyhow::Result<()>;
}
