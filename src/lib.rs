//! Reliability and acknowledgment core of a QUIC (draft-18 era) transport
//!  endpoint: the subsystem that buffers outbound packets until they are
//!  acknowledged, aggregates received packet numbers into ACK frames, and
//!  drives retransmission on timeout.
//!
//! ## Scope
//!
//! This crate sits between the decrypted-packet ingress and the
//!  frame-serialization egress of a connection pipeline. Its collaborators
//!  are deliberately external and appear only as injected traits:
//! * the UDP datagram I/O layer ([`pipeline::PacketSender`])
//! * the TLS handshake machine, which produces and consumes CRYPTO frames
//! * packet header parsing and serialization
//! * per-stream flow control and stream demultiplexing (the stage behind
//!   [`pipeline::PipelineContext::next`])
//! * the connection state machine gating when user frames may flow
//!   ([`pipeline::PipelineContext::state`])
//!
//! Congestion control, key update, connection migration and path MTU
//!  discovery are out of scope; the core assumes a single active path with
//!  stable keys per epoch.
//!
//! ## Data flow
//!
//! ```ascii
//!                 ingress (after decryption)
//!                          |
//!                          v
//!            +---------------------------+      standalone ACK frame
//!            | PacketBufferManager       |----------------------------> ctx.send_frame
//!            |   - ack aggregation       |
//!            |   - ack processing        |      surviving packet
//!            |   - loss detection sweep  |----------------------------> ctx.next
//!            +---------------------------+
//!                          ^                     resent frames
//!       before_send -------+               ----------------------------> FrameSender
//!       (egress path)                            (fresh packet number)
//! ```
//!
//! An outbound packet passes through `before_send`, which opportunistically
//!  piggybacks pending acks, registers the packet for retransmission if it
//!  elicits an ack, and forwards it. An inbound packet enters `on_receive`,
//!  which retires buffered packets covered by its ACK frames, absorbs its
//!  packet number for future acknowledgment, and decides whether to emit a
//!  standalone ACK now:
//!
//! | received packet | standalone ACK? |
//! |-----------------|-----------------|
//! | Initial packet | no - deferred, rides with the handshake response |
//! | only ACK and/or PADDING frames | no - acks do not elicit acks |
//! | anything else ack-eliciting | yes |
//!
//! The loss-detection sweep runs at the `max_ack_delay` period. A buffered
//!  packet older than the loss threshold has its ack-eliciting frames
//!  resubmitted through the [`pipeline::FrameSender`], where they are
//!  repackaged under a fresh packet number in a packet of the same key
//!  epoch, and pass through `before_send` again so the replacement is
//!  tracked like any first transmission; the packet number itself is never
//!  reused.
//!
//! ## Ordering
//!
//! For one connection, ingress events, egress events and sweep ticks are
//!  serialized behind a single lock: handlers run to completion, a packet
//!  buffered by `before_send` is visible to every subsequent `on_receive`,
//!  and the LargestAcked watermark only ever advances. Handlers must not
//!  re-enter the manager from their callbacks.
//!
//! ## Wire formats
//!
//! The frame codecs implement the draft-18 encodings used on this path:
//!
//! ```ascii
//! ACK (0x02):        largest acknowledged (varint), ack delay (varint,
//!                    microseconds >> ack_delay_exponent), block count
//!                    (varint), first ack range (varint),
//!                    then (gap, range) varint pairs, largest block first
//! PADDING (0x00):    type byte only
//! PING (0x01):       type byte only
//! RESET_STREAM (0x04): stream id (varint), error code (u16),
//!                    final offset (varint)
//! CRYPTO (0x06):     offset (varint), length (varint), data
//! STREAM (0x08-0x0f): OFF/LEN/FIN flag bits in the type byte, stream id
//!                    (varint), then optional offset, optional length, data
//! CONNECTION_CLOSE (0x1c/0x1d): error code (u16), triggering frame type
//!                    (varint, transport flavour only), reason length
//!                    (varint), UTF-8 reason
//! ```
//!
//! Packet headers and packet number wire encoding are handled outside this
//!  crate.

pub mod config;
pub mod egress;
pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod reliability;
pub mod timing;
