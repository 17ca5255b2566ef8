//! The reliability core: the pipeline middleware between decrypted-packet
//!  ingress and frame egress.
//!
//! Three cooperating parts live behind one lock:
//! * [`packet_buffer::PacketBuffer`] - the sent-packet registry, holding
//!   every ack-eliciting outbound packet until the peer acknowledges it or
//!   the loss sweep retires it
//! * [`ack_aggregator::AckAggregator`] - the received-packet-number set,
//!   drained into compact ack block runs on flush
//! * the loss-detection sweep - a periodic task that resends the frames of
//!   timed-out packets under a fresh packet number
//!
//! All three event streams of a connection (ingress, egress, sweep ticks)
//!  are serialized on the inner write lock: each handler runs to completion
//!  before the next one observes state. A packet inserted by `before_send`
//!  is therefore always visible to a subsequent `on_receive`, and a sweep
//!  tick can never declare a packet lost that an interleaved ack just
//!  retired. The sweep retires lost entries under the lock but resubmits
//!  their frames only after releasing it, because resent frames come back
//!  through `before_send` under their fresh packet numbers.

mod ack_aggregator;
mod ack_delay;
mod packet_buffer;

pub use ack_delay::AckDelay;

use crate::config::Configuration;
use crate::error::TransportError;
use crate::pipeline::{AckListener, FrameSender, PipelineContext};
use crate::protocol::frames::{AckFrame, Frame};
use crate::protocol::packet::{EncryptionLevel, Packet};
use crate::protocol::packet_number::PacketNumber;
use crate::timing::Ticker;
use ack_aggregator::AckAggregator;
use packet_buffer::PacketBuffer;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, trace, warn};

struct Inner {
    buffer: PacketBuffer,
    acks: AckAggregator,
    closed: bool,
}

pub struct PacketBufferManager {
    inner: Arc<RwLock<Inner>>,
    frame_sender: Arc<dyn FrameSender>,
    ack_listener: Option<Arc<dyn AckListener>>,
    ack_delay: AckDelay,
    ticker: Arc<dyn Ticker>,
    loss_threshold_nanos: u64,
    sweep_period: Duration,
    sweep_handle: StdMutex<Option<JoinHandle<()>>>,
}

impl Drop for PacketBufferManager {
    fn drop(&mut self) {
        if let Some(handle) = self.sweep_handle.lock().expect("sweep handle lock poisoned").take() {
            handle.abort();
        }
    }
}

impl PacketBufferManager {
    pub fn new(
        config: &Configuration,
        frame_sender: Arc<dyn FrameSender>,
        ack_listener: Option<Arc<dyn AckListener>>,
        ticker: Arc<dyn Ticker>,
    ) -> PacketBufferManager {
        PacketBufferManager {
            inner: Arc::new(RwLock::new(Inner {
                buffer: PacketBuffer::new(),
                acks: AckAggregator::new(config.max_pending_acks),
                closed: false,
            })),
            frame_sender,
            ack_listener,
            ack_delay: AckDelay::new(config.ack_delay_exponent, ticker.clone()),
            ticker,
            loss_threshold_nanos: config.loss_threshold.as_nanos() as u64,
            sweep_period: config.max_ack_delay,
            sweep_handle: StdMutex::new(None),
        }
    }

    /// Starts the periodic loss-detection sweep. Registered once; the task
    ///  is cancelled by [`close`](Self::close) and on drop.
    pub fn spawn_loss_detection_loop(&self) {
        let mut handle = self.sweep_handle.lock().expect("sweep handle lock poisoned");
        if handle.is_some() {
            warn!("loss detection loop already spawned");
            return;
        }
        *handle = Some(tokio::spawn(Self::sweep_loop(
            self.inner.clone(),
            self.frame_sender.clone(),
            self.ticker.clone(),
            self.loss_threshold_nanos,
            self.sweep_period,
        )));
    }

    /// Egress: piggyback any pending acks onto the outgoing packet, register
    ///  it for retransmission if it elicits an ack, then forward it.
    ///
    /// The buffer insert happens before the forward so a near-instant ack
    ///  cannot race ahead of the buffer write.
    pub async fn before_send(
        &self,
        packet: Packet,
        ctx: &dyn PipelineContext,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.write().await;
        if inner.closed {
            return Err(TransportError::ConnectionClosed);
        }

        let packet = match inner.acks.drain() {
            Some((blocks, largest_arrival_nanos)) => {
                trace!("piggybacking acks {:?} onto outgoing packet {}", blocks, packet.packet_number());
                let ack = AckFrame::new(self.ack_delay.since(largest_arrival_nanos), blocks);
                packet.with_frame(Frame::Ack(ack))
            }
            None => packet,
        };

        if packet.payload().is_ack_eliciting() {
            inner.buffer.insert(packet.clone(), self.ticker.now_nanos());
            debug!("buffered packet {}", packet.packet_number());
        }

        ctx.next(packet).await;
        Ok(())
    }

    /// Ingress: validate and absorb a received packet, retire buffered
    ///  packets it acknowledges, emit a standalone ack when the packet calls
    ///  for one, then forward it to the next stage.
    pub async fn on_receive(
        &self,
        packet: Packet,
        ctx: &dyn PipelineContext,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.write().await;
        if inner.closed {
            debug!("dropping ingress packet {} on closed connection", packet.packet_number());
            return Ok(());
        }

        let state = ctx.state();
        if packet.payload().has_application_data() && !state.admits_application_data() {
            warn!("received application data in packet {} while in state {:?}", packet.packet_number(), state);
            return Err(TransportError::FatalState { state });
        }

        for frame in packet.payload().frames() {
            if let Frame::Ack(ack) = frame {
                for block in ack.blocks() {
                    if !block.is_well_formed() {
                        warn!("received ack block with inverted bounds [{}, {}]", block.smallest(), block.largest());
                        return Err(TransportError::MalformedAck {
                            smallest: block.smallest().to_raw(),
                            largest: block.largest().to_raw(),
                        });
                    }
                }
            }
        }

        let must_flush = inner.acks.record(packet.packet_number(), self.ticker.now_nanos());
        trace!("recorded received packet {}", packet.packet_number());

        for frame in packet.payload().frames() {
            if let Frame::Ack(ack) = frame {
                self.process_ack_frame(&mut inner, ack).await;
            }
        }

        if must_flush || AckAggregator::should_flush(&packet) {
            if must_flush {
                debug!("pending ack set at capacity - forcing a flush");
            }
            self.flush_acks(&mut inner, ctx).await;
        }

        ctx.next(packet).await;
        Ok(())
    }

    async fn process_ack_frame(&self, inner: &mut Inner, ack: &AckFrame) {
        for block in ack.blocks() {
            // the watermark tracks every acked number, buffered or not -
            //  peers may ack retransmissions we already retired, or our own
            //  standalone acks which were never buffered
            inner.buffer.note_acked(block.largest());

            for pn in inner.buffer.remove_range(block) {
                debug!("peer acked packet {}", pn);
                if let Some(listener) = &self.ack_listener {
                    listener.on_ack(pn).await;
                }
            }
        }
    }

    async fn flush_acks(&self, inner: &mut Inner, ctx: &dyn PipelineContext) {
        if let Some((blocks, largest_arrival_nanos)) = inner.acks.drain() {
            debug!("flushing acks {:?}", blocks);
            let ack = AckFrame::new(self.ack_delay.since(largest_arrival_nanos), blocks);
            ctx.send_frame(Frame::Ack(ack)).await;
        }
    }

    /// One loss-detection sweep at the current tick time. Invoked
    ///  periodically by the spawned loop; exposed so tests (and alternative
    ///  timer hosts) can drive it directly.
    pub async fn run_loss_detection(&self) {
        Self::detect_and_resend(
            &self.inner,
            self.frame_sender.as_ref(),
            self.ticker.as_ref(),
            self.loss_threshold_nanos,
        ).await;
    }

    async fn detect_and_resend(
        inner: &RwLock<Inner>,
        frame_sender: &dyn FrameSender,
        ticker: &dyn Ticker,
        threshold_nanos: u64,
    ) {
        let mut resends = Vec::new();
        {
            let mut inner = inner.write().await;
            if inner.closed {
                return;
            }

            let now_nanos = ticker.now_nanos();
            for pn in inner.buffer.expired(now_nanos, threshold_nanos) {
                if let Some(sent) = inner.buffer.remove(pn) {
                    debug!("packet {} timed out - resending its frames under a fresh number", pn);
                    let level = sent.packet.encryption_level();
                    for frame in sent.packet.payload().frames() {
                        // acks and padding are state, not payload - they are
                        //  regenerated, never resent
                        if frame.is_ack_eliciting() {
                            resends.push((frame.clone(), level));
                        }
                    }
                }
            }
        }

        // the lock is released first: resent frames travel back through
        //  before_send, which takes it again for the fresh packet
        for (frame, level) in resends {
            frame_sender.send(frame, level).await;
        }
    }

    async fn sweep_loop(
        inner: Arc<RwLock<Inner>>,
        frame_sender: Arc<dyn FrameSender>,
        ticker: Arc<dyn Ticker>,
        threshold_nanos: u64,
        period: Duration,
    ) {
        let mut sweep_interval = interval(period);
        loop {
            sweep_interval.tick().await;
            Self::detect_and_resend(&inner, frame_sender.as_ref(), ticker.as_ref(), threshold_nanos).await;
        }
    }

    /// A send future completed with an error: the packet never made it onto
    ///  the wire and will never be acked, so its buffer entry is discarded.
    ///  The frames are not resubmitted from here; a transport that cannot
    ///  dispatch datagrams is a connection-level problem.
    pub async fn on_send_failure(&self, packet_number: PacketNumber) {
        let mut inner = self.inner.write().await;
        if inner.buffer.remove(packet_number).is_some() {
            debug!("discarding buffered packet {} after transport send failure", packet_number);
        }
    }

    /// Retires all buffered packets of one key epoch without resend. Frames
    ///  protected under discarded keys must not reappear under newer keys;
    ///  if their content still matters, a higher layer re-issues it.
    pub async fn on_keys_discarded(&self, level: EncryptionLevel) {
        let mut inner = self.inner.write().await;
        for pn in inner.buffer.drain_level(level) {
            debug!("dropping buffered packet {} after {:?} keys were discarded - not resending", pn, level);
        }
    }

    pub async fn largest_acked(&self) -> PacketNumber {
        self.inner.read().await.buffer.largest_acked()
    }

    /// Stops accepting egress packets, drops all buffered state and cancels
    ///  the loss-detection task. Ingress packets arriving afterwards are
    ///  dropped silently.
    pub async fn close(&self) {
        {
            let mut inner = self.inner.write().await;
            inner.closed = true;
            inner.buffer.clear();
            inner.acks.clear();
        }
        if let Some(handle) = self.sweep_handle.lock().expect("sweep handle lock poisoned").take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub(crate) async fn buffered_packet_numbers(&self) -> Vec<PacketNumber> {
        self.inner.read().await.buffer.packet_numbers()
    }
}
