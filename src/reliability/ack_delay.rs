use crate::timing::Ticker;
use std::sync::Arc;

/// Measures and encodes ack delays: the time between receiving the largest
///  pending packet and acknowledging it, in microseconds, right-shifted by
///  the local ack_delay_exponent for the wire.
pub struct AckDelay {
    exponent: u8,
    ticker: Arc<dyn Ticker>,
}

impl AckDelay {
    pub fn new(exponent: u8, ticker: Arc<dyn Ticker>) -> AckDelay {
        AckDelay { exponent, ticker }
    }

    pub fn now_nanos(&self) -> u64 {
        self.ticker.now_nanos()
    }

    pub fn encode(&self, delta_nanos: u64) -> u64 {
        (delta_nanos / 1000) >> self.exponent
    }

    /// The encoded delay since `arrival_nanos`, measured against the
    ///  injected clock.
    pub fn since(&self, arrival_nanos: u64) -> u64 {
        self.encode(self.now_nanos().saturating_sub(arrival_nanos))
    }
}
