use anyhow::bail;
use std::time::Duration;

/// A QUIC protocol version on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Version(pub u32);

impl Version {
    pub const DRAFT_18: Version = Version(0xff00_0012);
}

/// Per-connection configuration, read once at construction. Transport
///  parameters mirror what is announced to the peer during the handshake;
///  `ack_delay_exponent`, `max_ack_delay`, `loss_threshold` and
///  `max_pending_acks` are the knobs that materially affect the reliability
///  core.
#[derive(Clone, Debug)]
pub struct Configuration {
    pub version: Version,
    pub initial_max_stream_data_bidi_local: u32,
    pub initial_max_stream_data_bidi_remote: u32,
    pub initial_max_stream_data_uni: u32,
    pub initial_max_data: u32,
    pub initial_max_bidi_streams: u32,
    pub initial_max_uni_streams: u32,
    pub idle_timeout: Duration,
    pub max_packet_size: usize,

    /// Right-shift applied to ack delays on the wire.
    pub ack_delay_exponent: u8,

    /// The longest this endpoint will sit on pending acks; doubles as the
    ///  loss-detection sweep period.
    pub max_ack_delay: Duration,

    pub disable_migration: bool,

    /// Age at which a buffered packet is declared lost. A constant pending
    ///  an RTT estimator.
    pub loss_threshold: Duration,

    /// Upper bound on the pending-ack set; reaching it forces a flush
    ///  rather than dropping packet numbers.
    pub max_pending_acks: usize,
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration {
            version: Version::DRAFT_18,
            initial_max_stream_data_bidi_local: 32768,
            initial_max_stream_data_bidi_remote: 32768,
            initial_max_stream_data_uni: 32768,
            initial_max_data: 49152,
            initial_max_bidi_streams: 100,
            initial_max_uni_streams: 100,
            idle_timeout: Duration::from_secs(30),
            max_packet_size: 1452,
            ack_delay_exponent: 3,
            max_ack_delay: Duration::from_millis(100),
            disable_migration: true,
            loss_threshold: Duration::from_secs(1),
            max_pending_acks: 1000,
        }
    }
}

impl Configuration {
    pub fn with_ack_delay_exponent(mut self, ack_delay_exponent: u8) -> Configuration {
        self.ack_delay_exponent = ack_delay_exponent;
        self
    }

    pub fn with_max_ack_delay(mut self, max_ack_delay: Duration) -> Configuration {
        self.max_ack_delay = max_ack_delay;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Configuration {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_max_packet_size(mut self, max_packet_size: usize) -> Configuration {
        self.max_packet_size = max_packet_size;
        self
    }

    pub fn with_loss_threshold(mut self, loss_threshold: Duration) -> Configuration {
        self.loss_threshold = loss_threshold;
        self
    }

    pub fn with_max_pending_acks(mut self, max_pending_acks: usize) -> Configuration {
        self.max_pending_acks = max_pending_acks;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_packet_size < 256 {
            bail!("max packet size is too small");
        }
        if self.ack_delay_exponent > 20 {
            bail!("ack delay exponent {} is outside the negotiable range", self.ack_delay_exponent);
        }
        if self.loss_threshold.is_zero() {
            bail!("loss threshold must be positive");
        }
        if self.max_pending_acks == 0 {
            bail!("pending ack capacity must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();

        assert_eq!(config.version, Version::DRAFT_18);
        assert_eq!(config.ack_delay_exponent, 3);
        assert_eq!(config.max_ack_delay, Duration::from_millis(100));
        assert_eq!(config.max_packet_size, 1452);
        assert_eq!(config.loss_threshold, Duration::from_secs(1));
        assert_eq!(config.max_pending_acks, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = Configuration::default()
            .with_ack_delay_exponent(5)
            .with_max_ack_delay(Duration::from_millis(25));

        assert_eq!(config.ack_delay_exponent, 5);
        assert_eq!(config.max_ack_delay, Duration::from_millis(25));
    }

    #[test]
    fn test_validation_rejects_nonsense() {
        assert!(Configuration::default().with_max_packet_size(10).validate().is_err());
        assert!(Configuration::default().with_ack_delay_exponent(40).validate().is_err());
        assert!(Configuration::default().with_loss_threshold(Duration::ZERO).validate().is_err());
        assert!(Configuration::default().with_max_pending_acks(0).validate().is_err());
    }
}
