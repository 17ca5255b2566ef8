use rand::Rng;
use std::fmt::{Debug, Display, Formatter};

/// An opaque connection identifier, chosen by each endpoint for packets
///  addressed to it. Some packet types omit one or both ids, so they appear
///  as `Option<ConnectionId>` on packets rather than as sentinel values.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ConnectionId(Vec<u8>);

impl ConnectionId {
    pub const LENGTH: usize = 8;

    pub fn random() -> ConnectionId {
        let mut bytes = [0u8; Self::LENGTH];
        rand::thread_rng().fill(&mut bytes);
        ConnectionId(bytes.to_vec())
    }

    pub fn from_bytes(bytes: &[u8]) -> ConnectionId {
        ConnectionId(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl Debug for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(ConnectionId::random(), ConnectionId::random());
    }

    #[test]
    fn test_display_hex() {
        let id = ConnectionId::from_bytes(&[0x01, 0xab, 0x00, 0xff]);
        assert_eq!(format!("{}", id), "01ab00ff");
    }
}
