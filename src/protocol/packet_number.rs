use std::fmt::{Display, Formatter};

/// A monotonically non-decreasing identifier within a connection's packet
///  number space. Packet numbers are never reused; a retransmission carries
///  a fresh number.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct PacketNumber(u64);

impl Display for PacketNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PacketNumber {
    pub const MIN: PacketNumber = PacketNumber(0);

    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn to_raw(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> PacketNumber {
        PacketNumber(
            self.0.checked_add(1)
                .expect("packet number space exhausted")
        )
    }

    pub fn max(self, other: PacketNumber) -> PacketNumber {
        if other.0 > self.0 { other } else { self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next() {
        assert_eq!(PacketNumber::MIN.next(), PacketNumber::from_raw(1));
        assert_eq!(PacketNumber::from_raw(41).next(), PacketNumber::from_raw(42));
    }

    #[test]
    fn test_max() {
        let a = PacketNumber::from_raw(3);
        let b = PacketNumber::from_raw(7);
        assert_eq!(a.max(b), b);
        assert_eq!(b.max(a), b);
        assert_eq!(b.max(b), b);
    }
}
