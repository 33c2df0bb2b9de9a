use std::fmt;
use std::ops::BitOr;

/// Capability bits of a [`Value`](crate::Value) handle.
///
/// Bits 5 and 6 together form the read-only protection; a handle with either bit set
/// refuses writes.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flag(u32);

impl Flag {
    pub const EMPTY: Flag = Flag(0);

    /// Set on handles sealed by their owner.
    pub const STICKY_RO: Flag = Flag(1 << 5);

    /// Set on handles reached through a non-public path.
    pub const EMBED_RO: Flag = Flag(1 << 6);

    pub const RO: Flag = Flag(Self::STICKY_RO.0 | Self::EMBED_RO.0);

    /// Marks a handle that is addressable by its holder.
    pub const ADDR: Flag = Flag(1 << 8);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Flag) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Flag) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Flag) -> Flag {
        Flag(self.0 | other.0)
    }

    #[inline]
    #[must_use]
    pub const fn difference(self, other: Flag) -> Flag {
        Flag(self.0 & !other.0)
    }

    #[inline]
    pub const fn is_read_only(self) -> bool {
        self.intersects(Self::RO)
    }
}

impl BitOr for Flag {
    type Output = Flag;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [(Self::STICKY_RO, "STICKY_RO"), (Self::EMBED_RO, "EMBED_RO"), (Self::ADDR, "ADDR")];
        let mut list = f.debug_set();
        for (flag, name) in names {
            if self.contains(flag) {
                list.entry(&format_args!("{name}"));
            }
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Flag;

    #[test]
    fn test_read_only_bits() {
        assert!(!Flag::EMPTY.is_read_only());
        assert!(Flag::STICKY_RO.is_read_only());
        assert!(Flag::EMBED_RO.is_read_only());
        assert!(!Flag::ADDR.is_read_only());
        assert_eq!(Flag::RO.bits(), 0b110_0000);
    }

    #[test]
    fn test_difference_keeps_other_bits() {
        let flag = Flag::RO | Flag::ADDR;
        assert_eq!(flag.difference(Flag::RO), Flag::ADDR);
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Flag::STICKY_RO | Flag::ADDR), "{STICKY_RO, ADDR}");
        assert_eq!(format!("{:?}", Flag::EMPTY), "{}");
    }
}
