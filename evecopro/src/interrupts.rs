//! The chip's interrupt sources, as found in `REG_INT_FLAGS`, `REG_INT_EN`
//! and `REG_INT_MASK`.

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(TryFromPrimitive, IntoPrimitive, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum InterruptFlag {
    Swap = 0x01,
    Touch = 0x02,
    Tag = 0x04,
    Sound = 0x08,
    Playback = 0x10,
    CmdEmpty = 0x20,
    CmdFlag = 0x40,
    ConvComplete = 0x80,
}

/// A set of interrupt flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Interrupts(u8);

impl Interrupts {
    pub const NONE: Self = Self(0);

    /// The interrupts that [`Device::service`](crate::Device::service)
    /// responds to.
    pub const SERVICED: Self = Self(0x02 | 0x04 | 0x20);

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u8 {
        self.0
    }

    pub fn with(self, flag: InterruptFlag) -> Self {
        Self(self.0 | u8::from(flag))
    }

    pub fn contains(self, flag: InterruptFlag) -> bool {
        (self.0 & u8::from(flag)) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<InterruptFlag> for Interrupts {
    fn from(flag: InterruptFlag) -> Self {
        Self(flag.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::TryFrom;

    #[test]
    fn test_interrupts() {
        let ints = Interrupts::from(InterruptFlag::Tag).with(InterruptFlag::CmdEmpty);
        assert_eq!(ints.to_raw(), 0x24);
        assert!(ints.contains(InterruptFlag::Tag));
        assert!(!ints.contains(InterruptFlag::Touch));
        assert!(Interrupts::SERVICED.contains(InterruptFlag::Touch));
        assert!(Interrupts::NONE.is_empty());
        assert_eq!(InterruptFlag::try_from(0x80), Ok(InterruptFlag::ConvComplete));
        assert!(InterruptFlag::try_from(0x03).is_err());
    }
}
