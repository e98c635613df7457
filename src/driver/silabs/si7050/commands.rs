use num_derive::{FromPrimitive, ToPrimitive};

/// 7-bit bus address of every Si705x part.
pub const DEFAULT_ADDRESS: u8 = 0x40;

pub mod reset {
    pub const CMD: u8 = 0xFE;

    /// The sensor ignores the bus for this long after a reset.
    pub const SETTLE_US: u32 = 15_000;
}

pub mod user_register {
    pub const READ: u8 = 0xE7;
    pub const WRITE: u8 = 0xE6;

    /// Resolution lives in bits 7 and 0; everything else must be preserved.
    pub const RESOLUTION_MASK: u8 = 0x81;
}

pub mod measure {
    /// Measure temperature, no hold master mode.
    pub const TRIGGER: u8 = 0xF3;
}

pub mod firmware {
    pub const READ: [u8; 2] = [0x84, 0xB8];
}

pub mod serial {
    pub const READ_FIRST: [u8; 2] = [0xFA, 0x0F];
    pub const READ_SECOND: [u8; 2] = [0xFC, 0xC9];

    pub const BURST_LEN: usize = 8;
}

/// Measurement resolution, encoded as the user register bits it occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum Resolution {
    #[default]
    Bits14 = 0x00,
    Bits13 = 0x80,
    Bits12 = 0x01,
    Bits11 = 0x81,
}

impl Resolution {
    pub fn from_bit_count(bits: u8) -> Option<Self> {
        match bits {
            14 => Some(Self::Bits14),
            13 => Some(Self::Bits13),
            12 => Some(Self::Bits12),
            11 => Some(Self::Bits11),
            _ => None,
        }
    }

    pub fn bit_count(self) -> u8 {
        match self {
            Self::Bits14 => 14,
            Self::Bits13 => 13,
            Self::Bits12 => 12,
            Self::Bits11 => 11,
        }
    }

    /// Time to wait between triggering a measurement and reading it back.
    /// Datasheet maximum conversion time, rounded up to the next millisecond.
    pub fn conversion_time_us(self) -> u32 {
        match self {
            Self::Bits14 => 11_000,
            Self::Bits13 => 7_000,
            Self::Bits12 => 4_000,
            Self::Bits11 => 3_000,
        }
    }

    /// Replaces the resolution bits of `register`, leaving the rest alone.
    pub fn apply(self, register: u8) -> u8 {
        (register & !user_register::RESOLUTION_MASK) | self as u8
    }
}
