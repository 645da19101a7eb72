use super::Flags7;

/// Header revision, from bits 2..=3 of byte 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomFormat {
    /// iNES 1.0: bytes 8..=15 carry no size or mapper information.
    INes,
    /// NES 2.0: bytes 8..=15 extend mapper, sizes and console data.
    Nes20,
    /// Reserved bit pattern, usually a header with "DiskDude!"-style junk.
    Archaic,
}

impl RomFormat {
    pub(crate) fn from_flags7(flags7: Flags7) -> Self {
        match (flags7 & Flags7::NES2_DETECTION).bits() {
            0b0000_1000 => Self::Nes20,
            0b0000_0000 => Self::INes,
            _ => Self::Archaic,
        }
    }

    /// Whether bytes 8..=15 are meaningful.
    pub fn is_extended(self) -> bool {
        self == Self::Nes20
    }
}
