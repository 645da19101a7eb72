use bitflags::bitflags;

bitflags! {
    /// Header byte 7.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags7: u8 {
        const CONSOLE_TYPE_MASK = 0b0000_0011;
        const NES2_DETECTION    = 0b0000_1100;
        const NES2_MARKER       = 0b0000_1000;
        const MAPPER_HIGH_MASK  = 0b1111_0000;
    }
}

impl Flags7 {
    pub(crate) fn compose(nes2: bool, console_bits: u8, mapper: u16) -> Self {
        let mut flags = Self::from_bits_truncate(console_bits & Self::CONSOLE_TYPE_MASK.bits());
        flags.set(Self::NES2_MARKER, nes2);
        flags | Self::from_bits_truncate((mapper & 0xF0) as u8)
    }

    pub(crate) fn console_bits(self) -> u8 {
        (self & Self::CONSOLE_TYPE_MASK).bits()
    }

    pub(crate) fn mapper_middle(self) -> u16 {
        (self & Self::MAPPER_HIGH_MASK).bits() as u16
    }
}
