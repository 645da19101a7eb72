use bitflags::bitflags;

bitflags! {
    /// Header byte 6.
    ///
    /// `MIRRORING` and `ALT_NAMETABLES` together form the mirroring code written by
    /// [`super::mirroring_code`]; mappers 30 and 218 give the pair their own meaning.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags6: u8 {
        const MIRRORING        = 0b0000_0001;
        const BATTERY          = 0b0000_0010;
        const TRAINER          = 0b0000_0100;
        const ALT_NAMETABLES   = 0b0000_1000;
        const MAPPER_LOW_MASK  = 0b1111_0000;
    }
}

impl Flags6 {
    pub(crate) fn compose(mirroring_code: u8, battery: bool, trainer: bool, mapper: u16) -> Self {
        let mut flags = Self::from_bits_truncate(mirroring_code & 0b0000_1001);
        flags.set(Self::BATTERY, battery);
        flags.set(Self::TRAINER, trainer);
        flags | Self::from_bits_truncate(((mapper & 0x0F) as u8) << 4)
    }

    pub(crate) fn mapper_low(self) -> u16 {
        ((self & Self::MAPPER_LOW_MASK).bits() >> 4) as u16
    }
}
