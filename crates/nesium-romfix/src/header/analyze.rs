use super::{
    CHR_ROM_UNIT, ConsoleType, EXPONENT_NIBBLE, Flags6, Flags7, HeaderBytes, Mirroring,
    NES_HEADER_LEN, NES_MAGIC, PRG_ROM_UNIT, RomFormat, mirroring_from_code,
};
use crate::{TRAINER_SIZE, error::Error};

/// An existing 16-byte header found in front of a ROM payload.
///
/// Accessors mirror the fields written by [`super::synthesize`]; the
/// interesting ones for repair decisions are [`RawHeader::expected_payload_size`]
/// and [`RawHeader::full_mapper_number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHeader(HeaderBytes);

impl RawHeader {
    /// Validate length and magic of `bytes[..16]`.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let header: HeaderBytes = bytes
            .get(..NES_HEADER_LEN)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(Error::HeaderTooShort {
                actual: bytes.len(),
            })?;
        if &header[..4] != NES_MAGIC {
            return Err(Error::InvalidMagic);
        }
        Ok(Self(header))
    }

    /// Wrap bytes without validation.
    pub fn from_bytes(bytes: HeaderBytes) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &HeaderBytes {
        &self.0
    }

    pub fn flags6(&self) -> Flags6 {
        Flags6::from_bits_truncate(self.0[6])
    }

    pub fn flags7(&self) -> Flags7 {
        Flags7::from_bits_truncate(self.0[7])
    }

    pub fn format(&self) -> RomFormat {
        RomFormat::from_flags7(self.flags7())
    }

    fn is_extended(&self) -> bool {
        self.format().is_extended()
    }

    pub fn trainer_present(&self) -> bool {
        self.flags6().contains(Flags6::TRAINER)
    }

    pub fn battery(&self) -> bool {
        self.flags6().contains(Flags6::BATTERY)
    }

    pub fn console_type(&self) -> ConsoleType {
        ConsoleType::from_bits(self.flags7().console_bits())
    }

    /// Mapper number including the NES 2.0 high nibble when present.
    pub fn full_mapper_number(&self) -> u16 {
        let upper = if self.is_extended() {
            ((self.0[8] & 0x0F) as u16) << 8
        } else {
            0
        };
        self.flags6().mapper_low() | self.flags7().mapper_middle() | upper
    }

    pub fn submapper(&self) -> u8 {
        if self.is_extended() { self.0[8] >> 4 } else { 0 }
    }

    pub fn mirroring(&self) -> Mirroring {
        mirroring_from_code(self.full_mapper_number(), self.0[6])
    }

    pub fn prg_rom_size(&self) -> u64 {
        self.rom_size(self.0[4], self.0[9] & 0x0F, PRG_ROM_UNIT)
    }

    pub fn chr_rom_size(&self) -> u64 {
        self.rom_size(self.0[5], self.0[9] >> 4, CHR_ROM_UNIT)
    }

    /// Bytes the header claims follow it: trainer, PRG and CHR.
    pub fn expected_payload_size(&self) -> u64 {
        let trainer = if self.trainer_present() {
            TRAINER_SIZE as u64
        } else {
            0
        };
        trainer
            .saturating_add(self.prg_rom_size())
            .saturating_add(self.chr_rom_size())
    }

    fn rom_size(&self, lsb: u8, msb_nibble: u8, unit: u64) -> u64 {
        if !self.is_extended() {
            return lsb as u64 * unit;
        }
        if msb_nibble == EXPONENT_NIBBLE {
            decode_exponent_form(lsb)
        } else {
            (((msb_nibble as u64) << 8) | lsb as u64) * unit
        }
    }
}

/// `2^exponent * (mm * 2 + 1)` from `exponent << 2 | mm`.
pub fn decode_exponent_form(value: u8) -> u64 {
    let exponent = (value >> 2) as u32;
    let multiplier = ((value & 0b11) as u64) * 2 + 1;
    1u64.checked_shl(exponent)
        .unwrap_or(0)
        .saturating_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(bytes: [u8; 12]) -> RawHeader {
        let mut raw = [0u8; NES_HEADER_LEN];
        raw[..4].copy_from_slice(NES_MAGIC);
        raw[4..].copy_from_slice(&bytes);
        RawHeader::parse(&raw).expect("valid header")
    }

    #[test]
    fn rejects_short_and_foreign_buffers() {
        assert!(matches!(
            RawHeader::parse(b"NES\x1A"),
            Err(Error::HeaderTooShort { actual: 4 })
        ));
        let mut foreign = [0u8; NES_HEADER_LEN];
        foreign[..4].copy_from_slice(b"FDS\x1A");
        assert!(matches!(RawHeader::parse(&foreign), Err(Error::InvalidMagic)));
    }

    #[test]
    fn ines_payload_ignores_extension_bytes() {
        // Byte 9 would add 0x100 units if this were NES 2.0.
        let h = header([2, 1, 0, 0, 0x0F, 0x11, 0, 0, 0, 0, 0, 0]);
        assert_eq!(h.format(), RomFormat::INes);
        assert_eq!(h.expected_payload_size(), 2 * 16384 + 8192);
        assert_eq!(h.full_mapper_number(), 0);
    }

    #[test]
    fn trainer_adds_512_bytes() {
        let h = header([1, 0, 0b0000_0100, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(h.trainer_present());
        assert_eq!(h.expected_payload_size(), 512 + 16384);
    }

    #[test]
    fn nes2_linear_with_msb_nibble() {
        let h = header([2, 1, 0, 0x08, 0, 0x10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(h.prg_rom_size(), 2 * 16384);
        assert_eq!(h.chr_rom_size(), (0x100 + 1) * 8192);
    }

    #[test]
    fn nes2_exponent_form() {
        // PRG: exponent 13, multiplier 3. CHR: exponent 9, multiplier 1.
        let h = header([(13 << 2) | 1, 9 << 2, 0, 0x08, 0, 0xFF, 0, 0, 0, 0, 0, 0]);
        assert_eq!(h.prg_rom_size(), 3 * 8192);
        assert_eq!(h.chr_rom_size(), 512);
        assert_eq!(h.expected_payload_size(), 3 * 8192 + 512);
    }

    #[test]
    fn huge_exponent_saturates() {
        assert_eq!(decode_exponent_form(0xFF), (1u64 << 63).saturating_mul(7));
    }

    #[test]
    fn mapper_number_uses_byte8_only_for_nes2() {
        let ines = header([0, 0, 0x40, 0x10, 0x0A, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ines.full_mapper_number(), 0x14);
        assert_eq!(ines.submapper(), 0);

        let nes2 = header([0, 0, 0x40, 0x18, 0x3A, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(nes2.full_mapper_number(), 0xA14);
        assert_eq!(nes2.submapper(), 3);
    }

    #[test]
    fn reads_flags() {
        let h = header([0, 0, 0b1001_0011, 0x08, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(h.battery());
        assert!(!h.trainer_present());
        assert_eq!(h.full_mapper_number(), 9);
        assert_eq!(h.mirroring(), Mirroring::Vertical);
        assert_eq!(h.console_type(), ConsoleType::NesFamicom);
    }

    #[test]
    fn four_screen_bit_wins_over_vertical() {
        let h = header([0, 0, 0b0000_1001, 0x00, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(h.mirroring(), Mirroring::FourScreen);

        let unrom512 = header([0, 0, 0xE9, 0x10, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(unrom512.full_mapper_number(), 30);
        assert_eq!(unrom512.mirroring(), Mirroring::FourScreen);
    }
}
