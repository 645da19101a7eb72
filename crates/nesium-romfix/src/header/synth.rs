//! Header synthesis: [`HeaderRecord`] in, canonical 16 header bytes out.
//!
//! ROM sizes are normally stored as a count of 16 KiB (PRG) or 8 KiB (CHR) units.
//! NES 2.0 adds an *exponent-multiplier* form for sizes that are not a whole
//! number of units or exceed 64 MiB: byte 4/5 holds `exponent << 2 | mm` and the
//! matching nibble of byte 9 is set to `0xF`. The decoded size is
//! `2^exponent * (mm * 2 + 1)`; the exponent is `floor(log2(size / multiplier))`,
//! so sizes that are not exactly `multiplier * 2^n` round down.

use super::{
    ConsoleType, Flags6, Flags7, HeaderBytes, HeaderRecord, NES_MAGIC, mirroring_code,
};

pub const PRG_ROM_UNIT: u64 = 16 * 1024;
pub const CHR_ROM_UNIT: u64 = 8 * 1024;

/// Largest size still written in linear (unit count) form.
pub const LINEAR_SIZE_LIMIT: u64 = 64 * 1024 * 1024;

/// Byte 9 nibble value announcing exponent-multiplier form.
pub const EXPONENT_NIBBLE: u8 = 0x0F;

/// Build the header for `record`. With `nes2 == false` an iNES 1.0 header is
/// produced and bytes 8..=15 stay zero.
pub fn synthesize(record: &HeaderRecord, nes2: bool) -> HeaderBytes {
    let mut header = [0u8; super::NES_HEADER_LEN];
    header[..4].copy_from_slice(NES_MAGIC);

    let mapper = record.mapper_number;
    let console = ConsoleType::from_database(record.console_type);
    let flags6 = Flags6::compose(
        mirroring_code(mapper, record.mirroring),
        record.has_battery_backup,
        record.has_trainer,
        mapper,
    );
    let flags7 = Flags7::compose(nes2, console.bits(), mapper);

    header[4] = rom_size_byte(record.prg_rom_size, PRG_ROM_UNIT, nes2);
    header[5] = rom_size_byte(record.chr_rom_size, CHR_ROM_UNIT, nes2);
    header[6] = flags6.bits();
    header[7] = flags7.bits();

    if !nes2 {
        return header;
    }

    header[8] = ((mapper >> 8) & 0x0F) as u8 | ((record.submapper_number & 0x0F) << 4);
    header[9] = rom_size_nibble(record.prg_rom_size, PRG_ROM_UNIT)
        | (rom_size_nibble(record.chr_rom_size, CHR_ROM_UNIT) << 4);
    header[10] = ram_shift(record.prg_ram_size) | (ram_shift(record.prg_nvram_size) << 4);
    header[11] = ram_shift(record.chr_ram_size) | (ram_shift(record.chr_nvram_size) << 4);
    header[12] = record.console_region & 0x03;
    header[13] = match ConsoleType::from_bits(flags7.console_bits()) {
        ConsoleType::VsSystem => ((record.vs_hardware & 0x0F) << 4) | (record.vs_ppu & 0x0F),
        ConsoleType::Extended => record.console_type & 0x0F,
        ConsoleType::NesFamicom | ConsoleType::PlayChoice10 => 0,
    };
    header[14] = record.misc_rom_count & 0x03;
    header[15] = record.expansion_device & 0x3F;

    header
}

fn needs_exponent_form(size: u64, unit: u64) -> bool {
    size > LINEAR_SIZE_LIMIT || size % unit != 0
}

/// Byte 4 (PRG) / byte 5 (CHR).
pub fn rom_size_byte(size: u64, unit: u64, nes2: bool) -> u8 {
    if nes2 && needs_exponent_form(size, unit) {
        let multiplier = [3u64, 5, 7]
            .into_iter()
            .find(|m| size % m == 0)
            .unwrap_or(1);
        // size > 0 here: zero is always a whole number of units.
        let exponent = (size / multiplier).ilog2() as u8;
        (exponent << 2) | ((multiplier as u8 - 1) >> 1)
    } else {
        ((size / unit) & 0xFF) as u8
    }
}

/// PRG (low) / CHR (high) nibble of byte 9.
pub fn rom_size_nibble(size: u64, unit: u64) -> u8 {
    if needs_exponent_form(size, unit) {
        EXPONENT_NIBBLE
    } else {
        (((size / unit) >> 8) & 0x0F) as u8
    }
}

/// RAM shift count: `size == 64 << shift`. Absent (and sub-64-byte) RAM is 0.
pub fn ram_shift(size: u64) -> u8 {
    ((size / 64).checked_ilog2().unwrap_or(0) & 0x0F) as u8
}
