//! The iNES / NES 2.0 header.
//!
//! The first 16 bytes of a headered `.nes` dump describe how much PRG/CHR data
//! follows, which mapper the board uses and a handful of compatibility flags.
//! This module goes both ways:
//! - [`synthesize`] turns a database [`HeaderRecord`] into the canonical header.
//! - [`RawHeader`] reads an existing header back, mainly to learn how many
//!   payload bytes it promises ([`RawHeader::expected_payload_size`]) and which
//!   mapper it names ([`RawHeader::full_mapper_number`]).

mod analyze;
mod console_type;
mod flags6;
mod flags7;
mod mirroring;
mod record;
mod rom_format;
mod synth;

pub use analyze::{RawHeader, decode_exponent_form};
pub use console_type::ConsoleType;
pub use flags6::Flags6;
pub use flags7::Flags7;
pub use mirroring::{Mirroring, mirroring_code, mirroring_from_code};
pub use record::HeaderRecord;
pub use rom_format::RomFormat;
pub use synth::{
    CHR_ROM_UNIT, EXPONENT_NIBBLE, LINEAR_SIZE_LIMIT, PRG_ROM_UNIT, ram_shift, rom_size_byte,
    rom_size_nibble, synthesize,
};

pub const NES_MAGIC: &[u8; 4] = b"NES\x1A";

/// Size of the fixed iNES header in bytes.
pub const NES_HEADER_LEN: usize = 16;

pub type HeaderBytes = [u8; NES_HEADER_LEN];

/// Space separated lowercase hex, the format used in repair logs.
pub fn format_header(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
