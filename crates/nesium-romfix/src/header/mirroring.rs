/// Layout mirroring type for the PPU nametables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mirroring {
    /// Two horizontal nametables that mirror vertically (common for NTSC games).
    #[default]
    Horizontal,
    /// Two vertical nametables that mirror horizontally.
    Vertical,
    /// Cartridge supplies its own four nametables.
    FourScreen,
    /// Single-screen mirroring using the first nametable (`$2000` region).
    SingleScreenLower,
    /// Single-screen mirroring using the second nametable (`$2400` region).
    SingleScreenUpper,
}

impl Mirroring {
    /// Decode the `pcb@mirroring` attribute of the NES 2.0 database.
    ///
    /// Unknown codes fall back to horizontal, which writes a zero mirroring code.
    pub fn from_database_code(code: &str) -> Self {
        match code.trim() {
            "V" | "v" => Self::Vertical,
            "4" => Self::FourScreen,
            "1" => Self::SingleScreenLower,
            "0" => Self::SingleScreenUpper,
            _ => Self::Horizontal,
        }
    }
}

type CodeTable = &'static [(Mirroring, u8)];

const STANDARD_CODES: CodeTable = &[(Mirroring::Vertical, 0x1), (Mirroring::FourScreen, 0x8)];

// UNROM 512: one-screen boards set bit 3, four-screen boards set both bits.
const MAPPER30_CODES: CodeTable = &[
    (Mirroring::Vertical, 0x1),
    (Mirroring::SingleScreenLower, 0x8),
    (Mirroring::FourScreen, 0x9),
];

// Magic Floor: bits 0 and 3 select which CIRAM address line drives A10.
const MAPPER218_CODES: CodeTable = &[
    (Mirroring::Vertical, 0x1),
    (Mirroring::SingleScreenLower, 0x8),
    (Mirroring::SingleScreenUpper, 0x9),
];

fn code_table(mapper: u16) -> CodeTable {
    match mapper {
        30 => MAPPER30_CODES,
        218 => MAPPER218_CODES,
        _ => STANDARD_CODES,
    }
}

/// Mirroring code written into bits 0 and 3 of header byte 6.
pub fn mirroring_code(mapper: u16, mirroring: Mirroring) -> u8 {
    code_table(mapper)
        .iter()
        .find(|(candidate, _)| *candidate == mirroring)
        .map_or(0, |&(_, code)| code)
}

/// Inverse of [`mirroring_code`]; unassigned codes read back as horizontal.
pub fn mirroring_from_code(mapper: u16, code: u8) -> Mirroring {
    let table = code_table(mapper);
    let mut code = code & 0b0000_1001;
    // Outside the special boards the four-screen bit overrides bit 0.
    if table == STANDARD_CODES && code & 0b0000_1000 != 0 {
        code = 0b0000_1000;
    }
    table
        .iter()
        .find(|&&(_, candidate)| candidate == code)
        .map_or(Mirroring::Horizontal, |&(mirroring, _)| mirroring)
}
