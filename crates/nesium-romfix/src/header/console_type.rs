/// Console type as stored in the two low bits of header byte 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleType {
    /// Standard NES/Famicom cartridge.
    NesFamicom,
    /// Vs. System arcade hardware.
    VsSystem,
    /// PlayChoice-10 hardware.
    PlayChoice10,
    /// NES 2.0 extended console type; the full value lives in byte 13.
    Extended,
}

impl ConsoleType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::NesFamicom,
            1 => Self::VsSystem,
            2 => Self::PlayChoice10,
            3 => Self::Extended,
            _ => unreachable!("masked to 2 bits"),
        }
    }

    /// Database console types of 3 and above all collapse to [`Self::Extended`].
    pub fn from_database(value: u8) -> Self {
        Self::from_bits(value.min(3))
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::NesFamicom => 0,
            Self::VsSystem => 1,
            Self::PlayChoice10 => 2,
            Self::Extended => 3,
        }
    }
}
