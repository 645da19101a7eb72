use super::Mirroring;

/// Known-good cartridge metadata, one per database entry.
///
/// Sizes are byte counts; `0` means the memory is absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HeaderRecord {
    pub prg_rom_size: u64,
    pub prg_ram_size: u64,
    pub prg_nvram_size: u64,
    pub chr_rom_size: u64,
    pub chr_ram_size: u64,
    pub chr_nvram_size: u64,
    /// Number of miscellaneous ROM areas that follow CHR data.
    pub misc_rom_count: u8,
    /// Raw console type. Values of 3 and above denote an extended console.
    pub console_type: u8,
    /// CPU/PPU timing (0 NTSC, 1 PAL, 2 multi-region, 3 Dendy).
    pub console_region: u8,
    pub expansion_device: u8,
    /// Only meaningful for Vs. System boards.
    pub vs_hardware: u8,
    /// Only meaningful for Vs. System boards.
    pub vs_ppu: u8,
    pub mirroring: Mirroring,
    pub mapper_number: u16,
    pub submapper_number: u8,
    pub has_battery_backup: bool,
    /// A 512 byte trainer block precedes PRG data.
    pub has_trainer: bool,
}

impl HeaderRecord {
    /// Payload bytes (trainer + PRG + CHR) a dump of this board carries.
    pub fn payload_size(&self) -> u64 {
        let trainer = if self.has_trainer {
            crate::TRAINER_SIZE as u64
        } else {
            0
        };
        trainer + self.prg_rom_size + self.chr_rom_size
    }
}
