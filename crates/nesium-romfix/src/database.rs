//! Metadata table built from the NES 2.0 XML database (`nes20db.xml`).
//!
//! Every `<game>` element becomes one [`HeaderRecord`] keyed by the SHA-1 of
//! its PRG+CHR data:
//!
//! ```xml
//! <game>
//!   <prgrom size="32768" sha1="..."/>
//!   <chrrom size="8192" sha1="..."/>
//!   <rom size="40960" sha1="3F9D3E4D9C0F4A7D2F4B6E8C1A2B3C4D5E6F7A8B"/>
//!   <pcb mapper="0" submapper="0" mirroring="V" battery="0"/>
//!   <console type="0" region="0"/>
//!   <expansion type="1"/>
//! </game>
//! ```

use std::{collections::HashMap, fs, path::Path, str::FromStr};

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use tracing::{info, warn};

use crate::{
    error::Error,
    header::{HeaderRecord, Mirroring},
};

/// Length of a hex encoded SHA-1.
pub const SHA1_HEX_LEN: usize = 40;

/// Content hash -> known-good header metadata. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    records: HashMap<String, HeaderRecord>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse the database document at `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let xml = fs::read_to_string(path).map_err(|err| Error::MetadataLoad {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::from_xml(&xml).map_err(|reason| Error::MetadataLoad {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse a database document. Bad records are skipped; a broken document is an error.
    pub fn from_xml(xml: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(xml);
        let mut table = Self::new();
        let mut saw_root = false;
        let mut index = 0usize;
        let mut game: Option<GameBuilder> = None;
        let mut skipped = 0usize;

        loop {
            let event = reader
                .read_event()
                .map_err(|err| format!("{err} (at byte {})", reader.buffer_position()))?;
            match event {
                Event::Start(element) => {
                    saw_root = true;
                    if element.name().as_ref() == b"game" {
                        index += 1;
                        game = Some(GameBuilder::default());
                    } else if let Some(builder) = game.as_mut() {
                        builder.apply(&element);
                    }
                }
                Event::Empty(element) => {
                    saw_root = true;
                    if element.name().as_ref() == b"game" {
                        index += 1;
                        skipped += 1;
                        warn!(
                            "{}",
                            Error::MetadataRecord {
                                index,
                                reason: "empty <game> element".to_string(),
                            }
                        );
                    } else if let Some(builder) = game.as_mut() {
                        builder.apply(&element);
                    }
                }
                Event::End(element) if element.name().as_ref() == b"game" => {
                    if let Some(builder) = game.take() {
                        match builder.finish(index) {
                            Ok((sha1, record)) => {
                                table.insert(&sha1, record);
                            }
                            Err(err) => {
                                skipped += 1;
                                warn!("{err}");
                            }
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err("document has no root element".to_string());
        }
        if game.is_some() {
            return Err("document ends inside a <game> element".to_string());
        }

        info!(
            "Loaded {} database records ({} skipped)",
            table.len(),
            skipped
        );
        Ok(table)
    }

    /// Insert under the canonical uppercase key, returning any displaced record.
    pub fn insert(&mut self, sha1: &str, record: HeaderRecord) -> Option<HeaderRecord> {
        self.records.insert(sha1.to_ascii_uppercase(), record)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, sha1: &str) -> Option<&HeaderRecord> {
        self.records.get(&sha1.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(String, HeaderRecord)> for MetadataTable {
    fn from_iter<T: IntoIterator<Item = (String, HeaderRecord)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (sha1, record) in iter {
            table.insert(&sha1, record);
        }
        table
    }
}

/// Accumulates one `<game>` element; the first bad attribute poisons the record.
#[derive(Debug, Default)]
struct GameBuilder {
    sha1: Option<String>,
    record: HeaderRecord,
    error: Option<String>,
}

impl GameBuilder {
    fn apply(&mut self, element: &BytesStart<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.try_apply(element) {
            self.error = Some(err);
        }
    }

    fn try_apply(&mut self, element: &BytesStart<'_>) -> Result<(), String> {
        let record = &mut self.record;
        match element.name().as_ref() {
            b"rom" => self.sha1 = attribute(element, b"sha1")?,
            b"prgrom" => set(&mut record.prg_rom_size, number(element, b"size")?),
            b"prgram" => set(&mut record.prg_ram_size, number(element, b"size")?),
            b"prgnvram" => set(&mut record.prg_nvram_size, number(element, b"size")?),
            b"chrrom" => set(&mut record.chr_rom_size, number(element, b"size")?),
            b"chrram" => set(&mut record.chr_ram_size, number(element, b"size")?),
            b"chrnvram" => set(&mut record.chr_nvram_size, number(element, b"size")?),
            b"miscrom" => set(&mut record.misc_rom_count, number(element, b"number")?),
            b"trainer" => {
                let size: Option<u64> = number(element, b"size")?;
                record.has_trainer = size.is_some_and(|size| size > 0);
            }
            b"console" => {
                set(&mut record.console_type, number(element, b"type")?);
                set(&mut record.console_region, number(element, b"region")?);
            }
            b"expansion" => set(&mut record.expansion_device, number(element, b"type")?),
            b"vs" => {
                set(&mut record.vs_hardware, number(element, b"hardware")?);
                set(&mut record.vs_ppu, number(element, b"ppu")?);
            }
            b"pcb" => {
                set(&mut record.mapper_number, number(element, b"mapper")?);
                set(&mut record.submapper_number, number(element, b"submapper")?);
                if let Some(code) = attribute(element, b"mirroring")? {
                    record.mirroring = Mirroring::from_database_code(&code);
                }
                let battery: Option<u8> = number(element, b"battery")?;
                record.has_battery_backup = battery.is_some_and(|battery| battery != 0);
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self, index: usize) -> Result<(String, HeaderRecord), Error> {
        let record_error = |reason: String| Error::MetadataRecord { index, reason };
        if let Some(reason) = self.error {
            return Err(record_error(reason));
        }
        let sha1 = self
            .sha1
            .ok_or_else(|| record_error("missing <rom sha1=...>".to_string()))?;
        if sha1.len() != SHA1_HEX_LEN || !sha1.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(record_error(format!("malformed sha1 `{sha1}`")));
        }
        Ok((sha1.to_ascii_uppercase(), self.record))
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        if attr.key.as_ref() == name {
            let value = std::str::from_utf8(&attr.value).map_err(|err| err.to_string())?;
            return Ok(Some(value.trim().to_string()));
        }
    }
    Ok(None)
}

fn number<T: FromStr>(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<T>, String> {
    let Some(value) = attribute(element, name)? else {
        return Ok(None);
    };
    value.parse().map(Some).map_err(|_| {
        format!(
            "<{} {}=\"{value}\"> is not a valid number",
            String::from_utf8_lossy(element.name().as_ref()),
            String::from_utf8_lossy(name)
        )
    })
}
