//! Per-file repair decision.
//!
//! The engine decodes the container, hashes the payload, looks the hash up in
//! the [`MetadataTable`] and decides what the file should look like. When an
//! existing header promises fewer payload bytes than the file holds and the full
//! payload is unknown, the promised prefix is hashed as well; a hit there means
//! the dump carries trailing garbage that should be trimmed.

use sha1::{Digest, Sha1};
use tracing::debug;

use crate::{
    container::{self, ContainerFormat, DecodedContainer, SourceKind},
    database::MetadataTable,
    header::{HeaderBytes, HeaderRecord, RawHeader, synthesize},
};

/// What should happen to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Write this header in front of the (possibly trimmed) payload.
    WriteHeader(HeaderBytes),
    /// Disk image: drop the 16 byte prefix.
    StripHeader,
    NoChange,
    /// Not in the database; left to the unmatched-file policy.
    Unmatched,
}

/// Old and new mapper numbers when a rewrite changes the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperCorrection {
    pub old: u16,
    pub new: u16,
}

#[derive(Debug, Clone)]
pub struct Outcome {
    /// Uppercase hex SHA-1 the decision is based on.
    pub chosen_hash: String,
    pub matched_record: Option<HeaderRecord>,
    pub action: Action,
    /// Keep only this many payload bytes.
    pub trim_to: Option<u64>,
    pub mapper_correction: Option<MapperCorrection>,
    pub decoded: DecodedContainer,
}

impl Outcome {
    pub fn format(&self) -> ContainerFormat {
        self.decoded.format
    }

    /// Payload after applying `trim_to`.
    pub fn payload(&self) -> &[u8] {
        let content = &self.decoded.content;
        match self.trim_to {
            Some(len) => &content[..content.len().min(len as usize)],
            None => content,
        }
    }
}

/// Uppercase hex SHA-1, the key format of the metadata table.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(bytes))
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileEngine<'a> {
    table: &'a MetadataTable,
    nes2: bool,
}

impl<'a> ReconcileEngine<'a> {
    /// `nes2` selects NES 2.0 headers; otherwise iNES 1.0 headers are written.
    pub fn new(table: &'a MetadataTable, nes2: bool) -> Self {
        Self { table, nes2 }
    }

    pub fn reconcile(&self, bytes: &[u8], kind: SourceKind) -> Outcome {
        self.reconcile_decoded(container::decode(bytes, kind))
    }

    pub fn reconcile_decoded(&self, decoded: DecodedContainer) -> Outcome {
        let full_hash = content_hash(&decoded.content);

        if decoded.format == ContainerFormat::DiskImage {
            let action = if decoded.embedded_header.is_some() {
                Action::StripHeader
            } else {
                Action::NoChange
            };
            return Outcome {
                chosen_hash: full_hash,
                matched_record: None,
                action,
                trim_to: None,
                mapper_correction: None,
                decoded,
            };
        }

        let mut chosen_hash = full_hash;
        let mut matched = self.table.get(&chosen_hash).cloned();
        let mut trim_to = None;

        if let Some(implied) = self.size_mismatch(&decoded) {
            if matched.is_none() && implied < decoded.content.len() as u64 {
                let prefix_hash = content_hash(&decoded.content[..implied as usize]);
                debug!("re-hashed first {implied} bytes: {prefix_hash}");
                if let Some(record) = self.table.get(&prefix_hash) {
                    chosen_hash = prefix_hash;
                    matched = Some(record.clone());
                    trim_to = Some(implied);
                }
            }
        }

        let Some(record) = matched else {
            return Outcome {
                chosen_hash,
                matched_record: None,
                action: Action::Unmatched,
                trim_to: None,
                mapper_correction: None,
                decoded,
            };
        };

        let synthesized = synthesize(&record, self.nes2);
        let action = if trim_to.is_none() && decoded.embedded_header == Some(synthesized) {
            Action::NoChange
        } else {
            Action::WriteHeader(synthesized)
        };

        let mapper_correction = match (action, decoded.embedded_header) {
            (Action::WriteHeader(new), Some(old)) => {
                let old = RawHeader::from_bytes(old).full_mapper_number();
                let new = RawHeader::from_bytes(new).full_mapper_number();
                (old != new).then_some(MapperCorrection { old, new })
            }
            _ => None,
        };

        Outcome {
            chosen_hash,
            matched_record: Some(record),
            action,
            trim_to,
            mapper_correction,
            decoded,
        }
    }

    /// Payload size promised by a well-formed embedded header, when it is
    /// non-zero and disagrees with the bytes actually present.
    fn size_mismatch(&self, decoded: &DecodedContainer) -> Option<u64> {
        let header = RawHeader::parse(decoded.embedded_header.as_ref()?).ok()?;
        let implied = header.expected_payload_size();
        let actual = decoded.content.len() as u64;
        if implied == 0 || implied == actual {
            return None;
        }
        debug!("header promises {implied} payload bytes, file holds {actual}");
        Some(implied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{Mirroring, NES_HEADER_LEN};

    fn payload(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    fn nrom_record() -> HeaderRecord {
        HeaderRecord {
            prg_rom_size: 16384,
            chr_rom_size: 8192,
            mirroring: Mirroring::Vertical,
            ..Default::default()
        }
    }

    fn table_with(content: &[u8], record: HeaderRecord) -> MetadataTable {
        [(content_hash(content), record)].into_iter().collect()
    }

    fn headered(header: &[u8], content: &[u8]) -> Vec<u8> {
        let mut file = header.to_vec();
        file.extend_from_slice(content);
        file
    }

    #[test]
    fn hash_is_uppercase_sha1() {
        assert_eq!(
            content_hash(b"abc"),
            "A9993E364706816ABA3E25717850C26C9CD0D89D"
        );
    }

    #[test]
    fn headerless_match_gets_header() {
        let content = payload(16384 + 8192, 1);
        let table = table_with(&content, nrom_record());
        let engine = ReconcileEngine::new(&table, true);

        let outcome = engine.reconcile(&content, SourceKind::Cartridge);
        assert_eq!(outcome.format(), ContainerFormat::Headerless);
        assert_eq!(
            outcome.action,
            Action::WriteHeader(synthesize(&nrom_record(), true))
        );
        assert_eq!(outcome.trim_to, None);
        assert_eq!(outcome.mapper_correction, None);
        assert_eq!(outcome.chosen_hash, content_hash(&content));
    }

    #[test]
    fn correct_header_is_left_alone() {
        let content = payload(16384 + 8192, 2);
        let table = table_with(&content, nrom_record());
        let engine = ReconcileEngine::new(&table, true);
        let file = headered(&synthesize(&nrom_record(), true), &content);

        let outcome = engine.reconcile(&file, SourceKind::Cartridge);
        assert_eq!(outcome.action, Action::NoChange);
    }

    #[test]
    fn wrong_mapper_is_reported() {
        let content = payload(16384 + 8192, 3);
        let table = table_with(&content, nrom_record());
        let engine = ReconcileEngine::new(&table, true);
        let mut bad = synthesize(&nrom_record(), true);
        bad[6] |= 0x40;
        let outcome = engine.reconcile(&headered(&bad, &content), SourceKind::Cartridge);

        assert!(matches!(outcome.action, Action::WriteHeader(_)));
        assert_eq!(
            outcome.mapper_correction,
            Some(MapperCorrection { old: 4, new: 0 })
        );
    }

    #[test]
    fn unknown_content_is_unmatched() {
        let table = MetadataTable::new();
        let engine = ReconcileEngine::new(&table, true);
        let outcome = engine.reconcile(&payload(100, 4), SourceKind::Cartridge);
        assert_eq!(outcome.action, Action::Unmatched);
        assert!(outcome.matched_record.is_none());
    }

    #[test]
    fn trailing_garbage_is_trimmed_on_prefix_match() {
        let content = payload(16384 + 8192, 5);
        let table = table_with(&content, nrom_record());
        let engine = ReconcileEngine::new(&table, true);
        let header = synthesize(&nrom_record(), true);
        let mut padded = content.clone();
        padded.extend_from_slice(&[0xFF; 300]);

        let outcome = engine.reconcile(&headered(&header, &padded), SourceKind::Cartridge);
        assert_eq!(outcome.action, Action::WriteHeader(header));
        assert_eq!(outcome.trim_to, Some(content.len() as u64));
        assert_eq!(outcome.payload(), &content[..]);
        assert_eq!(outcome.chosen_hash, content_hash(&content));
    }

    #[test]
    fn full_match_wins_over_prefix() {
        let mut content = payload(16384 + 8192, 6);
        content.extend_from_slice(&[0xEE; 16]);
        let table = table_with(&content, nrom_record());
        let engine = ReconcileEngine::new(&table, true);
        let header = synthesize(&nrom_record(), true);

        let outcome = engine.reconcile(&headered(&header, &content), SourceKind::Cartridge);
        assert_eq!(outcome.trim_to, None);
        assert_eq!(outcome.action, Action::NoChange);
    }

    #[test]
    fn short_file_is_not_rehashed() {
        let content = payload(1000, 7);
        let table = MetadataTable::new();
        let engine = ReconcileEngine::new(&table, true);
        let header = synthesize(&nrom_record(), true);
        let outcome = engine.reconcile(&headered(&header, &content), SourceKind::Cartridge);
        assert_eq!(outcome.action, Action::Unmatched);
        assert_eq!(outcome.chosen_hash, content_hash(&content));
    }

    #[test]
    fn disk_images_are_stripped_without_lookup() {
        let table = MetadataTable::new();
        let engine = ReconcileEngine::new(&table, true);
        let mut file = b"FDS\x1A\x02".to_vec();
        file.resize(NES_HEADER_LEN, 0);
        file.extend_from_slice(&payload(65500, 8));

        let outcome = engine.reconcile(&file, SourceKind::Disk);
        assert_eq!(outcome.action, Action::StripHeader);
        assert_eq!(outcome.payload().len(), 65500);

        let outcome = engine.reconcile(&payload(65500, 8), SourceKind::Disk);
        assert_eq!(outcome.action, Action::NoChange);
    }

    #[test]
    fn ines_mode_writes_ines_headers() {
        let content = payload(16384 + 8192, 9);
        let table = table_with(&content, nrom_record());
        let engine = ReconcileEngine::new(&table, false);
        let outcome = engine.reconcile(&content, SourceKind::Cartridge);
        let Action::WriteHeader(header) = outcome.action else {
            panic!("expected a header rewrite, got {:?}", outcome.action);
        };
        assert_eq!(header[7] & 0x0C, 0);
        assert_eq!(&header[8..], &[0u8; 8]);
    }
}
