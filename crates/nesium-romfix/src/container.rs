//! Container classification and payload extraction.
//!
//! Four shapes are recognised from the first three bytes:
//! - `NES`: a 16 byte iNES header followed by the payload.
//! - `UNI`: a UNIF chunk container; PRG chunks then CHR chunks form the payload.
//! - `FDS` (or `NES` on a disk image): a headered Famicom Disk System image.
//! - anything else: a raw, headerless dump.
//!
//! Decoding never fails. A container that ends early yields whatever was read.

pub mod unif;

use std::io::Cursor;

use tracing::debug;

use crate::header::{HeaderBytes, NES_HEADER_LEN};

pub use unif::{Chunk, ChunkReader, DISK_INFO_LEN, DISK_INFO_TAG, UNIF_MAGIC};

/// What the file name says the file should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// `.nes`, `.unf`, `.unif` (optionally with a `.unh` marker).
    Cartridge,
    /// `.fds`.
    Disk,
}

/// What the bytes turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    TaggedChunk,
    FixedHeader,
    Headerless,
    DiskImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedContainer {
    /// Bytes the content hash is computed over.
    pub content: Vec<u8>,
    /// Header found in place, returned as-is.
    pub embedded_header: Option<HeaderBytes>,
    pub format: ContainerFormat,
    /// The container ended before a chunk it announced.
    pub truncated: bool,
}

impl DecodedContainer {
    fn new(format: ContainerFormat, content: Vec<u8>, embedded_header: Option<HeaderBytes>) -> Self {
        Self {
            content,
            embedded_header,
            format,
            truncated: false,
        }
    }
}

/// Classify `bytes` and extract the payload.
pub fn decode(bytes: &[u8], kind: SourceKind) -> DecodedContainer {
    let signature = bytes.get(..3);
    match (kind, signature) {
        (_, Some(b"FDS")) | (SourceKind::Disk, Some(b"NES")) => split_header(bytes)
            .map(|(header, payload)| {
                DecodedContainer::new(ContainerFormat::DiskImage, payload.to_vec(), Some(header))
            })
            .unwrap_or_else(|| DecodedContainer::new(ContainerFormat::DiskImage, bytes.to_vec(), None)),
        (SourceKind::Disk, _) => {
            DecodedContainer::new(ContainerFormat::DiskImage, bytes.to_vec(), None)
        }
        (SourceKind::Cartridge, Some(b"NES")) => match split_header(bytes) {
            Some((header, payload)) => DecodedContainer::new(
                ContainerFormat::FixedHeader,
                payload.to_vec(),
                Some(header),
            ),
            None => DecodedContainer::new(ContainerFormat::Headerless, bytes.to_vec(), None),
        },
        (SourceKind::Cartridge, Some(b"UNI")) => decode_unif(bytes),
        (SourceKind::Cartridge, _) => {
            DecodedContainer::new(ContainerFormat::Headerless, bytes.to_vec(), None)
        }
    }
}

fn split_header(bytes: &[u8]) -> Option<(HeaderBytes, &[u8])> {
    let header: HeaderBytes = bytes.get(..NES_HEADER_LEN)?.try_into().ok()?;
    Some((header, &bytes[NES_HEADER_LEN..]))
}

fn decode_unif(bytes: &[u8]) -> DecodedContainer {
    let mut reader = ChunkReader::new(Cursor::new(bytes));
    let mut prg = Vec::new();
    let mut chr = Vec::new();

    let mut read_chunks = || -> std::io::Result<()> {
        reader.skip_preamble()?;
        while let Some(chunk) = reader.next_chunk()? {
            if chunk.is_program() {
                debug!("{} size {}", chunk.tag_lossy(), chunk.data.len());
                prg.extend_from_slice(&chunk.data);
            } else if chunk.is_graphics() {
                debug!("{} size {}", chunk.tag_lossy(), chunk.data.len());
                chr.extend_from_slice(&chunk.data);
            }
        }
        Ok(())
    };
    let outcome = read_chunks();

    let mut truncated = reader.is_truncated();
    if let Err(err) = outcome {
        debug!("UNIF stream stopped early: {err}");
        truncated = true;
    }

    prg.extend_from_slice(&chr);
    DecodedContainer {
        content: prg,
        embedded_header: None,
        format: ContainerFormat::TaggedChunk,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unif(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut bytes = UNIF_MAGIC.to_vec();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.resize(32, 0);
        for (tag, data) in chunks {
            bytes.extend_from_slice(*tag);
            bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
            bytes.extend_from_slice(data);
        }
        bytes
    }

    #[test]
    fn unif_concatenates_prg_then_chr() {
        let file = unif(&[(b"PRG0", &[1, 2, 3, 4]), (b"CHR0", &[5, 6])]);
        let decoded = decode(&file, SourceKind::Cartridge);
        assert_eq!(decoded.format, ContainerFormat::TaggedChunk);
        assert_eq!(decoded.content, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(decoded.embedded_header, None);
        assert!(!decoded.truncated);
    }

    #[test]
    fn unif_groups_interleaved_chunks() {
        let file = unif(&[
            (b"MAPR", b"NES-NROM-256\0"),
            (b"CHR0", &[0xC0]),
            (b"PRG0", &[0xA0]),
            (b"CHR1", &[0xC1]),
            (b"PRG1", &[0xA1]),
            (b"BATR", &[1]),
        ]);
        let decoded = decode(&file, SourceKind::Cartridge);
        assert_eq!(decoded.content, vec![0xA0, 0xA1, 0xC0, 0xC1]);
    }

    #[test]
    fn unif_truncated_chunk_keeps_partial_data() {
        let mut file = unif(&[(b"PRG0", &[1, 2, 3, 4])]);
        file.truncate(file.len() - 2);
        let decoded = decode(&file, SourceKind::Cartridge);
        assert_eq!(decoded.content, vec![1, 2]);
        assert!(decoded.truncated);
    }

    #[test]
    fn ines_splits_header() {
        let mut file = b"NES\x1A".to_vec();
        file.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        file.extend_from_slice(&[0xAA; 8]);
        let decoded = decode(&file, SourceKind::Cartridge);
        assert_eq!(decoded.format, ContainerFormat::FixedHeader);
        assert_eq!(decoded.embedded_header.map(|h| h[4]), Some(1));
        assert_eq!(decoded.content, vec![0xAA; 8]);
    }

    #[test]
    fn headerless_keeps_every_byte() {
        let file: Vec<u8> = (0..40).collect();
        let decoded = decode(&file, SourceKind::Cartridge);
        assert_eq!(decoded.format, ContainerFormat::Headerless);
        assert_eq!(decoded.content, file);
        assert_eq!(decoded.embedded_header, None);
    }

    #[test]
    fn short_nes_prefix_is_headerless() {
        let decoded = decode(b"NES\x1A\x01", SourceKind::Cartridge);
        assert_eq!(decoded.format, ContainerFormat::Headerless);
        assert_eq!(decoded.content.len(), 5);
    }

    #[test]
    fn disk_images() {
        let mut headered = b"FDS\x1A\x01".to_vec();
        headered.resize(16, 0);
        headered.extend_from_slice(b"*NINTENDO-HVC*");
        let decoded = decode(&headered, SourceKind::Disk);
        assert_eq!(decoded.format, ContainerFormat::DiskImage);
        assert!(decoded.embedded_header.is_some());
        assert_eq!(decoded.content, b"*NINTENDO-HVC*".to_vec());

        let mut nes_prefixed = b"NES\x1A".to_vec();
        nes_prefixed.resize(20, 0);
        let decoded = decode(&nes_prefixed, SourceKind::Disk);
        assert_eq!(decoded.format, ContainerFormat::DiskImage);
        assert_eq!(decoded.content.len(), 4);

        let raw = b"\x01*NINTENDO-HVC*".to_vec();
        let decoded = decode(&raw, SourceKind::Disk);
        assert_eq!(decoded.format, ContainerFormat::DiskImage);
        assert_eq!(decoded.embedded_header, None);
        assert_eq!(decoded.content, raw);
    }

    #[test]
    fn fds_signature_wins_over_extension() {
        let mut file = b"FDS\x1A".to_vec();
        file.resize(32, 0);
        let decoded = decode(&file, SourceKind::Cartridge);
        assert_eq!(decoded.format, ContainerFormat::DiskImage);
    }
}
