//! UNIF chunk reader.
//!
//! A UNIF file is a 32 byte preamble (`"UNIF"`, revision, padding) followed by
//! chunks of `tag: [u8; 4]`, `len: u32 LE`, `data: [u8; len]`. Only the `PRGn`
//! and `CHRn` chunks carry ROM data; everything else is metadata.

use std::io::{self, Read, Seek, SeekFrom};

pub const UNIF_MAGIC: &[u8; 4] = b"UNIF";
pub const UNIF_PREAMBLE_LEN: usize = 32;

/// Famicom Disk System info chunk.
pub const DISK_INFO_TAG: &[u8; 4] = b"DINF";
/// Real size of a `DINF` chunk whose length field says zero.
pub const DISK_INFO_LEN: u32 = 204;
/// Tail of a tag read one byte before `DINF`.
const DISK_INFO_OVERLAP: &[u8; 3] = b"DIN";

/// One decoded chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: [u8; 4],
    /// Length as written in the file, before any quirk substitution.
    pub declared_len: u32,
    /// Payload, possibly shorter than announced if the file ends early.
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn is_program(&self) -> bool {
        self.tag.starts_with(b"PRG")
    }

    pub fn is_graphics(&self) -> bool {
        self.tag.starts_with(b"CHR")
    }

    pub fn tag_lossy(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// Incremental reader over a UNIF stream.
#[derive(Debug)]
pub struct ChunkReader<R> {
    inner: R,
    truncated: bool,
}

impl<R: Read + Seek> ChunkReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            truncated: false,
        }
    }

    /// Consume the fixed preamble. Call once before [`Self::next_chunk`].
    pub fn skip_preamble(&mut self) -> io::Result<()> {
        let mut preamble = [0u8; UNIF_PREAMBLE_LEN];
        if read_up_to(&mut self.inner, &mut preamble)? < UNIF_PREAMBLE_LEN {
            self.truncated = true;
        }
        Ok(())
    }

    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    /// Set once any chunk header or payload ended before its announced size.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the next chunk, `None` once the stream is exhausted.
    pub fn next_chunk(&mut self) -> io::Result<Option<Chunk>> {
        let mut tag = [0u8; 4];
        match read_up_to(&mut self.inner, &mut tag)? {
            0 => return Ok(None),
            4 => {}
            _ => {
                self.truncated = true;
                return Ok(None);
            }
        }

        if &tag[1..] == DISK_INFO_OVERLAP {
            tag = self.realign_disk_info(tag)?;
        }

        let mut len = [0u8; 4];
        if read_up_to(&mut self.inner, &mut len)? < len.len() {
            self.truncated = true;
            return Ok(None);
        }
        let declared_len = u32::from_le_bytes(len);
        let effective_len = if &tag == DISK_INFO_TAG && declared_len == 0 {
            DISK_INFO_LEN
        } else {
            declared_len
        };

        let mut data = Vec::new();
        (&mut self.inner)
            .take(effective_len as u64)
            .read_to_end(&mut data)?;
        if data.len() < effective_len as usize {
            self.truncated = true;
        }

        Ok(Some(Chunk {
            tag,
            declared_len,
            data,
        }))
    }

    /// Some writers emit a chunk length that is one byte short right before a
    /// `DINF` chunk, so the tag read picks up the last payload byte followed by
    /// `DIN`. Back up three bytes and read the tag again.
    fn realign_disk_info(&mut self, tag: [u8; 4]) -> io::Result<[u8; 4]> {
        self.inner.seek(SeekFrom::Current(-3))?;
        let mut realigned = [0u8; 4];
        if read_up_to(&mut self.inner, &mut realigned)? < realigned.len() {
            return Ok(tag);
        }
        Ok(realigned)
    }
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
