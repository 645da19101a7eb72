//! Directory walk yielding the ROM files worth looking at.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::container::SourceKind;

/// Suffix appended to unmatched headerless dumps.
pub const UNHEADERED_SUFFIX: &str = ".unh";

const CARTRIDGE_EXTENSIONS: &[&str] = &[".nes", ".unf", ".unif"];
const DISK_EXTENSIONS: &[&str] = &[".fds"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomEntry {
    pub path: PathBuf,
    /// Path below the scan root.
    pub relative: PathBuf,
    pub kind: SourceKind,
}

impl RomEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory part of [`Self::relative`].
    pub fn relative_dir(&self) -> &Path {
        self.relative.parent().unwrap_or(Path::new(""))
    }
}

/// Classify by file name, case-insensitively. `game.nes.unh` is a cartridge.
pub fn classify(file_name: &str) -> Option<SourceKind> {
    let lower = file_name.to_ascii_lowercase();
    let stem = lower.strip_suffix(UNHEADERED_SUFFIX).unwrap_or(&lower);
    let has_extension = |extensions: &[&str]| {
        extensions
            .iter()
            .any(|ext| stem.len() > ext.len() && stem.ends_with(ext))
    };

    if has_extension(CARTRIDGE_EXTENSIONS) {
        Some(SourceKind::Cartridge)
    } else if stem == lower && has_extension(DISK_EXTENSIONS) {
        Some(SourceKind::Disk)
    } else {
        None
    }
}

/// Collect every recognised file below `root`, sorted by name, skipping `exclude`.
///
/// Entries are gathered up front so later renames cannot disturb the walk.
pub fn collect_roms(root: &Path, exclude: Option<&Path>) -> Vec<RomEntry> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| exclude.is_none_or(|excluded| entry.path() != excluded));

    let mut entries = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable path: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = classify(&entry.file_name().to_string_lossy()) else {
            continue;
        };
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        entries.push(RomEntry {
            path: entry.into_path(),
            relative,
            kind,
        });
    }
    entries
}
