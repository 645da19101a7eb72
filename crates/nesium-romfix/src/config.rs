use std::path::{Path, PathBuf};

/// Directory name used for unmatched files when no `unknown_dir` is configured.
pub const DEFAULT_UNKNOWN_DIR: &str = "nes_unknown";

/// Switches for one run. Built once and handed to the [`crate::Runner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Report intended changes without touching the file system.
    pub dry_run: bool,
    /// Write NES 2.0 headers instead of iNES 1.0.
    pub nes2: bool,
    /// Move unmatched files into the mirrored unknown tree.
    pub sort_unknown: bool,
    /// Add `.unh` to unmatched headerless/UNIF files and unwrap UNIF payloads.
    pub mark_unheadered: bool,
    /// Root of the unknown tree. Defaults to a `nes_unknown` sibling of the scan root.
    pub unknown_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            nes2: true,
            sort_unknown: true,
            mark_unheadered: true,
            unknown_dir: None,
        }
    }
}

impl RunConfig {
    pub fn unknown_root(&self, scan_root: &Path) -> PathBuf {
        self.unknown_dir
            .clone()
            .unwrap_or_else(|| scan_root.join("..").join(DEFAULT_UNKNOWN_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_root_defaults_to_sibling() {
        let config = RunConfig::default();
        assert_eq!(
            config.unknown_root(Path::new("games/NES")),
            Path::new("games/NES/../nes_unknown")
        );
        let config = RunConfig {
            unknown_dir: Some(PathBuf::from("/tmp/unsorted")),
            ..RunConfig::default()
        };
        assert_eq!(config.unknown_root(Path::new(".")), Path::new("/tmp/unsorted"));
    }
}
