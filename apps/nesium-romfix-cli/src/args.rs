use std::path::PathBuf;

use clap::Parser;
use nesium_romfix::RunConfig;
use tracing::Level;

/// Repair iNES / NES 2.0 headers using the NES 2.0 XML database
#[derive(Parser, Debug)]
#[command(name = "nesium_romfix")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory scanned recursively for .nes/.unf/.fds files
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// NES 2.0 XML database
    #[arg(short, long, default_value = "nes20db.xml")]
    pub database: PathBuf,

    /// Report what would change without modifying any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Write iNES 1.0 headers instead of NES 2.0
    #[arg(long)]
    pub ines1: bool,

    /// Leave unmatched files where they are
    #[arg(long)]
    pub no_sort_unknown: bool,

    /// Do not add `.unh` to unmatched headerless/UNIF files
    #[arg(long)]
    pub no_mark_unheadered: bool,

    /// Where unmatched files are moved (defaults to `<root>/../nes_unknown`)
    #[arg(long)]
    pub unknown_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: Level,
}

impl Args {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            dry_run: self.dry_run,
            nes2: !self.ines1,
            sort_unknown: !self.no_sort_unknown,
            mark_unheadered: !self.no_mark_unheadered,
            unknown_dir: self.unknown_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_defaults() {
        let args = Args::parse_from(["nesium_romfix"]);
        assert_eq!(args.root, PathBuf::from("."));
        assert_eq!(args.database, PathBuf::from("nes20db.xml"));
        assert_eq!(args.log_level, Level::INFO);
        assert_eq!(args.run_config(), RunConfig::default());
    }

    #[test]
    fn flags_flip_config() {
        let args = Args::parse_from([
            "nesium_romfix",
            "roms",
            "-n",
            "--ines1",
            "--no-sort-unknown",
            "--no-mark-unheadered",
            "--unknown-dir",
            "/tmp/unknown",
            "--log-level",
            "debug",
        ]);
        let config = args.run_config();
        assert!(config.dry_run);
        assert!(!config.nes2);
        assert!(!config.sort_unknown);
        assert!(!config.mark_unheadered);
        assert_eq!(config.unknown_dir, Some(PathBuf::from("/tmp/unknown")));
        assert_eq!(args.root, PathBuf::from("roms"));
        assert_eq!(args.log_level, Level::DEBUG);
    }
}
