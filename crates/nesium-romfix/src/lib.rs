//! NES ROM header repair.
//!
//! Dumps come as iNES/NES 2.0 files with a possibly wrong header, as UNIF chunk
//! containers, or as raw headerless PRG+CHR data. Each one is hashed and looked
//! up in the NES 2.0 database; known dumps get a freshly synthesized header.
//!
//! ```no_run
//! use std::path::Path;
//! use nesium_romfix::{MetadataTable, RunConfig, Runner};
//!
//! let table = MetadataTable::load(Path::new("nes20db.xml"))?;
//! let config = RunConfig { dry_run: true, ..RunConfig::default() };
//! let summary = Runner::new(config, &table).run(Path::new("roms"));
//! println!("{summary}");
//! # Ok::<(), nesium_romfix::Error>(())
//! ```

pub mod config;
pub mod container;
pub mod database;
pub mod error;
pub mod header;
pub mod materialize;
pub mod reconcile;
pub mod runner;
pub mod traverse;

/// Size of the optional trainer block between header and PRG data.
pub const TRAINER_SIZE: usize = 512;

pub use config::RunConfig;
pub use container::{ContainerFormat, DecodedContainer, SourceKind, decode};
pub use database::MetadataTable;
pub use error::Error;
pub use header::{HeaderBytes, HeaderRecord, Mirroring, RawHeader, synthesize};
pub use materialize::Materializer;
pub use reconcile::{Action, MapperCorrection, Outcome, ReconcileEngine, content_hash};
pub use runner::{FileStatus, RunSummary, Runner};
