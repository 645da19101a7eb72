mod args;

use anyhow::Result;
use args::Args;
use clap::Parser;
use nesium_romfix::{MetadataTable, Runner};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Reading {}, please wait...", args.database.display());
    let table = MetadataTable::load(&args.database)?;

    let config = args.run_config();
    if config.dry_run {
        info!("Dry run: no files will be modified");
    }
    info!("Evaluating files under {}...", args.root.display());
    Runner::new(config, &table).run(&args.root);
    Ok(())
}
