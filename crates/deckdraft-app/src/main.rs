//! Main application entry point.

use clap::Parser;
use deckdraft_app::{App, AppConfig, AppResult};
use deckdraft_core::storage::{FileStorage, create_default_storage};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

/// Slide deck editor shell.
#[derive(Parser, Debug)]
#[command(name = "deckdraft", version, about)]
struct Args {
    /// Presentation file to open instead of a blank deck.
    #[arg(long)]
    deck: Option<PathBuf>,

    /// Command script to run (reads stdin when omitted).
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write the final presentation to this file.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Document store directory.
    #[arg(long)]
    store: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    log::info!("Starting DeckDraft");

    let args = Args::parse();
    if let Err(e) = pollster::block_on(run(args)) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> AppResult<()> {
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let storage: Arc<FileStorage> = match &args.store {
        Some(dir) => Arc::new(FileStorage::new(dir.clone())?),
        None => create_default_storage()?,
    };

    let mut app = App::new(config, storage);
    if let Some(path) = &args.deck {
        app.import_file(path)?;
    }

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut script = String::new();
            std::io::stdin().read_to_string(&mut script)?;
            script
        }
    };

    for output in app.run_script(&script).await {
        println!("{}", output);
    }

    if let Some(path) = &args.out {
        app.export_file(path)?;
    }
    app.close().await?;
    Ok(())
}
