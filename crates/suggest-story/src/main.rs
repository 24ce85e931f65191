mod script;
mod session;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use gpui_plate_suggest::SuggestConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::script::parse_script;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "plate-suggest-story")]
#[command(about = "Replays editor input against the block menu and mention overlays")]
struct Args {
    /// JSON-lines script of editor events
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// JSON file with overlay settings
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print one JSON snapshot per event instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SuggestConfig::from_json_str(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => SuggestConfig::default(),
    };

    let source = std::fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read script {}", args.script.display()))?;
    let events = parse_script(&source)?;
    info!(events = events.len(), script = %args.script.display(), "replaying");

    let mut session = Session::new(config);
    for (ix, event) in events.iter().enumerate() {
        session
            .apply(event)
            .with_context(|| format!("event {} ({event:?}) failed", ix + 1))?;
        let snapshot = session.snapshot();
        if args.json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            println!("#{} {event:?}", ix + 1);
            print!("{snapshot}");
        }
    }
    info!(
        blocks = session.document().blocks().len(),
        phase = ?session.controller().phase(),
        "replay finished"
    );
    Ok(())
}
