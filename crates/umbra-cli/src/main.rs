//! Command-line entrypoint
//!
//! Thin shell over [`ProcessingSession`] and [`DocumentFetcher`]: load the
//! session configuration, run one command, print the result as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use umbra_core::UmbraConfig;
use umbra_vault::DocumentFetcher;
use umbra_workload::ProcessingSession;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "umbra", version, about = "Privacy-preserving document insights")]
struct Cli {
    /// Path to the session configuration file
    #[arg(short, long, default_value = "umbra.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a document to the vault and print the upload record
    Upload {
        /// File to publish
        file: PathBuf,
    },
    /// Publish a document and run the insights workload end to end
    Run {
        /// File to publish
        file: PathBuf,
    },
    /// Fetch a published document's shares and reconstruct it
    Fetch {
        /// Read-token bundle from an upload record
        bundle: String,
        /// Collection the document was published into
        collection_id: Uuid,
        /// Remote document identifier
        document_id: Uuid,
        /// Write the payload here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = UmbraConfig::load(&cli.config)
        .with_context(|| format!("Loading configuration from {}", cli.config.display()))?;

    match cli.command {
        Commands::Upload { file } => upload(&config, &file).await,
        Commands::Run { file } => run(&config, &file).await,
        Commands::Fetch {
            bundle,
            collection_id,
            document_id,
            output,
        } => fetch(&bundle, collection_id, document_id, output.as_deref()).await,
    }
}

async fn upload(config: &UmbraConfig, file: &std::path::Path) -> Result<()> {
    let (name, payload) = read_file(file)?;
    let session = ProcessingSession::new(config)?;

    let record = session.upload(&name, &payload).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn run(config: &UmbraConfig, file: &std::path::Path) -> Result<()> {
    let (name, payload) = read_file(file)?;
    let session = ProcessingSession::new(config)?;

    // Report each step as the session reaches it
    let mut updates = session.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if let Some(guide) = &snapshot.current_guide {
                eprintln!("[{:>3.0}%] {}", snapshot.progress * 100.0, guide.title);
            }
        }
    });

    let insights = session.run(&name, &payload).await?;
    drop(session);
    let _ = progress.await;

    println!("{}", serde_json::to_string_pretty(&insights)?);
    Ok(())
}

async fn fetch(
    bundle: &str,
    collection_id: Uuid,
    document_id: Uuid,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let fetcher = DocumentFetcher::new();
    let payload = fetcher
        .fetch_document(bundle, collection_id, document_id)
        .await?;

    match output {
        Some(path) => {
            std::fs::write(path, &payload)
                .with_context(|| format!("Writing {}", path.display()))?;
            tracing::info!(bytes = payload.len(), path = %path.display(), "Document written");
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&payload)?;
        }
    }
    Ok(())
}

fn read_file(path: &std::path::Path) -> Result<(String, Vec<u8>)> {
    let payload =
        std::fs::read(path).with_context(|| format!("Reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((name, payload))
}
