use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docqa_session::models::{FileRef, SessionState};
use docqa_session::{HttpBackend, SessionConfig, SessionController, SessionError};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Upload documents and ask questions about them")]
struct Cli {
    /// Backend base URL (overrides the config file and DOCQA_API_URL)
    #[arg(short, long)]
    url: Option<String>,

    /// Documents to upload before the conversation starts
    files: Vec<PathBuf>,
}

const HELP: &str = "\
Type a question, or one of:
  :upload <path>...  add documents
  :retry             retry a failed analysis
  :clear             start over
  :save <path>       write the conversation to a file
  :state             show the session state
  :quit              exit";

/// Log to stderr so stdout carries only the conversation.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "docqa_session=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

type Session = SessionController<HttpBackend>;

async fn load_files(paths: &[PathBuf]) -> anyhow::Result<Vec<FileRef>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = FileRef::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

async fn upload(session: &Session, paths: &[PathBuf]) -> anyhow::Result<()> {
    let files = load_files(paths).await?;
    match session.submit_files(files).await {
        Ok(outcome) => {
            for doc in &outcome.rejected {
                println!("Skipped {} (unsupported type)", doc.name);
            }
            println!("Uploaded {} document(s).", outcome.documents.len());
            println!("\nAssistant: {}\n", outcome.summary.as_str());
        }
        Err(e) => println!("Error: {}", e),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = SessionConfig::load();
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    tracing::info!("Using backend at {}", config.base_url);

    let backend = HttpBackend::new(&config).context("Failed to build HTTP client")?;
    let session = SessionController::new(backend, &config);

    if !cli.files.is_empty() {
        upload(&session, &cli.files).await?;
    }
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "" => continue,
            ":quit" | ":q" => break,
            ":clear" => {
                session.clear();
                println!("Session cleared.");
            }
            ":state" => {
                let snapshot = session.snapshot();
                println!(
                    "{} - {} document(s), {} message(s)",
                    snapshot.state,
                    snapshot.documents.len(),
                    snapshot.messages.len()
                );
                if let Some(err) = snapshot.last_error {
                    println!("Last error: {}", err);
                }
            }
            ":upload" => {
                let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if let Err(e) = upload(&session, &paths).await {
                    println!("Error: {:#}", e);
                }
            }
            ":retry" => match session.retry_analysis().await {
                Ok(summary) => println!("\nAssistant: {}\n", summary.as_str()),
                Err(e) => println!("Error: {}", e),
            },
            ":save" => {
                let path = rest.trim();
                if path.is_empty() {
                    println!("Usage: :save <path>");
                    continue;
                }
                match tokio::fs::write(path, session.transcript()).await {
                    Ok(()) => println!("Saved conversation to {}", path),
                    Err(e) => println!("Error: failed to write {}: {}", path, e),
                }
            }
            _ => match session.ask(line).await {
                Ok(message) if message.is_error => println!("\nAssistant (error): {}\n", message.text),
                Ok(message) => println!("\nAssistant: {}\n", message.text),
                Err(SessionError::InvalidState { .. }) if session.state() == SessionState::Idle => {
                    println!("Upload a document first (:upload <path>).")
                }
                Err(e) => println!("Error: {}", e),
            },
        }
    }

    Ok(())
}
