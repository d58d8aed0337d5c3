//! Token Bridge CLI
//!
//! Drives the bridge core from the command line: stream a generation to
//! stdout as it is produced, or chunk a text file into JSON documents.
//!
//! # Usage
//!
//! ```bash
//! # Stream from a local Ollama server
//! token-bridge stream --prompt "Why is the sky blue?" --model llama3.2
//!
//! # Stream a fixed script, failing after three tokens
//! token-bridge stream --scripted "one two three four" --fail-after 3
//!
//! # Chunk a file for a FAISS store
//! token-bridge chunk notes.md --chunk-size 256 --store faiss
//!
//! # Verbose logging (logs go to stderr)
//! RUST_LOG=debug token-bridge stream --scripted "a b c"
//! ```
//!
//! # Signals
//!
//! - `SIGINT` (Ctrl-C): cancel the running stream

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use bridge_core::backend::{GenerationRequest, OllamaBackend, ScriptedGenerator, TokenGenerator};
use bridge_core::config::{default_config_path, load_config_from_path, BridgeConfig, ConfigSource};
use bridge_core::documents::{
    add_meta, chunk_sources, fix_json_meta, Document, MetaOptions, VectorStoreKind,
};
use bridge_core::hooks::run_generation;
use bridge_core::streaming::{StreamEnd, TokenBridge};

/// Token Bridge - stream callback-produced tokens as a pull sequence
#[derive(Parser, Debug)]
#[command(name = "token-bridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, env = "TOKEN_BRIDGE_CONFIG", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short = 'l',
        long,
        env = "TOKEN_BRIDGE_LOG_LEVEL",
        default_value = "warn",
        global = true
    )]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream one generation to stdout
    Stream(StreamArgs),
    /// Chunk a text file and print one JSON document per line
    Chunk(ChunkArgs),
}

#[derive(Args, Debug)]
struct StreamArgs {
    /// Prompt sent to the backend
    #[arg(short = 'p', long, default_value = "")]
    prompt: String,

    /// Model name (overrides the configured model)
    #[arg(short = 'm', long)]
    model: Option<String>,

    /// Emit these whitespace-separated tokens instead of calling a backend
    #[arg(long, value_name = "TEXT")]
    scripted: Option<String>,

    /// Make the scripted generator fail after N tokens
    #[arg(long, value_name = "N", requires = "scripted")]
    fail_after: Option<usize>,

    /// Delay between scripted tokens in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    token_interval_ms: u64,

    /// Per-pull timeout in milliseconds (0 waits indefinitely)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct ChunkArgs {
    /// Text file to chunk
    path: PathBuf,

    /// Maximum chunk length in characters
    #[arg(long, value_name = "N")]
    chunk_size: Option<usize>,

    /// Pass the document through unsplit
    #[arg(long)]
    no_chunk: bool,

    /// Target vector store (chroma, chroma_old, faiss, weaviate)
    #[arg(long, value_name = "KIND")]
    store: Option<VectorStoreKind>,

    /// Parser label recorded in metadata
    #[arg(long, value_name = "NAME")]
    parser: Option<String>,
}

/// Initialize logging with the specified level
///
/// Logs go to stderr so stdout carries only the token stream.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("token_bridge={level},bridge_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Load configuration from the given file, or the default location
fn load(config_path: Option<PathBuf>) -> Result<BridgeConfig> {
    let path = config_path.or_else(default_config_path);
    load_config_from_path(path).context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = load(cli.config)?;
    info!(
        source = %config.source(),
        path = ?config.config_file_path,
        "Configuration loaded"
    );

    match cli.command {
        Command::Stream(args) => stream(config, args).await,
        Command::Chunk(args) => chunk(config, args),
    }
}

// =============================================================================
// stream
// =============================================================================

async fn stream(mut config: BridgeConfig, args: StreamArgs) -> Result<()> {
    if let Some(ms) = args.timeout_ms {
        config.bridge.timeout = (ms > 0).then(|| Duration::from_millis(ms));
        config.set_source(ConfigSource::Cli);
    }
    config.validate()?;

    let generator: Box<dyn TokenGenerator> = match args.scripted {
        Some(ref text) => {
            let mut scripted = ScriptedGenerator::from_text(text)
                .with_token_interval(Duration::from_millis(args.token_interval_ms));
            if let Some(count) = args.fail_after {
                scripted =
                    scripted.fail_after(count, format!("scripted failure after {count} tokens"));
            }
            Box::new(scripted)
        }
        None => Box::new(OllamaBackend::new(config.backend.host.clone(), config.backend.port)?),
    };
    let model = args.model.unwrap_or_else(|| config.backend.model.clone());
    let request = GenerationRequest::new(args.prompt, model);

    let bridge = Arc::new(TokenBridge::with_options(config.bridge.clone()));

    let producer = {
        let bridge = Arc::clone(&bridge);
        tokio::spawn(async move { run_generation(generator.as_ref(), &request, &bridge).await })
    };

    // The blocking iterator runs off the async workers.
    let mut consumer = {
        let bridge = Arc::clone(&bridge);
        tokio::task::spawn_blocking(move || -> std::io::Result<Option<StreamEnd>> {
            let mut stdout = std::io::stdout().lock();
            let mut tokens = bridge.tokens();
            for token in tokens.by_ref() {
                stdout.write_all(token.as_bytes())?;
                stdout.flush()?;
            }
            writeln!(stdout)?;
            Ok(tokens.end_reason().cloned())
        })
    };

    let joined = tokio::select! {
        joined = &mut consumer => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, cancelling stream");
            bridge.cancel();
            consumer.await
        }
    };
    let end = joined.context("Consumer task panicked")??;

    if matches!(end, Some(StreamEnd::Cancelled)) {
        producer.abort();
    } else {
        match producer.await {
            Ok(Ok(text)) => info!(chars = text.chars().count(), "Generation complete"),
            Ok(Err(e)) => warn!(error = %e, "Generation returned an error"),
            Err(e) if e.is_cancelled() => {}
            Err(e) => warn!(error = %e, "Producer task failed"),
        }
    }

    let stats = bridge.stats();
    info!(
        delivered = stats.tokens_delivered,
        stale = stats.stale_discarded,
        "Stream closed"
    );

    match end {
        Some(StreamEnd::Failed(message)) => anyhow::bail!("Generation failed: {message}"),
        Some(StreamEnd::TimedOut) => anyhow::bail!("Timed out waiting for tokens"),
        _ => Ok(()),
    }
}

// =============================================================================
// chunk
// =============================================================================

fn chunk(mut config: BridgeConfig, args: ChunkArgs) -> Result<()> {
    if let Some(size) = args.chunk_size {
        config.chunking.chunk_size = size;
        config.set_source(ConfigSource::Cli);
    }
    if args.no_chunk {
        config.chunking.enabled = false;
        config.set_source(ConfigSource::Cli);
    }
    if let Some(store) = args.store {
        config.chunking.store = store;
        config.set_source(ConfigSource::Cli);
    }
    config.validate()?;

    let content = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let source = args.path.to_string_lossy().to_string();

    let mut docs = vec![Document::new(content).with_meta("source", source.as_str())];
    let mut options = MetaOptions {
        head_size: config.head_size,
        ..Default::default()
    };
    if let Some(parser) = args.parser {
        options.parser = parser;
    }
    add_meta(&mut docs, &source, &options)?;

    let mut chunks = chunk_sources(docs, &config.chunking);
    fix_json_meta(&mut chunks);

    let mut stdout = std::io::stdout().lock();
    for doc in &chunks {
        let line = serde_json::to_string(doc).context("Failed to serialize document")?;
        writeln!(stdout, "{line}")?;
    }

    info!(
        path = %args.path.display(),
        chunks = chunks.len(),
        store = %config.chunking.store,
        "Chunked file"
    );
    Ok(())
}
