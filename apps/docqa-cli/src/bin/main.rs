use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{resolve_with_base, AppConfig};
use docqa_core::corpus;
use docqa_core::Chunker;
use docqa_embed::build_embedder;
use docqa_rag::{AnswerOrchestrator, Indexer, OllamaGenerator, Retriever};
use docqa_vector::LanceVectorStore;

#[derive(Parser)]
#[command(name = "docqa", about = "Grounded question answering over an official-document corpus")]
struct Cli {
    /// Directory holding config.toml and its env overlays.
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Overlay to merge (dev, prod, test).
    #[arg(long, env = "RUST_ENV", default_value = "dev")]
    env: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize the documents and write the chunks file.
    Prepare {
        /// Read `.txt` files from this directory instead of the documents file.
        #[arg(long)]
        txt_dir: Option<String>,
    },
    /// Embed the chunks file and rebuild the index.
    Index,
    /// Interactive question loop; `q` or `exit` quits.
    Ask,
    /// Answer one question and exit.
    Query { query: String },
}

struct Paths {
    base: PathBuf,
}

impl Paths {
    fn resolve(&self, p: &str) -> PathBuf {
        resolve_with_base(&self.base, p)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_figment(AppConfig::figment(&cli.config_dir, &cli.env)).context("loading configuration")?;
    let paths = Paths { base: cli.config_dir.clone() };

    let rt = tokio::runtime::Runtime::new()?;
    match cli.command {
        Command::Prepare { txt_dir } => prepare(&config, &paths, txt_dir),
        Command::Index => rt.block_on(index(&config, &paths)),
        Command::Ask => rt.block_on(interactive(&config, &paths)),
        Command::Query { query } => rt.block_on(async {
            let orchestrator = build_orchestrator(&config, &paths).await?;
            let answer = orchestrator.ask(&query).await?;
            println!("{}", answer.text);
            Ok(())
        }),
    }
}

fn prepare(config: &AppConfig, paths: &Paths, txt_dir: Option<String>) -> Result<()> {
    let mut documents = match txt_dir.or_else(|| config.data.txt_dir.clone()) {
        Some(dir) => corpus::load_txt_documents(&paths.resolve(&dir))?,
        None => {
            let path = paths.resolve(&config.data.documents_path);
            corpus::load_documents(&path).with_context(|| format!("reading documents from {}", path.display()))?
        }
    };
    corpus::normalize_documents(&mut documents);

    let chunker = Chunker::new(config.chunking.clone())?;
    let chunks = chunker.chunk_all(&documents);
    let out = paths.resolve(&config.data.chunks_path);
    corpus::write_json(&out, &chunks)?;
    info!(documents = documents.len(), chunks = chunks.len(), path = %out.display(), "chunks written");
    Ok(())
}

async fn open_store(config: &AppConfig, paths: &Paths) -> Result<Arc<LanceVectorStore>> {
    let uri = paths.resolve(&config.store.uri);
    let store = LanceVectorStore::open(&uri.to_string_lossy(), &config.store.index_name)
        .await
        .with_context(|| format!("opening vector store at {}", uri.display()))?;
    Ok(Arc::new(store))
}

async fn index(config: &AppConfig, paths: &Paths) -> Result<()> {
    let chunks_path = paths.resolve(&config.data.chunks_path);
    let chunks = corpus::load_chunks(&chunks_path).with_context(|| format!("reading chunks from {}", chunks_path.display()))?;
    let embedder = build_embedder(&config.embedding)?;
    let store = open_store(config, paths).await?;

    let started = Instant::now();
    let report = Indexer::new(embedder, store, config.indexing.clone()).with_progress(true).build_index(&chunks).await?;
    println!(
        "Indexed {} of {} chunks into '{}' (dim {}, {} embedding failures, {} write failures) in {:.1}s",
        report.indexed,
        chunks.len(),
        config.store.index_name,
        report.dimension,
        report.embedding_failures,
        report.write_failures,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

async fn build_orchestrator(config: &AppConfig, paths: &Paths) -> Result<AnswerOrchestrator> {
    let embedder = build_embedder(&config.embedding)?;
    let store = open_store(config, paths).await?;
    let retriever = Retriever::new(embedder, store, config.retrieval.clone())?;
    let generator = Arc::new(OllamaGenerator::new(&config.generation)?);
    Ok(AnswerOrchestrator::new(retriever, generator, config.generation.clone()))
}

fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("exit")
}

async fn interactive(config: &AppConfig, paths: &Paths) -> Result<()> {
    let orchestrator = build_orchestrator(config, paths).await?;
    println!("{}", "=".repeat(50));
    println!("Ask about the indexed documents.");
    println!("(LLM: {} @ {})", config.generation.model, config.generation.base_url);
    println!("(Type 'q' or 'exit' to quit.)");
    println!("{}", "=".repeat(50));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let query = line.trim();
        if is_exit(query) {
            break;
        }
        if query.is_empty() {
            continue;
        }
        let started = Instant::now();
        match orchestrator.ask(query).await {
            Ok(answer) => println!("\n{}", answer.text),
            Err(e) => eprintln!("\nerror ({}): {}", e.kind(), e),
        }
        println!("({:.2}s)", started.elapsed().as_secs_f64());
    }
    println!("Bye.");
    Ok(())
}
