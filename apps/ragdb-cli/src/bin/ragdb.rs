use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use ragdb_core::config::Config;
use ragdb_core::traits::VectorStore;
use ragdb_core::types::{Chunk, ChunkMetadata};
use ragdb_embed::get_default_embedder;
use ragdb_hybrid::repair::plan_repairs;
use ragdb_hybrid::{classify, HybridSearchEngine, ResultKind};
use ragdb_vector::LanceVectorStore;

const INGEST_BATCH: usize = 64;

#[derive(Parser)]
#[command(name = "ragdb")]
#[command(about = "Hybrid search over contract document chunks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Override the store location from config
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load chunks from a JSON Lines file
    Ingest {
        file: PathBuf,
    },
    /// Run a hybrid search
    Search {
        query: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
        /// Print results and the search report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how a query would be classified and routed
    Classify {
        query: String,
    },
    /// Dump stored chunk metadata
    Inspect {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Fill missing section number/title from each chunk's leading heading
    #[command(name = "repair-metadata")]
    RepairMetadata {
        #[arg(long)]
        dry_run: bool,
    },
}

/// One input line. `id` defaults to a content hash.
#[derive(Deserialize)]
struct ChunkRecord {
    id: Option<String>,
    text: String,
    #[serde(default)]
    metadata: ChunkMetadata,
}

impl ChunkRecord {
    fn into_chunk(self, ingested_at: &str) -> Chunk {
        let id = self.id.unwrap_or_else(|| blake3::hash(self.text.as_bytes()).to_hex()[..16].to_string());
        let mut metadata = self.metadata;
        if metadata.upload_timestamp.is_none() {
            metadata.upload_timestamp = Some(ingested_at.to_string());
        }
        Chunk { id, text: self.text, metadata }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_store(config: &Config, db_path: Option<PathBuf>) -> Result<LanceVectorStore> {
    let settings = config.store_settings()?;
    let path = match db_path {
        Some(p) => p,
        None => settings.resolved_db_path(&std::env::current_dir()?),
    };
    let embedder = get_default_embedder()?;
    LanceVectorStore::open(&path, &settings, embedder)
        .with_context(|| format!("opening store at {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    let config = Config::load().context("loading configuration")?;

    match cli.command {
        Commands::Classify { query } => {
            let classification = classify(&query);
            let branch = ragdb_hybrid::Branch::select(&classification);
            let out = serde_json::json!({ "query": query, "classification": classification, "branch": branch });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Ingest { file } => {
            let store = open_store(&config, cli.db_path)?;
            ingest(&store, &file)?;
            store.close();
        }
        Commands::Search { query, limit, json } => {
            let store = Arc::new(open_store(&config, cli.db_path)?);
            let engine = HybridSearchEngine::new(store.clone(), config.search_settings()?)?;
            let (results, report) = engine.search_with_report(&query, limit);
            drop(engine);
            match Arc::try_unwrap(store) {
                Ok(store) => store.close(),
                Err(_) => tracing::warn!("store still shared after search, not closed"),
            }
            if json {
                let out = serde_json::json!({ "results": results, "report": report });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("branch: {}{}", report.branch, if report.fallback_used { " (fallback)" } else { "" });
                for e in &report.errors {
                    println!("warning: {} failed: {}", e.strategy, e.message);
                }
                if results.is_empty() {
                    println!("no results");
                }
                for r in &results {
                    let section = r.metadata.as_ref().and_then(|m| m.section_number.as_deref()).unwrap_or("-");
                    println!("\n{}. [{}] {:.3} id={} section={section}", r.rank.unwrap_or(0), r.tag(), r.relevance, r.id);
                    if let ResultKind::SectionContent { numbered_items, .. } = &r.kind {
                        for item in numbered_items {
                            println!("     {item}");
                        }
                    }
                    println!("   {}", snippet(&r.text, 200));
                }
            }
        }
        Commands::Inspect { limit } => {
            let store = open_store(&config, cli.db_path)?;
            println!("{} chunks", store.count()?);
            for chunk in store.get(None, Some(limit))? {
                println!("{}", serde_json::to_string(&serde_json::json!({ "id": chunk.id, "metadata": chunk.metadata }))?);
            }
            store.close();
        }
        Commands::RepairMetadata { dry_run } => {
            let store = open_store(&config, cli.db_path)?;
            let repairs = plan_repairs(&store.get(None, None)?);
            for chunk in &repairs {
                println!(
                    "{}: section_number={} section_title={}",
                    chunk.id,
                    chunk.metadata.section_number.as_deref().unwrap_or("-"),
                    chunk.metadata.section_title.as_deref().unwrap_or("-"),
                );
            }
            if dry_run {
                println!("{} chunks would be updated (dry run)", repairs.len());
            } else {
                store.update(&repairs)?;
                println!("{} chunks updated", repairs.len());
            }
            store.close();
        }
    }
    Ok(())
}

fn ingest(store: &LanceVectorStore, file: &Path) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let ingested_at = chrono::Utc::now().to_rfc3339();
    let mut chunks = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ChunkRecord =
            serde_json::from_str(&line).with_context(|| format!("{}:{}: invalid chunk record", file.display(), n + 1))?;
        chunks.push(record.into_chunk(&ingested_at));
    }
    if chunks.is_empty() {
        bail!("{} contains no chunks", file.display());
    }

    let before = store.count()?;
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} chunks")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    for batch in chunks.chunks(INGEST_BATCH) {
        store.add(batch)?;
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();
    let added = store.count()?.saturating_sub(before);
    tracing::info!(read = chunks.len(), added, "ingest finished");
    println!("added {added} of {} chunks ({} already present)", chunks.len(), chunks.len().saturating_sub(added));
    Ok(())
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}...")
}
