use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use docrank_core::corpus::load_corpus;
use docrank_core::lemma::merge_lemma_maps;
use docrank_core::persist::{
    save_index, save_lemma_map, save_meta, save_weights, IndexPaths, MetaFile, FORMAT_VERSION,
};
use docrank_core::weights::compute_corpus_weights;
use docrank_core::{DocId, DocumentTokens, InvertedIndex};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the index and weight artifacts from tokenized documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build index, weight, and lemma artifacts from tokenized input
    Build {
        /// Input path: a JSONL file, a directory of JSONL files, or a corpus
        /// directory of tokens_*/lemmas_*/text_* files
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output),
    }
}

fn build_index(input: &str, output: &str) -> Result<()> {
    let documents = collect_documents(Path::new(input))?;
    if documents.is_empty() {
        bail!("no documents found under {input}");
    }

    let mut claimed: BTreeMap<DocId, String> = BTreeMap::new();
    for doc in &documents {
        if let Some(first) = claimed.insert(doc.doc_id, doc.name.clone()) {
            bail!(
                "documents {first:?} and {:?} share document id {}",
                doc.name,
                doc.doc_id
            );
        }
    }

    let index = InvertedIndex::from_documents(&documents);
    tracing::info!(
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        "ingested documents"
    );

    let corpus_lemmas = merge_lemma_maps(&documents);
    let weights = compute_corpus_weights(&documents, &index, &corpus_lemmas);
    tracing::info!(num_lemmas = corpus_lemmas.len(), "computed corpus weights");

    let out_paths = IndexPaths::new(output);
    save_index(&out_paths, &index)?;
    save_weights(&out_paths, &weights)?;
    save_lemma_map(&out_paths, &corpus_lemmas)?;
    let meta = MetaFile {
        num_docs: index.num_docs() as u32,
        num_terms: index.num_terms() as u64,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    save_meta(&out_paths, &meta)?;

    tracing::info!(output, "index build complete");
    Ok(())
}

/// Gathers documents from `input`. JSONL files win if any are present;
/// otherwise the path is treated as a corpus directory in the flat
/// tokens_*/lemmas_*/text_* layout.
fn collect_documents(input: &Path) -> Result<Vec<DocumentTokens>> {
    let mut jsonl_files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                jsonl_files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        jsonl_files.push(input.to_path_buf());
    }

    if jsonl_files.is_empty() {
        let documents = load_corpus(input)
            .with_context(|| format!("loading corpus directory {}", input.display()))?;
        return Ok(documents);
    }

    jsonl_files.sort();
    let mut documents = Vec::new();
    for file in &jsonl_files {
        read_jsonl(file, &mut documents)
            .with_context(|| format!("reading {}", file.display()))?;
    }
    documents.sort_by_key(|doc| doc.doc_id);
    Ok(documents)
}

fn read_jsonl(file: &Path, documents: &mut Vec<DocumentTokens>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: DocumentTokens = serde_json::from_str(&line)?;
        documents.push(doc);
    }
    Ok(())
}
