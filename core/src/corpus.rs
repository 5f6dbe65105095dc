use crate::document::{DocId, DocumentTokens};
use crate::lemma::LemmaMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    /// Word pattern used to count occurrences in cleaned text. Matches the
    /// upstream tokenizer: a letter followed by letters, digits, underscores
    /// or apostrophes.
    static ref WORD_RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref SEQ_RE: Regex = Regex::new(r"\d+").expect("valid regex");
}

const TOKENS_PREFIX: &str = "tokens_";
const LEMMAS_PREFIX: &str = "lemmas_";
const TEXT_PREFIX: &str = "text_";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document name {name:?} carries no usable sequence number")]
    MissingSequence { name: String },
    #[error("documents {first:?} and {second:?} share sequence number {seq}")]
    DuplicateSequence { seq: DocId, first: String, second: String },
}

/// Extracts the document sequence number embedded in a corpus file name,
/// e.g. `page_17` -> 17. The last digit run wins, matching names like
/// `2024_dump_page_17`.
pub fn doc_sequence(name: &str) -> Option<DocId> {
    SEQ_RE.find_iter(name).last()?.as_str().parse().ok()
}

/// Token files carry one token per line.
pub fn parse_tokens(contents: &str) -> BTreeSet<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lemma files carry `<lemma> <token> <token>...` per line. Lines without
/// surface tokens are skipped with a warning.
pub fn parse_lemmas(name: &str, contents: &str) -> LemmaMap {
    let mut map = LemmaMap::new();
    for line in contents.lines() {
        let mut parts = line.split_whitespace();
        let lemma = match parts.next() {
            Some(lemma) => lemma,
            None => continue,
        };
        let tokens: BTreeSet<String> = parts.map(str::to_string).collect();
        if tokens.is_empty() {
            tracing::warn!(doc = name, lemma, "lemma line without surface tokens skipped");
            continue;
        }
        map.entry(lemma.to_string()).or_default().extend(tokens);
    }
    map
}

/// Extracts the lowercased word occurrences of a cleaned-text file, repeats
/// included.
pub fn parse_text(contents: &str) -> Vec<String> {
    WORD_RE
        .find_iter(contents)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

#[derive(Default)]
struct DocFiles {
    tokens: Option<PathBuf>,
    lemmas: Option<PathBuf>,
    text: Option<PathBuf>,
}

/// Loads a corpus from a flat directory holding `tokens_<name>.txt`,
/// `lemmas_<name>.txt` and `text_<name>.txt` per document, with the document
/// sequence number embedded in `<name>`.
///
/// Documents missing their token or text file are skipped with a warning;
/// a missing lemma file just means the document has no lemmas. Duplicate
/// sequence numbers abort the load. The result is sorted by `DocId`.
pub fn load_corpus(dir: &Path) -> Result<Vec<DocumentTokens>, CorpusError> {
    let mut by_name: BTreeMap<String, DocFiles> = BTreeMap::new();
    let entries = fs::read_dir(dir).map_err(|source| CorpusError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| CorpusError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        if let Some(name) = stem.strip_prefix(TOKENS_PREFIX) {
            by_name.entry(name.to_string()).or_default().tokens = Some(path);
        } else if let Some(name) = stem.strip_prefix(LEMMAS_PREFIX) {
            by_name.entry(name.to_string()).or_default().lemmas = Some(path);
        } else if let Some(name) = stem.strip_prefix(TEXT_PREFIX) {
            by_name.entry(name.to_string()).or_default().text = Some(path);
        }
    }

    let mut claimed: BTreeMap<DocId, String> = BTreeMap::new();
    let mut documents = Vec::new();
    for (name, files) in by_name {
        let (tokens_path, text_path) = match (files.tokens, files.text) {
            (Some(tokens), Some(text)) => (tokens, text),
            (tokens, _) => {
                let missing = if tokens.is_none() { "tokens" } else { "text" };
                tracing::warn!(doc = %name, missing, "incomplete document skipped");
                continue;
            }
        };
        let doc_id =
            doc_sequence(&name).ok_or_else(|| CorpusError::MissingSequence { name: name.clone() })?;
        if let Some(first) = claimed.insert(doc_id, name.clone()) {
            return Err(CorpusError::DuplicateSequence {
                seq: doc_id,
                first,
                second: name,
            });
        }

        let tokens = parse_tokens(&read(&tokens_path)?);
        let occurrences = parse_text(&read(&text_path)?);
        let lemmas = match files.lemmas {
            Some(path) => parse_lemmas(&name, &read(&path)?),
            None => LemmaMap::new(),
        };
        documents.push(DocumentTokens {
            doc_id,
            name,
            occurrences,
            tokens,
            lemmas,
        });
    }

    documents.sort_by_key(|doc| doc.doc_id);
    Ok(documents)
}

fn read(path: &Path) -> Result<String, CorpusError> {
    fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })
}
