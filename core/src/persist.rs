use crate::engine::SearchEngine;
use crate::index::InvertedIndex;
use crate::lemma::{DictionaryLemmatizer, LemmaMap};
use crate::weights::CorpusWeights;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u64,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.json") }
    fn weights(&self) -> PathBuf { self.root.join("weights.bin") }
    fn lemmas(&self) -> PathBuf { self.root.join("lemmas.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// The index itself is stored as pretty JSON so it stays inspectable; its
/// ordered maps make the bytes reproducible for a given corpus.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.index())?;
    let json = serde_json::to_string_pretty(index)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let mut f = File::open(paths.index())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let index = serde_json::from_str(&buf)?;
    Ok(index)
}

pub fn save_weights(paths: &IndexPaths, weights: &CorpusWeights) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.weights())?;
    let bytes = bincode::serialize(weights)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_weights(paths: &IndexPaths) -> Result<CorpusWeights> {
    let mut f = File::open(paths.weights())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let weights = bincode::deserialize(&buf)?;
    Ok(weights)
}

pub fn save_lemma_map(paths: &IndexPaths, lemmas: &LemmaMap) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.lemmas())?;
    let bytes = bincode::serialize(lemmas)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_lemma_map(paths: &IndexPaths) -> Result<LemmaMap> {
    let mut f = File::open(paths.lemmas())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let lemmas = bincode::deserialize(&buf)?;
    Ok(lemmas)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Loads every artifact under `root` and assembles a ready `SearchEngine`,
/// with the stock dictionary lemmatizer built from the stored lemma mapping.
pub fn load_engine(paths: &IndexPaths) -> Result<SearchEngine> {
    let index = load_index(paths)?;
    let weights = load_weights(paths)?;
    let lemmas = load_lemma_map(paths)?;
    let lemmatizer = DictionaryLemmatizer::from_lemma_map(&lemmas);
    let engine = SearchEngine::new(index, &weights, Box::new(lemmatizer))?;
    Ok(engine)
}
