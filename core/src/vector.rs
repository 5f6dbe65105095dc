use crate::document::DocId;
use crate::lemma::Lemmatizer;
use crate::weights::CorpusWeights;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result cutoff used when the caller does not pick one.
pub const DEFAULT_TOP_N: usize = 10;

const IDF_TOLERANCE: f64 = 1e-9;

/// Stored weight artifacts that disagree with their own shared IDF table.
/// Loading such artifacts would silently skew ranking, so it is refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightsError {
    #[error("lemma {lemma:?} in document {doc_id} stores idf {stored} but the shared table says {expected}")]
    IdfMismatch {
        doc_id: DocId,
        lemma: String,
        stored: f64,
        expected: f64,
    },
    #[error("lemma {lemma:?} in document {doc_id} is absent from the shared idf table")]
    UnknownLemma { doc_id: DocId, lemma: String },
}

/// Ranked retrieval over per-document lemma TF-IDF vectors.
#[derive(Debug, Clone, Default)]
pub struct VectorSearchEngine {
    doc_vectors: BTreeMap<DocId, BTreeMap<String, f64>>,
    idf: BTreeMap<String, f64>,
}

impl VectorSearchEngine {
    /// Builds the engine from corpus weight artifacts. Every stored lemma
    /// weight is checked against the shared IDF table first.
    pub fn from_weights(weights: &CorpusWeights) -> Result<Self, WeightsError> {
        let mut doc_vectors = BTreeMap::new();
        for (&doc_id, doc) in &weights.docs {
            let mut vector = BTreeMap::new();
            for (lemma, weight) in &doc.lemmas {
                match weights.lemma_idf.get(lemma) {
                    None => {
                        return Err(WeightsError::UnknownLemma {
                            doc_id,
                            lemma: lemma.clone(),
                        })
                    }
                    Some(&expected) if (weight.idf - expected).abs() > IDF_TOLERANCE => {
                        return Err(WeightsError::IdfMismatch {
                            doc_id,
                            lemma: lemma.clone(),
                            stored: weight.idf,
                            expected,
                        })
                    }
                    Some(_) => {}
                }
                vector.insert(lemma.clone(), weight.tfidf);
            }
            doc_vectors.insert(doc_id, vector);
        }
        Ok(Self {
            doc_vectors,
            idf: weights.lemma_idf.clone(),
        })
    }

    pub fn num_docs(&self) -> usize {
        self.doc_vectors.len()
    }

    /// IDF of `lemma` in the shared table; 0.0 for lemmas the corpus never saw.
    pub fn idf(&self, lemma: &str) -> f64 {
        self.idf.get(lemma).copied().unwrap_or(0.0)
    }

    /// Splits the query on whitespace, lowercases each word, and maps it to
    /// its lemma. Repeats are kept so they raise the query-side term
    /// frequency.
    pub fn lemmatize_query(&self, lemmatizer: &dyn Lemmatizer, query: &str) -> Vec<String> {
        query
            .split_whitespace()
            .map(|word| lemmatizer.normalize(&word.to_lowercase()))
            .collect()
    }

    /// Builds the ephemeral query vector: `tf * idf` per lemma, where TF is
    /// the lemma's share of the query length. Lemmas outside the corpus
    /// weigh 0.
    pub fn build_query_vector(&self, lemmas: &[String]) -> BTreeMap<String, f64> {
        let total = lemmas.len();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for lemma in lemmas {
            *counts.entry(lemma.as_str()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(lemma, count)| {
                let tf = count as f64 / total as f64;
                (lemma.to_string(), tf * self.idf(lemma))
            })
            .collect()
    }

    /// Scores `query` against every document and returns the `top_n` best as
    /// `(doc_id, cosine)` pairs, sorted by descending similarity with ties
    /// broken by ascending document id. An empty query matches nothing.
    pub fn search(
        &self,
        lemmatizer: &dyn Lemmatizer,
        query: &str,
        top_n: usize,
    ) -> Vec<(DocId, f64)> {
        if top_n == 0 {
            return Vec::new();
        }
        let lemmas = self.lemmatize_query(lemmatizer, query);
        if lemmas.is_empty() {
            return Vec::new();
        }
        let query_vector = self.build_query_vector(&lemmas);

        let mut scored: Vec<(DocId, f64)> = self
            .doc_vectors
            .iter()
            .map(|(&doc_id, doc_vector)| (doc_id, cosine_similarity(&query_vector, doc_vector)))
            .collect();
        scored.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(top_n);
        scored
    }
}

/// Cosine similarity between a sparse query vector and a document vector.
/// The dot product walks the query's entries only; dimensions missing from
/// either side contribute 0. Either norm being 0 yields similarity 0.0.
pub fn cosine_similarity(query: &BTreeMap<String, f64>, doc: &BTreeMap<String, f64>) -> f64 {
    let mut dot = 0.0;
    let mut query_norm_sq = 0.0;
    for (lemma, &qw) in query {
        dot += qw * doc.get(lemma).copied().unwrap_or(0.0);
        query_norm_sq += qw * qw;
    }
    let doc_norm_sq: f64 = doc.values().map(|w| w * w).sum();
    let norm = query_norm_sq.sqrt() * doc_norm_sq.sqrt();
    if norm == 0.0 {
        0.0
    } else {
        dot / norm
    }
}
