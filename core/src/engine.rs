use crate::boolean::{self, QueryError};
use crate::document::{DocId, DocMeta};
use crate::index::InvertedIndex;
use crate::lemma::Lemmatizer;
use crate::vector::{VectorSearchEngine, WeightsError};
use crate::weights::CorpusWeights;

/// Query-facing entry point: an immutable index plus ranked-retrieval state.
/// Once built it is read-only and can be shared freely across threads.
pub struct SearchEngine {
    index: InvertedIndex,
    vectors: VectorSearchEngine,
    lemmatizer: Box<dyn Lemmatizer + Send + Sync>,
}

impl SearchEngine {
    pub fn new(
        index: InvertedIndex,
        weights: &CorpusWeights,
        lemmatizer: Box<dyn Lemmatizer + Send + Sync>,
    ) -> Result<Self, WeightsError> {
        let vectors = VectorSearchEngine::from_weights(weights)?;
        Ok(Self {
            index,
            vectors,
            lemmatizer,
        })
    }

    /// Evaluates a boolean query; matches come back in ascending id order.
    pub fn boolean_search(&self, query: &str) -> Result<Vec<DocId>, QueryError> {
        boolean::boolean_search(&self.index, query)
    }

    /// Ranked retrieval: the `top_n` most similar documents, best first.
    pub fn ranked_search(&self, query: &str, top_n: usize) -> Vec<(DocId, f64)> {
        self.vectors.search(self.lemmatizer.as_ref(), query, top_n)
    }

    pub fn doc_meta(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.index.doc_meta(doc_id)
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn num_docs(&self) -> usize {
        self.index.num_docs()
    }
}
