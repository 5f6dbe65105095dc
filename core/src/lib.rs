//! Retrieval core for a small document search engine.
//!
//! Documents arrive already tokenized and lemmatized by an upstream pipeline.
//! This crate builds the inverted index over them, answers boolean set
//! queries, computes TF-IDF weights, and ranks documents by cosine
//! similarity against free-text queries.

pub mod boolean;
pub mod corpus;
pub mod document;
pub mod engine;
pub mod index;
pub mod lemma;
pub mod persist;
pub mod vector;
pub mod weights;

pub use boolean::{boolean_search, parse_query, PostfixToken, QueryError};
pub use document::{DocId, DocMeta, DocumentTokens};
pub use engine::SearchEngine;
pub use index::InvertedIndex;
pub use lemma::{DictionaryLemmatizer, LemmaMap, Lemmatizer};
pub use vector::{cosine_similarity, VectorSearchEngine, WeightsError, DEFAULT_TOP_N};
pub use weights::{compute_corpus_weights, CorpusWeights, DocumentWeights, TermWeight};
