use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    /// Source name the document was ingested under, e.g. `page_17`.
    pub name: String,
}

/// Per-document output of the external tokenization pipeline.
///
/// `occurrences` is the token sequence of the cleaned text with repeats kept,
/// `tokens` the unique normalized token set, and `lemmas` the surface tokens
/// each lemma covers in this document. Lemmas are optional; documents without
/// them still index and still answer boolean queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTokens {
    pub doc_id: DocId,
    pub name: String,
    pub occurrences: Vec<String>,
    pub tokens: BTreeSet<String>,
    #[serde(default)]
    pub lemmas: BTreeMap<String, BTreeSet<String>>,
}

impl DocumentTokens {
    pub fn meta(&self) -> DocMeta {
        DocMeta {
            name: self.name.clone(),
        }
    }
}
