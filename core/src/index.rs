use crate::document::{DocId, DocMeta, DocumentTokens};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Inverted index mapping each term to the ascending list of documents that
/// contain it.
///
/// Posting lists are duplicate-free and sorted by `DocId`, and every map is
/// ordered, so the serialized form of an index depends only on its contents,
/// never on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<DocId>>,
    universe: BTreeSet<DocId>,
    docs: BTreeMap<DocId, DocMeta>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from per-document token sets. Metadata is recorded for
    /// every document, but only documents with at least one token enter the
    /// universe.
    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a DocumentTokens>,
    {
        let mut index = Self::new();
        for doc in documents {
            index.docs.insert(doc.doc_id, doc.meta());
            for token in &doc.tokens {
                index.add(token, doc.doc_id);
            }
        }
        index
    }

    /// Records that `doc_id` contains `term`, keeping the posting list sorted.
    /// Adding the same pair twice leaves the list unchanged.
    pub fn add(&mut self, term: &str, doc_id: DocId) {
        let list = self.postings.entry(term.to_string()).or_default();
        if let Err(pos) = list.binary_search(&doc_id) {
            list.insert(pos, doc_id);
        }
        self.universe.insert(doc_id);
    }

    /// The posting list for `term`, ascending. Unknown terms yield an empty
    /// slice, not an error.
    pub fn postings(&self, term: &str) -> &[DocId] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings(term).len()
    }

    /// Every document that contributed at least one posting. This is the
    /// universal set NOT complements against.
    pub fn document_universe(&self) -> &BTreeSet<DocId> {
        &self.universe
    }

    pub fn doc_meta(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.docs.get(&doc_id)
    }

    pub fn docs(&self) -> &BTreeMap<DocId, DocMeta> {
        &self.docs
    }

    pub fn num_docs(&self) -> usize {
        self.universe.len()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn doc(doc_id: DocId, tokens: &[&str]) -> DocumentTokens {
        DocumentTokens {
            doc_id,
            name: format!("page_{doc_id}"),
            occurrences: tokens.iter().map(|t| t.to_string()).collect(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            lemmas: BTreeMap::new(),
        }
    }

    #[test]
    fn postings_stay_sorted_and_unique() {
        let mut index = InvertedIndex::new();
        index.add("cat", 3);
        index.add("cat", 1);
        index.add("cat", 2);
        index.add("cat", 2);
        assert_eq!(index.postings("cat"), &[1, 2, 3]);
        assert_eq!(index.document_frequency("cat"), 3);
    }

    #[test]
    fn unknown_term_is_empty() {
        let index = InvertedIndex::from_documents(&[doc(1, &["cat"])]);
        assert_eq!(index.postings("dog"), &[] as &[DocId]);
        assert_eq!(index.document_frequency("dog"), 0);
    }

    #[test]
    fn universe_is_union_of_postings() {
        let docs = vec![doc(1, &["cat"]), doc(2, &["dog"]), doc(3, &["cat", "dog"])];
        let index = InvertedIndex::from_documents(&docs);
        let universe: Vec<DocId> = index.document_universe().iter().copied().collect();
        assert_eq!(universe, vec![1, 2, 3]);
        assert_eq!(index.num_docs(), 3);
    }

    #[test]
    fn tokenless_document_keeps_meta_but_stays_out_of_universe() {
        let docs = vec![doc(1, &["cat"]), doc(2, &[])];
        let index = InvertedIndex::from_documents(&docs);
        assert!(index.doc_meta(2).is_some());
        assert!(!index.document_universe().contains(&2));
        assert_eq!(index.num_docs(), 1);
    }

    #[test]
    fn serialization_ignores_insertion_order() {
        let forward = vec![doc(1, &["ant", "bee"]), doc(2, &["bee", "cow"])];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = serde_json::to_string(&InvertedIndex::from_documents(&forward)).unwrap();
        let b = serde_json::to_string(&InvertedIndex::from_documents(&reversed)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn terms_iterate_in_lexicographic_order() {
        let index = InvertedIndex::from_documents(&[doc(1, &["zebra", "ant", "maple"])]);
        let terms: Vec<&str> = index.terms().collect();
        assert_eq!(terms, vec!["ant", "maple", "zebra"]);
    }
}
