use crate::document::{DocId, DocumentTokens};
use crate::index::InvertedIndex;
use crate::lemma::LemmaMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A term's weight within one document, paired with the IDF it was computed
/// against so stored vectors can be checked for consistency later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub idf: f64,
    pub tfidf: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentWeights {
    pub tokens: BTreeMap<String, TermWeight>,
    pub lemmas: BTreeMap<String, TermWeight>,
}

/// Weight artifacts for a whole corpus: per-document vectors plus the shared
/// lemma IDF table every document's lemma weights were computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusWeights {
    pub docs: BTreeMap<DocId, DocumentWeights>,
    pub lemma_idf: BTreeMap<String, f64>,
}

/// `ln(N / df)`, defined as 0.0 when `df` is 0 so a term nobody indexed
/// cannot poison a vector with infinity.
pub fn inverse_document_frequency(universe: usize, df: usize) -> f64 {
    if df == 0 {
        0.0
    } else {
        (universe as f64 / df as f64).ln()
    }
}

/// IDF for every lemma in the corpus mapping, computed once from the union of
/// its surface tokens' posting lists. Every document is weighted against this
/// one table, so identical lemmas score identically everywhere.
pub fn lemma_idf_table(index: &InvertedIndex, corpus_lemmas: &LemmaMap) -> BTreeMap<String, f64> {
    let universe = index.num_docs();
    let mut table = BTreeMap::new();
    for (lemma, tokens) in corpus_lemmas {
        let mut docs: BTreeSet<DocId> = BTreeSet::new();
        for token in tokens {
            docs.extend(index.postings(token).iter().copied());
        }
        if docs.is_empty() {
            tracing::warn!(%lemma, "lemma has no indexed surface tokens, idf is 0");
        }
        table.insert(lemma.clone(), inverse_document_frequency(universe, docs.len()));
    }
    table
}

/// TF is `count / n_doc` where `n_doc` is the document's total occurrence
/// count; lemma counts pool the counts of the lemma's surface tokens. Token
/// IDF comes from the index, lemma IDF from the shared table.
pub fn compute_document_weights(
    doc: &DocumentTokens,
    index: &InvertedIndex,
    lemma_idf: &BTreeMap<String, f64>,
) -> DocumentWeights {
    let universe = index.num_docs();
    let n_doc = doc.occurrences.len();
    if n_doc == 0 && !doc.tokens.is_empty() {
        tracing::warn!(
            doc_id = doc.doc_id,
            "document has tokens but no occurrences, term frequencies are 0"
        );
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in &doc.occurrences {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    let tf = |count: usize| {
        if n_doc == 0 {
            0.0
        } else {
            count as f64 / n_doc as f64
        }
    };

    let mut tokens = BTreeMap::new();
    for token in &doc.tokens {
        let count = counts.get(token.as_str()).copied().unwrap_or(0);
        let df = index.document_frequency(token);
        if df == 0 {
            tracing::warn!(doc_id = doc.doc_id, %token, "token absent from index, idf is 0");
        }
        let idf = inverse_document_frequency(universe, df);
        tokens.insert(
            token.clone(),
            TermWeight {
                idf,
                tfidf: tf(count) * idf,
            },
        );
    }

    let mut lemmas = BTreeMap::new();
    for (lemma, surface) in &doc.lemmas {
        let pooled: usize = surface
            .iter()
            .map(|t| counts.get(t.as_str()).copied().unwrap_or(0))
            .sum();
        let idf = match lemma_idf.get(lemma) {
            Some(&idf) => idf,
            None => {
                tracing::warn!(doc_id = doc.doc_id, %lemma, "lemma missing from idf table, idf is 0");
                0.0
            }
        };
        lemmas.insert(
            lemma.clone(),
            TermWeight {
                idf,
                tfidf: tf(pooled) * idf,
            },
        );
    }

    DocumentWeights { tokens, lemmas }
}

/// Weights the whole corpus. Documents are independent, so they are scored in
/// parallel and merged into ordered maps afterward.
pub fn compute_corpus_weights(
    documents: &[DocumentTokens],
    index: &InvertedIndex,
    corpus_lemmas: &LemmaMap,
) -> CorpusWeights {
    let lemma_idf = lemma_idf_table(index, corpus_lemmas);
    let docs: BTreeMap<DocId, DocumentWeights> = documents
        .par_iter()
        .map(|doc| (doc.doc_id, compute_document_weights(doc, index, &lemma_idf)))
        .collect();
    CorpusWeights { docs, lemma_idf }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(doc_id: DocId, occurrences: &[&str]) -> DocumentTokens {
        DocumentTokens {
            doc_id,
            name: format!("page_{doc_id}"),
            occurrences: occurrences.iter().map(|t| t.to_string()).collect(),
            tokens: occurrences.iter().map(|t| t.to_string()).collect(),
            lemmas: BTreeMap::new(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn tf_is_count_over_document_length() {
        // "cat" twice in a four-token document, unique to that document.
        let docs = vec![
            doc(1, &["cat", "cat", "fish", "fish"]),
            doc(2, &["fish"]),
            doc(3, &["fish"]),
        ];
        let index = InvertedIndex::from_documents(&docs);
        let weights = compute_document_weights(&docs[0], &index, &BTreeMap::new());

        let cat = weights.tokens["cat"];
        assert!(close(cat.idf, 3f64.ln()));
        assert!(close(cat.tfidf, 0.5 * 3f64.ln()));
    }

    #[test]
    fn tf_sums_to_one_over_unique_tokens() {
        let docs = vec![doc(1, &["cat", "dog", "cat", "bird"]), doc(2, &["fish"])];
        let index = InvertedIndex::from_documents(&docs);
        let weights = compute_document_weights(&docs[0], &index, &BTreeMap::new());
        // every token here has idf = ln 2, so tf is recoverable.
        let tf_sum: f64 = weights.tokens.values().map(|w| w.tfidf / w.idf).sum();
        assert!(close(tf_sum, 1.0));
    }

    #[test]
    fn term_in_every_document_weighs_nothing() {
        let docs = vec![doc(1, &["fish"]), doc(2, &["fish"]), doc(3, &["fish"])];
        let index = InvertedIndex::from_documents(&docs);
        let weights = compute_document_weights(&docs[0], &index, &BTreeMap::new());
        assert!(close(weights.tokens["fish"].idf, 0.0));
        assert!(close(weights.tokens["fish"].tfidf, 0.0));
    }

    #[test]
    fn idf_grows_as_df_shrinks() {
        assert!(close(inverse_document_frequency(10, 0), 0.0));
        let idf_common = inverse_document_frequency(10, 8);
        let idf_rare = inverse_document_frequency(10, 1);
        assert!(idf_rare > idf_common);
        assert!(close(idf_rare, 10f64.ln()));
    }

    #[test]
    fn unindexed_token_gets_zero_idf() {
        let docs = vec![doc(1, &["cat"]), doc(2, &["dog"])];
        let index = InvertedIndex::from_documents(&docs);
        let mut stray = doc(1, &["cat"]);
        stray.tokens.insert("ghost".to_string());
        let weights = compute_document_weights(&stray, &index, &BTreeMap::new());
        assert!(close(weights.tokens["ghost"].idf, 0.0));
        assert!(close(weights.tokens["ghost"].tfidf, 0.0));
    }

    #[test]
    fn empty_document_weighs_zero_everywhere() {
        let docs = vec![doc(1, &["cat"]), doc(2, &[])];
        let index = InvertedIndex::from_documents(&docs);
        let mut empty = docs[1].clone();
        empty.tokens.insert("cat".to_string());
        let weights = compute_document_weights(&empty, &index, &BTreeMap::new());
        assert!(close(weights.tokens["cat"].tfidf, 0.0));
    }

    #[test]
    fn lemma_counts_pool_surface_tokens() {
        // "run" covers both "running" and "ran": count 2 of 4, df from the
        // union of the two posting lists.
        let mut runner = doc(1, &["running", "ran", "fish", "fish"]);
        runner.lemmas.insert(
            "run".to_string(),
            ["running", "ran"].iter().map(|t| t.to_string()).collect(),
        );
        let docs = vec![runner.clone(), doc(2, &["ran"]), doc(3, &["fish"])];
        let index = InvertedIndex::from_documents(&docs);
        let corpus_lemmas = crate::lemma::merge_lemma_maps(&docs);
        let lemma_idf = lemma_idf_table(&index, &corpus_lemmas);

        // docs 1 and 2 contain a surface form of "run".
        assert!(close(lemma_idf["run"], (3f64 / 2f64).ln()));

        let weights = compute_document_weights(&runner, &index, &lemma_idf);
        let run = weights.lemmas["run"];
        assert!(close(run.idf, (3f64 / 2f64).ln()));
        assert!(close(run.tfidf, 0.5 * (3f64 / 2f64).ln()));
    }

    #[test]
    fn corpus_weights_carry_one_shared_idf_table() {
        let mut first = doc(1, &["running", "cat"]);
        first.lemmas.insert(
            "run".to_string(),
            ["running"].iter().map(|t| t.to_string()).collect(),
        );
        let mut second = doc(2, &["ran", "dog"]);
        second.lemmas.insert(
            "run".to_string(),
            ["ran"].iter().map(|t| t.to_string()).collect(),
        );
        let docs = vec![first, second];
        let index = InvertedIndex::from_documents(&docs);
        let corpus_lemmas = crate::lemma::merge_lemma_maps(&docs);
        let weights = compute_corpus_weights(&docs, &index, &corpus_lemmas);

        let a = weights.docs[&1].lemmas["run"].idf;
        let b = weights.docs[&2].lemmas["run"].idf;
        assert!(close(a, b));
        assert!(close(a, weights.lemma_idf["run"]));
        // both documents carry a surface form, so df is 2 of 2.
        assert!(close(a, 0.0));
    }

    #[test]
    fn parallel_corpus_weighting_is_deterministic() {
        let docs: Vec<DocumentTokens> = (0..64)
            .map(|i| {
                doc(
                    i,
                    &[
                        format!("term{}", i % 7).as_str(),
                        format!("term{}", i % 13).as_str(),
                        "shared",
                    ],
                )
            })
            .collect();
        let index = InvertedIndex::from_documents(&docs);
        let corpus_lemmas = crate::lemma::merge_lemma_maps(&docs);

        let a = compute_corpus_weights(&docs, &index, &corpus_lemmas);
        let b = compute_corpus_weights(&docs, &index, &corpus_lemmas);
        assert_eq!(
            bincode::serialize(&a).unwrap(),
            bincode::serialize(&b).unwrap()
        );
    }
}
