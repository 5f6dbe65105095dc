use crate::document::DocumentTokens;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Mapping from a lemma to the surface tokens it covers.
pub type LemmaMap = BTreeMap<String, BTreeSet<String>>;

/// Morphological normalization seam. Maps one lowercased surface word to its
/// canonical lemma; implementations must be deterministic.
pub trait Lemmatizer {
    fn normalize(&self, word: &str) -> String;
}

/// Lemmatizer backed by the corpus's own lemma mapping, inverted to
/// token -> lemma. Words outside the dictionary normalize to themselves.
#[derive(Debug, Clone, Default)]
pub struct DictionaryLemmatizer {
    token_to_lemma: HashMap<String, String>,
}

impl DictionaryLemmatizer {
    /// Inverts a corpus lemma mapping. If two lemmas claim the same surface
    /// token, the lexicographically smaller lemma wins and the conflict is
    /// logged.
    pub fn from_lemma_map(lemmas: &LemmaMap) -> Self {
        let mut token_to_lemma = HashMap::new();
        for (lemma, tokens) in lemmas {
            for token in tokens {
                match token_to_lemma.entry(token.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(lemma.clone());
                    }
                    Entry::Occupied(slot) => {
                        if slot.get() != lemma {
                            tracing::warn!(
                                %token,
                                kept = %slot.get(),
                                dropped = %lemma,
                                "surface token claimed by multiple lemmas"
                            );
                        }
                    }
                }
            }
        }
        Self { token_to_lemma }
    }

    pub fn len(&self) -> usize {
        self.token_to_lemma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_lemma.is_empty()
    }
}

impl Lemmatizer for DictionaryLemmatizer {
    fn normalize(&self, word: &str) -> String {
        self.token_to_lemma
            .get(word)
            .cloned()
            .unwrap_or_else(|| word.to_string())
    }
}

/// Merges per-document lemma mappings into one corpus-wide mapping. Surface
/// token sets for a lemma seen in several documents are unioned.
pub fn merge_lemma_maps<'a, I>(documents: I) -> LemmaMap
where
    I: IntoIterator<Item = &'a DocumentTokens>,
{
    let mut merged = LemmaMap::new();
    for doc in documents {
        for (lemma, tokens) in &doc.lemmas {
            merged
                .entry(lemma.clone())
                .or_default()
                .extend(tokens.iter().cloned());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocId;

    fn lemma_map(entries: &[(&str, &[&str])]) -> LemmaMap {
        entries
            .iter()
            .map(|(lemma, tokens)| {
                (
                    lemma.to_string(),
                    tokens.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    fn doc_with_lemmas(doc_id: DocId, lemmas: LemmaMap) -> DocumentTokens {
        DocumentTokens {
            doc_id,
            name: format!("page_{doc_id}"),
            occurrences: Vec::new(),
            tokens: BTreeSet::new(),
            lemmas,
        }
    }

    #[test]
    fn known_tokens_normalize_to_their_lemma() {
        let lemmatizer =
            DictionaryLemmatizer::from_lemma_map(&lemma_map(&[("run", &["running", "ran", "runs"])]));
        assert_eq!(lemmatizer.normalize("running"), "run");
        assert_eq!(lemmatizer.normalize("ran"), "run");
        assert_eq!(lemmatizer.len(), 3);
    }

    #[test]
    fn unknown_words_pass_through() {
        let lemmatizer = DictionaryLemmatizer::from_lemma_map(&LemmaMap::new());
        assert_eq!(lemmatizer.normalize("quokka"), "quokka");
        assert!(lemmatizer.is_empty());
    }

    #[test]
    fn conflicting_claims_keep_the_smaller_lemma() {
        let lemmatizer = DictionaryLemmatizer::from_lemma_map(&lemma_map(&[
            ("axis", &["axes"]),
            ("axe", &["axes", "axe"]),
        ]));
        // "axe" < "axis", so it is seen first and wins.
        assert_eq!(lemmatizer.normalize("axes"), "axe");
    }

    #[test]
    fn merge_unions_surface_tokens_across_documents() {
        let docs = vec![
            doc_with_lemmas(1, lemma_map(&[("run", &["running"])])),
            doc_with_lemmas(2, lemma_map(&[("run", &["ran"]), ("cat", &["cats"])])),
        ];
        let merged = merge_lemma_maps(&docs);
        assert_eq!(
            merged,
            lemma_map(&[("cat", &["cats"]), ("run", &["ran", "running"])])
        );
    }
}
