//! Tag sets to sparse feature vectors.
//!
//! The vocabulary is every distinct term across the catalog minus the stop list,
//! ordered lexicographically so dimension indices are reproducible between runs.
//! Terms are lower-cased before the stop list is applied.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::Item;

/// Common English terms, only relevant once title words feed the vectors
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with", "de",
    "la", "le", "les", "der", "die", "das", "ii", "iii",
];

/// How a present term is weighted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Binary: 1.0 for every retained term
    #[default]
    Presence,
    /// Term count times smoothed inverse document frequency
    TfIdf,
}

/// Which fields of an item contribute terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSource {
    #[default]
    Tags,
    /// Tags plus word tokens of the display title
    TagsAndTitle,
}

/// Sparse vector; entries sorted by dimension, weights strictly positive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(usize, f32)>,
}

impl FeatureVector {
    fn from_weights(weights: BTreeMap<usize, f32>) -> Self {
        Self {
            entries: weights.into_iter().filter(|&(_, w)| w > 0.0).collect(),
        }
    }

    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    /// Weight of dimension `dim`, 0 when absent
    pub fn weight(&self, dim: usize) -> f32 {
        self.entries
            .binary_search_by_key(&dim, |&(d, _)| d)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// L2 norm
    pub fn norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|&(_, w)| (w as f64) * (w as f64))
            .sum::<f64>()
            .sqrt()
    }

    /// Dot product by merging the two sorted entry lists
    pub fn dot(&self, other: &FeatureVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f64;
        while i < self.entries.len() && j < other.entries.len() {
            let (da, wa) = self.entries[i];
            let (db, wb) = other.entries[j];
            match da.cmp(&db) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += (wa as f64) * (wb as f64);
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Converts items to feature vectors over a shared vocabulary
#[derive(Debug, Clone, Default)]
pub struct FeatureVectorizer {
    weighting: Weighting,
    source: FeatureSource,
    stop_words: HashSet<String>,
}

impl FeatureVectorizer {
    pub fn new(weighting: Weighting, source: FeatureSource) -> Self {
        Self {
            weighting,
            source,
            stop_words: HashSet::new(),
        }
    }

    /// Adds terms to the stop list (case-insensitive)
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        self
    }

    pub fn with_english_stop_words(self) -> Self {
        self.with_stop_words(ENGLISH_STOP_WORDS.iter())
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    /// Sorted vocabulary the given items would produce
    pub fn vocabulary(&self, items: &[Item]) -> Vec<String> {
        let terms: BTreeSet<String> = items
            .iter()
            .flat_map(|item| self.terms(item).into_keys())
            .collect();
        terms.into_iter().collect()
    }

    /// One vector per item, in input order
    pub fn vectorize(&self, items: &[Item]) -> Vec<FeatureVector> {
        let per_item: Vec<BTreeMap<String, u32>> =
            items.iter().map(|item| self.terms(item)).collect();

        let mut doc_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for terms in &per_item {
            for term in terms.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let index: BTreeMap<&str, usize> = doc_freq
            .keys()
            .enumerate()
            .map(|(dim, term)| (*term, dim))
            .collect();

        let n = items.len() as f64;
        let idf: Vec<f64> = doc_freq
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        tracing::debug!(
            item_count = items.len(),
            vocabulary_size = index.len(),
            weighting = ?self.weighting,
            "Vectorized catalog"
        );

        per_item
            .iter()
            .map(|terms| {
                let weights = terms
                    .iter()
                    .map(|(term, &count)| {
                        let dim = index[term.as_str()];
                        let weight = match self.weighting {
                            Weighting::Presence => 1.0,
                            Weighting::TfIdf => (count as f64 * idf[dim]) as f32,
                        };
                        (dim, weight)
                    })
                    .collect();
                FeatureVector::from_weights(weights)
            })
            .collect()
    }

    /// Retained terms of one item with their occurrence counts
    fn terms(&self, item: &Item) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();

        for tag in &item.tags {
            let term = tag.trim().to_lowercase();
            if !term.is_empty() && !self.stop_words.contains(&term) {
                *counts.entry(term).or_insert(0) += 1;
            }
        }

        if self.source == FeatureSource::TagsAndTitle {
            for token in tokenize(&item.title) {
                if !self.stop_words.contains(&token) {
                    *counts.entry(token).or_insert(0) += 1;
                }
            }
        }

        counts
    }
}

/// Lower-cased alphanumeric runs of at least two characters
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
}
