//! Lexical similarity used in place of embeddings.

use std::collections::HashMap;

/// Word counts of a text, lowercased, split on anything non-alphanumeric.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TermVector {
    terms: HashMap<String, f64>,
    norm: f64,
}

impl TermVector {
    pub(crate) fn from_text(text: &str) -> Self {
        let mut terms: HashMap<String, f64> = HashMap::new();
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            *terms.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
        }
        let norm = terms.values().map(|v| v * v).sum::<f64>().sqrt();
        Self { terms, norm }
    }

    /// Cosine similarity in `[0, 1]`; 0 when either side has no terms.
    pub(crate) fn cosine(&self, other: &TermVector) -> f64 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        let (small, large) = if self.terms.len() <= other.terms.len() {
            (self, other)
        } else {
            (other, self)
        };
        let dot: f64 = small
            .terms
            .iter()
            .filter_map(|(t, a)| large.terms.get(t).map(|b| a * b))
            .sum();
        (dot / (self.norm * other.norm)).clamp(0.0, 1.0)
    }
}
