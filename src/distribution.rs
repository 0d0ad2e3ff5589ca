use crate::{sanitize, tokenizer};
use itertools::{EitherOrBoth, Itertools};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized token frequencies for one piece of text.
///
/// Serializes as a flat `{"token": proportion}` JSON object. Keys are kept
/// sorted so two distributions can be walked side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution(BTreeMap<String, f64>);

impl Distribution {
    /// Each distinct token maps to its count over the total token count.
    /// No tokens gives an empty distribution.
    pub fn build(tokens: &[&str]) -> Self {
        let total = tokens.len();
        if total == 0 {
            return Self::default();
        }
        let map = tokens
            .iter()
            .copied()
            .counts()
            .into_iter()
            .map(|(token, count)| (token.to_string(), count as f64 / total as f64))
            .collect();
        Self(map)
    }

    /// Sanitize, tokenize and build in one step.
    pub fn of_command(raw: &str) -> Self {
        let clean = sanitize::sanitize(raw);
        Self::build(&tokenizer::tokenize(&clean))
    }

    pub fn get(&self, token: &str) -> Option<f64> {
        self.0.get(token).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl FromIterator<(String, f64)> for Distribution {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Sum of absolute differences over the union of tokens, a missing token
/// counting as 0. Lies in `[0, 2]`; two empty distributions are 0 apart.
///
/// Both maps are walked in key order so the terms are added in the same
/// order whichever argument comes first, keeping the result exactly
/// symmetric.
pub fn distance(a: &Distribution, b: &Distribution) -> f64 {
    a.0.iter()
        .merge_join_by(b.0.iter(), |(ka, _), (kb, _)| ka.cmp(kb))
        .map(|pair| match pair {
            EitherOrBoth::Both((_, x), (_, y)) => (x - y).abs(),
            EitherOrBoth::Left((_, x)) | EitherOrBoth::Right((_, x)) => *x,
        })
        .sum()
}
