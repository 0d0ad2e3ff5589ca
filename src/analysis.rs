//! Helpers for inspecting a set of distributions, mainly to choose a
//! clustering threshold.

use crate::distribution::{distance, Distribution};
use std::collections::BTreeMap;

/// Summed proportion of each token across all distributions, lightest first.
pub fn common_tokens(distributions: &[Distribution]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for d in distributions {
        for (token, p) in d.iter() {
            *totals.entry(token).or_insert(0.0) += p;
        }
    }
    let mut out: Vec<(String, f64)> = totals.into_iter().map(|(t, p)| (t.to_string(), p)).collect();
    // stable sort keeps token order for equal weights
    out.sort_by(|a, b| a.1.total_cmp(&b.1));
    out
}

/// Every pair `(i, j)`, `i < j`, of non-empty distributions whose distance
/// lies strictly between `lower` and `upper`.
pub fn pairs_within(distributions: &[Distribution], lower: f64, upper: f64) -> Vec<(usize, usize, f64)> {
    let mut out = Vec::new();
    for (i, x) in distributions.iter().enumerate() {
        if x.is_empty() {
            continue;
        }
        for (j, y) in distributions.iter().enumerate().skip(i + 1) {
            if y.is_empty() {
                continue;
            }
            let d = distance(x, y);
            if lower < d && d < upper {
                out.push((i, j, d));
            }
        }
    }
    out
}

/// One line per token: the token padded to the longest, then a bar scaled so
/// the heaviest token fills the rest of `width`.
pub fn bar_chart(distribution: &Distribution, width: usize) -> String {
    let key_width = distribution.iter().map(|(t, _)| t.chars().count()).max().unwrap_or(0);
    let max = distribution.iter().map(|(_, p)| p).fold(0.0_f64, f64::max);
    if distribution.is_empty() || max <= 0.0 {
        return String::new();
    }
    let space = width.saturating_sub(key_width + 1);
    distribution
        .iter()
        .map(|(token, p)| {
            let bar = ((space as f64) * p / max) as usize;
            format!("{token:<key_width$} {}", "#".repeat(bar))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
