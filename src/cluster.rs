//! Online clustering of command strings by token distribution.
//!
//! Representatives live in a `Vec` in creation order and are never removed.
//! Matching depends on scan order, so the order is part of the state.
//!
//! `insert` is O(N·M) for N representatives and M tokens per distribution,
//! making a batch of K commands O(K²·M) in the worst case. That is fine for
//! per-crash batches of tens to a few hundred commands. Anything larger wants
//! a different index.

use crate::distribution::{distance, Distribution};
use crate::sanitize;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_THRESHOLD: f64 = 0.7;

const SHORT_TEXT_PADDING: &str = " ....... ";
const SHORT_TEXT_SECTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepresentativeId(pub usize);

impl fmt::Display for RepresentativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which qualifying representative a new command joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// The last one scanned with distance below the threshold, not the
    /// closest. Existing stores were clustered this way.
    #[default]
    LastQualifying,
    /// The closest one below the threshold; ties keep the earliest.
    Nearest,
}

/// Records a command can be linked to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Association {
    Crash(String),
    User(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representative<H> {
    id: RepresentativeId,
    text: String,
    distribution: Distribution,
    associations: Vec<H>,
}

impl<H> Representative<H> {
    pub fn new(id: RepresentativeId, text: String, distribution: Distribution) -> Self {
        Self { id, text, distribution, associations: Vec::new() }
    }

    pub fn id(&self) -> RepresentativeId {
        self.id
    }

    /// Canonical text exactly as the scheduler reported it.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn associations(&self) -> &[H] {
        &self.associations
    }

    /// The text with its collapsed line breaks restored.
    pub fn display_text(&self) -> String {
        sanitize::reverse_line_breaks(&self.text)
    }

    /// Texts longer than `max_len` characters become three evenly spaced
    /// excerpts joined by a padding marker, `max_len` characters in total
    /// once the limit leaves room for the markers.
    pub fn short_text(&self, max_len: usize) -> String {
        short_text(&self.text, max_len)
    }
}

impl<H: PartialEq> Representative<H> {
    /// Returns false when the handle was already attached.
    pub fn attach(&mut self, handle: H) -> bool {
        if self.associations.contains(&handle) {
            return false;
        }
        self.associations.push(handle);
        true
    }
}

fn short_text(text: &str, max_len: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return text.to_string();
    }
    let pad = SHORT_TEXT_PADDING.chars().count();
    let gaps = SHORT_TEXT_SECTIONS - 1;
    let each = max_len.saturating_sub(pad * gaps) / SHORT_TEXT_SECTIONS;
    let large = (max_len - 2 * each) / gaps;
    let excerpt = |from: usize, to: usize| chars[from.min(chars.len())..to.min(chars.len())].iter().collect::<String>();

    let mut out = excerpt(0, each);
    for section in 1..gaps {
        let centre = section * large + each;
        out.push_str(SHORT_TEXT_PADDING);
        out.push_str(&excerpt(centre - each / 2, centre + each / 2));
    }
    out.push_str(SHORT_TEXT_PADDING);
    out.push_str(&excerpt(chars.len() - each, chars.len()));
    out
}

/// Result of one insert. `is_new` tells whether the command started a new
/// cluster; `attached` whether the handle was not already on it.
#[derive(Debug)]
pub struct Insertion<'a, H> {
    pub representative: &'a Representative<H>,
    pub is_new: bool,
    pub attached: bool,
}

/// Where a command belongs, before the index is changed.
#[derive(Debug, Clone)]
pub enum Placement<H> {
    Existing(RepresentativeId),
    New(Representative<H>),
}

/// Not synchronized: concurrent ingestion into one index needs an outer lock.
#[derive(Debug, Clone)]
pub struct ClusterIndex<H> {
    representatives: Vec<Representative<H>>,
    threshold: f64,
    policy: MatchPolicy,
}

impl<H> Default for ClusterIndex<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ClusterIndex<H> {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { representatives: Vec::new(), threshold, policy: MatchPolicy::default() }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seeds the index from previously stored representatives. Their order is
    /// taken as creation order.
    pub fn from_representatives(representatives: Vec<Representative<H>>, threshold: f64) -> Self {
        Self { representatives, threshold, policy: MatchPolicy::default() }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn representatives(&self) -> &[Representative<H>] {
        &self.representatives
    }

    pub fn get(&self, id: RepresentativeId) -> Option<&Representative<H>> {
        self.representatives.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.representatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }

    /// The representative `distribution` would join, if any.
    pub fn find_match(&self, distribution: &Distribution, threshold: f64) -> Option<RepresentativeId> {
        let scored = self
            .representatives
            .iter()
            .map(|r| (r.id, distance(&r.distribution, distribution)))
            .filter(|(_, d)| *d < threshold);
        match self.policy {
            MatchPolicy::LastQualifying => scored.last().map(|(id, _)| id),
            MatchPolicy::Nearest => scored
                .fold(None, |best: Option<(RepresentativeId, f64)>, (id, d)| match best {
                    Some((_, bd)) if bd <= d => best,
                    _ => Some((id, d)),
                })
                .map(|(id, _)| id),
        }
    }
}

impl<H: PartialEq> ClusterIndex<H> {
    pub fn insert(&mut self, raw_text: &str, handle: H) -> Insertion<'_, H> {
        self.insert_with_threshold(raw_text, handle, self.threshold)
    }

    /// Links `handle` to the representative `raw_text` matches, or creates a
    /// new representative for it. A matched representative keeps its text and
    /// distribution.
    pub fn insert_with_threshold(&mut self, raw_text: &str, handle: H, threshold: f64) -> Insertion<'_, H> {
        let placement = self.place(raw_text, threshold);
        self.commit(placement, handle)
    }

    /// Decides where `raw_text` goes without changing the index.
    pub fn place(&self, raw_text: &str, threshold: f64) -> Placement<H> {
        let distribution = Distribution::of_command(raw_text);
        match self.find_match(&distribution, threshold) {
            Some(id) => Placement::Existing(id),
            None => {
                let id = RepresentativeId(self.representatives.len());
                Placement::New(Representative::new(id, raw_text.to_string(), distribution))
            }
        }
    }

    /// Applies a placement from [`place`](Self::place). The index must not
    /// have changed in between.
    pub fn commit(&mut self, placement: Placement<H>, handle: H) -> Insertion<'_, H> {
        let (index, is_new) = match placement {
            Placement::Existing(id) => {
                log::debug!("linking command to representative {id}");
                (id.0, false)
            }
            Placement::New(representative) => {
                let id = representative.id;
                debug_assert_eq!(id.0, self.representatives.len());
                log::info!("creating representative {id} ({} distinct tokens)", representative.distribution.len());
                self.representatives.push(representative);
                (self.representatives.len() - 1, true)
            }
        };
        let representative = &mut self.representatives[index];
        let attached = representative.attach(handle);
        Insertion { representative, is_new, attached }
    }

    /// `None` if `id` is not in the index, otherwise whether the handle was new.
    pub fn attach(&mut self, id: RepresentativeId, handle: H) -> Option<bool> {
        self.representatives.get_mut(id.0).map(|r| r.attach(handle))
    }
}
