//! Identity-key normalization and cross-source candidate merging.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::search::core::candidate::{Candidate, ScoredCandidate};

/// Normalize one key component: lowercase, fold punctuation and symbols into single spaces.
#[must_use]
pub fn normalize_component(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut prev_space = false;

    for ch in text.trim().chars() {
        if ch.is_alphanumeric() {
            normalized.extend(ch.to_lowercase());
            prev_space = false;
        } else if !prev_space && !normalized.is_empty() {
            // Whitespace and any punctuation or symbol act as a separator.
            normalized.push(' ');
            prev_space = true;
        }
    }

    if normalized.ends_with(' ') {
        normalized.pop();
    }
    normalized
}

/// Build the `name|country|city` identity key.
#[must_use]
pub fn identity_key(name: &str, country: &str, city: Option<&str>) -> String {
    format!(
        "{}|{}|{}",
        normalize_component(name),
        normalize_component(country),
        normalize_component(city.unwrap_or_default())
    )
}

/// What happened when a candidate was merged into the accumulator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeOutcome {
    /// First time this identity key was seen.
    Inserted,
    /// The incoming candidate scored higher and replaced the existing one.
    Replaced,
    /// The existing candidate was kept; metadata may have been enriched.
    Kept,
}

/// Merge two scored candidates sharing an identity key.
///
/// The higher score wins; ties keep `existing`. Tags, verification and URL are unioned
/// from the loser where the winner has nothing.
#[must_use]
pub fn merge_pair(
    existing: ScoredCandidate,
    incoming: ScoredCandidate,
) -> (ScoredCandidate, MergeOutcome) {
    let replaced = incoming.score > existing.score;
    let (winner, loser, outcome) = if replaced {
        // Keep the original acceptance order for stable tie-breaking.
        let incoming = incoming.accepted_in(existing.pass, existing.recall_rank);
        (incoming, existing, MergeOutcome::Replaced)
    } else {
        (existing, incoming, MergeOutcome::Kept)
    };

    let candidate = union_metadata(winner.candidate, &loser.candidate);
    (
        ScoredCandidate {
            candidate,
            ..winner
        },
        outcome,
    )
}

fn union_metadata(mut winner: Candidate, loser: &Candidate) -> Candidate {
    winner.tags.extend(loser.tags.iter().cloned());
    winner.verified |= loser.verified;
    if winner.url.is_none() {
        winner.url.clone_from(&loser.url);
    }
    if winner.city.is_none() {
        winner.city.clone_from(&loser.city);
    }
    if winner.moq.is_none() {
        winner.moq = loser.moq;
    }
    if winner.lead_time_days.is_none() {
        winner.lead_time_days = loser.lead_time_days;
    }
    if winner.customization.is_none() {
        winner.customization = loser.customization;
    }
    for (key, value) in &loser.extras {
        winner
            .extras
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
    winner
}

/// Accumulates scored candidates, keeping at most one entry per identity key.
#[derive(Clone, Debug, Default)]
pub struct Deduplicator {
    entries: HashMap<String, ScoredCandidate>,
}

impl Deduplicator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one candidate.
    pub fn merge(&mut self, incoming: ScoredCandidate) -> MergeOutcome {
        match self.entries.entry(incoming.identity_key().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
                MergeOutcome::Inserted
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get().clone();
                let (merged, outcome) = merge_pair(existing, incoming);
                slot.insert(merged);
                outcome
            }
        }
    }

    /// Number of unique identity keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been merged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best score accumulated so far.
    #[must_use]
    pub fn best_score(&self) -> Option<f64> {
        self.entries.values().map(|c| c.score).reduce(f64::max)
    }

    /// Drain into a list sorted by score descending, then pass, then recall order.
    #[must_use]
    pub fn into_sorted(self) -> Vec<ScoredCandidate> {
        let mut items: Vec<ScoredCandidate> = self.entries.into_values().collect();
        items.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.pass.cmp(&b.pass))
                .then(a.recall_rank.cmp(&b.recall_rank))
                .then_with(|| a.identity_key().cmp(b.identity_key()))
        });
        items
    }
}
