//! Do-not-call list handling
//!
//! Membership is bidirectional substring containment: a number matches when it
//! contains a DNC entry or a DNC entry contains it. This catches entries stored
//! with or without a truncated prefix, and it also means a very short entry
//! matches almost every number. The looseness is kept as is.

pub mod source;

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

pub use source::{DncLoad, DncOrigin, DncSource, cached, cached_count, clear_cache, save_cache};

/// Runs of 7 or more ASCII digits
static DNC_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{7,}").expect("static DNC pattern is valid"));

/// Every run of 7+ digits in `text`, in order and with repeats
pub fn extract_entries(text: &str) -> Vec<String> {
    DNC_ENTRY.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Set of do-not-call digit strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DncSet {
    entries: BTreeSet<String>,
}

impl DncSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every run of 7+ digits from a text resource
    pub fn parse(text: &str) -> Self {
        extract_entries(text).into_iter().collect()
    }

    pub fn insert(&mut self, entry: impl Into<String>) -> bool {
        self.entries.insert(entry.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }

    /// Whether `number` matches any entry, in either direction.
    pub fn contains_number(&self, number: &str) -> bool {
        is_in_dnc(number, self.entries.iter())
    }

    /// Split a queue into numbers to dial and the count that were dropped.
    pub fn filter_queue(&self, queue: &[String]) -> (Vec<String>, usize) {
        let kept: Vec<String> = queue
            .iter()
            .filter(|number| !self.contains_number(number))
            .cloned()
            .collect();
        let skipped = queue.len() - kept.len();
        (kept, skipped)
    }
}

impl FromIterator<String> for DncSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DncSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Bidirectional substring membership test.
///
/// An empty `number` is contained in every entry, so it matches any non-empty
/// set.
pub fn is_in_dnc<'a, I>(number: &str, entries: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    entries
        .into_iter()
        .any(|entry| number.contains(entry.as_str()) || entry.contains(number))
}
