//! Occurrence-based anchor codec
//!
//! Both directions count matches with the same scan: find the next match,
//! then resume one character after its start (not after its end), so
//! overlapping occurrences are counted. Encode and decode must agree on this
//! rule or anchors resolve to the wrong occurrence.

use serde::{Deserialize, Serialize};

use crate::text::units::{byte_to_utf16, utf16_len, utf16_to_byte};
use crate::text::FlatRange;

/// Persisted anchor: exact text plus which occurrence of it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub selected_text: String,
    pub occurrence_index: u32,
}

impl Anchor {
    pub fn new(selected_text: impl Into<String>, occurrence_index: u32) -> Self {
        Self {
            selected_text: selected_text.into(),
            occurrence_index,
        }
    }

    /// Locate this anchor in `flat`
    pub fn locate(&self, flat: &str) -> Option<FlatRange> {
        find_occurrence(flat, &self.selected_text, self.occurrence_index)
    }
}

/// Byte positions of successive matches, resuming at `match_start + 1 char`
struct Matches<'a> {
    haystack: &'a str,
    needle: &'a str,
    from: usize,
}

impl<'a> Matches<'a> {
    fn new(haystack: &'a str, needle: &'a str) -> Self {
        Self { haystack, needle, from: 0 }
    }
}

impl Iterator for Matches<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.needle.is_empty() || self.from > self.haystack.len() {
            return None;
        }
        let found = self.from + self.haystack[self.from..].find(self.needle)?;
        let step = self.haystack[found..].chars().next().map(char::len_utf8).unwrap_or(1);
        self.from = found + step;
        Some(found)
    }
}

/// Decode: the `occurrence_index`-th (0-based) match of `text` in `flat`
///
/// Returns `None` when `text` is empty or has fewer matches.
pub fn find_occurrence(flat: &str, text: &str, occurrence_index: u32) -> Option<FlatRange> {
    let byte = Matches::new(flat, text).nth(occurrence_index as usize)?;
    let start = byte_to_utf16(flat, byte);
    Some(FlatRange::new(start, start + utf16_len(text)))
}

/// Encode: how many matches of `text` start strictly before `sel_start`
///
/// `sel_start` is a UTF-16 flat offset.
pub fn occurrences_before(flat: &str, text: &str, sel_start: usize) -> u32 {
    let limit = utf16_to_byte(flat, sel_start).unwrap_or(flat.len());
    Matches::new(flat, text).take_while(|byte| *byte < limit).count() as u32
}
