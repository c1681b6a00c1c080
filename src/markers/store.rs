//! Client-side marker cache
//!
//! Keeps records in load order followed by creation order, so re-rendering
//! from the store reproduces the same exclusive-mode claims every time.

use super::record::{MarkerId, MarkerRecord};

#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    records: Vec<MarkerRecord>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a server list, preserving its order
    pub fn from_records(records: Vec<MarkerRecord>) -> Self {
        Self { records }
    }

    /// All records in insertion order
    pub fn all(&self) -> &[MarkerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record
    ///
    /// A record whose id is already present replaces the stored one in place
    /// rather than being appended twice.
    pub fn add(&mut self, record: MarkerRecord) {
        if let Some(id) = record.id.clone() {
            if let Some(existing) = self.find_mut(&id) {
                *existing = record;
                return;
            }
        }
        self.records.push(record);
    }

    pub fn find(&self, id: &MarkerId) -> Option<&MarkerRecord> {
        self.records.iter().find(|r| r.id.as_ref() == Some(id))
    }

    pub fn find_mut(&mut self, id: &MarkerId) -> Option<&mut MarkerRecord> {
        self.records.iter_mut().find(|r| r.id.as_ref() == Some(id))
    }

    pub fn remove(&mut self, id: &MarkerId) -> Option<MarkerRecord> {
        let index = self.records.iter().position(|r| r.id.as_ref() == Some(id))?;
        Some(self.records.remove(index))
    }

    /// Replace a record's note; returns false if the id is unknown
    pub fn update_note(&mut self, id: &MarkerId, note: &str) -> bool {
        match self.find_mut(id) {
            Some(record) => {
                record.comment_text = Some(note.to_string());
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
