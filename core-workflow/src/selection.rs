//! # Selection Set
//!
//! Cross-page accumulation of the records chosen for a pending transfer.
//!
//! Membership is unique by record id and ordered by first insertion. Every
//! mutation republishes the current size on a `watch` channel, which is what
//! drives the "can advance" gate of the workflow.

use bridge_traits::{Record, RecordId};
use std::collections::HashSet;
use tokio::sync::watch;

/// Ordered, id-unique set of selected records
#[derive(Debug)]
pub struct SelectionSet {
    records: Vec<Record>,
    ids: HashSet<RecordId>,
    size_tx: watch::Sender<usize>,
}

impl SelectionSet {
    pub fn new() -> Self {
        let (size_tx, _) = watch::channel(0);
        Self {
            records: Vec::new(),
            ids: HashSet::new(),
            size_tx,
        }
    }

    /// Replace the set with exactly `records`.
    ///
    /// Ids already present keep their position; new ids are appended in the
    /// order given. Duplicate ids in the input are collapsed to the first one.
    pub fn add<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        let mut incoming: Vec<Record> = Vec::new();
        let mut incoming_ids = HashSet::new();
        for record in records {
            if incoming_ids.insert(record.id) {
                incoming.push(record);
            }
        }

        let mut next: Vec<Record> = self
            .records
            .iter()
            .filter(|existing| incoming_ids.contains(&existing.id))
            .cloned()
            .collect();
        next.extend(
            incoming
                .into_iter()
                .filter(|record| !self.ids.contains(&record.id)),
        );

        self.records = next;
        self.ids = incoming_ids;
        self.publish();
    }

    /// Remove one record by id. Returns false if it was not selected.
    pub fn remove(&mut self, id: RecordId) -> bool {
        if !self.ids.remove(&id) {
            return false;
        }
        self.records.retain(|record| record.id != id);
        self.publish();
        true
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.ids.clear();
        self.publish();
    }

    /// Selected records in insertion order
    pub fn list(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|record| record.id).collect()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Watch the selection size
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.size_tx.subscribe()
    }

    fn publish(&self) {
        self.size_tx.send_replace(self.records.len());
    }
}

impl Default for SelectionSet {
    fn default() -> Self {
        Self::new()
    }
}
