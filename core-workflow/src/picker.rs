//! Destination collection picker
//!
//! Resolution is by collection id only. Display names may collide, so the
//! picker disambiguates labels but never resolves by them.

use crate::error::{Result, WorkflowError};
use bridge_traits::{Collection, CollectionId};
use std::collections::HashMap;

/// Single-select control over the collection metadata list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionPicker {
    options: Vec<Collection>,
    chosen: Option<Collection>,
}

impl CollectionPicker {
    pub fn new(options: Vec<Collection>) -> Self {
        Self {
            options,
            chosen: None,
        }
    }

    /// Preselect a collection. Ignored if it is not among the options.
    pub fn with_chosen(mut self, chosen: Option<&Collection>) -> Self {
        self.chosen = chosen.and_then(|c| self.resolve(&c.id)).cloned();
        self
    }

    /// Drop `origin` from the options
    pub fn excluding(mut self, origin: &CollectionId) -> Self {
        self.options.retain(|collection| &collection.id != origin);
        if self.chosen.as_ref().map(|c| &c.id) == Some(origin) {
            self.chosen = None;
        }
        self
    }

    pub fn options(&self) -> &[Collection] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn resolve(&self, id: &CollectionId) -> Option<&Collection> {
        self.options.iter().find(|collection| &collection.id == id)
    }

    /// Choose by id, returning the full collection
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::UnknownCollection` if `id` is not an option
    pub fn choose(&mut self, id: &CollectionId) -> Result<Collection> {
        let collection = self
            .resolve(id)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownCollection(id.clone()))?;
        self.chosen = Some(collection.clone());
        Ok(collection)
    }

    pub fn chosen(&self) -> Option<&Collection> {
        self.chosen.as_ref()
    }

    /// Option labels in list order. Colliding names get the id appended.
    pub fn labels(&self) -> Vec<(CollectionId, String)> {
        let mut name_counts: HashMap<&str, usize> = HashMap::new();
        for collection in &self.options {
            *name_counts.entry(collection.name.as_str()).or_default() += 1;
        }

        self.options
            .iter()
            .map(|collection| {
                let label = if name_counts.get(collection.name.as_str()).copied().unwrap_or(0) > 1 {
                    format!("{} ({})", collection.name, collection.id)
                } else {
                    collection.name.clone()
                };
                (collection.id.clone(), label)
            })
            .collect()
    }
}
