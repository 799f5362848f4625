//! Navigation side effects
//!
//! The browsed collection is reflected in the host's address bar (or any other
//! location model). The core never mutates that state directly; it hands a
//! [`Location`] to an injected [`Navigator`].

use serde::{Deserialize, Serialize};

use crate::collections::CollectionId;
use crate::error::Result;

/// Query parameter carrying the browsed collection
pub const COLLECTION_QUERY_KEY: &str = "collection";

/// Location the host should reflect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub collection_id: Option<CollectionId>,
}

impl Location {
    pub fn collection(collection_id: CollectionId) -> Self {
        Self {
            collection_id: Some(collection_id),
        }
    }

    /// Render as a query string, e.g. `?collection=abc`. Empty when no
    /// collection is set.
    pub fn to_query_string(&self) -> String {
        match &self.collection_id {
            Some(id) => format!("?{}={}", COLLECTION_QUERY_KEY, id),
            None => String::new(),
        }
    }
}

/// Receives location changes emitted by the core
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &Location) -> Result<()>;
}

/// Navigator that ignores every location change
#[derive(Debug, Clone, Default)]
pub struct NullNavigator;

impl Navigator for NullNavigator {
    fn navigate(&self, _location: &Location) -> Result<()> {
        Ok(())
    }
}
