//! In-process location history

use bridge_traits::{
    error::{BridgeError, Result},
    navigation::{Location, Navigator},
};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

/// Entries kept by [`HistoryNavigator::new`]
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Navigator that keeps an in-memory history of query-string locations.
///
/// Desktop shells have no address bar; they read [`current`](Self::current)
/// to restore the last browsed collection and may show the history for
/// back/forward. Re-navigating to the current location does not add an entry.
/// Once the history is full the oldest entry is dropped.
#[derive(Debug)]
pub struct HistoryNavigator {
    entries: Mutex<VecDeque<String>>,
    limit: usize,
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` entries (at least one)
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            limit: limit.max(1),
        }
    }

    /// Most recent query string, if any
    pub fn current(&self) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.back().cloned())
    }

    /// Every recorded query string, oldest first
    pub fn history(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, location: &Location) -> Result<()> {
        let query = location.to_query_string();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| BridgeError::OperationFailed("navigation history poisoned".to_string()))?;

        if entries.back() != Some(&query) {
            debug!(location = %query, "Pushing location");
            if entries.len() == self.limit {
                entries.pop_front();
            }
            entries.push_back(query);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::CollectionId;

    #[test]
    fn test_records_locations_in_order() {
        let navigator = HistoryNavigator::new();
        navigator
            .navigate(&Location::collection(CollectionId::new("a")))
            .unwrap();
        navigator
            .navigate(&Location::collection(CollectionId::new("b")))
            .unwrap();

        assert_eq!(navigator.current().as_deref(), Some("?collection=b"));
        assert_eq!(
            navigator.history(),
            vec!["?collection=a".to_string(), "?collection=b".to_string()]
        );
    }

    #[test]
    fn test_same_location_is_not_duplicated() {
        let navigator = HistoryNavigator::new();
        let location = Location::collection(CollectionId::new("a"));
        navigator.navigate(&location).unwrap();
        navigator.navigate(&location).unwrap();

        assert_eq!(navigator.history().len(), 1);
    }

    #[test]
    fn test_history_drops_oldest_beyond_limit() {
        let navigator = HistoryNavigator::with_limit(3);
        for id in ["a", "b", "c", "d", "e"] {
            navigator
                .navigate(&Location::collection(CollectionId::new(id)))
                .unwrap();
        }

        assert_eq!(
            navigator.history(),
            vec![
                "?collection=c".to_string(),
                "?collection=d".to_string(),
                "?collection=e".to_string()
            ]
        );
        assert_eq!(navigator.current().as_deref(), Some("?collection=e"));
    }
}
