use std::sync::{Arc, Mutex};

use crate::publishing::domain::decision_store::{DecisionStore, PublishError};

/// In-process [`DecisionStore`] for dry runs.
///
/// Holds only the latest value, like the remote node. Clones share the same
/// slot, so a caller can keep a handle and inspect what the publisher wrote.
#[derive(Clone, Default)]
pub struct MemoryStore {
    value: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.value.lock().ok()?.clone()
    }
}

impl DecisionStore for MemoryStore {
    fn write(&mut self, value: &str) -> Result<(), PublishError> {
        let mut slot = self
            .value
            .lock()
            .map_err(|e| PublishError::Unavailable(format!("lock poisoned: {e}")))?;
        *slot = Some(value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_has_no_value() {
        assert_eq!(MemoryStore::new().current(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = MemoryStore::new();
        let mut writer = handle.clone();
        writer.write("Yes").unwrap();
        assert_eq!(handle.current().as_deref(), Some("Yes"));
    }

    #[test]
    fn test_write_replaces_previous_value() {
        let mut store = MemoryStore::new();
        for i in 0..10_000 {
            let value = if i % 2 == 0 { "Yes" } else { "No" };
            store.write(value).unwrap();
        }
        assert_eq!(store.current().as_deref(), Some("No"));
        assert_eq!(store.value.lock().unwrap().iter().count(), 1);
    }
}
