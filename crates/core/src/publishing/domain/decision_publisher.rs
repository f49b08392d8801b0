use crate::publishing::domain::decision_store::{AccessDecision, DecisionStore, PublishError};
use crate::shared::constants::{ACCESS_DENIED_VALUE, ACCESS_GRANTED_VALUE};

/// The two canonical strings written to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecisionValues {
    pub granted: String,
    pub denied: String,
}

impl DecisionValues {
    pub fn value_for(&self, decision: AccessDecision) -> &str {
        match decision {
            AccessDecision::Granted => &self.granted,
            AccessDecision::Denied => &self.denied,
        }
    }
}

impl Default for DecisionValues {
    fn default() -> Self {
        Self {
            granted: ACCESS_GRANTED_VALUE.to_string(),
            denied: ACCESS_DENIED_VALUE.to_string(),
        }
    }
}

/// Best-effort, last-write-wins publication of access decisions.
///
/// Failures are logged and handed back to the caller for reporting; nothing
/// is queued or retried. The next publish supersedes a lost one.
pub struct DecisionPublisher {
    store: Box<dyn DecisionStore>,
    values: DecisionValues,
}

impl DecisionPublisher {
    pub fn new(store: Box<dyn DecisionStore>, values: DecisionValues) -> Self {
        Self { store, values }
    }

    pub fn values(&self) -> &DecisionValues {
        &self.values
    }

    pub fn publish(&mut self, matched: bool) -> Result<AccessDecision, PublishError> {
        let decision = AccessDecision::from_match(matched);
        let value = self.values.value_for(decision);
        match self.store.write(value) {
            Ok(()) => {
                log::debug!("Published access={value}");
                Ok(decision)
            }
            Err(e) => {
                log::warn!("Failed to publish access={value}: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publishing::infrastructure::memory_store::MemoryStore;

    struct FailingStore;

    impl DecisionStore for FailingStore {
        fn write(&mut self, _value: &str) -> Result<(), PublishError> {
            Err(PublishError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_publish_writes_canonical_values() {
        let store = MemoryStore::new();
        let mut publisher = DecisionPublisher::new(Box::new(store.clone()), DecisionValues::default());

        assert_eq!(publisher.publish(true).unwrap(), AccessDecision::Granted);
        assert_eq!(store.current().as_deref(), Some("Yes"));
    }

    #[test]
    fn test_last_write_wins() {
        let store = MemoryStore::new();
        let mut publisher = DecisionPublisher::new(Box::new(store.clone()), DecisionValues::default());

        publisher.publish(true).unwrap();
        publisher.publish(false).unwrap();

        assert_eq!(store.current().as_deref(), Some("No"));
    }

    #[test]
    fn test_custom_values() {
        let store = MemoryStore::new();
        let values = DecisionValues {
            granted: "OPEN".into(),
            denied: "LOCKED".into(),
        };
        let mut publisher = DecisionPublisher::new(Box::new(store.clone()), values);

        publisher.publish(false).unwrap();
        assert_eq!(store.current().as_deref(), Some("LOCKED"));
    }

    #[test]
    fn test_failure_is_returned_not_retried() {
        let mut publisher = DecisionPublisher::new(Box::new(FailingStore), DecisionValues::default());
        assert!(matches!(
            publisher.publish(true),
            Err(PublishError::Unavailable(_))
        ));
        // The publisher stays usable for the next cycle.
        assert!(publisher.publish(false).is_err());
    }
}
