//! Fixed in-memory policy list

use super::{PolicySource, SourceError};
use crate::types::Policy;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPolicySource {
    policies: Vec<Policy>,
}

impl InMemoryPolicySource {
    pub fn new(policies: Vec<Policy>) -> Self {
        Self { policies }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl PolicySource for InMemoryPolicySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_policies(&self) -> Result<Vec<Policy>, SourceError> {
        Ok(self.policies.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_returns_snapshot() {
        let source = InMemoryPolicySource::default()
            .with_policy(Policy::new("a", "A", json!({})))
            .with_policy(Policy::new("b", "B", json!({})));
        let policies = source.fetch_policies().unwrap();
        assert_eq!(policies.len(), 2);
        assert_eq!(source.len(), 2);
        assert_eq!(policies[1].id, "b");
    }
}
