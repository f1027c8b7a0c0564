//! # Policy Sources
//!
//! Collaborators that supply the policies for a run. Caching lives here,
//! never inside the engine.

pub mod cached;
pub mod directory;
pub mod error;
pub mod memory;

pub use cached::{CacheEntry, CachedPolicySource, RefreshMode};
pub use directory::{parse_export, DirectoryPolicySource};
pub use error::SourceError;
pub use memory::InMemoryPolicySource;

use crate::results::PolicyFailure;
use crate::types::Policy;

/// Policies a source could read, plus the records it had to reject
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyBatch {
    pub policies: Vec<Policy>,
    pub rejected: Vec<PolicyFailure>,
}

impl PolicyBatch {
    pub fn new(policies: Vec<Policy>) -> Self {
        Self {
            policies,
            rejected: Vec::new(),
        }
    }

    pub fn append(&mut self, mut other: PolicyBatch) {
        self.policies.append(&mut other.policies);
        self.rejected.append(&mut other.rejected);
    }
}

impl From<Vec<Policy>> for PolicyBatch {
    fn from(policies: Vec<Policy>) -> Self {
        Self::new(policies)
    }
}

/// Anything that can hand the runner a snapshot of policies
pub trait PolicySource: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    fn fetch_policies(&self) -> Result<Vec<Policy>, SourceError>;

    /// Policies together with per-record rejections
    fn fetch_batch(&self) -> Result<PolicyBatch, SourceError> {
        self.fetch_policies().map(PolicyBatch::from)
    }
}
