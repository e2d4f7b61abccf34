//! Policy retrieval trait.

use async_trait::async_trait;

use crate::SourceResult;

/// A policy document as retrieved for a role, already URL-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    /// Managed policy name (last ARN segment) or inline policy name
    pub policy_name: String,

    /// JSON policy document
    pub document: String,
}

impl PolicyDocument {
    /// Create a new policy document.
    pub fn new(policy_name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            policy_name: policy_name.into(),
            document: document.into(),
        }
    }
}

/// Trait for retrieving the policies that apply to a role.
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Default-version documents of every managed policy attached to `role`.
    async fn managed_policies(&self, role: &str) -> SourceResult<Vec<PolicyDocument>>;

    /// Documents of every inline policy embedded in `role`.
    async fn inline_policies(&self, role: &str) -> SourceResult<Vec<PolicyDocument>>;
}
