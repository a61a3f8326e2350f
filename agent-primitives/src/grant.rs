//! Capability grants held by an agent driver.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::CapabilityId;

/// Set of capabilities the holder is allowed to exercise.
///
/// An empty grant allows nothing. Tools that declare no capabilities are
/// always invocable regardless of the grant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityGrant {
    granted: BTreeSet<CapabilityId>,
}

impl CapabilityGrant {
    /// Creates an empty grant.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a grant holding every supplied capability.
    #[must_use]
    pub fn of<I>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = CapabilityId>,
    {
        Self {
            granted: capabilities.into_iter().collect(),
        }
    }

    /// Adds a capability, returning the updated grant.
    #[must_use]
    pub fn with(mut self, capability: CapabilityId) -> Self {
        self.granted.insert(capability);
        self
    }

    /// Removes a capability, returning the updated grant.
    #[must_use]
    pub fn without(mut self, capability: &CapabilityId) -> Self {
        self.granted.remove(capability);
        self
    }

    /// Returns `true` when the capability has been granted.
    #[must_use]
    pub fn allows(&self, capability: &CapabilityId) -> bool {
        self.granted.contains(capability)
    }

    /// Returns the first capability in `required` that is not granted.
    #[must_use]
    pub fn first_missing<'a>(&self, required: &'a [CapabilityId]) -> Option<&'a CapabilityId> {
        required.iter().find(|cap| !self.allows(cap))
    }

    /// Iterates over granted capabilities in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityId> {
        self.granted.iter()
    }

    /// Returns `true` if nothing has been granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grant_allows_nothing() {
        let grant = CapabilityGrant::none();
        assert!(grant.is_empty());
        assert!(!grant.allows(&CapabilityId::file_read()));
    }

    #[test]
    fn first_missing_reports_ungranted_capability() {
        let grant = CapabilityGrant::none().with(CapabilityId::file_read());
        let required = vec![CapabilityId::file_read(), CapabilityId::script_execute()];

        assert_eq!(
            grant.first_missing(&required),
            Some(&CapabilityId::script_execute())
        );
        assert_eq!(grant.first_missing(&required[..1]), None);
        assert_eq!(grant.first_missing(&[]), None);
    }

    #[test]
    fn without_revokes() {
        let grant = CapabilityGrant::of([CapabilityId::file_read(), CapabilityId::script_execute()])
            .without(&CapabilityId::script_execute());

        let held: Vec<_> = grant.iter().map(CapabilityId::as_str).collect();
        assert_eq!(held, vec!["fs.read"]);
    }
}
