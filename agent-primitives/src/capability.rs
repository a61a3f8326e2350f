//! Capability identifiers shared across the agent runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_ID_LEN: usize = 64;

/// Identifier for a capability a tool requires before it may be invoked.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CapabilityId(String);

impl CapabilityId {
    /// Reading local files through the fetch service.
    pub const FILE_READ: &'static str = "fs.read";

    /// Executing untrusted scripts through the browser-automation service.
    pub const SCRIPT_EXECUTE: &'static str = "script.execute";

    /// Creates a new capability identifier after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapabilityId`] if the supplied identifier is empty,
    /// too long, or contains unsupported characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_identifier(&id)?;
        Ok(Self(id))
    }

    /// Capability required by the file-fetch tool.
    #[must_use]
    pub fn file_read() -> Self {
        Self(Self::FILE_READ.to_owned())
    }

    /// Capability required by the script-execution tool.
    #[must_use]
    pub fn script_execute() -> Self {
        Self(Self::SCRIPT_EXECUTE.to_owned())
    }

    /// Returns the capability identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CapabilityId> for String {
    fn from(value: CapabilityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for CapabilityId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidCapabilityId {
            id: String::new(),
            reason: "identifier cannot be empty".into(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(Error::InvalidCapabilityId {
            id: id.into(),
            reason: format!("identifier length must be <= {MAX_ID_LEN}"),
        });
    }

    if !id
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_' | '.'))
    {
        return Err(Error::InvalidCapabilityId {
            id: id.into(),
            reason: "identifier must contain lowercase alphanumeric, dash, underscore, or dot"
                .into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_ids_pass_validation() {
        assert!(CapabilityId::new(CapabilityId::FILE_READ).is_ok());
        assert!(CapabilityId::new(CapabilityId::SCRIPT_EXECUTE).is_ok());
        assert_eq!(CapabilityId::file_read().as_str(), "fs.read");
        assert_eq!(CapabilityId::script_execute().to_string(), "script.execute");
    }

    #[test]
    fn rejects_malformed_ids() {
        let err = CapabilityId::new("").expect_err("empty id");
        assert!(matches!(err, Error::InvalidCapabilityId { .. }));

        let err = CapabilityId::new("Script.Execute").expect_err("uppercase id");
        assert!(matches!(err, Error::InvalidCapabilityId { id, .. } if id == "Script.Execute"));

        let err = CapabilityId::new("x".repeat(MAX_ID_LEN + 1)).expect_err("too long");
        assert!(matches!(err, Error::InvalidCapabilityId { .. }));
    }

    #[test]
    fn deserialization_validates() {
        let id: CapabilityId = serde_json::from_str("\"fs.read\"").unwrap();
        assert_eq!(id, CapabilityId::file_read());

        assert!(serde_json::from_str::<CapabilityId>("\"no spaces\"").is_err());
    }
}
