//! Experiment domain entities

use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::{
    validate_experiment_name, validate_provider_experiment_id, NameValidationError,
};

// ============================================================================
// ExperimentName
// ============================================================================

/// Name of an experiment as registered with the local variation registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Create a new experiment name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, NameValidationError> {
        let name = name.into();
        validate_experiment_name(&name)?;
        Ok(Self(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExperimentName {
    type Error = NameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExperimentName> for String {
    fn from(name: ExperimentName) -> Self {
        name.0
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ExperimentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// ProviderExperimentId
// ============================================================================

/// Identifier the external variation provider knows an experiment by
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderExperimentId(String);

impl ProviderExperimentId {
    /// Create a new provider experiment ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, NameValidationError> {
        let id = id.into();
        validate_provider_experiment_id(&id)?;
        Ok(Self(id))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProviderExperimentId {
    type Error = NameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProviderExperimentId> for String {
    fn from(id: ProviderExperimentId) -> Self {
        id.0
    }
}

impl fmt::Display for ProviderExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProviderExperimentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
