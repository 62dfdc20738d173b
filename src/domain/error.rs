use thiserror::Error;

use crate::domain::experiment::NameValidationError;

/// Core domain errors
///
/// `Clone` is required because registry accessors memoize their outcome:
/// a failed resolution is replayed verbatim to every later caller.
#[derive(Debug, Error, Clone)]
pub enum VariationError {
    #[error("Unknown experiment: {name}")]
    UnknownExperiment { name: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {message}")]
    Provider { message: String },

    #[error("Hydration error: {message}")]
    Hydration { message: String },

    #[error("Experiment name already set: {name}")]
    NameAlreadySet { name: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl VariationError {
    pub fn unknown_experiment(name: impl Into<String>) -> Self {
        Self::UnknownExperiment { name: name.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    pub fn hydration(message: impl Into<String>) -> Self {
        Self::Hydration {
            message: message.into(),
        }
    }

    pub fn name_already_set(name: impl Into<String>) -> Self {
        Self::NameAlreadySet { name: name.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<NameValidationError> for VariationError {
    fn from(error: NameValidationError) -> Self {
        Self::validation(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_experiment_error() {
        let error = VariationError::unknown_experiment("checkout-banner");
        assert_eq!(error.to_string(), "Unknown experiment: checkout-banner");
    }

    #[test]
    fn test_provider_error() {
        let error = VariationError::provider("script load failed");
        assert_eq!(error.to_string(), "Provider error: script load failed");
    }

    #[test]
    fn test_name_already_set_error() {
        let error = VariationError::name_already_set("checkout-banner");
        assert_eq!(
            error.to_string(),
            "Experiment name already set: checkout-banner"
        );
    }

    #[test]
    fn test_errors_clone() {
        let error = VariationError::hydration("provider missing");
        let cloned = error.clone();
        assert_eq!(error.to_string(), cloned.to_string());
    }

    #[test]
    fn test_validation_error_converts() {
        let error: VariationError = NameValidationError::EmptyName.into();
        assert_eq!(
            error.to_string(),
            "Validation error: Experiment name cannot be empty"
        );
    }
}
