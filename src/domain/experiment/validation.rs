//! Experiment key validation utilities

use thiserror::Error;

/// Maximum length for experiment names
pub const MAX_EXPERIMENT_NAME_LENGTH: usize = 100;

/// Maximum length for provider experiment IDs
pub const MAX_PROVIDER_EXPERIMENT_ID_LENGTH: usize = 64;

/// Validation errors for experiment names and provider experiment IDs
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    #[error("Experiment name cannot be empty")]
    EmptyName,

    #[error("Experiment name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Experiment name must start with a letter or number")]
    InvalidNameStart,

    #[error("Experiment name must end with a letter or number")]
    InvalidNameEnd,

    #[error("Experiment name contains invalid character: '{0}'")]
    InvalidNameCharacter(char),

    #[error("Experiment name cannot contain consecutive hyphens")]
    ConsecutiveHyphens,

    #[error("Provider experiment ID cannot be empty")]
    EmptyProviderId,

    #[error("Provider experiment ID exceeds maximum length of {0} characters")]
    ProviderIdTooLong(usize),

    #[error("Provider experiment ID contains invalid character: '{0}'")]
    InvalidProviderIdCharacter(char),
}

/// Validate an experiment name
pub fn validate_experiment_name(name: &str) -> Result<(), NameValidationError> {
    if name.is_empty() {
        return Err(NameValidationError::EmptyName);
    }

    if name.len() > MAX_EXPERIMENT_NAME_LENGTH {
        return Err(NameValidationError::NameTooLong(
            MAX_EXPERIMENT_NAME_LENGTH,
        ));
    }

    let first_char = name.chars().next().unwrap();

    if !first_char.is_ascii_alphanumeric() {
        return Err(NameValidationError::InvalidNameStart);
    }

    let last_char = name.chars().last().unwrap();

    if !last_char.is_ascii_alphanumeric() {
        return Err(NameValidationError::InvalidNameEnd);
    }

    let mut prev_was_hyphen = false;

    for ch in name.chars() {
        if ch == '-' {
            if prev_was_hyphen {
                return Err(NameValidationError::ConsecutiveHyphens);
            }
            prev_was_hyphen = true;
        } else if ch.is_ascii_alphanumeric() {
            prev_was_hyphen = false;
        } else {
            return Err(NameValidationError::InvalidNameCharacter(ch));
        }
    }

    Ok(())
}

/// Validate a provider experiment ID
///
/// Provider-issued tokens are opaque and may carry hyphens and underscores
/// anywhere, so only the charset and length are checked.
pub fn validate_provider_experiment_id(id: &str) -> Result<(), NameValidationError> {
    if id.is_empty() {
        return Err(NameValidationError::EmptyProviderId);
    }

    if id.len() > MAX_PROVIDER_EXPERIMENT_ID_LENGTH {
        return Err(NameValidationError::ProviderIdTooLong(
            MAX_PROVIDER_EXPERIMENT_ID_LENGTH,
        ));
    }

    for ch in id.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '-' && ch != '_' {
            return Err(NameValidationError::InvalidProviderIdCharacter(ch));
        }
    }

    Ok(())
}
