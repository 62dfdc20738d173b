//! Variation values and the declared-branch coercion rule

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved variation: the branch a visitor was assigned for an experiment
///
/// Provider-sourced variations are numeric indices; locally registered ones
/// may be arbitrary strings. No canonical type is enforced at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariationValue {
    Number(f64),
    Text(String),
}

impl VariationValue {
    /// Compare against a branch's declared value (always configured as a string).
    ///
    /// If the chosen variation is a finite number, the declared string is
    /// parsed to a number first; otherwise plain string equality applies.
    /// A blank declared value coerces to zero and so matches the control
    /// variation. Any other declared string that fails to parse never matches
    /// a numeric value, and non-finite numbers match nothing.
    pub fn matches_declared(&self, declared: &str) -> bool {
        match self {
            Self::Number(chosen) => {
                if !chosen.is_finite() {
                    return false;
                }
                let declared = declared.trim();
                if declared.is_empty() {
                    return *chosen == 0.0;
                }
                match declared.parse::<f64>() {
                    Ok(parsed) => parsed == *chosen,
                    Err(_) => false,
                }
            }
            Self::Text(chosen) => chosen == declared,
        }
    }
}

impl Default for VariationValue {
    /// The control branch
    fn default() -> Self {
        Self::Number(0.0)
    }
}

impl From<f64> for VariationValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for VariationValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for VariationValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for VariationValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for VariationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}
