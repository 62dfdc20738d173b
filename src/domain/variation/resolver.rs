use async_trait::async_trait;
use std::fmt::Debug;

use super::VariationValue;
use crate::domain::experiment::ExperimentName;
use crate::domain::VariationError;

/// Trait for resolving which variation was chosen for a named experiment
#[async_trait]
pub trait VariationResolver: Send + Sync + Debug {
    /// Resolve the variation for `name`
    ///
    /// Fails with [`VariationError::UnknownExperiment`] when no source was
    /// registered under `name`; callers decide whether to fall back.
    async fn resolve(&self, name: &ExperimentName) -> Result<VariationValue, VariationError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    #[derive(Debug)]
    pub struct MockVariationResolver {
        variations: RwLock<HashMap<ExperimentName, VariationValue>>,
        error: RwLock<Option<VariationError>>,
    }

    impl MockVariationResolver {
        pub fn new() -> Self {
            Self {
                variations: RwLock::new(HashMap::new()),
                error: RwLock::new(None),
            }
        }

        pub fn with_variation(self, name: ExperimentName, value: VariationValue) -> Self {
            self.variations.write().unwrap().insert(name, value);
            self
        }

        pub fn with_error(self, error: VariationError) -> Self {
            *self.error.write().unwrap() = Some(error);
            self
        }
    }

    impl Default for MockVariationResolver {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl VariationResolver for MockVariationResolver {
        async fn resolve(&self, name: &ExperimentName) -> Result<VariationValue, VariationError> {
            if let Some(error) = self.error.read().unwrap().clone() {
                return Err(error);
            }

            self.variations
                .read()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| VariationError::unknown_experiment(name.as_str()))
        }
    }
}
