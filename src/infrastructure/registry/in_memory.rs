//! In-memory variation registry

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::RwLock;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::domain::experiment::ExperimentName;
use crate::domain::variation::{VariationResolver, VariationValue};
use crate::domain::VariationError;

/// A memoized accessor for a not-yet-settled variation
///
/// `Shared` does not run until first polled, so a factory registered through
/// it stays dormant until someone asks for the variation, runs once, and
/// replays its outcome (success or failure) to every waiter.
type SharedVariation = Shared<BoxFuture<'static, Result<VariationValue, VariationError>>>;

enum VariationSource {
    /// Immediate registrations are stored already resolved
    Ready(VariationValue),
    /// Deferred and factory registrations share one memoized accessor
    Deferred(SharedVariation),
}

impl fmt::Debug for VariationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Deferred(_) => f.debug_tuple("Deferred").field(&"..").finish(),
        }
    }
}

/// Process-wide map from experiment name to its variation source
///
/// Entries live for the registry's lifetime; re-registering a name replaces
/// the prior source (last write wins) with a warning.
#[derive(Debug)]
pub struct VariationRegistry {
    sources: RwLock<HashMap<ExperimentName, VariationSource>>,
}

impl Default for VariationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VariationRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry pre-populated with immediate variations
    pub fn with_variations(variations: Vec<(ExperimentName, VariationValue)>) -> Self {
        let sources = variations
            .into_iter()
            .map(|(name, value)| (name, VariationSource::Ready(value)))
            .collect();

        Self {
            sources: RwLock::new(sources),
        }
    }

    /// Register an immediate variation for `name`
    pub fn set_variation(
        &self,
        name: ExperimentName,
        value: impl Into<VariationValue>,
    ) -> Result<(), VariationError> {
        self.insert(name, VariationSource::Ready(value.into()))
    }

    /// Register a pending variation for `name`
    ///
    /// The future is stored as-is, with no timeout wrapper: if it never
    /// settles, consumers wait forever. Settlement policy belongs to the
    /// caller that produced the future.
    pub fn set_deferred_variation<Fut>(
        &self,
        name: ExperimentName,
        pending: Fut,
    ) -> Result<(), VariationError>
    where
        Fut: Future<Output = Result<VariationValue, VariationError>> + Send + 'static,
    {
        self.insert(name, VariationSource::Deferred(pending.boxed().shared()))
    }

    /// Register a lazily-invoked variation factory for `name`
    ///
    /// `compute` runs at most once, on the first `get_variation` for this
    /// registration, and its outcome is memoized for every later caller.
    pub fn set_variation_factory<F, Fut>(
        &self,
        name: ExperimentName,
        compute: F,
    ) -> Result<(), VariationError>
    where
        F: FnOnce(ExperimentName) -> Fut + Send + 'static,
        Fut: Future<Output = Result<VariationValue, VariationError>> + Send + 'static,
    {
        let factory_name = name.clone();
        let pending = async move { compute(factory_name).await }.boxed().shared();
        self.insert(name, VariationSource::Deferred(pending))
    }

    /// Resolve the variation registered under `name`
    ///
    /// Fails with [`VariationError::UnknownExperiment`] when nothing was
    /// registered; that failure is surfaced, not swallowed, so callers keep
    /// control of their fallback.
    pub async fn get_variation(
        &self,
        name: &ExperimentName,
    ) -> Result<VariationValue, VariationError> {
        let pending = {
            let sources = self.sources.read().map_err(|e| {
                VariationError::internal(format!("Failed to acquire read lock: {}", e))
            })?;

            match sources.get(name) {
                None => {
                    warn!(experiment = %name, "variation requested for unregistered experiment");
                    return Err(VariationError::unknown_experiment(name.as_str()));
                }
                Some(VariationSource::Ready(value)) => return Ok(value.clone()),
                Some(VariationSource::Deferred(pending)) => pending.clone(),
            }
        };

        pending.await
    }

    fn insert(&self, name: ExperimentName, source: VariationSource) -> Result<(), VariationError> {
        let mut sources = self.sources.write().map_err(|e| {
            VariationError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        if sources.insert(name.clone(), source).is_some() {
            warn!(experiment = %name, "overwriting registered variation source");
        } else {
            debug!(experiment = %name, "registered variation source");
        }

        Ok(())
    }
}

#[async_trait]
impl VariationResolver for VariationRegistry {
    async fn resolve(&self, name: &ExperimentName) -> Result<VariationValue, VariationError> {
        self.get_variation(name).await
    }
}
