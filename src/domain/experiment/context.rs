//! Per-experiment coordination between the enclosing experiment and its
//! branch consumers
//!
//! Consumers may ask "what variation was chosen for my experiment" before the
//! experiment's own name has been recorded. [`NameCell`] makes that ordering
//! explicit: a single-assignment cell with a waiter list instead of reliance
//! on setup-phase ordering.

use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::debug;

use super::ExperimentName;
use crate::domain::variation::{VariationResolver, VariationValue};
use crate::domain::VariationError;

// ============================================================================
// NameCell
// ============================================================================

#[derive(Debug)]
enum NameState {
    Unset {
        waiters: Vec<oneshot::Sender<ExperimentName>>,
    },
    Set(ExperimentName),
}

/// Single-assignment cell for an experiment name
///
/// `set` fulfills every waiter, current and future. A second `set` is
/// rejected so consumers can never observe two different names.
#[derive(Debug)]
pub struct NameCell {
    state: Mutex<NameState>,
}

impl NameCell {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NameState::Unset {
                waiters: Vec::new(),
            }),
        }
    }

    /// Record the name, waking all current waiters
    pub fn set(&self, name: ExperimentName) -> Result<(), VariationError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| VariationError::internal(format!("Failed to acquire name lock: {}", e)))?;

        match &mut *state {
            NameState::Set(existing) => Err(VariationError::name_already_set(existing.as_str())),
            NameState::Unset { waiters } => {
                let waiters = std::mem::take(waiters);
                *state = NameState::Set(name.clone());
                drop(state);

                for waiter in waiters {
                    // A dropped receiver only means that caller lost interest
                    let _ = waiter.send(name.clone());
                }

                Ok(())
            }
        }
    }

    /// Wait for the name; completes immediately once set
    pub async fn wait(&self) -> Result<ExperimentName, VariationError> {
        let receiver = {
            let mut state = self.state.lock().map_err(|e| {
                VariationError::internal(format!("Failed to acquire name lock: {}", e))
            })?;

            match &mut *state {
                NameState::Set(name) => return Ok(name.clone()),
                NameState::Unset { waiters } => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    receiver
                }
            }
        };

        receiver
            .await
            .map_err(|_| VariationError::internal("Experiment name cell dropped before set"))
    }
}

impl Default for NameCell {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FallbackPolicy
// ============================================================================

/// How resolution failures surface to branch consumers
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackPolicy {
    /// Swallow the failure and hand consumers `fallback` (the control branch
    /// unless overridden), so downstream UI never observes a broken lookup
    FailOpen { fallback: VariationValue },
    /// Surface failures to the consumer
    Strict,
}

impl FallbackPolicy {
    pub fn fail_open(fallback: VariationValue) -> Self {
        Self::FailOpen { fallback }
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::FailOpen {
            fallback: VariationValue::default(),
        }
    }
}

// ============================================================================
// ExperimentContext
// ============================================================================

/// Coordinator created per experiment instance
///
/// The name arrives after construction, via [`ExperimentContext::set_name`];
/// any number of branch consumers call [`ExperimentContext::variation`]
/// before or after that happens.
#[derive(Debug)]
pub struct ExperimentContext {
    resolver: Arc<dyn VariationResolver>,
    name: NameCell,
    policy: FallbackPolicy,
}

impl ExperimentContext {
    pub fn new(resolver: Arc<dyn VariationResolver>) -> Self {
        Self::with_policy(resolver, FallbackPolicy::default())
    }

    pub fn with_policy(resolver: Arc<dyn VariationResolver>, policy: FallbackPolicy) -> Self {
        Self {
            resolver,
            name: NameCell::new(),
            policy,
        }
    }

    /// Record the enclosing experiment's name; at most once
    pub fn set_name(&self, name: ExperimentName) -> Result<(), VariationError> {
        self.name.set(name)
    }

    /// Wait for the experiment name, then resolve its variation
    ///
    /// Under [`FallbackPolicy::FailOpen`] every failure in the chain maps to
    /// the fallback value; under [`FallbackPolicy::Strict`] it surfaces.
    pub async fn variation(&self) -> Result<VariationValue, VariationError> {
        match self.resolve_variation().await {
            Ok(value) => Ok(value),
            Err(error) => match &self.policy {
                FallbackPolicy::FailOpen { fallback } => {
                    debug!(error = %error, fallback = %fallback, "variation lookup failed, using fallback");
                    Ok(fallback.clone())
                }
                FallbackPolicy::Strict => Err(error),
            },
        }
    }

    async fn resolve_variation(&self) -> Result<VariationValue, VariationError> {
        let name = self.name.wait().await?;
        self.resolver.resolve(&name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::variation::MockVariationResolver;

    fn name(raw: &str) -> ExperimentName {
        ExperimentName::new(raw).unwrap()
    }

    mod name_cell_tests {
        use super::*;

        #[tokio::test]
        async fn test_wait_after_set_completes_immediately() {
            let cell = NameCell::new();
            cell.set(name("exp1")).unwrap();

            let resolved = cell.wait().await.unwrap();
            assert_eq!(resolved.as_str(), "exp1");
        }

        #[tokio::test]
        async fn test_waiters_before_set_are_woken() {
            let cell = Arc::new(NameCell::new());

            let first = tokio::spawn({
                let cell = Arc::clone(&cell);
                async move { cell.wait().await }
            });
            let second = tokio::spawn({
                let cell = Arc::clone(&cell);
                async move { cell.wait().await }
            });

            tokio::task::yield_now().await;
            cell.set(name("exp1")).unwrap();

            assert_eq!(first.await.unwrap().unwrap().as_str(), "exp1");
            assert_eq!(second.await.unwrap().unwrap().as_str(), "exp1");
        }

        #[tokio::test]
        async fn test_second_set_is_rejected() {
            let cell = NameCell::new();
            cell.set(name("exp1")).unwrap();

            let error = cell.set(name("exp2")).unwrap_err();
            assert!(matches!(
                error,
                VariationError::NameAlreadySet { name } if name == "exp1"
            ));
        }
    }

    mod context_tests {
        use super::*;

        #[tokio::test]
        async fn test_variation_after_name_set() {
            let resolver = Arc::new(
                MockVariationResolver::new()
                    .with_variation(name("exp1"), VariationValue::Number(1.0)),
            );
            let context = ExperimentContext::new(resolver);

            context.set_name(name("exp1")).unwrap();
            let chosen = context.variation().await.unwrap();
            assert_eq!(chosen, VariationValue::Number(1.0));
        }

        #[tokio::test]
        async fn test_variation_awaits_late_name() {
            let resolver = Arc::new(
                MockVariationResolver::new()
                    .with_variation(name("exp1"), VariationValue::Number(2.0)),
            );
            let context = Arc::new(ExperimentContext::new(resolver));

            let pending = tokio::spawn({
                let context = Arc::clone(&context);
                async move { context.variation().await }
            });

            tokio::task::yield_now().await;
            context.set_name(name("exp1")).unwrap();

            assert_eq!(
                pending.await.unwrap().unwrap(),
                VariationValue::Number(2.0)
            );
        }

        #[tokio::test]
        async fn test_fail_open_maps_errors_to_fallback() {
            let resolver = Arc::new(MockVariationResolver::new());
            let context = ExperimentContext::new(resolver);

            context.set_name(name("missing")).unwrap();
            let chosen = context.variation().await.unwrap();
            assert_eq!(chosen, VariationValue::Number(0.0));
        }

        #[tokio::test]
        async fn test_fail_open_uses_configured_fallback() {
            let resolver = Arc::new(
                MockVariationResolver::new()
                    .with_error(VariationError::provider("blocked")),
            );
            let context = ExperimentContext::with_policy(
                resolver,
                FallbackPolicy::fail_open(VariationValue::Number(3.0)),
            );

            context.set_name(name("exp1")).unwrap();
            assert_eq!(
                context.variation().await.unwrap(),
                VariationValue::Number(3.0)
            );
        }

        #[tokio::test]
        async fn test_strict_surfaces_errors() {
            let resolver = Arc::new(MockVariationResolver::new());
            let context =
                ExperimentContext::with_policy(resolver, FallbackPolicy::Strict);

            context.set_name(name("missing")).unwrap();
            let error = context.variation().await.unwrap_err();
            assert!(matches!(error, VariationError::UnknownExperiment { .. }));
        }
    }
}
