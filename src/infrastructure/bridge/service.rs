//! Bridge to the external variation provider
//!
//! The provider can only be queried from an isolated execution context that
//! reports back asynchronously. The bridge owns the per-experiment resolution
//! entries (pending waiters or the settled value), de-duplicates in-flight
//! requests so one context serves every concurrent caller, and runs the
//! host-context hydration step after each decision before waking waiters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::domain::experiment::ProviderExperimentId;
use crate::domain::provider::ProviderScriptLoader;
use crate::domain::variation::VariationValue;
use crate::domain::VariationError;

/// Per-experiment resolution state, kept for the bridge's lifetime
///
/// `Failed` is terminal like `Resolved`: it carries the default the isolated
/// context substituted, and later callers get that value without a retry.
#[derive(Debug)]
enum ResolutionEntry {
    Pending {
        waiters: Vec<oneshot::Sender<VariationValue>>,
    },
    Resolved(VariationValue),
    Failed(VariationValue),
}

/// Outcome reported by an isolated context through the decision port
#[derive(Debug)]
enum DecisionOutcome {
    /// The provider answered with a usable variation
    Chosen(VariationValue),
    /// The provider was absent or inert; the caller's default was substituted
    Fallback(VariationValue),
}

#[derive(Debug)]
struct Decision {
    id: ProviderExperimentId,
    outcome: DecisionOutcome,
}

type EntryMap = Arc<Mutex<HashMap<ProviderExperimentId, ResolutionEntry>>>;

/// Resolves variations through the external provider with caching and
/// single-flight de-duplication
///
/// Must be constructed inside a tokio runtime: the decision port receiver
/// runs as a background task for the bridge's lifetime.
#[derive(Debug)]
pub struct VariationBridge {
    entries: EntryMap,
    loader: Arc<dyn ProviderScriptLoader>,
    port: mpsc::UnboundedSender<Decision>,
}

impl VariationBridge {
    pub fn new(loader: Arc<dyn ProviderScriptLoader>) -> Self {
        let entries: EntryMap = Arc::new(Mutex::new(HashMap::new()));
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_decision_port(
            receiver,
            Arc::clone(&entries),
            Arc::clone(&loader),
        ));

        Self {
            entries,
            loader,
            port: sender,
        }
    }

    /// Resolve the variation for `id`, falling back to `default` when the
    /// provider is blocked or inert
    ///
    /// The first caller for an `id` opens an isolated context; callers that
    /// arrive while it is in flight share the same resolution. Once settled,
    /// the outcome is cached for the bridge's lifetime and `default` from
    /// later calls is ignored.
    pub async fn get_variation(
        &self,
        id: &ProviderExperimentId,
        default: VariationValue,
    ) -> Result<VariationValue, VariationError> {
        let (receiver, start_resolution) = {
            let mut entries = self.entries.lock().map_err(|e| {
                VariationError::internal(format!("Failed to acquire entries lock: {}", e))
            })?;

            match entries.get_mut(id) {
                Some(ResolutionEntry::Resolved(value)) => {
                    debug!(experiment_id = %id, variation = %value, "resolved variation cache hit");
                    return Ok(value.clone());
                }
                Some(ResolutionEntry::Failed(value)) => {
                    debug!(experiment_id = %id, variation = %value, "returning cached fallback variation");
                    return Ok(value.clone());
                }
                Some(ResolutionEntry::Pending { waiters }) => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    debug!(experiment_id = %id, "joining in-flight resolution");
                    (receiver, false)
                }
                None => {
                    let (sender, receiver) = oneshot::channel();
                    entries.insert(
                        id.clone(),
                        ResolutionEntry::Pending {
                            waiters: vec![sender],
                        },
                    );
                    (receiver, true)
                }
            }
        };

        if start_resolution {
            self.spawn_isolated_context(id.clone(), default);
        }

        receiver
            .await
            .map_err(|_| VariationError::internal("Resolution abandoned before completion"))
    }

    /// Spawn the isolated context that queries the provider for `id`
    ///
    /// The context always reports an outcome through the decision port, even
    /// when the provider script never loads.
    fn spawn_isolated_context(&self, id: ProviderExperimentId, default: VariationValue) {
        debug!(experiment_id = %id, loader = self.loader.loader_name(), "opening isolated context");

        let loader = Arc::clone(&self.loader);
        let port = self.port.clone();

        tokio::spawn(async move {
            let outcome = match loader.load(&id).await {
                Ok(client) => match client.choose_variation().await {
                    Ok(Some(value)) => DecisionOutcome::Chosen(value),
                    Ok(None) => {
                        debug!(experiment_id = %id, "provider answered nothing usable, using default");
                        DecisionOutcome::Fallback(default)
                    }
                    Err(error) => {
                        debug!(experiment_id = %id, error = %error, "provider query failed, using default");
                        DecisionOutcome::Fallback(default)
                    }
                },
                Err(error) => {
                    debug!(experiment_id = %id, error = %error, "provider script unavailable in isolated context");
                    DecisionOutcome::Fallback(default)
                }
            };

            if port.send(Decision { id, outcome }).is_err() {
                warn!("decision port closed before outcome could be reported");
            }
        });
    }

    /// Receive decisions for the bridge's lifetime
    ///
    /// Recording the settled state happens inline so a decision for one
    /// experiment is never reordered behind another's hydration; hydration
    /// and waiter fan-out run on their own task per decision.
    async fn run_decision_port(
        mut receiver: mpsc::UnboundedReceiver<Decision>,
        entries: EntryMap,
        loader: Arc<dyn ProviderScriptLoader>,
    ) {
        while let Some(Decision { id, outcome }) = receiver.recv().await {
            let (value, waiters) = {
                let mut entries = match entries.lock() {
                    Ok(guard) => guard,
                    Err(error) => {
                        warn!(experiment_id = %id, error = %error, "entries lock poisoned, dropping decision");
                        continue;
                    }
                };

                let Some(entry) = entries.get_mut(&id) else {
                    warn!(experiment_id = %id, "decision received for unknown resolution");
                    continue;
                };

                match entry {
                    ResolutionEntry::Pending { waiters } => {
                        let waiters = std::mem::take(waiters);
                        let (value, settled) = match outcome {
                            DecisionOutcome::Chosen(value) => {
                                (value.clone(), ResolutionEntry::Resolved(value))
                            }
                            DecisionOutcome::Fallback(value) => {
                                (value.clone(), ResolutionEntry::Failed(value))
                            }
                        };
                        *entry = settled;
                        debug!(experiment_id = %id, variation = %value, "provider decision recorded");
                        (value, waiters)
                    }
                    _ => {
                        warn!(experiment_id = %id, "duplicate decision ignored");
                        continue;
                    }
                }
            };

            tokio::spawn(Self::finish_resolution(
                Arc::clone(&loader),
                id,
                value,
                waiters,
            ));
        }
    }

    /// Hydrate the host context, then wake every waiter with the decision
    async fn finish_resolution(
        loader: Arc<dyn ProviderScriptLoader>,
        id: ProviderExperimentId,
        value: VariationValue,
        waiters: Vec<oneshot::Sender<VariationValue>>,
    ) {
        Self::hydrate(loader.as_ref(), &id).await;

        for waiter in waiters {
            // A dropped receiver only means that caller lost interest
            let _ = waiter.send(value.clone());
        }
    }

    /// Re-request the provider in the host context and query the chosen
    /// variation, so the provider ties its tracking state to this session
    ///
    /// Best-effort: the decision is already recorded, so every failure here
    /// is swallowed.
    async fn hydrate(loader: &dyn ProviderScriptLoader, id: &ProviderExperimentId) {
        match loader.load(id).await {
            Ok(client) => {
                if let Err(error) = client.chosen_variation(id).await {
                    debug!(experiment_id = %id, error = %error, "hydration query failed");
                }
            }
            Err(error) => {
                debug!(experiment_id = %id, error = %error, "provider script unavailable for hydration");
            }
        }
    }
}
