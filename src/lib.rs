//! PMP Variation Engine
//!
//! Resolves which variation (branch) a visitor was assigned for an
//! experiment and exposes that decision so only the chosen branch renders:
//! - Local registry of immediate, deferred, and lazily-computed variation sources
//! - Bridge to an external variation provider reachable only through an
//!   isolated execution context, with caching, single-flight de-duplication,
//!   and degraded-mode fallback when the provider is blocked
//! - Two-phase experiment/branch coordination with a fail-open default policy

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::EngineConfig;

use std::sync::Arc;

use domain::{
    BranchContent, ExperimentContext, ExperimentName, FallbackPolicy, ProviderExperimentId,
    ProviderScriptLoader, VariationError, VariationResolver, VariationSwitch, VariationValue,
};
use infrastructure::{
    bridge::VariationBridge, provider::HttpScriptLoader, registry::VariationRegistry,
};
use tracing::info;

/// One engine per page/session: the variation registry, the provider bridge,
/// and the fallback policy handed to every experiment context
///
/// Must be constructed inside a tokio runtime; the bridge runs its decision
/// port as a background task. Resolution caches are never evicted, so hosts
/// that outlive a session should build one engine per session.
#[derive(Debug)]
pub struct VariationEngine {
    registry: Arc<VariationRegistry>,
    bridge: Arc<VariationBridge>,
    policy: FallbackPolicy,
    default_variation: VariationValue,
}

impl VariationEngine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// Create an engine with custom configuration
    pub fn with_config(config: &EngineConfig) -> Self {
        let loader = Arc::new(HttpScriptLoader::with_timeout(
            config.provider.script_url.clone(),
            config.provider.request_timeout(),
        ));
        Self::with_loader(config, loader)
    }

    /// Create an engine with a custom provider script loader
    pub fn with_loader(config: &EngineConfig, loader: Arc<dyn ProviderScriptLoader>) -> Self {
        let registry = Arc::new(VariationRegistry::new());
        let bridge = Arc::new(VariationBridge::new(loader));

        let policy = if config.resolution.strict {
            FallbackPolicy::Strict
        } else {
            FallbackPolicy::fail_open(config.resolution.fallback_variation.clone())
        };

        info!(
            script_url = %config.provider.script_url,
            strict = config.resolution.strict,
            "variation engine initialized"
        );

        Self {
            registry,
            bridge,
            policy,
            default_variation: config.resolution.fallback_variation.clone(),
        }
    }

    /// The local variation registry
    pub fn registry(&self) -> &Arc<VariationRegistry> {
        &self.registry
    }

    /// The provider bridge
    pub fn bridge(&self) -> &Arc<VariationBridge> {
        &self.bridge
    }

    /// Link a registry name to a provider-resolved experiment
    ///
    /// Registers a factory, so no provider request starts until the first
    /// consumer asks; the configured fallback variation doubles as the
    /// bridge default when the provider is blocked.
    pub fn register_provider_experiment(
        &self,
        name: ExperimentName,
        id: ProviderExperimentId,
    ) -> Result<(), VariationError> {
        self.register_provider_experiment_with_default(name, id, self.default_variation.clone())
    }

    /// Link a registry name to a provider-resolved experiment with an
    /// explicit default variation
    pub fn register_provider_experiment_with_default(
        &self,
        name: ExperimentName,
        id: ProviderExperimentId,
        default: VariationValue,
    ) -> Result<(), VariationError> {
        let bridge = Arc::clone(&self.bridge);
        self.registry
            .set_variation_factory(name, move |_| async move {
                bridge.get_variation(&id, default).await
            })
    }

    /// Create the coordinator for one experiment instance
    pub fn experiment_context(&self) -> Arc<ExperimentContext> {
        Arc::new(ExperimentContext::with_policy(
            Arc::clone(&self.registry) as Arc<dyn VariationResolver>,
            self.policy.clone(),
        ))
    }

    /// Create a branch switch bound to `context`
    pub fn variation_switch(
        &self,
        declared: impl Into<String>,
        context: Arc<ExperimentContext>,
        content: Arc<dyn BranchContent>,
    ) -> VariationSwitch {
        VariationSwitch::new(declared, context, content)
    }
}

impl Default for VariationEngine {
    fn default() -> Self {
        Self::new()
    }
}
