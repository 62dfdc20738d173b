use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::experiment::ProviderExperimentId;
use crate::domain::variation::VariationValue;
use crate::domain::VariationError;

/// Handle onto the external provider's client script, once loaded
///
/// The provider is third-party code that may be blocked or replaced by an
/// inert stub; implementations must report that as `Ok(None)` or a
/// [`VariationError::Provider`], never panic.
#[async_trait]
pub trait ProviderClient: Send + Sync + Debug {
    /// In-context query: which variation did the provider choose for the
    /// experiment this client was loaded for?
    ///
    /// `Ok(None)` models a script that loaded but answered with nothing
    /// usable; callers substitute their default.
    async fn choose_variation(&self) -> Result<Option<VariationValue>, VariationError>;

    /// Host-context query for the variation already chosen for `id`
    ///
    /// Issued by the hydration step so the provider associates its tracking
    /// state with the host session.
    async fn chosen_variation(
        &self,
        id: &ProviderExperimentId,
    ) -> Result<Option<VariationValue>, VariationError>;
}

/// Trait for loading the provider's client script scoped to one experiment
#[async_trait]
pub trait ProviderScriptLoader: Send + Sync + Debug {
    /// Fetch and install the provider client for `id`
    async fn load(
        &self,
        id: &ProviderExperimentId,
    ) -> Result<Arc<dyn ProviderClient>, VariationError>;

    /// Get loader name for logging/debugging
    fn loader_name(&self) -> &'static str;
}
