//! Branch switches: the per-branch consumers of an experiment decision

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::ExperimentContext;
use crate::domain::VariationError;

/// Host attachment primitive for one branch's content
///
/// The host marks the content for deferred attachment at construction time;
/// `materialize` replaces the placeholder with the live content. Called at
/// most once per switch.
pub trait BranchContent: Send + Sync + Debug {
    fn materialize(&self);
}

/// One branch of an experiment
///
/// Declares its value as a string (configuration always arrives as text),
/// awaits the enclosing experiment's decision through its context, and
/// materializes its content exactly once when chosen. Mutual exclusion
/// between branches is a configuration invariant, not enforced here.
#[derive(Debug)]
pub struct VariationSwitch {
    declared: String,
    context: Arc<ExperimentContext>,
    content: Arc<dyn BranchContent>,
    materialized: AtomicBool,
}

impl VariationSwitch {
    pub fn new(
        declared: impl Into<String>,
        context: Arc<ExperimentContext>,
        content: Arc<dyn BranchContent>,
    ) -> Self {
        Self {
            declared: declared.into(),
            context,
            content,
            materialized: AtomicBool::new(false),
        }
    }

    /// The branch value this switch was configured with
    pub fn declared_value(&self) -> &str {
        &self.declared
    }

    /// Whether this switch has already attached its content
    pub fn is_materialized(&self) -> bool {
        self.materialized.load(Ordering::SeqCst)
    }

    /// Await the experiment decision and materialize when chosen
    ///
    /// Returns whether this branch is the chosen one. Repeated calls after a
    /// match do not attach the content again.
    pub async fn run(&self) -> Result<bool, VariationError> {
        let chosen = self.context.variation().await?;

        if !chosen.matches_declared(&self.declared) {
            debug!(declared = %self.declared, chosen = %chosen, "branch not chosen");
            return Ok(false);
        }

        if self.materialized.swap(true, Ordering::SeqCst) {
            return Ok(true);
        }

        debug!(declared = %self.declared, "materializing chosen branch");
        self.content.materialize();
        Ok(true)
    }
}
