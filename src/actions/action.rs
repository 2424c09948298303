//! # Action trait and shared handle type.
//!
//! Defines [`Action`] the async unit of work the engine dispatches, and
//! [`ActionRef`], an `Arc<dyn Action>` suitable for sharing across the
//! runtime.
//!
//! Actions are fire-and-forget: the engine starts them, never retries
//! them, and surfaces their outcome only on the event bus.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;

/// Shared reference to an action.
pub type ActionRef = Arc<dyn Action>;

/// # Asynchronous, fire-and-forget unit of work.
///
/// An `Action` is dispatched by the engine when a coalescing window
/// decides it should run. Executions for the same key never overlap;
/// executions across different keys run concurrently.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use burstgate::{Action, ActionError};
///
/// /// Named-call style: the action carries its own arguments.
/// struct Reindex { shard: u32 }
///
/// #[async_trait]
/// impl Action for Reindex {
///     async fn run(&self) -> Result<(), ActionError> {
///         let _ = self.shard;
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Action: Send + Sync + 'static {
    /// Executes the action until completion.
    ///
    /// Errors are isolated to this run: they are published as
    /// `ActionFailed` events and never corrupt engine state or block
    /// future dispatches for the same key.
    async fn run(&self) -> Result<(), ActionError>;
}
