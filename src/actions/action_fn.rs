//! # Function-backed action (`ActionFn`)
//!
//! [`ActionFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future
//! per dispatch. This avoids shared mutable state between runs; if runs
//! need common state, move an `Arc<...>` into the closure explicitly.
//!
//! ## Example
//! ```rust
//! use burstgate::{ActionFn, ActionRef, ActionError};
//!
//! let a: ActionRef = ActionFn::arc(|| async {
//!     // do work...
//!     Ok::<_, ActionError>(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::actions::action::Action;
use crate::error::ActionError;

/// Function-backed action implementation.
///
/// Wraps a closure that *creates* a new future per dispatch.
#[derive(Debug)]
pub struct ActionFn<F> {
    f: F,
}

impl<F> ActionFn<F> {
    /// Creates a new function-backed action.
    ///
    /// Prefer [`ActionFn::arc`] when you immediately need an
    /// [`ActionRef`](crate::ActionRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the action and returns it as a shared handle (`Arc<Self>`).
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Action for ActionFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    async fn run(&self) -> Result<(), ActionError> {
        (self.f)().await
    }
}
