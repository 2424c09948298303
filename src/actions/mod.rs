//! # Action abstractions.
//!
//! This module provides the core action-related types:
//! - [`Action`] - trait for units of work dispatched by the engine
//! - [`ActionFn`] - function-based action implementation
//! - [`ActionRef`] - shared reference to an action (`Arc<dyn Action>`)
//!
//! The engine never inspects an action's semantics; it only decides
//! *whether* and *when* one runs. Both plain closures ([`ActionFn`]) and
//! named-call styles (any other [`Action`] impl carrying its own
//! arguments) go through the same invocation abstraction.

mod action;
mod action_fn;

pub use action::{Action, ActionRef};
pub use action_fn::ActionFn;
