//! Runtime events and the broadcast bus that carries them.
//!
//! This module provides the observability backbone of the engine:
//! - [`Event`] / [`EventKind`] - what happened, with builder-style metadata
//! - [`Bus`] - non-blocking broadcast channel shared by the engine and workers

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
