//! Event subscribers and fan-out delivery.
//!
//! This module provides the observability extension point:
//! - [`Subscribe`] - trait for plugging custom event handlers into the runtime
//! - [`SubscriberSet`] - non-blocking fan-out with per-subscriber queues
//! - `LogWriter` - stdout demo subscriber (feature `logging`)

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
