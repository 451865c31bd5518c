//! Batched hit delivery for Measurement Protocol collectors.
//!
//! Events are encoded into percent-encoded hits, queued, and posted together
//! once a short debounce window has passed since the first hit of the window.
//!
//! # Example
//!
//! ```rust,ignore
//! use measurement::{AppInfo, Identifier, Params, Tracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), measurement::Error> {
//!     let tracker = Tracker::builder("UA-XXXX-Y", Identifier::anonymous())
//!         .app_info(AppInfo::new("My App").version("1.0"))
//!         .build()?;
//!
//!     tracker.track(&Params::new().set("t", "event").set("ec", "video").set("ea", "play"))?;
//!
//!     tracker.shutdown().await;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod dispatcher;
mod encode;
mod error;
mod hit;
mod queue;
mod scheduler;
mod transport;
mod types;

pub use client::Tracker;
pub use config::{
    locale_language, Config, DispatchMode, LogSink, TrackerBuilder, DEFAULT_DATA_SOURCE,
    DEFAULT_ENDPOINT, DEFAULT_FLUSH_DELAY, DEFAULT_TIMEOUT,
};
pub use dispatcher::Outcome;
pub use encode::encode_hit;
pub use error::Error;
pub use hit::{Batch, Hit};
pub use types::{
    AppInfo, CustomDimensions, DefaultContext, Identifier, Params, QueryItem, QueryItems,
    PROTOCOL_VERSION,
};
