//! Umbra Scanner - Concurrent handle probing with streamed results.
//!
//! This crate turns one handle and the platform catalog into N independent
//! HTTP probes, runs them under a shared concurrency cap with optional proxy
//! rotation and retry/backoff, classifies every response into a small status
//! taxonomy, and streams outcomes to the consumer as they complete - followed
//! by exactly one terminal summary event.
//!
//! # Features
//!
//! - Bounded fan-out: at most K probes in flight per scan (default 8)
//! - Proxy-aware dispatch with jittered exponential backoff on proxy failure
//! - One terminal outcome per platform, never one per retry
//! - Completion-ordered streaming: fast sites surface first
//! - Cancellation that stops delivery without aborting in-flight requests
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use umbra_core::Handle;
//! use umbra_scanner::{ScanEngine, ScanEvent, ScannerSettings};
//!
//! let engine = ScanEngine::new(registry, proxy_pool, ScannerSettings::default())?;
//! let handle = Handle::new("alice")?;
//!
//! let mut stream = engine.start_scan(&handle, None)?;
//! while let Some(event) = stream.next_event().await {
//!     match event {
//!         ScanEvent::SiteResult(outcome) => println!("{}: {:?}", outcome.site, outcome.state),
//!         ScanEvent::SearchComplete { summary, .. } => {
//!             println!("{}/{} found", summary.found_count, summary.total);
//!         }
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod classify;
pub mod dispatcher;
pub mod error;
#[allow(missing_docs)]
pub mod extract;
pub mod outcome;
pub mod session;
pub mod target;
#[allow(missing_docs)]
pub mod url_builder;

// Re-export commonly used types
pub use dispatcher::{ScanEngine, ScannerSettings};
pub use error::{Result, ScanError};
pub use extract::ProfileDetails;
pub use outcome::{ProbeOutcome, ProbeStatus, ScanEvent, ScanReport, ScanSummary};
pub use session::{ScanStream, SessionState};
pub use target::ProbeTarget;
pub use url_builder::build_probe_url;
