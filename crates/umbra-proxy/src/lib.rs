//! Umbra Proxy - Rotating proxy pool with health-based cooldown.
//!
//! This crate owns the set of configured proxy endpoints and hands out a
//! candidate proxy per probe attempt, keeping recently-failed proxies out of
//! rotation for a cooldown window. The pool is process-wide shared state:
//! every concurrent probe task, across all scan sessions, reads and mutates
//! the same health bookkeeping.
//!
//! # Rotation
//!
//! Two modes are supported:
//!
//! - `round-robin`: cycles through entries in insertion order, skipping
//!   entries currently in cooldown
//! - `random-healthy`: uniform random choice among entries not in cooldown
//!
//! If every entry is in cooldown, [`ProxyPool::next_proxy`] returns `None`
//! and the caller decides between direct fallback and a hard failure.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use umbra_core::ProxyConfig;
//! use umbra_proxy::ProxyPool;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProxyConfig {
//!     enabled: true,
//!     endpoints: vec!["http://127.0.0.1:3128".to_string()],
//!     ..ProxyConfig::default()
//! };
//! let pool = ProxyPool::from_config(&config, Duration::from_secs(5), "umbra/0.1")?;
//!
//! if let Some(lease) = pool.next_proxy() {
//!     // ...issue the request through lease.client, then:
//!     pool.report_success(&lease.id);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod pool;

// Re-export commonly used types
pub use error::{ProxyError, Result};
pub use pool::{PoolSnapshot, ProxyLease, ProxyPool, ProxySnapshot};
