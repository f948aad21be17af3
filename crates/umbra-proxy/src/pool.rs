//! Rotating proxy pool with per-entry health tracking.

use crate::error::{ProxyError, Result};
use rand::Rng;
use reqwest::{Client, Proxy};
use serde::Serialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use umbra_core::{ProxyConfig, RotationMode};

/// One configured proxy endpoint with mutable health state.
///
/// Entries are created at pool start and never removed during a session;
/// health is the only thing that changes. An entry is eligible for rotation
/// when it has no recorded failure or its cooldown window has elapsed. The
/// failure timestamp is retained rather than cleared, so a successful retry
/// does not shorten an active cooldown.
struct ProxyEntry {
    id: String,
    url: String,
    client: Client,
    last_failure: Option<Instant>,
    success_count: u64,
    failure_count: u64,
}

impl ProxyEntry {
    fn eligible(&self, cooldown: Duration) -> bool {
        self.last_failure.map_or(true, |t| t.elapsed() >= cooldown)
    }
}

/// A proxy handed out for one probe attempt.
///
/// Carries a clone of the entry's preconfigured HTTP client; the caller
/// reports the outcome back to the pool via [`ProxyPool::report_success`]
/// or [`ProxyPool::report_failure`] using the lease `id`.
#[derive(Clone)]
pub struct ProxyLease {
    /// Pool-assigned identifier (`proxy-1`, `proxy-2`, ...)
    pub id: String,
    /// Proxy endpoint URL
    pub url: String,
    /// HTTP client routed through this proxy
    pub client: Client,
}

struct PoolInner {
    entries: Vec<ProxyEntry>,
    cursor: usize,
}

/// Process-wide rotating proxy pool.
///
/// All health state lives behind one mutex; two probe tasks reporting on the
/// same proxy at the same time serialize on it. An empty endpoint list (or
/// `enabled = false` in configuration) yields a disabled pool: every
/// downstream request goes direct.
pub struct ProxyPool {
    inner: Mutex<PoolInner>,
    rotation: RotationMode,
    cooldown: Duration,
    allow_direct_fallback: bool,
    enabled: bool,
}

impl std::fmt::Debug for ProxyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyPool")
            .field("cooldown", &self.cooldown)
            .field("allow_direct_fallback", &self.allow_direct_fallback)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl ProxyPool {
    /// Build a pool from configuration, constructing one HTTP client per
    /// endpoint.
    ///
    /// Clients are preconfigured with the proxy route, the probe timeout,
    /// the scanner user agent, and a no-follow redirect policy (the scanner
    /// classifies redirects itself).
    ///
    /// # Errors
    /// Returns error if an endpoint cannot be parsed or a client cannot be
    /// built.
    pub fn from_config(
        config: &ProxyConfig,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(config.endpoints.len());

        for (idx, endpoint) in config.endpoints.iter().enumerate() {
            let proxy = Proxy::all(endpoint).map_err(|source| ProxyError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                source,
            })?;

            let client = Client::builder()
                .proxy(proxy)
                .timeout(timeout)
                .user_agent(user_agent)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .map_err(|source| ProxyError::ClientBuild {
                    endpoint: endpoint.clone(),
                    source,
                })?;

            entries.push(ProxyEntry {
                id: format!("proxy-{}", idx + 1),
                url: endpoint.clone(),
                client,
                last_failure: None,
                success_count: 0,
                failure_count: 0,
            });
        }

        let enabled = config.enabled && !entries.is_empty();
        if config.enabled && entries.is_empty() {
            warn!("proxying enabled but no endpoints configured, pool disabled");
        }
        if enabled {
            info!(
                count = entries.len(),
                rotation = ?config.rotation,
                cooldown_secs = config.cooldown_secs,
                "proxy pool configured"
            );
        }

        Ok(Self {
            inner: Mutex::new(PoolInner { entries, cursor: 0 }),
            rotation: config.rotation,
            cooldown: Duration::from_secs(config.cooldown_secs),
            allow_direct_fallback: config.allow_direct_fallback,
            enabled,
        })
    }

    /// Create an explicitly disabled pool (all probes go direct).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                entries: Vec::new(),
                cursor: 0,
            }),
            rotation: RotationMode::RoundRobin,
            cooldown: Duration::ZERO,
            allow_direct_fallback: true,
            enabled: false,
        }
    }

    /// Override the cooldown window.
    ///
    /// Configuration expresses cooldown in whole seconds; this builder hook
    /// accepts arbitrary durations for callers that need finer control.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Whether probes should be routed through this pool at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a probe may go direct when no healthy proxy is available.
    #[must_use]
    pub fn allow_direct_fallback(&self) -> bool {
        self.allow_direct_fallback
    }

    /// Number of configured entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("acquire proxy pool lock").entries.len()
    }

    /// Whether the pool has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand out the next candidate proxy according to the rotation mode.
    ///
    /// Returns `None` when the pool is disabled or every entry is in
    /// cooldown; the caller then either falls back to a direct request (if
    /// allowed) or fails the attempt.
    #[must_use]
    pub fn next_proxy(&self) -> Option<ProxyLease> {
        if !self.enabled {
            return None;
        }

        let mut inner = self.inner.lock().expect("acquire proxy pool lock");
        let len = inner.entries.len();
        if len == 0 {
            return None;
        }

        let idx = match self.rotation {
            RotationMode::RoundRobin => {
                let start = inner.cursor;
                (0..len)
                    .map(|offset| (start + offset) % len)
                    .find(|&idx| inner.entries[idx].eligible(self.cooldown))?
            }
            RotationMode::RandomHealthy => {
                let healthy: Vec<usize> = (0..len)
                    .filter(|&idx| inner.entries[idx].eligible(self.cooldown))
                    .collect();
                if healthy.is_empty() {
                    return None;
                }
                healthy[rand::thread_rng().gen_range(0..healthy.len())]
            }
        };

        if self.rotation == RotationMode::RoundRobin {
            inner.cursor = (idx + 1) % len;
        }

        let entry = &inner.entries[idx];
        Some(ProxyLease {
            id: entry.id.clone(),
            url: entry.url.clone(),
            client: entry.client.clone(),
        })
    }

    /// Record a failed attempt through the given proxy.
    ///
    /// The entry is excluded from rotation until the cooldown window has
    /// elapsed.
    pub fn report_failure(&self, id: &str) {
        let mut inner = self.inner.lock().expect("acquire proxy pool lock");
        if let Some(entry) = inner.entries.iter_mut().find(|e| e.id == id) {
            entry.last_failure = Some(Instant::now());
            entry.failure_count += 1;
            debug!(proxy = %id, failures = entry.failure_count, "proxy marked unhealthy");
        }
    }

    /// Record a successful attempt through the given proxy.
    ///
    /// Only bumps the success counter; an active cooldown is not cut short.
    pub fn report_success(&self, id: &str) {
        let mut inner = self.inner.lock().expect("acquire proxy pool lock");
        if let Some(entry) = inner.entries.iter_mut().find(|e| e.id == id) {
            entry.success_count += 1;
        }
    }

    /// Serializable diagnostic view of the pool.
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        let inner = self.inner.lock().expect("acquire proxy pool lock");

        PoolSnapshot {
            enabled: self.enabled,
            rotation: self.rotation,
            cooldown_secs: self.cooldown.as_secs(),
            allow_direct_fallback: self.allow_direct_fallback,
            proxies: inner
                .entries
                .iter()
                .map(|entry| {
                    let cooldown_remaining_secs = entry.last_failure.and_then(|t| {
                        self.cooldown.checked_sub(t.elapsed()).map(|d| d.as_secs())
                    });
                    ProxySnapshot {
                        id: entry.id.clone(),
                        url: entry.url.clone(),
                        healthy: entry.eligible(self.cooldown),
                        cooldown_remaining_secs,
                        success_count: entry.success_count,
                        failure_count: entry.failure_count,
                    }
                })
                .collect(),
        }
    }
}

/// Diagnostic snapshot of the whole pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    /// Whether the pool is active
    pub enabled: bool,
    /// Configured rotation mode
    pub rotation: RotationMode,
    /// Cooldown window in seconds
    pub cooldown_secs: u64,
    /// Whether direct fallback is allowed
    pub allow_direct_fallback: bool,
    /// Per-entry state
    pub proxies: Vec<ProxySnapshot>,
}

/// Diagnostic snapshot of one proxy entry.
#[derive(Debug, Clone, Serialize)]
pub struct ProxySnapshot {
    /// Pool-assigned identifier
    pub id: String,
    /// Proxy endpoint URL
    pub url: String,
    /// Whether the entry is currently eligible for rotation
    pub healthy: bool,
    /// Seconds until the entry leaves cooldown, if it is in one
    pub cooldown_remaining_secs: Option<u64>,
    /// Successful attempts through this proxy
    pub success_count: u64,
    /// Failed attempts through this proxy
    pub failure_count: u64,
}
