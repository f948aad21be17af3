//! Probe dispatch with bounded concurrency, proxy selection, and retry.
//!
//! This module provides the [`ScanEngine`], which executes one HTTP probe
//! per [`ProbeTarget`] under a shared concurrency limiter, routing attempts
//! through the proxy pool when enabled and classifying every outcome.

use crate::classify::classify_response;
use crate::error::Result;
use crate::extract::extract_profile_details;
use crate::outcome::{ProbeOutcome, ProbeStatus};
use crate::target::ProbeTarget;
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;
use umbra_catalog::PlatformRegistry;
use umbra_core::AppConfig;
use umbra_proxy::ProxyPool;

/// Upper bound of the random jitter added to every backoff delay.
const BACKOFF_JITTER_MS: u64 = 250;

/// Tunables for the probe engine.
#[derive(Debug, Clone)]
pub struct ScannerSettings {
    /// Maximum probes in flight at once per scan
    pub max_concurrency: usize,
    /// Per-request timeout; tight, so the slowest site cannot stall a scan
    pub timeout: Duration,
    /// User agent sent with every probe
    pub user_agent: String,
    /// Retry attempts after a failed proxied request.
    /// Retries exist to survive flaky proxies; with proxying disabled every
    /// probe is a single attempt.
    pub max_retries: u32,
    /// Base delay for jittered exponential backoff between retries
    pub backoff_base: Duration,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            timeout: Duration::from_secs(5),
            user_agent: "Mozilla/5.0 (compatible; Umbra/0.1)".to_string(),
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl ScannerSettings {
    /// Derive settings from the application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_concurrency: config.scanning.max_concurrency.max(1),
            timeout: Duration::from_secs(config.scanning.timeout_secs),
            user_agent: config.scanning.user_agent.clone(),
            max_retries: config.proxy.max_retries,
            backoff_base: Duration::from_millis(config.proxy.backoff_base_ms),
        }
    }
}

/// Executes probes for scan sessions.
///
/// The engine owns the direct HTTP client, the shared concurrency limiter,
/// and references to the catalog registry and the process-wide proxy pool.
/// Cloning is cheap; clones share the limiter and pool.
#[derive(Clone)]
pub struct ScanEngine {
    pub(crate) registry: Arc<PlatformRegistry>,
    pub(crate) pool: Arc<ProxyPool>,
    limiter: Arc<Semaphore>,
    client: Client,
    pub(crate) settings: ScannerSettings,
}

/// One received HTTP response, before classification.
struct FetchedResponse {
    status: u16,
    location: Option<String>,
    body: String,
    latency_ms: u64,
}

/// Network-level failure of a single attempt.
enum FetchError {
    Timeout,
    Network(String),
}

impl ScanEngine {
    /// Create a new engine.
    ///
    /// Redirects are never followed: the classifier inspects 3xx responses
    /// itself.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        registry: Arc<PlatformRegistry>,
        pool: Arc<ProxyPool>,
        settings: ScannerSettings,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(&settings.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let limiter = Arc::new(Semaphore::new(settings.max_concurrency));

        Ok(Self {
            registry,
            pool,
            limiter,
            client,
            settings,
        })
    }

    /// The proxy pool this engine dispatches through.
    #[must_use]
    pub fn proxy_pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    /// The engine's settings.
    #[must_use]
    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    /// Execute one probe, producing exactly one terminal outcome.
    ///
    /// A concurrency slot is held for the whole probe (including retries and
    /// backoff sleeps) and released on every exit path when the permit drops.
    pub(crate) async fn probe_target(&self, target: &ProbeTarget) -> ProbeOutcome {
        let _permit = self
            .limiter
            .clone()
            .acquire_owned()
            .await
            .expect("concurrency limiter closed");

        if self.pool.is_enabled() {
            self.probe_with_proxies(target).await
        } else {
            // Single attempt, no retry/backoff: retries are a proxy-resilience
            // feature, not a general reliability feature.
            match fetch_once(&self.client, &target.url).await {
                Ok(fetched) => self.finish(target, &fetched, false, None),
                Err(err) => failure_outcome(target, &err, false, None),
            }
        }
    }

    /// Execute one probe through the proxy pool, retrying with backoff.
    async fn probe_with_proxies(&self, target: &ProbeTarget) -> ProbeOutcome {
        let attempts = self.settings.max_retries + 1;
        let mut attempt: u32 = 0;

        loop {
            let lease = self.pool.next_proxy();
            let (client, via_proxy, proxy_id) = match &lease {
                Some(lease) => (&lease.client, true, Some(lease.id.clone())),
                None if self.pool.allow_direct_fallback() => (&self.client, false, None),
                None => {
                    return blocked_outcome(
                        target,
                        "no eligible proxy and direct fallback disabled",
                    );
                }
            };

            match fetch_once(client, &target.url).await {
                Ok(fetched) => {
                    if let Some(id) = &proxy_id {
                        self.pool.report_success(id);
                    }
                    return self.finish(target, &fetched, via_proxy, proxy_id);
                }
                Err(err) => {
                    if let Some(id) = &proxy_id {
                        self.pool.report_failure(id);
                    }

                    attempt += 1;
                    if attempt >= attempts {
                        return failure_outcome(target, &err, via_proxy, proxy_id);
                    }

                    let delay = backoff_delay(self.settings.backoff_base, attempt - 1);
                    debug!(
                        platform = %target.platform,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "probe attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Classify a received response and build the terminal outcome.
    fn finish(
        &self,
        target: &ProbeTarget,
        fetched: &FetchedResponse,
        via_proxy: bool,
        proxy_id: Option<String>,
    ) -> ProbeOutcome {
        let verdict = classify_response(
            fetched.status,
            fetched.location.as_deref(),
            &fetched.body,
            &target.detection,
        );

        let details = if verdict.state == ProbeStatus::Found {
            target
                .extraction
                .as_ref()
                .and_then(|rule| extract_profile_details(&fetched.body, rule))
        } else {
            None
        };
        let details = details.unwrap_or_default();

        ProbeOutcome {
            site: target.name.clone(),
            url: target.url.clone(),
            found: verdict.state.is_found(),
            state: verdict.state,
            status_code: fetched.status,
            via_proxy,
            proxy_id,
            latency_ms: Some(fetched.latency_ms),
            reason: verdict.reason,
            display_name: details.display_name,
            bio: details.bio,
            avatar: details.avatar,
            category: target.category,
        }
    }
}

/// Issue one GET and read the body.
async fn fetch_once(client: &Client, url: &str) -> std::result::Result<FetchedResponse, FetchError> {
    let start = Instant::now();

    let response = client.get(url).send().await.map_err(map_reqwest_error)?;

    let status = response.status().as_u16();
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let body = response.text().await.map_err(map_reqwest_error)?;

    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    Ok(FetchedResponse {
        status,
        location,
        body,
        latency_ms,
    })
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}

/// Exponential backoff with random jitter: `base * 2^attempt + U(0..=250ms)`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponential = base.saturating_mul(2_u32.saturating_pow(attempt));
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=BACKOFF_JITTER_MS));
    exponential + jitter
}

/// Terminal outcome for a network-level failure.
fn failure_outcome(
    target: &ProbeTarget,
    err: &FetchError,
    via_proxy: bool,
    proxy_id: Option<String>,
) -> ProbeOutcome {
    let (state, reason) = match err {
        FetchError::Timeout => (ProbeStatus::Timeout, "request timed out".to_string()),
        FetchError::Network(msg) => (ProbeStatus::Error, msg.clone()),
    };

    ProbeOutcome {
        site: target.name.clone(),
        url: target.url.clone(),
        found: false,
        state,
        status_code: 0,
        via_proxy,
        proxy_id,
        latency_ms: None,
        reason: Some(reason),
        display_name: None,
        bio: None,
        avatar: None,
        category: target.category,
    }
}

/// Terminal outcome for proxy exhaustion with direct fallback disallowed.
fn blocked_outcome(target: &ProbeTarget, reason: &str) -> ProbeOutcome {
    ProbeOutcome {
        site: target.name.clone(),
        url: target.url.clone(),
        found: false,
        state: ProbeStatus::Blocked,
        status_code: 0,
        via_proxy: false,
        proxy_id: None,
        latency_ms: None,
        reason: Some(reason.to_string()),
        display_name: None,
        bio: None,
        avatar: None,
        category: target.category,
    }
}
