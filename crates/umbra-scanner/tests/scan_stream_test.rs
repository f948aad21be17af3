//! Integration tests for the scan session and result stream.
//!
//! These tests verify the streaming protocol against a local mock HTTP
//! server: one event per catalog entry plus exactly one terminal event,
//! completion ordering, the found-profiles aggregate, cancellation, the
//! concurrency cap, and proxy fallback/exhaustion behavior.

use std::sync::Arc;
use std::time::{Duration, Instant};
use umbra_catalog::{
    DetectionRule, ExtractionRule, PlatformCategory, PlatformDefinition, PlatformMetadata,
    PlatformRegistry,
};
use umbra_core::{Handle, PlatformId, ProxyConfig};
use umbra_proxy::ProxyPool;
use umbra_scanner::{ProbeStatus, ScanEngine, ScanEvent, ScannerSettings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to build a platform definition probing `base_url/<id>/{handle}`.
fn platform(id: &str, base_url: &str, detection: DetectionRule) -> PlatformDefinition {
    PlatformDefinition {
        platform: PlatformMetadata {
            id: PlatformId::new(id).expect("valid platform ID"),
            name: format!("Platform {id}"),
            category: PlatformCategory::Social,
            url_template: format!("{base_url}/{id}/{{handle}}"),
        },
        detection,
        extraction: None,
    }
}

fn status_rule() -> DetectionRule {
    DetectionRule::StatusRange {
        found_min: 200,
        found_max: 299,
    }
}

/// Helper to build an engine over the given definitions, proxying disabled.
fn direct_engine(definitions: Vec<PlatformDefinition>, settings: ScannerSettings) -> ScanEngine {
    let registry = PlatformRegistry::new();
    for definition in definitions {
        registry.insert(definition).expect("insert definition");
    }
    ScanEngine::new(
        Arc::new(registry),
        Arc::new(ProxyPool::disabled()),
        settings,
    )
    .expect("build engine")
}

fn fast_settings() -> ScannerSettings {
    ScannerSettings {
        timeout: Duration::from_millis(300),
        ..ScannerSettings::default()
    }
}

/// Grab a port with no listener behind it, for connection-refused targets.
fn refused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

/// The three-platform scenario: one found, one missing, one that times out.
/// The stream must deliver one event per platform in completion order plus
/// exactly one terminal event whose aggregate matches the delivered events.
#[tokio::test]
async fn test_stream_protocol_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/site-a/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>alice</h1>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/site-b/alice"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/site-c/alice"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
        .mount(&server)
        .await;

    let engine = direct_engine(
        vec![
            platform("site-a", &server.uri(), status_rule()),
            platform("site-b", &server.uri(), status_rule()),
            platform("site-c", &server.uri(), status_rule()),
        ],
        fast_settings(),
    );
    let handle = Handle::new("alice").expect("valid handle");

    let mut stream = engine.start_scan(&handle, None).expect("start scan");
    assert_eq!(stream.total(), 3);

    let mut site_results = Vec::new();
    let mut terminal = None;
    while let Some(event) = stream.next_event().await {
        match event {
            ScanEvent::SiteResult(outcome) => site_results.push(outcome),
            ScanEvent::SearchComplete {
                summary,
                found_profiles,
            } => {
                assert!(terminal.is_none(), "only one terminal event allowed");
                terminal = Some((summary, found_profiles));
            }
        }
    }

    assert_eq!(site_results.len(), 3);

    let by_site = |name: &str| {
        site_results
            .iter()
            .find(|o| o.site == format!("Platform {name}"))
            .unwrap_or_else(|| panic!("missing outcome for {name}"))
    };

    let found = by_site("site-a");
    assert!(found.found);
    assert_eq!(found.state, ProbeStatus::Found);
    assert_eq!(found.status_code, 200);
    assert!(!found.via_proxy);
    assert!(found.latency_ms.is_some());

    let missing = by_site("site-b");
    assert!(!missing.found);
    assert_eq!(missing.state, ProbeStatus::NotFound);
    assert_eq!(missing.status_code, 404);

    let slow = by_site("site-c");
    assert!(!slow.found);
    assert_eq!(slow.state, ProbeStatus::Timeout);
    assert_eq!(slow.status_code, 0);

    // The slow site finishes last even though it is not last in the catalog
    assert_eq!(site_results[2].site, "Platform site-c");

    let (summary, found_profiles) = terminal.expect("terminal event");
    assert_eq!(summary.total, 3);
    assert_eq!(summary.found_count, 1);
    assert_eq!(found_profiles.len(), 1);
    assert_eq!(found_profiles[0].site, "Platform site-a");
}

/// `limit` probes only a stable prefix of the catalog.
#[tokio::test]
async fn test_limit_selects_catalog_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let engine = direct_engine(
        vec![
            platform("site-a", &server.uri(), status_rule()),
            platform("site-b", &server.uri(), status_rule()),
            platform("site-c", &server.uri(), status_rule()),
        ],
        fast_settings(),
    );
    let handle = Handle::new("alice").expect("valid handle");

    let mut stream = engine.start_scan(&handle, Some(2)).expect("start scan");
    assert_eq!(stream.total(), 2);

    let mut sites = Vec::new();
    let mut terminals = 0;
    while let Some(event) = stream.next_event().await {
        match event {
            ScanEvent::SiteResult(outcome) => sites.push(outcome.site),
            ScanEvent::SearchComplete { summary, .. } => {
                terminals += 1;
                assert_eq!(summary.total, 2);
            }
        }
    }

    assert_eq!(sites.len(), 2);
    assert_eq!(terminals, 1);
    sites.sort();
    assert_eq!(sites, vec!["Platform site-a", "Platform site-b"]);
}

/// Total failure across all sites still produces exactly one terminal event
/// with `found_count = 0`, not a hard error.
#[tokio::test]
async fn test_total_failure_still_completes() {
    let base = format!("http://127.0.0.1:{}", refused_port());

    let engine = direct_engine(
        vec![
            platform("site-a", &base, status_rule()),
            platform("site-b", &base, status_rule()),
        ],
        fast_settings(),
    );
    let handle = Handle::new("alice").expect("valid handle");

    let mut stream = engine.start_scan(&handle, None).expect("start scan");

    let mut site_results = 0;
    let mut terminal = None;
    while let Some(event) = stream.next_event().await {
        match event {
            ScanEvent::SiteResult(outcome) => {
                assert_eq!(outcome.state, ProbeStatus::Error);
                assert_eq!(outcome.status_code, 0);
                assert!(outcome.reason.is_some());
                site_results += 1;
            }
            ScanEvent::SearchComplete {
                summary,
                found_profiles,
            } => {
                assert_eq!(summary.found_count, 0);
                assert!(found_profiles.is_empty());
                terminal = Some(summary);
            }
        }
    }

    assert_eq!(site_results, 2);
    assert_eq!(terminal.expect("terminal event").total, 2);
}

/// With proxying disabled there is no retry: a failing probe resolves in a
/// single attempt, far faster than one backoff interval.
#[tokio::test]
async fn test_direct_mode_has_no_retry_delay() {
    let base = format!("http://127.0.0.1:{}", refused_port());

    let settings = ScannerSettings {
        timeout: Duration::from_millis(300),
        max_retries: 3,
        backoff_base: Duration::from_secs(5),
        ..ScannerSettings::default()
    };
    let engine = direct_engine(vec![platform("site-a", &base, status_rule())], settings);
    let handle = Handle::new("alice").expect("valid handle");

    let start = Instant::now();
    let report = engine
        .scan_to_completion(&handle, None)
        .await
        .expect("scan report");
    let elapsed = start.elapsed();

    assert_eq!(report.total, 1);
    assert_eq!(report.outcomes[0].state, ProbeStatus::Error);
    assert!(
        elapsed < Duration::from_secs(2),
        "single direct attempt should not back off, took {elapsed:?}"
    );
}

/// One dead proxy, direct fallback disallowed: the first attempt marks the
/// proxy unhealthy, the second finds no eligible proxy and terminates with
/// `blocked` without waiting out the cooldown.
#[tokio::test]
async fn test_proxy_exhaustion_yields_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let proxy_config = ProxyConfig {
        enabled: true,
        endpoints: vec![format!("http://127.0.0.1:{}", refused_port())],
        max_retries: 2,
        backoff_base_ms: 10,
        cooldown_secs: 3600,
        allow_direct_fallback: false,
        ..ProxyConfig::default()
    };
    let pool = ProxyPool::from_config(&proxy_config, Duration::from_millis(300), "umbra-test/0.1")
        .expect("build pool");

    let registry = PlatformRegistry::new();
    registry
        .insert(platform("site-a", &server.uri(), status_rule()))
        .expect("insert definition");

    let settings = ScannerSettings {
        timeout: Duration::from_millis(300),
        max_retries: 2,
        backoff_base: Duration::from_millis(10),
        ..ScannerSettings::default()
    };
    let engine =
        ScanEngine::new(Arc::new(registry), Arc::new(pool), settings).expect("build engine");
    let handle = Handle::new("alice").expect("valid handle");

    let start = Instant::now();
    let report = engine
        .scan_to_completion(&handle, None)
        .await
        .expect("scan report");

    assert_eq!(report.total, 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.state, ProbeStatus::Blocked);
    assert!(!outcome.via_proxy);
    assert!(outcome
        .reason
        .as_deref()
        .expect("reason")
        .contains("no eligible proxy"));

    // Terminated well before the one-hour cooldown
    assert!(start.elapsed() < Duration::from_secs(5));
}

/// One dead proxy, direct fallback allowed: the retry goes direct and the
/// outcome reports the proxy state of the final attempt.
#[tokio::test]
async fn test_proxy_failure_falls_back_to_direct() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/site-a/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>alice</h1>"))
        .expect(1)
        .mount(&server)
        .await;

    let proxy_config = ProxyConfig {
        enabled: true,
        endpoints: vec![format!("http://127.0.0.1:{}", refused_port())],
        max_retries: 2,
        backoff_base_ms: 10,
        cooldown_secs: 3600,
        allow_direct_fallback: true,
        ..ProxyConfig::default()
    };
    let pool = ProxyPool::from_config(&proxy_config, Duration::from_millis(300), "umbra-test/0.1")
        .expect("build pool");

    let registry = PlatformRegistry::new();
    registry
        .insert(platform("site-a", &server.uri(), status_rule()))
        .expect("insert definition");

    let settings = ScannerSettings {
        timeout: Duration::from_millis(300),
        max_retries: 2,
        backoff_base: Duration::from_millis(10),
        ..ScannerSettings::default()
    };
    let engine =
        ScanEngine::new(Arc::new(registry), Arc::new(pool), settings).expect("build engine");
    let handle = Handle::new("alice").expect("valid handle");

    let report = engine
        .scan_to_completion(&handle, None)
        .await
        .expect("scan report");

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.state, ProbeStatus::Found);
    // Final attempt went direct, so via_proxy is false despite the first
    // attempt using a proxy
    assert!(!outcome.via_proxy);
    assert!(outcome.proxy_id.is_none());
}

/// The shared limiter caps in-flight probes: with K=2 and six sites each
/// delayed 150ms, the scan needs at least three sequential batches.
#[tokio::test]
async fn test_concurrency_cap_is_enforced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404).set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let definitions: Vec<PlatformDefinition> = (1..=6)
        .map(|i| platform(&format!("site-{i}"), &server.uri(), status_rule()))
        .collect();

    let settings = ScannerSettings {
        max_concurrency: 2,
        timeout: Duration::from_secs(2),
        ..ScannerSettings::default()
    };
    let engine = direct_engine(definitions, settings);
    let handle = Handle::new("alice").expect("valid handle");

    let start = Instant::now();
    let report = engine
        .scan_to_completion(&handle, None)
        .await
        .expect("scan report");
    let elapsed = start.elapsed();

    assert_eq!(report.total, 6);
    assert!(
        elapsed >= Duration::from_millis(400),
        "6 probes at K=2 with 150ms latency cannot finish in {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_millis(900),
        "probes did not run in parallel, took {elapsed:?}"
    );
}

/// Cancelling the stream stops delivery; no terminal event arrives and the
/// consumer-facing channel closes once background probes drain.
#[tokio::test]
async fn test_cancellation_stops_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let definitions: Vec<PlatformDefinition> = (1..=3)
        .map(|i| platform(&format!("site-{i}"), &server.uri(), status_rule()))
        .collect();

    let engine = direct_engine(definitions, fast_settings());
    let handle = Handle::new("alice").expect("valid handle");

    let mut stream = engine.start_scan(&handle, None).expect("start scan");
    stream.cancel();

    let mut saw_terminal = false;
    while let Some(event) = stream.next_event().await {
        if matches!(event, ScanEvent::SearchComplete { .. }) {
            saw_terminal = true;
        }
    }

    assert!(!saw_terminal, "cancelled scan must not emit a terminal event");
}

/// Display metadata is extracted opportunistically on found profiles.
#[tokio::test]
async fn test_found_profile_metadata_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/site-a/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head>
                <meta property="og:title" content="Alice Smith" />
                <meta property="og:description" content="Rustacean" />
            </head><body>alice</body></html>"#,
        ))
        .mount(&server)
        .await;

    let mut definition = platform("site-a", &server.uri(), status_rule());
    definition.extraction = Some(ExtractionRule::og_defaults());

    let engine = direct_engine(vec![definition], fast_settings());
    let handle = Handle::new("alice").expect("valid handle");

    let report = engine
        .scan_to_completion(&handle, None)
        .await
        .expect("scan report");

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.state, ProbeStatus::Found);
    assert_eq!(outcome.display_name.as_deref(), Some("Alice Smith"));
    assert_eq!(outcome.bio.as_deref(), Some("Rustacean"));
    assert!(outcome.avatar.is_none());
}

/// The blocking variant reports the same aggregate as the stream.
#[tokio::test]
async fn test_blocking_variant_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/site-a/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("alice"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/site-b/alice"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let engine = direct_engine(
        vec![
            platform("site-a", &server.uri(), status_rule()),
            platform("site-b", &server.uri(), status_rule()),
        ],
        fast_settings(),
    );
    let handle = Handle::new("alice").expect("valid handle");

    let report = engine
        .scan_to_completion(&handle, None)
        .await
        .expect("scan report");

    assert_eq!(report.handle, "alice");
    assert_eq!(report.total, 2);
    assert_eq!(report.found_count, 1);
    assert_eq!(report.found_profiles().len(), 1);
    assert!(report.finished_at >= report.started_at);
}

/// Redirect classification: an accepted redirect target is a hit, any other
/// redirect is reported as `redirect`.
#[tokio::test]
async fn test_redirect_classification_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/site-a/alice"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/profile/alice"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/site-b/alice"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
        .mount(&server)
        .await;

    let redirect_rule = DetectionRule::RedirectTarget {
        location_contains: "/profile/".to_string(),
    };
    let engine = direct_engine(
        vec![
            platform("site-a", &server.uri(), redirect_rule.clone()),
            platform("site-b", &server.uri(), redirect_rule),
        ],
        fast_settings(),
    );
    let handle = Handle::new("alice").expect("valid handle");

    let report = engine
        .scan_to_completion(&handle, None)
        .await
        .expect("scan report");

    let by_site = |name: &str| {
        report
            .outcomes
            .iter()
            .find(|o| o.site == format!("Platform {name}"))
            .unwrap_or_else(|| panic!("missing outcome for {name}"))
    };

    assert_eq!(by_site("site-a").state, ProbeStatus::Found);
    assert_eq!(by_site("site-b").state, ProbeStatus::Redirect);
}
