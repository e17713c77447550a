use super::*;
use crate::config::ProxyConfig;
use std::time::Duration;

fn config_with(proxies: Vec<ProxyConfig>) -> RotorConfig {
    RotorConfig {
        proxies,
        ..RotorConfig::default()
    }
}

#[test]
fn test_untried_endpoint_defaults() {
    let endpoint = ProxyEndpoint::new(Some("http://p1:1".to_string()), None);
    assert_eq!(endpoint.success_rate(), 1.0);
    assert_eq!(endpoint.average_latency_ms(), 0.0);
    assert_eq!(endpoint.score(), 1000.0);
    assert!(!endpoint.is_direct());
}

#[test]
fn test_failure_only_bumps_failure_count() {
    let endpoint = ProxyEndpoint::new(Some("http://p1:1".to_string()), None);
    endpoint.record_outcome(false, Duration::from_millis(500));

    assert_eq!(endpoint.failure_count(), 1);
    assert_eq!(endpoint.success_count(), 0);
    assert_eq!(endpoint.total_latency(), Duration::ZERO);
    assert_eq!(endpoint.success_rate(), 0.0);
    assert_eq!(endpoint.score(), 0.0);
}

#[test]
fn test_success_accumulates_latency() {
    let endpoint = ProxyEndpoint::direct(None);
    endpoint.record_outcome(true, Duration::from_millis(10));
    endpoint.record_outcome(true, Duration::from_millis(30));

    assert_eq!(endpoint.success_count(), 2);
    assert_eq!(endpoint.total_latency(), Duration::from_millis(40));
    assert_eq!(endpoint.average_latency_ms(), 20.0);
    assert!((endpoint.score() - 1000.0 / 21.0).abs() < 1e-9);
}

#[test]
fn test_concurrent_recording_is_exact() {
    let endpoint = Arc::new(ProxyEndpoint::direct(None));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let endpoint = Arc::clone(&endpoint);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    endpoint.record_outcome(i % 2 == 0, Duration::from_micros(1));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(endpoint.success_count(), 4000);
    assert_eq!(endpoint.failure_count(), 4000);
    assert_eq!(endpoint.total_latency(), Duration::from_micros(4000));
}

#[test]
fn test_view_matches_endpoint() {
    let endpoint = ProxyEndpoint::new(Some("http://p1:1".to_string()), None);
    endpoint.record_outcome(true, Duration::from_millis(4));
    endpoint.record_outcome(false, Duration::ZERO);

    let view = endpoint.snapshot();
    assert_eq!(view.name, "http://p1:1");
    assert_eq!(view.success_count, 1);
    assert_eq!(view.failure_count, 1);
    assert_eq!(view.success_rate, 0.5);
    assert_eq!(view.average_latency_ms, 4.0);
    assert_eq!(view.score, 100.0);
    assert_eq!(view.limit, None);
}

#[tokio::test]
async fn test_empty_proxy_list_builds_direct_entry() {
    let set = ProxySet::build(&RotorConfig::default());
    assert_eq!(set.len(), 1);

    let direct = &set.endpoints()[0];
    assert!(direct.is_direct());
    assert_eq!(direct.display_name(), DIRECT);
    assert!(direct.limiter().is_none());
}

#[tokio::test]
async fn test_direct_entry_uses_default_limit() {
    let config = RotorConfig {
        default_proxy_limit: Some(4),
        default_proxy_window_seconds: Some(2),
        ..RotorConfig::default()
    };
    let set = ProxySet::build(&config);

    let limiter = set.endpoints()[0].limiter().unwrap();
    assert_eq!(limiter.token_limit(), 4);
    assert_eq!(limiter.period(), Duration::from_secs(2));
}

#[tokio::test]
async fn test_non_positive_default_means_no_limiter() {
    let config = RotorConfig {
        default_proxy_limit: Some(0),
        default_proxy_window_seconds: Some(1),
        ..RotorConfig::default()
    };
    assert!(ProxySet::build(&config).endpoints()[0].limiter().is_none());
}

#[tokio::test]
async fn test_proxy_limits_fall_back_to_defaults() {
    let mut config = config_with(vec![
        ProxyConfig::new("http://p1:1"),
        ProxyConfig::new("http://p2:1").with_limit(2, 5),
        ProxyConfig::new("http://p3:1").with_limit(3, -1),
    ]);
    config.default_proxy_limit = Some(10);
    config.default_proxy_window_seconds = Some(1);

    let set = ProxySet::build(&config);
    let limits: Vec<Option<u32>> = set
        .endpoints()
        .iter()
        .map(|e| e.limiter().map(|l| l.token_limit()))
        .collect();
    assert_eq!(limits, vec![Some(10), Some(2), None]);
}

#[tokio::test]
async fn test_limit_without_window_means_no_limiter() {
    let mut config = config_with(vec![ProxyConfig::new("http://p1:1")]);
    config.default_proxy_limit = Some(10);

    assert!(ProxySet::build(&config).endpoints()[0].limiter().is_none());
}

#[tokio::test]
async fn test_blank_addresses_are_skipped() {
    let config = config_with(vec![
        ProxyConfig::new(""),
        ProxyConfig::new("http://p2:1"),
        ProxyConfig::new("   "),
    ]);
    let set = ProxySet::build(&config);

    assert_eq!(set.len(), 1);
    assert_eq!(set.endpoints()[0].address(), Some("http://p2:1"));
}

#[tokio::test]
async fn test_ranked_orders_by_descending_score() {
    let config = config_with(vec![
        ProxyConfig::new("http://slow:1"),
        ProxyConfig::new("http://fast:1"),
        ProxyConfig::new("http://broken:1"),
    ]);
    let pool = ProxyPool::from_config(&config);
    let set = pool.snapshot();
    let [slow, fast, broken] = set.endpoints() else {
        panic!("expected three endpoints");
    };

    pool.record_outcome(slow, true, Duration::from_millis(400));
    pool.record_outcome(fast, true, Duration::from_millis(20));
    pool.record_outcome(broken, false, Duration::ZERO);

    let order: Vec<String> = pool
        .ranked()
        .iter()
        .map(|e| e.display_name().to_string())
        .collect();
    assert_eq!(order, vec!["http://fast:1", "http://slow:1", "http://broken:1"]);
}

#[tokio::test]
async fn test_ranked_ties_keep_configuration_order() {
    let config = config_with(vec![
        ProxyConfig::new("http://a:1"),
        ProxyConfig::new("http://b:1"),
        ProxyConfig::new("http://c:1"),
    ]);
    let pool = ProxyPool::from_config(&config);

    let order: Vec<String> = pool
        .ranked()
        .iter()
        .map(|e| e.display_name().to_string())
        .collect();
    assert_eq!(order, vec!["http://a:1", "http://b:1", "http://c:1"]);
}

#[tokio::test]
async fn test_swap_replaces_set_and_disposes_old_limiters() {
    let mut config = config_with(vec![ProxyConfig::new("http://old:1").with_limit(1, 1)]);
    let pool = ProxyPool::from_config(&config);
    let old = pool.snapshot();
    let old_limiter = Arc::clone(old.endpoints()[0].limiter().unwrap());
    assert_eq!(pool.generation(), 0);

    config.proxies = vec![
        ProxyConfig::new("http://new1:1").with_limit(1, 1),
        ProxyConfig::new("http://new2:1"),
    ];
    pool.rebuild(&config);

    assert_eq!(pool.generation(), 1);
    assert!(old_limiter.is_disposed());
    assert_eq!(pool.len(), 2);
    assert!(pool
        .ranked()
        .iter()
        .all(|e| e.limiter().map_or(true, |l| !l.is_disposed())));

    // The captured snapshot is untouched by the swap.
    assert_eq!(old.len(), 1);
    assert_eq!(old.endpoints()[0].address(), Some("http://old:1"));
}

#[tokio::test]
async fn test_swap_resets_counters() {
    let config = config_with(vec![ProxyConfig::new("http://p1:1")]);
    let pool = ProxyPool::from_config(&config);
    pool.ranked()[0].record_outcome(false, Duration::ZERO);

    pool.rebuild(&config);
    assert_eq!(pool.ranked()[0].failure_count(), 0);
}

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_ranked_is_sorted_permutation(
            outcomes in prop::collection::vec((0u64..20, 0u64..20, 0u64..500), 1..12)
        ) {
            let endpoints: Vec<ProxyEndpoint> = outcomes
                .iter()
                .enumerate()
                .map(|(i, (successes, failures, latency_ms))| {
                    let endpoint = ProxyEndpoint::new(Some(format!("http://p{}:1", i)), None);
                    for _ in 0..*successes {
                        endpoint.record_outcome(true, Duration::from_millis(*latency_ms));
                    }
                    for _ in 0..*failures {
                        endpoint.record_outcome(false, Duration::ZERO);
                    }
                    endpoint
                })
                .collect();
            let set = ProxySet::new(endpoints);

            let ranked = set.ranked();
            prop_assert_eq!(ranked.len(), set.len());

            for pair in ranked.windows(2) {
                let (a, b) = (pair[0].score(), pair[1].score());
                prop_assert!(a >= b);
                if a == b {
                    // Equal scores keep configuration order.
                    let index = |e: &Arc<ProxyEndpoint>| {
                        set.endpoints().iter().position(|x| Arc::ptr_eq(x, e)).unwrap()
                    };
                    prop_assert!(index(&pair[0]) < index(&pair[1]));
                }
            }
        }

        #[test]
        fn prop_score_bounded(rate in 0.0f64..=1.0, avg_ms in 0.0f64..10_000.0) {
            let s = score(rate, avg_ms);
            prop_assert!(s >= 0.0);
            prop_assert!(s <= 1000.0);
        }
    }
}
