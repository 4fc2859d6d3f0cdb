/// Reload statistics tests
///
/// Run with: cargo test --test stats_tests

use lvm_reload_stress::{LatencySample, ReloadStats};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn ok(secs: f64) -> LatencySample {
    LatencySample::success(Duration::from_secs_f64(secs))
}

fn failed(secs: f64) -> LatencySample {
    LatencySample::failure(Duration::from_secs_f64(secs))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} got {}",
        expected,
        actual
    );
}

#[test]
fn test_median_odd_count() {
    let stats = ReloadStats::from_samples(&[ok(0.1), ok(0.3), ok(0.2)]).unwrap();
    assert_close(stats.med_time, 0.2);
    assert_close(stats.min_time, 0.1);
    assert_close(stats.max_time, 0.3);
    assert_close(stats.avg_time, 0.2);
}

#[test]
fn test_median_even_count() {
    let stats = ReloadStats::from_samples(&[ok(0.4), ok(0.1), ok(0.3), ok(0.2)]).unwrap();
    assert_close(stats.med_time, 0.25);
    assert_close(stats.avg_time, 0.25);
}

#[test]
fn test_single_sample() {
    let stats = ReloadStats::from_samples(&[failed(1.5)]).unwrap();
    assert_eq!(stats.reloads, 1);
    assert_eq!(stats.errors, 1);
    assert_close(stats.error_rate, 100.0);
    assert_close(stats.med_time, 1.5);
    assert_close(stats.min_time, 1.5);
    assert_close(stats.max_time, 1.5);
}

#[test]
fn test_error_rate() {
    let mut samples: Vec<_> = (0..7).map(|i| ok(0.1 * (i + 1) as f64)).collect();
    samples.extend([failed(0.5), failed(0.6), failed(0.7)]);

    let stats = ReloadStats::from_samples(&samples).unwrap();
    assert_eq!(stats.reloads, 10);
    assert_eq!(stats.errors, 3);
    assert_close(stats.error_rate, 30.0);
    assert!(stats.to_string().contains("error_rate=30.00%"));
}

#[test]
fn test_empty_samples_have_no_stats() {
    assert!(ReloadStats::from_samples(&[]).is_none());
}

#[test]
fn test_input_order_is_preserved() {
    let samples = vec![ok(0.3), failed(0.1), ok(0.2)];
    let before = samples.clone();
    ReloadStats::from_samples(&samples).unwrap();
    assert_eq!(samples, before);
}

#[test]
fn test_display_format() {
    let stats = ReloadStats::from_samples(&[ok(0.148), failed(1.216), ok(9.041)]).unwrap();
    assert_eq!(
        stats.to_string(),
        "reloads=3 errors=1 error_rate=33.33% avg_time=3.468 med_time=1.216 min_time=0.148 max_time=9.041"
    );
}

#[test]
fn test_identical_samples_keep_average_in_range() {
    let samples = vec![ok(0.1); 3];
    let stats = ReloadStats::from_samples(&samples).unwrap();
    assert!(stats.avg_time <= stats.max_time);
    assert!(stats.avg_time >= stats.min_time);
}

#[test]
fn test_ordering_invariants_over_random_samples() {
    let mut rng = StdRng::seed_from_u64(1837199);

    for _ in 0..500 {
        let len = rng.gen_range(1..64);
        let samples: Vec<_> = (0..len)
            .map(|_| {
                let secs = rng.gen_range(0.0..10.0);
                LatencySample::new(Duration::from_secs_f64(secs), rng.gen_bool(0.8))
            })
            .collect();

        let stats = ReloadStats::from_samples(&samples).unwrap();
        assert_eq!(stats.reloads, len);
        assert!(stats.errors <= stats.reloads);
        assert!(stats.min_time <= stats.med_time, "{:?}", stats);
        assert!(stats.med_time <= stats.max_time, "{:?}", stats);
        assert!(stats.min_time <= stats.avg_time, "{:?}", stats);
        assert!(stats.avg_time <= stats.max_time, "{:?}", stats);
        assert!((0.0..=100.0).contains(&stats.error_rate));
    }
}

#[test]
fn test_serializes_for_reports() {
    let stats = ReloadStats::from_samples(&[ok(0.5), failed(1.5)]).unwrap();
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["reloads"], 2);
    assert_eq!(json["errors"], 1);
    assert_eq!(json["error_rate"], 50.0);
}
