//! Property-based tests for the detector invariants.

use adaptive_anomaly::{AdaptiveAnomalyDetector, DetectorConfig, EmaTracker, Method};
use proptest::prelude::*;

/// (window_size, season_length) with 2 <= season_length < window_size.
fn sizes_strategy() -> impl Strategy<Value = (usize, usize)> {
    (3usize..40).prop_flat_map(|window| (Just(window), 2usize..window))
}

fn samples_strategy(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6f64..1.0e6, 0..max_len)
}

fn detector(window_size: usize, season_length: usize, interval: usize) -> AdaptiveAnomalyDetector {
    let config = DetectorConfig::default()
        .with_window_size(window_size)
        .with_season_length(season_length)
        .with_drift_detection_interval(interval)
        .with_n_estimators(8)
        .with_random_state(99);
    AdaptiveAnomalyDetector::new(config).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ema_is_cold_before_window_fills(
        (window, season) in sizes_strategy(),
        samples in samples_strategy(60),
    ) {
        let mut d = detector(window, season, 5);
        for (i, &v) in samples.iter().enumerate().take(window - 1) {
            let detection = d.detect(v).unwrap();
            prop_assert!(!detection.fired(Method::Ema), "EMA fired at sample {}", i);
        }
    }

    #[test]
    fn seasonal_is_cold_before_one_season(
        (window, season) in sizes_strategy(),
        samples in samples_strategy(60),
    ) {
        let mut d = detector(window, season, 5);
        for &v in samples.iter().take(season - 1) {
            prop_assert!(!d.detect(v).unwrap().fired(Method::Seasonal));
        }
    }

    #[test]
    fn ema_trajectory_is_deterministic(
        alpha in 0.01f64..=1.0,
        samples in samples_strategy(100),
    ) {
        let mut a = EmaTracker::new(alpha, 16, 4);
        let mut b = EmaTracker::new(alpha, 16, 4);
        for &v in &samples {
            prop_assert_eq!(a.update(v), b.update(v));
        }
        prop_assert_eq!(a.window(), b.window());
    }

    #[test]
    fn identical_replays_give_identical_detections(
        (window, season) in sizes_strategy(),
        samples in samples_strategy(120),
    ) {
        let mut a = detector(window, season, 7);
        let mut b = detector(window, season, 7);
        prop_assert_eq!(a.detect_batch(&samples).unwrap(), b.detect_batch(&samples).unwrap());
        prop_assert_eq!(a.ema_window(), b.ema_window());
    }

    #[test]
    fn raw_window_holds_last_values_in_order(
        (window, season) in sizes_strategy(),
        samples in samples_strategy(120),
    ) {
        let mut d = detector(window, season, 5);
        d.detect_batch(&samples).unwrap();
        let start = samples.len().saturating_sub(window);
        prop_assert_eq!(d.raw_window().to_vec(), samples[start..].to_vec());
        prop_assert!(d.ema_window().map_or(0, |w| w.len()) <= window);
    }

    #[test]
    fn model_refits_on_schedule(
        (window, season) in sizes_strategy(),
        interval in 1usize..20,
        samples in samples_strategy(150),
    ) {
        let mut d = detector(window, season, interval);
        for (i, &v) in samples.iter().enumerate() {
            d.detect(v).unwrap();
            let seen = i + 1;
            let expected = if seen < window { 0 } else { 1 + (seen - window) / interval };
            prop_assert_eq!(d.fit_count(), expected, "after {} samples", seen);
        }
    }

    #[test]
    fn labels_and_scores_stay_aligned(
        (window, season) in sizes_strategy(),
        samples in samples_strategy(120),
    ) {
        let mut d = detector(window, season, 5);
        for &v in &samples {
            let detection = d.detect(v).unwrap();
            prop_assert_eq!(detection.labels.len(), detection.scores.len());
            let positions: Vec<usize> = detection
                .labels
                .iter()
                .map(|m| Method::ALL.iter().position(|a| a == m).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
