//! Recommendation builder tests
//!
//! Covers the output contract: window ordering, sowing-period clamping,
//! confidence combination, risk flagging, and alternative ranking.

mod common;

use std::collections::BTreeMap;

use apr_backend::config::RecommendationConfig;
use apr_backend::services::builder::RecommendationBuilder;
use apr_backend::services::scoring::RawPrediction;
use proptest::prelude::*;
use shared::{
    validate_alternatives, validate_window, Campaign, Crop, RISK_INSUFFICIENT_DATA,
};
use uuid::Uuid;

use common::{date, test_context, CLIMATE_WINDOW_DAYS};

fn builder() -> RecommendationBuilder {
    RecommendationBuilder::new(&RecommendationConfig::default())
}

fn prediction(day_of_year: u32, confidence: f64) -> RawPrediction {
    RawPrediction {
        optimal_day_of_year: day_of_year,
        model_confidence: confidence,
        indicators: BTreeMap::new(),
        model_version: "v1-test".to_string(),
    }
}

fn full_context(crop: Crop) -> shared::ParcelContext {
    let campaign = Campaign::parse("2025/2026").unwrap();
    test_context(
        Uuid::from_u128(1),
        crop,
        &campaign,
        date(2025, 8, 20),
        CLIMATE_WINDOW_DAYS,
        true,
        3,
    )
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn window_contains_optimal_date() {
    let ctx = full_context(Crop::Maiz);
    let (window, _) = builder().build(&ctx, &prediction(280, 0.9)).unwrap();

    assert!(window.start <= window.optimal_date);
    assert!(window.optimal_date <= window.end);
    assert!(validate_window(&window).is_ok());
}

#[test]
fn prediction_outside_sowing_period_is_clamped() {
    let ctx = full_context(Crop::Maiz);
    // Day 32 (early February) falls well before the maiz sowing period.
    let (window, _) = builder().build(&ctx, &prediction(32, 0.9)).unwrap();

    let (period_start, period_end) = Crop::Maiz.sowing_period(2026);
    assert!(window.optimal_date >= period_start);
    assert!(window.optimal_date <= period_end);
    assert!(window.start >= period_start);
    assert!(window.end <= period_end);
}

#[test]
fn confidence_combines_model_and_completeness() {
    let campaign = Campaign::parse("2025/2026").unwrap();
    let full = full_context(Crop::Maiz);
    let sparse = test_context(
        Uuid::from_u128(2),
        Crop::Maiz,
        &campaign,
        date(2025, 8, 20),
        2,
        true,
        3,
    );

    let b = builder();
    let (full_window, _) = b.build(&full, &prediction(280, 0.9)).unwrap();
    let (sparse_window, _) = b.build(&sparse, &prediction(280, 0.9)).unwrap();

    assert!(full_window.confidence > sparse_window.confidence);
    assert!((full_window.confidence - 0.9 * full.completeness).abs() < 1e-9);
}

#[test]
fn low_completeness_flags_insufficient_data_instead_of_failing() {
    let campaign = Campaign::parse("2025/2026").unwrap();
    // No soil, two climate days, no yields: completeness well below 0.5.
    let ctx = test_context(
        Uuid::from_u128(3),
        Crop::Maiz,
        &campaign,
        date(2025, 8, 20),
        2,
        false,
        0,
    );

    let (window, _) = builder().build(&ctx, &prediction(280, 0.9)).unwrap();
    assert!(window.risks.iter().any(|r| r == RISK_INSUFFICIENT_DATA));
}

#[test]
fn alternatives_are_capped_ranked_and_distinct_from_principal() {
    let ctx = full_context(Crop::Maiz);
    let config = RecommendationConfig::default();
    let (window, alternatives) = builder().build(&ctx, &prediction(280, 0.9)).unwrap();

    assert!(!alternatives.is_empty());
    assert!(alternatives.len() <= config.max_alternatives);
    assert!(validate_alternatives(&window, &alternatives, config.max_alternatives).is_ok());
    for alt in &alternatives {
        assert!(alt.confidence < window.confidence);
        assert_ne!(alt.date, window.optimal_date);
        assert!(alt.scenario.is_some());
    }
}

#[test]
fn indicators_carry_completeness_and_model_confidence() {
    let ctx = full_context(Crop::Soja);
    let (window, _) = builder().build(&ctx, &prediction(300, 0.8)).unwrap();

    assert_eq!(window.indicators.get("completitud_datos"), Some(&ctx.completeness));
    assert_eq!(window.indicators.get("confianza_modelo"), Some(&0.8));
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Any in-range prediction yields an ordered window with confidence in
    /// [0, 1], for every crop.
    #[test]
    fn window_invariants_hold_for_any_prediction(
        day in 1u32..=365,
        model_confidence in 0.0f64..=1.0,
        crop_idx in 0usize..4,
    ) {
        let crop = [Crop::Maiz, Crop::Soja, Crop::Trigo, Crop::Girasol][crop_idx];
        let ctx = full_context(crop);
        let (window, alternatives) = builder()
            .build(&ctx, &prediction(day, model_confidence))
            .unwrap();

        prop_assert!(validate_window(&window).is_ok());
        prop_assert!(validate_alternatives(&window, &alternatives, 3).is_ok());

        let (period_start, period_end) = crop.sowing_period(2026);
        prop_assert!(window.optimal_date >= period_start);
        prop_assert!(window.optimal_date <= period_end);
    }

    /// Confidence never exceeds either of its two factors.
    #[test]
    fn confidence_bounded_by_factors(
        model_confidence in 0.0f64..=1.0,
        climate_days in 0usize..=10,
        has_soil in proptest::bool::ANY,
    ) {
        let campaign = Campaign::parse("2025/2026").unwrap();
        let ctx = test_context(
            Uuid::from_u128(9),
            Crop::Maiz,
            &campaign,
            date(2025, 8, 20),
            climate_days,
            has_soil,
            1,
        );
        let (window, _) = builder()
            .build(&ctx, &prediction(280, model_confidence))
            .unwrap();

        prop_assert!(window.confidence <= model_confidence + 1e-12);
        prop_assert!(window.confidence <= ctx.completeness + 1e-12);
    }
}
