//! Property-based tests for the performance tracker.
//!
//! Invariants covered:
//! - the recent window holds min(N, 10) answers, oldest evicted first
//! - lifetime accuracy always matches the two counters
//! - the difficulty level never leaves [0, 1]
//! - fewer than three answers never move the level

use chrono::Utc;
use proptest::prelude::*;

use quizito_backend::adaptive::profile::RECENT_WINDOW;
use quizito_backend::adaptive::{AnswerOutcome, PerformanceProfile, Trend};

fn arb_outcome() -> impl Strategy<Value = AnswerOutcome> {
    (
        any::<bool>(),
        proptest::option::of(-10.0f64..600.0),
        proptest::option::of(-1.0f64..2.0),
    )
        .prop_map(|(is_correct, time_taken, difficulty)| AnswerOutcome {
            question_id: None,
            is_correct,
            time_taken,
            difficulty,
        })
}

fn arb_level() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 1000.0)
}

fn replay(outcomes: &[AnswerOutcome], start_level: f64) -> PerformanceProfile {
    let mut profile = PerformanceProfile::new("prop-user");
    profile.current_difficulty_level = start_level;
    for (i, outcome) in outcomes.iter().enumerate() {
        let mut outcome = outcome.clone();
        outcome.question_id = Some(format!("q{i}"));
        profile.record_answer(outcome, Utc::now());
    }
    profile
}

proptest! {
    #[test]
    fn window_is_bounded_and_fifo(outcomes in prop::collection::vec(arb_outcome(), 0..40)) {
        let profile = replay(&outcomes, 0.5);

        let expected_len = outcomes.len().min(RECENT_WINDOW);
        prop_assert_eq!(profile.recent_performance.len(), expected_len);

        let first_kept = outcomes.len() - expected_len;
        let ids: Vec<String> = profile
            .recent_performance
            .iter()
            .filter_map(|r| r.question_id.clone())
            .collect();
        let expected: Vec<String> = (first_kept..outcomes.len()).map(|i| format!("q{i}")).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn accuracy_matches_counters(outcomes in prop::collection::vec(arb_outcome(), 1..40)) {
        let mut profile = PerformanceProfile::new("prop-user");
        let mut last_total = 0;
        let mut last_correct = 0;

        for outcome in outcomes {
            profile.record_answer(outcome, Utc::now());

            prop_assert!(profile.total_questions_answered > last_total);
            prop_assert!(profile.total_correct_answers >= last_correct);
            prop_assert!(profile.total_correct_answers <= profile.total_questions_answered);

            let expected = profile.total_correct_answers as f64
                / profile.total_questions_answered as f64
                * 100.0;
            prop_assert!((profile.average_accuracy - expected).abs() < 1e-9);

            last_total = profile.total_questions_answered;
            last_correct = profile.total_correct_answers;
        }
    }

    #[test]
    fn level_stays_in_unit_interval(
        start in arb_level(),
        outcomes in prop::collection::vec(arb_outcome(), 0..60),
    ) {
        let mut profile = PerformanceProfile::new("prop-user");
        profile.current_difficulty_level = start;
        for outcome in outcomes {
            profile.record_answer(outcome, Utc::now());
            prop_assert!((0.0..=1.0).contains(&profile.current_difficulty_level));
        }
    }

    #[test]
    fn two_answers_never_adjust(
        start in arb_level(),
        outcomes in prop::collection::vec(arb_outcome(), 0..3),
    ) {
        let profile = replay(&outcomes, start);
        prop_assert_eq!(profile.current_difficulty_level, start);
    }

    #[test]
    fn short_windows_are_stable(outcomes in prop::collection::vec(arb_outcome(), 0..5)) {
        let profile = replay(&outcomes, 0.5);
        prop_assert_eq!(profile.trend(), Trend::Stable);
    }
}
