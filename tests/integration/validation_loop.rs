use std::sync::Arc;

use wayfinder::orchestrator::prelude::*;

use crate::helpers::{build_service, ScriptedClassifier};

#[test]
fn insatiable_validator_is_cut_off_after_the_iteration_bound() {
    // The classifier never reports satisfied; every verdict demands another
    // flight search.
    let classifier = Arc::new(ScriptedClassifier::new().with_verdicts([
        ValidationVerdict::needs_more_work(RouteTarget::Flight),
        ValidationVerdict::needs_more_work(RouteTarget::Flight),
        ValidationVerdict::needs_more_work(RouteTarget::Flight),
    ]));
    let (service, store) = build_service(Arc::clone(&classifier));

    let outcome = service.submit("s1", "plan a trip");

    let state = store.get("s1").expect("stored");
    assert!(state.meta.forced_end);
    assert_eq!(
        outcome.termination,
        Some(TerminationReason::ValidationBudgetExhausted)
    );
    assert_eq!(state.meta.validation_iterations, MAX_VALIDATION_ITERATIONS);
    // The final validator pass forced the end without consulting the
    // classifier again.
    assert_eq!(classifier.validate_calls() as u32, MAX_VALIDATION_ITERATIONS - 1);
}

#[test]
fn satisfied_verdict_ends_without_forcing() {
    let classifier = Arc::new(ScriptedClassifier::new());
    let (service, store) = build_service(classifier);

    let outcome = service.submit("s1", "plan a trip");

    let state = store.get("s1").expect("stored");
    assert!(!state.meta.forced_end);
    assert_eq!(outcome.termination, Some(TerminationReason::Satisfied));
    assert_eq!(state.meta.validation_iterations, 1);
}

#[test]
fn one_refinement_round_then_the_bound_cuts_in() {
    let classifier = Arc::new(ScriptedClassifier::new().with_verdicts([
        ValidationVerdict::needs_more_work(RouteTarget::Hotel),
        ValidationVerdict::satisfied(),
    ]));
    let (service, store) = build_service(Arc::clone(&classifier));

    service.submit("s1", "plan a trip");

    let state = store.get("s1").expect("stored");
    assert!(state.side_results.contains_key("hotel_search"));
    assert_eq!(state.meta.validation_iterations, MAX_VALIDATION_ITERATIONS);
    // Both validator runs happened, the second forced the end before the
    // scripted Satisfied could be consumed.
    assert!(state.meta.forced_end);
}

#[test]
fn validation_counter_resets_between_turns() {
    let classifier = Arc::new(ScriptedClassifier::new());
    let (service, store) = build_service(classifier);

    service.submit("s1", "plan a trip");
    service.submit("s1", "actually add a hotel");

    let state = store.get("s1").expect("stored");
    assert_eq!(state.meta.validation_iterations, 1);
    assert!(!state.meta.forced_end);
}
