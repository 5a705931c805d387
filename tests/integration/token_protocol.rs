use std::sync::Arc;

use wayfinder::orchestrator::prelude::*;

use crate::helpers::{build_service, ScriptedClassifier};

#[test]
fn suggestion_batches_are_well_formed() {
    let classifier = Arc::new(ScriptedClassifier::new());
    let (service, _store) = build_service(classifier);

    let outcome = service.submit("s1", "plan a trip");

    assert!(!outcome.suggestions.is_empty());
    assert!(outcome.suggestions.len() <= MAX_SUGGESTIONS);
    for (index, suggestion) in outcome.suggestions.iter().enumerate() {
        assert_eq!(suggestion.token, format!("A{}", index + 1));
        assert!(!suggestion.description.is_empty());
    }
    // The listing shown to the user names every token.
    let listing = outcome
        .messages
        .iter()
        .find(|message| message.annotation("suggestions").is_some())
        .expect("suggestion listing");
    for suggestion in &outcome.suggestions {
        assert!(listing.content.contains(&suggestion.token));
    }
}

#[test]
fn selecting_a_token_skips_the_router() {
    let classifier = Arc::new(ScriptedClassifier::new().with_routes([RouteTarget::Planner]));
    let (service, store) = build_service(Arc::clone(&classifier));

    let first = service.submit("s1", "plan a trip");
    assert_eq!(classifier.route_calls(), 1);
    let token = first.suggestions[0].token.clone();

    service.select("s1", &token);
    assert_eq!(classifier.route_calls(), 1);

    // The selection landed in the transcript as the user's words.
    let state = store.get("s1").expect("stored");
    let selected = state
        .history
        .iter()
        .find(|message| message.annotation("selected_token").is_some())
        .expect("synthetic selection message");
    assert_eq!(selected.role, MessageRole::User);
    assert!(selected.content.starts_with("I'd like to: "));
}

#[test]
fn stale_token_falls_back_to_plain_routing() {
    let classifier = Arc::new(ScriptedClassifier::new());
    let (service, store) = build_service(Arc::clone(&classifier));

    service.submit("s1", "plan a trip");
    let calls_after_submit = classifier.route_calls();

    let outcome = service.select("s1", "Z9");
    assert_eq!(classifier.route_calls(), calls_after_submit + 1);
    assert!(!outcome.messages.is_empty());

    let state = store.get("s1").expect("stored");
    assert!(state
        .history
        .iter()
        .any(|message| message.role == MessageRole::User && message.content == "Z9"));
}

#[test]
fn selecting_invalidates_the_whole_batch() {
    let classifier = Arc::new(ScriptedClassifier::new());
    let (service, _store) = build_service(Arc::clone(&classifier));

    let first = service.submit("s1", "plan a trip");
    let last = first.suggestions.last().expect("batch").token.clone();

    // Consume the batch through its first token; the follow-up batch is
    // smaller because the searched category drops out.
    let next = service.select("s1", &first.suggestions[0].token);
    assert!(next.suggestions.len() < first.suggestions.len());
    let calls_before_replay = classifier.route_calls();

    // The old batch's trailing token is gone and routes as plain text.
    service.select("s1", &last);
    assert_eq!(classifier.route_calls(), calls_before_replay + 1);
}

#[test]
fn destination_selection_round_trip() {
    let classifier =
        Arc::new(ScriptedClassifier::new().with_routes([RouteTarget::DestinationPlanner]));
    let (service, store) = build_service(Arc::clone(&classifier));

    let discovery = service.submit("s1", "somewhere warm in spring");
    assert_eq!(discovery.termination, Some(TerminationReason::AwaitingUser));
    let candidate = discovery
        .suggestions
        .iter()
        .find(|suggestion| suggestion.action == ActionKind::SelectDestination)
        .expect("destination candidates offered");
    let expected = candidate.destination.clone().expect("payload");

    let outcome = service.select("s1", &candidate.token);

    let state = store.get("s1").expect("stored");
    assert_eq!(
        state.preferences.get("destination"),
        Some(&serde_json::json!(expected))
    );
    assert!(state.meta.destination_selected);
    assert!(!state.meta.awaiting_destination);
    assert_eq!(outcome.termination, Some(TerminationReason::Satisfied));
    // Selection went straight to planning; the router was only used for the
    // discovery turn.
    assert_eq!(classifier.route_calls(), 1);
}

#[test]
fn show_more_destinations_reenters_discovery() {
    let classifier =
        Arc::new(ScriptedClassifier::new().with_routes([RouteTarget::DestinationPlanner]));
    let (service, _store) = build_service(classifier);

    let discovery = service.submit("s1", "somewhere warm");
    let more = discovery
        .suggestions
        .iter()
        .find(|suggestion| suggestion.action == ActionKind::ShowMoreDestinations)
        .expect("escape hatch offered");

    let outcome = service.select("s1", &more.token);
    // Still waiting on a pick, with a fresh candidate batch.
    assert_eq!(outcome.termination, Some(TerminationReason::AwaitingUser));
    assert!(outcome
        .suggestions
        .iter()
        .any(|suggestion| suggestion.action == ActionKind::SelectDestination));
}
