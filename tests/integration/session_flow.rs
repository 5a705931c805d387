use std::sync::Arc;

use wayfinder::orchestrator::prelude::*;

use crate::helpers::{build_service, ScriptedClassifier};

#[test]
fn sessions_are_isolated_from_each_other() {
    let classifier = Arc::new(
        ScriptedClassifier::new().with_routes([RouteTarget::Flight, RouteTarget::Hotel]),
    );
    let (service, store) = build_service(classifier);

    service.submit("alice", "flight please");
    service.submit("bob", "hotel please");

    assert_eq!(store.len(), 2);
    let alice = store.get("alice").expect("stored");
    let bob = store.get("bob").expect("stored");
    assert!(alice.side_results.contains_key("flight_search"));
    assert!(!alice.side_results.contains_key("hotel_search"));
    assert!(bob.side_results.contains_key("hotel_search"));
    assert!(!bob.side_results.contains_key("flight_search"));
}

#[test]
fn concurrent_turns_on_one_session_serialize() {
    let classifier = Arc::new(
        ScriptedClassifier::new().with_routes([RouteTarget::Flight, RouteTarget::Hotel]),
    );
    let (service, store) = build_service(classifier);
    let service = Arc::new(service);

    let a = Arc::clone(&service);
    let b = Arc::clone(&service);
    let first = std::thread::spawn(move || a.submit("s1", "find flights"));
    let second = std::thread::spawn(move || b.submit("s1", "find hotels"));
    first.join().expect("first turn");
    second.join().expect("second turn");

    // Both turns completed against the same record; neither overwrote the
    // other's results.
    let state = store.get("s1").expect("stored");
    assert!(state.side_results.contains_key("flight_search"));
    assert!(state.side_results.contains_key("hotel_search"));
    let user_messages = state
        .history
        .iter()
        .filter(|message| message.role == MessageRole::User)
        .count();
    assert_eq!(user_messages, 2);
    assert_eq!(store.len(), 1);
}

#[test]
fn a_session_survives_many_turns() {
    let classifier = Arc::new(ScriptedClassifier::new().with_routes([
        RouteTarget::Flight,
        RouteTarget::Hotel,
        RouteTarget::Activity,
        RouteTarget::Itinerary,
    ]));
    let (service, store) = build_service(classifier);

    for text in ["flights", "hotels", "activities", "itinerary"] {
        let outcome = service.submit("s1", text);
        assert_eq!(outcome.termination, Some(TerminationReason::Satisfied));
    }

    let state = store.get("s1").expect("stored");
    for key in [
        "flight_search",
        "hotel_search",
        "activity_search",
        "itinerary_search",
    ] {
        assert!(state.side_results.contains_key(key), "missing {}", key);
    }
}

#[test]
fn selecting_against_an_unknown_session_starts_fresh() {
    let classifier = Arc::new(ScriptedClassifier::new());
    let (service, store) = build_service(classifier);

    let outcome = service.select("ghost", "A1");
    assert!(!outcome.suggestions.is_empty());
    assert!(store.get("ghost").is_some());
}
