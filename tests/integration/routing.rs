use std::sync::Arc;

use wayfinder::orchestrator::prelude::*;

use crate::helpers::{build_service, ScriptedClassifier};

#[test]
fn first_turn_routes_to_a_real_handler() {
    let classifier = Arc::new(ScriptedClassifier::new().with_routes([RouteTarget::Flight]));
    let (service, store) = build_service(Arc::clone(&classifier));

    let outcome = service.submit("s1", "find me a flight to Lisbon");

    let state = store.get("s1").expect("stored");
    assert!(state.side_results.contains_key("flight_search"));
    let routed = state
        .history
        .iter()
        .find_map(|message| message.annotation("route_decision"))
        .expect("route decision recorded");
    assert_eq!(routed, &serde_json::json!("flight"));
    assert_eq!(outcome.termination, Some(TerminationReason::Satisfied));
    assert_eq!(classifier.route_calls(), 1);
}

#[test]
fn handlers_flow_through_the_validator() {
    let classifier = Arc::new(ScriptedClassifier::new().with_routes([RouteTarget::Hotel]));
    let (service, _store) = build_service(Arc::clone(&classifier));

    service.submit("s1", "book me a hotel");
    // Hotel handed off to the Validator, which consulted the classifier once.
    assert_eq!(classifier.validate_calls(), 1);
}

#[test]
fn destination_discovery_pauses_for_the_user() {
    let classifier =
        Arc::new(ScriptedClassifier::new().with_routes([RouteTarget::DestinationPlanner]));
    let (service, store) = build_service(classifier);

    let outcome = service.submit("s1", "I want to travel somewhere warm");

    assert_eq!(outcome.termination, Some(TerminationReason::AwaitingUser));
    let state = store.get("s1").expect("stored");
    assert!(state.meta.awaiting_destination);
    assert!(!state.meta.destination_selected);
    assert!(outcome
        .suggestions
        .iter()
        .any(|suggestion| suggestion.action == ActionKind::SelectDestination));
    assert!(outcome
        .suggestions
        .iter()
        .any(|suggestion| suggestion.action == ActionKind::ShowMoreDestinations));
}

#[test]
fn planner_with_pending_steps_goes_through_execution() {
    let classifier: Arc<dyn Classifier> =
        Arc::new(ScriptedClassifier::new().with_routes([RouteTarget::Planner]));

    // Planner that emits a plan with an unexecuted step.
    let planner = NodeSpec::new(NodeId::Planner, |_state| async move {
        Ok(StateDelta {
            plan: Some(ExecutionPlan::new(vec![PlanStep::new(
                "step-1",
                ActionKind::SearchFlights,
            )])),
            ..StateDelta::default()
        })
    });

    let mut builder =
        PlannerGraphBuilder::new(Arc::clone(&classifier)).with_handler(planner);
    for id in [
        NodeId::DestinationPlanner,
        NodeId::PlannerExecution,
        NodeId::Flight,
        NodeId::Hotel,
        NodeId::Activity,
        NodeId::Itinerary,
    ] {
        builder = builder.with_handler(crate::helpers::stub_handler(id));
    }
    let graph = builder.build().expect("build");
    let store = Arc::new(InMemorySessionStore::new());
    let service = PlannerService::new(graph, classifier, Arc::clone(&store) as _);

    service.submit("s1", "plan everything for me");
    let state = store.get("s1").expect("stored");
    assert!(state.side_results.contains_key("planner_execution_search"));
}
