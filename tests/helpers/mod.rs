use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wayfinder::orchestrator::prelude::*;

/// Classifier that replays scripted answers in order, falling back to the
/// safe defaults (Planner, Satisfied) once a script runs dry.
pub struct ScriptedClassifier {
    routes: Mutex<VecDeque<RouteTarget>>,
    verdicts: Mutex<VecDeque<ValidationVerdict>>,
    route_calls: AtomicUsize,
    validate_calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(VecDeque::new()),
            verdicts: Mutex::new(VecDeque::new()),
            route_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_routes(self, routes: impl IntoIterator<Item = RouteTarget>) -> Self {
        self.routes.lock().unwrap().extend(routes);
        self
    }

    pub fn with_verdicts(self, verdicts: impl IntoIterator<Item = ValidationVerdict>) -> Self {
        self.verdicts.lock().unwrap().extend(verdicts);
        self
    }

    pub fn route_calls(&self) -> usize {
        self.route_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }
}

impl Classifier for ScriptedClassifier {
    fn route(&self, _context: RouteContext) -> BoxFuture<'_, GraphResult<RouteDecision>> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        let target = self
            .routes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RouteTarget::Planner);
        Box::pin(async move { Ok(RouteDecision { target }) })
    }

    fn validate(
        &self,
        _context: ValidationContext,
    ) -> BoxFuture<'_, GraphResult<ValidationVerdict>> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        let verdict = self
            .verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ValidationVerdict::satisfied());
        Box::pin(async move { Ok(verdict) })
    }
}

/// Handler stub that records its execution as a `{node}_search` side result.
pub fn stub_handler(id: NodeId) -> NodeSpec {
    let key = format!("{}_search", id.as_str());
    NodeSpec::new(id, move |_state| {
        let key = key.clone();
        async move {
            Ok(StateDelta::default().with_side_result(key, serde_json::json!({"ok": true})))
        }
    })
}

/// Destination-discovery stub: publishes candidates and pauses the run until
/// the user picks one.
pub fn destination_handler() -> NodeSpec {
    NodeSpec::new(NodeId::DestinationPlanner, |_state| async move {
        let mut delta = StateDelta::default().with_side_result(
            "destination_recommendations",
            serde_json::json!({
                "recommendations": [
                    {"destination": "San Diego, California"},
                    {"destination": "Lisbon, Portugal"},
                    {"destination": "Kyoto, Japan"},
                ]
            }),
        );
        delta.meta.awaiting_destination = Some(true);
        Ok(delta)
    })
}

pub fn build_graph(classifier: Arc<dyn Classifier>) -> CompiledGraph {
    let mut builder = PlannerGraphBuilder::new(classifier).with_handler(destination_handler());
    for id in [
        NodeId::Planner,
        NodeId::PlannerExecution,
        NodeId::Flight,
        NodeId::Hotel,
        NodeId::Activity,
        NodeId::Itinerary,
    ] {
        builder = builder.with_handler(stub_handler(id));
    }
    builder.build().expect("valid topology")
}

pub fn build_service(
    classifier: Arc<ScriptedClassifier>,
) -> (PlannerService, Arc<InMemorySessionStore>) {
    let graph = build_graph(Arc::clone(&classifier) as Arc<dyn Classifier>);
    let store = Arc::new(InMemorySessionStore::new());
    let service = PlannerService::new(
        graph,
        classifier as Arc<dyn Classifier>,
        Arc::clone(&store) as Arc<dyn SessionStore>,
    );
    (service, store)
}
