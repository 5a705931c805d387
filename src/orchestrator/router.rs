//! Router node: decide which handler acts on the latest message.

use std::sync::Arc;

use tracing::{info, warn};

use crate::orchestrator::classifier::{Classifier, RouteContext};
use crate::orchestrator::message::Message;
use crate::orchestrator::node::{Directive, NodeId, NodeSpec, RouteTarget};
use crate::orchestrator::state::{StateDelta, TripState};

/// Build the Router node around a classifier.
///
/// The classifier is advisory only: its answer is parsed against the closed
/// target set and anything invalid is corrected to the planning handler. A
/// classifier failure routes the same way, so a routing turn never crashes.
pub fn router_node(classifier: Arc<dyn Classifier>) -> NodeSpec {
    NodeSpec::new(NodeId::Router, move |state: TripState| {
        let classifier = Arc::clone(&classifier);
        async move {
            if state.history.is_empty() {
                warn!(session_id = %state.session_id, "router invoked with empty history");
                return Ok(StateDelta::default().with_directive(Directive::End));
            }

            // A freshly selected destination must flow into full planning
            // without another classification round.
            if state.meta.destination_selected && state.plan.is_none() {
                info!(session_id = %state.session_id, "destination selected, routing to planner");
                return Ok(routing_delta(RouteTarget::Planner));
            }

            let target = match classifier.route(RouteContext::from_state(&state)).await {
                Ok(decision) => decision.target,
                Err(err) => {
                    warn!(error = %err, "route classification failed, defaulting to planner");
                    RouteTarget::Planner
                }
            };
            info!(target = ?target, "router decision");
            Ok(routing_delta(target))
        }
    })
}

fn routing_delta(target: RouteTarget) -> StateDelta {
    let directive = target.directive();
    let announcement = match directive {
        Directive::Node(node) => format!("Routing to {}...", node.as_str()),
        Directive::End => "Nothing further to do.".to_string(),
    };
    StateDelta::message(
        Message::assistant(announcement).with_annotation(
            "route_decision",
            serde_json::to_value(target).unwrap_or(serde_json::Value::Null),
        ),
    )
    .with_directive(directive)
}
