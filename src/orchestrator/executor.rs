//! The run loop: drive nodes until a terminal directive or the step budget.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::orchestrator::constants::MAX_STEPS;
use crate::orchestrator::graph::Edge;
use crate::orchestrator::message::Message;
use crate::orchestrator::node::{Directive, NodeId, NodeSpec, TerminationReason};
use crate::orchestrator::state::{StateDelta, TripState};

/// A compiled orchestration graph, ready for execution. Stateless and safe to
/// share across sessions.
pub struct CompiledGraph {
    nodes: HashMap<NodeId, NodeSpec>,
    edges: HashMap<NodeId, Edge>,
    entry: NodeId,
    max_steps: usize,
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("entry", &self.entry)
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl CompiledGraph {
    pub(crate) fn new(
        nodes: HashMap<NodeId, NodeSpec>,
        edges: HashMap<NodeId, Edge>,
        entry: NodeId,
    ) -> Self {
        Self {
            nodes,
            edges,
            entry,
            max_steps: MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Execute the graph to termination.
    ///
    /// Never returns an error: node failures become apology deltas routed to
    /// the Validator, and step-budget exhaustion returns the partial state
    /// flagged with `forced_end`. The caller always gets a state back.
    pub async fn run(&self, mut state: TripState) -> TripState {
        let mut current = match state.directive.take() {
            Some(Directive::Node(id)) => Some(id),
            Some(Directive::End) => None,
            None => Some(self.entry),
        };
        let mut steps = 0usize;

        while let Some(node_id) = current {
            if steps >= self.max_steps {
                warn!(
                    session_id = %state.session_id,
                    steps,
                    "step budget exhausted, forcing termination"
                );
                state.meta.forced_end = true;
                // Step-budget exhaustion wins over any reason set earlier in
                // this run.
                state.meta.termination = Some(TerminationReason::StepBudgetExhausted);
                return state;
            }
            steps += 1;

            let Some(node) = self.nodes.get(&node_id) else {
                warn!(node = node_id.as_str(), "directive targets an unregistered node");
                break;
            };

            debug!(node = node_id.as_str(), step = steps, "executing node");
            match node.execute(state.clone()).await {
                Ok(delta) => state.apply(delta),
                Err(err) => {
                    warn!(node = node_id.as_str(), error = %err, "node failed, recovering");
                    state.apply(recovery_delta(node_id));
                }
            }

            current = match state.directive.take() {
                Some(Directive::Node(id)) => Some(id),
                Some(Directive::End) => None,
                None => match self.edges.get(&node_id) {
                    Some(Edge::Direct(Directive::Node(id))) => Some(*id),
                    Some(Edge::Direct(Directive::End)) => None,
                    Some(Edge::Conditional(route)) => match route(&state) {
                        Directive::Node(id) => Some(id),
                        Directive::End => None,
                    },
                    None => {
                        debug!(node = node_id.as_str(), "no outgoing edge, ending run");
                        None
                    }
                },
            };
        }

        if state.meta.termination.is_none() {
            state.meta.termination =
                Some(if state.meta.awaiting_destination && !state.meta.destination_selected {
                    TerminationReason::AwaitingUser
                } else {
                    TerminationReason::Satisfied
                });
        }
        state
    }
}

/// Delta applied when a node fails: an apology the user can see, then on to
/// the Validator so the session still gets a verdict and fresh suggestions.
fn recovery_delta(failed: NodeId) -> StateDelta {
    let directive = if failed == NodeId::Validator {
        Directive::End
    } else {
        Directive::Node(NodeId::Validator)
    };
    StateDelta {
        messages: vec![Message::assistant(
            "Something went wrong while working on that step. Let's keep going with what we have.",
        )
        .with_annotation("recovered_from", serde_json::json!(failed.as_str()))],
        directive: Some(directive),
        ..StateDelta::default()
    }
}
