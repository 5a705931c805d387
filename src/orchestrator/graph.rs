//! Graph construction: node registry, edges, and the trip-planner topology.

use std::collections::HashMap;
use std::sync::Arc;

use crate::orchestrator::classifier::Classifier;
use crate::orchestrator::error::{GraphError, GraphResult};
use crate::orchestrator::executor::CompiledGraph;
use crate::orchestrator::node::{Directive, NodeId, NodeSpec};
use crate::orchestrator::router::router_node;
use crate::orchestrator::state::TripState;
use crate::orchestrator::validator::validator_node;

/// Outgoing edge for a node. Router and Validator steer through the directive
/// in their delta instead; a node with neither an edge nor a directive falls
/// through to the terminal sentinel.
#[derive(Clone)]
pub enum Edge {
    Direct(Directive),
    Conditional(Arc<dyn Fn(&TripState) -> Directive + Send + Sync>),
}

/// Builder for an orchestration graph.
pub struct StateGraph {
    nodes: HashMap<NodeId, NodeSpec>,
    edges: HashMap<NodeId, Edge>,
    entry: NodeId,
}

impl StateGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: NodeId::Router,
        }
    }

    pub fn add_node(&mut self, node: NodeSpec) -> &mut Self {
        self.nodes.insert(node.id(), node);
        self
    }

    pub fn add_edge(&mut self, from: NodeId, to: Directive) -> &mut Self {
        self.edges.insert(from, Edge::Direct(to));
        self
    }

    pub fn add_conditional_edges<F>(&mut self, from: NodeId, route: F) -> &mut Self
    where
        F: Fn(&TripState) -> Directive + Send + Sync + 'static,
    {
        self.edges.insert(from, Edge::Conditional(Arc::new(route)));
        self
    }

    pub fn set_entry(&mut self, entry: NodeId) -> &mut Self {
        self.entry = entry;
        self
    }

    /// Validate the graph and freeze it for execution.
    ///
    /// Every direct edge target, the entry node, and the Validator (the
    /// recovery target for failing handlers) must be registered.
    pub fn compile(self) -> GraphResult<CompiledGraph> {
        if !self.nodes.contains_key(&self.entry) {
            return Err(GraphError::InvalidGraph {
                message: format!("entry node {} not registered", self.entry.as_str()),
            });
        }
        if !self.nodes.contains_key(&NodeId::Validator) {
            return Err(GraphError::InvalidGraph {
                message: "validator node not registered".to_string(),
            });
        }
        for (from, edge) in &self.edges {
            if let Edge::Direct(Directive::Node(to)) = edge {
                if !self.nodes.contains_key(to) {
                    return Err(GraphError::InvalidGraph {
                        message: format!(
                            "edge {} -> {} targets an unregistered node",
                            from.as_str(),
                            to.as_str()
                        ),
                    });
                }
            }
        }
        Ok(CompiledGraph::new(self.nodes, self.edges, self.entry))
    }
}

impl Default for StateGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Wires the trip-planner topology around caller-supplied domain handlers.
///
/// Router and Validator are built in (from the classifier); the seven domain
/// nodes are external collaborators registered through [`with_handler`].
///
/// [`with_handler`]: PlannerGraphBuilder::with_handler
pub struct PlannerGraphBuilder {
    classifier: Arc<dyn Classifier>,
    handlers: HashMap<NodeId, NodeSpec>,
}

const REQUIRED_HANDLERS: [NodeId; 7] = [
    NodeId::DestinationPlanner,
    NodeId::Planner,
    NodeId::PlannerExecution,
    NodeId::Flight,
    NodeId::Hotel,
    NodeId::Activity,
    NodeId::Itinerary,
];

impl PlannerGraphBuilder {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            handlers: HashMap::new(),
        }
    }

    pub fn with_handler(mut self, handler: NodeSpec) -> Self {
        self.handlers.insert(handler.id(), handler);
        self
    }

    pub fn build(self) -> GraphResult<CompiledGraph> {
        for id in REQUIRED_HANDLERS {
            if !self.handlers.contains_key(&id) {
                return Err(GraphError::InvalidGraph {
                    message: format!("missing handler for {}", id.as_str()),
                });
            }
        }

        let mut graph = StateGraph::new();
        graph.add_node(router_node(Arc::clone(&self.classifier)));
        graph.add_node(validator_node(Arc::clone(&self.classifier)));
        for handler in self.handlers.into_values() {
            graph.add_node(handler);
        }

        graph.set_entry(NodeId::Router);

        // Domain handlers hand their results to the Validator.
        for id in [
            NodeId::Flight,
            NodeId::Hotel,
            NodeId::Activity,
            NodeId::Itinerary,
            NodeId::PlannerExecution,
        ] {
            graph.add_edge(id, Directive::Node(NodeId::Validator));
        }

        // A plan with unexecuted steps goes to the execution sub-phase;
        // otherwise straight to validation.
        graph.add_conditional_edges(NodeId::Planner, |state| {
            match &state.plan {
                Some(plan) if plan.has_pending_steps() => {
                    Directive::Node(NodeId::PlannerExecution)
                }
                _ => Directive::Node(NodeId::Validator),
            }
        });

        // Destination discovery pauses the run until the user picks a
        // candidate; once one is selected control returns to the Router.
        graph.add_conditional_edges(NodeId::DestinationPlanner, |state| {
            if state.meta.destination_selected {
                Directive::Node(NodeId::Router)
            } else {
                Directive::End
            }
        });

        graph.compile()
    }
}
