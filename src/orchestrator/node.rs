//! Node identity, routing directives, and the node execution contract.
//!
//! Node identity is a closed enum rather than a free-form label: the edge
//! resolver can match exhaustively, and an unknown destination can only enter
//! the system at the single classifier deserialization boundary
//! (`RouteTarget::parse`).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::orchestrator::error::GraphResult;
use crate::orchestrator::state::{StateDelta, TripState};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The fixed set of nodes the graph can dispatch to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Router,
    DestinationPlanner,
    Planner,
    PlannerExecution,
    Flight,
    Hotel,
    Activity,
    Itinerary,
    Validator,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Router => "router",
            NodeId::DestinationPlanner => "destination_planner",
            NodeId::Planner => "planner",
            NodeId::PlannerExecution => "planner_execution",
            NodeId::Flight => "flight",
            NodeId::Hotel => "hotel",
            NodeId::Activity => "activity",
            NodeId::Itinerary => "itinerary",
            NodeId::Validator => "validator",
        }
    }
}

/// Where the run loop goes next: a node, or the terminal sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    Node(NodeId),
    End,
}

impl Directive {
    pub fn is_end(&self) -> bool {
        matches!(self, Directive::End)
    }
}

/// Why a run stopped. A single terminal path carries the reason; the step
/// ceiling takes precedence when several conditions hold at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The Validator (or Router) judged the goal satisfied.
    Satisfied,
    /// Destination discovery is waiting on a user selection.
    AwaitingUser,
    /// The Validator hit its iteration bound.
    ValidationBudgetExhausted,
    /// The run loop hit `MAX_STEPS`.
    StepBudgetExhausted,
}

/// Routing target as spoken by the classifier dependency.
///
/// This is the only place free text becomes a directive. Anything outside the
/// enum is rejected here and coerced to a safe default by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    DestinationPlanner,
    Planner,
    Flight,
    Hotel,
    Activity,
    Itinerary,
    Validator,
    End,
}

impl RouteTarget {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_uppercase().as_str() {
            "DESTINATION_PLANNER" => Some(RouteTarget::DestinationPlanner),
            "PLANNER" => Some(RouteTarget::Planner),
            "FLIGHT" => Some(RouteTarget::Flight),
            "HOTEL" => Some(RouteTarget::Hotel),
            "ACTIVITY" => Some(RouteTarget::Activity),
            "ITINERARY" => Some(RouteTarget::Itinerary),
            "REASONING" | "VALIDATOR" => Some(RouteTarget::Validator),
            "END" => Some(RouteTarget::End),
            _ => None,
        }
    }

    pub fn directive(&self) -> Directive {
        match self {
            RouteTarget::DestinationPlanner => Directive::Node(NodeId::DestinationPlanner),
            RouteTarget::Planner => Directive::Node(NodeId::Planner),
            RouteTarget::Flight => Directive::Node(NodeId::Flight),
            RouteTarget::Hotel => Directive::Node(NodeId::Hotel),
            RouteTarget::Activity => Directive::Node(NodeId::Activity),
            RouteTarget::Itinerary => Directive::Node(NodeId::Itinerary),
            RouteTarget::Validator => Directive::Node(NodeId::Validator),
            RouteTarget::End => Directive::End,
        }
    }
}

type NodeRunner =
    dyn Fn(TripState) -> BoxFuture<'static, GraphResult<StateDelta>> + Send + Sync + 'static;

/// A unit of work: a function from state to a partial update.
///
/// Handlers out of the orchestrator's scope (flight, hotel, activity,
/// itinerary search) plug in through exactly this contract.
#[derive(Clone)]
pub struct NodeSpec {
    id: NodeId,
    runner: Arc<NodeRunner>,
}

impl NodeSpec {
    pub fn new<F, Fut>(id: NodeId, runner: F) -> Self
    where
        F: Fn(TripState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GraphResult<StateDelta>> + Send + 'static,
    {
        Self {
            id,
            runner: Arc::new(move |state| Box::pin(runner(state))),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn execute(&self, state: TripState) -> BoxFuture<'static, GraphResult<StateDelta>> {
        (self.runner)(state)
    }
}
