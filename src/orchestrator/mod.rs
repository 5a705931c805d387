//! Wayfinder orchestrator
//!
//! A graph-driven run loop for conversational trip planning.
//!
//! ## Features
//!
//! - **State Graph**: Nodes and edges over a shared session record
//! - **Conditional Routing**: A classifier picks the handler for each turn
//! - **Validation Loop**: Bounded refinement with forced termination
//! - **Follow-up Tokens**: Suggested next actions the user can select by token
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wayfinder::orchestrator::prelude::*;
//!
//! fn handler(id: NodeId) -> NodeSpec {
//!     NodeSpec::new(id, move |_state| async move {
//!         Ok(StateDelta::default().with_side_result("flight_search", serde_json::json!({})))
//!     })
//! }
//!
//! let classifier: Arc<dyn Classifier> = Arc::new(MockClassifier::new());
//! let mut builder = PlannerGraphBuilder::new(Arc::clone(&classifier));
//! for id in [
//!     NodeId::DestinationPlanner,
//!     NodeId::Planner,
//!     NodeId::PlannerExecution,
//!     NodeId::Flight,
//!     NodeId::Hotel,
//!     NodeId::Activity,
//!     NodeId::Itinerary,
//! ] {
//!     builder = builder.with_handler(handler(id));
//! }
//! let graph = builder.build().expect("valid topology");
//!
//! let store = Arc::new(InMemorySessionStore::new());
//! let service = PlannerService::new(graph, classifier, store);
//! let outcome = service.submit("session-1", "plan a long weekend in Lisbon");
//! for suggestion in &outcome.suggestions {
//!     println!("[{}] {}", suggestion.token, suggestion.description);
//! }
//! ```

pub mod classifier;
pub mod constants;
pub mod error;
pub mod executor;
pub mod followup;
pub mod graph;
pub mod message;
pub mod node;
pub mod plan;
pub mod provider;
pub mod router;
pub mod service;
pub mod session;
pub mod state;
pub mod validator;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::orchestrator::classifier::{
        Classifier, MockClassifier, RouteContext, RouteDecision, ValidationContext,
        ValidationVerdict,
    };
    pub use crate::orchestrator::constants::{
        MAX_STEPS, MAX_SUGGESTIONS, MAX_VALIDATION_ITERATIONS,
    };
    pub use crate::orchestrator::error::{GraphError, GraphResult};
    pub use crate::orchestrator::executor::CompiledGraph;
    pub use crate::orchestrator::followup::{
        generate_suggestions, resolve_token, ActionRegistry, Suggestion,
    };
    pub use crate::orchestrator::graph::{Edge, PlannerGraphBuilder, StateGraph};
    pub use crate::orchestrator::message::{Message, MessageRole};
    pub use crate::orchestrator::node::{
        BoxFuture, Directive, NodeId, NodeSpec, RouteTarget, TerminationReason,
    };
    pub use crate::orchestrator::plan::{ActionKind, ExecutionPlan, PlanStep};
    pub use crate::orchestrator::provider::openai::{OpenAiClassifier, OpenAiClassifierConfig};
    pub use crate::orchestrator::router::router_node;
    pub use crate::orchestrator::service::{PlannerService, TurnOutcome};
    pub use crate::orchestrator::session::{InMemorySessionStore, SessionStore};
    pub use crate::orchestrator::state::{MetaDelta, SessionMeta, StateDelta, TripState};
    pub use crate::orchestrator::validator::validator_node;
}
