//! The black-box classification dependency used by Router and Validator.
//!
//! The classifier is strictly advisory: everything it returns is parsed into
//! closed enums and intersected with statically known valid targets before
//! the orchestrator acts on it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::orchestrator::error::GraphResult;
use crate::orchestrator::node::{BoxFuture, RouteTarget};
use crate::orchestrator::plan::ActionKind;
use crate::orchestrator::state::TripState;

/// Context summary handed to the classifier for a routing decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteContext {
    pub last_message: String,
    pub message_count: usize,
    pub has_plan: bool,
    pub has_itinerary: bool,
    pub destination_selected: bool,
}

impl RouteContext {
    pub fn from_state(state: &TripState) -> Self {
        Self {
            last_message: state
                .last_message()
                .map(|message| message.content.clone())
                .unwrap_or_default(),
            message_count: state.history.len(),
            has_plan: state.plan.is_some(),
            has_itinerary: state.itinerary.is_some(),
            destination_selected: state.meta.destination_selected,
        }
    }
}

/// Context summary handed to the classifier for a validation verdict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationContext {
    pub executed_steps: usize,
    pub total_steps: usize,
    pub has_itinerary: bool,
    pub side_result_keys: Vec<String>,
    pub message_count: usize,
}

impl ValidationContext {
    pub fn from_state(state: &TripState) -> Self {
        Self {
            executed_steps: state
                .plan
                .as_ref()
                .map(|plan| plan.executed_steps())
                .unwrap_or(0),
            total_steps: state
                .plan
                .as_ref()
                .map(|plan| plan.steps.len())
                .unwrap_or(0),
            has_itinerary: state.itinerary.is_some(),
            side_result_keys: state.side_results.keys().cloned().collect(),
            message_count: state.history.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub target: RouteTarget,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub satisfied: bool,
    pub next_target: Option<RouteTarget>,
}

impl ValidationVerdict {
    pub fn satisfied() -> Self {
        Self {
            satisfied: true,
            next_target: None,
        }
    }

    pub fn needs_more_work(target: RouteTarget) -> Self {
        Self {
            satisfied: false,
            next_target: Some(target),
        }
    }
}

/// Classification seam. Implementations must return within a bounded time;
/// a timeout surfaces as an `Err` and every caller has a fixed safe default.
pub trait Classifier: Send + Sync {
    fn route(&self, context: RouteContext) -> BoxFuture<'_, GraphResult<RouteDecision>>;

    fn validate(&self, context: ValidationContext)
        -> BoxFuture<'_, GraphResult<ValidationVerdict>>;

    /// Rank candidate follow-up actions. The default keeps the deterministic
    /// order; implementations may reorder or drop entries, but the caller
    /// intersects the result with `available` so nothing new can be invented.
    fn rank_actions(
        &self,
        _context: ValidationContext,
        available: Vec<ActionKind>,
    ) -> BoxFuture<'_, GraphResult<Vec<ActionKind>>> {
        Box::pin(async move { Ok(available) })
    }
}

/// Deterministic classifier for tests and offline runs.
///
/// Tracks call counts so tests can assert, for example, that token selection
/// never re-invokes the Router.
#[derive(Clone)]
pub struct MockClassifier {
    route_target: RouteTarget,
    verdict: ValidationVerdict,
    route_calls: Arc<AtomicUsize>,
    validate_calls: Arc<AtomicUsize>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            route_target: RouteTarget::Planner,
            verdict: ValidationVerdict::satisfied(),
            route_calls: Arc::new(AtomicUsize::new(0)),
            validate_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_route(mut self, target: RouteTarget) -> Self {
        self.route_target = target;
        self
    }

    pub fn with_verdict(mut self, verdict: ValidationVerdict) -> Self {
        self.verdict = verdict;
        self
    }

    pub fn route_calls(&self) -> usize {
        self.route_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for MockClassifier {
    fn route(&self, _context: RouteContext) -> BoxFuture<'_, GraphResult<RouteDecision>> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        let target = self.route_target;
        Box::pin(async move { Ok(RouteDecision { target }) })
    }

    fn validate(
        &self,
        _context: ValidationContext,
    ) -> BoxFuture<'_, GraphResult<ValidationVerdict>> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        let verdict = self.verdict;
        Box::pin(async move { Ok(verdict) })
    }
}
