//! Execution plans and the shared action vocabulary.

use serde::{Deserialize, Serialize};

use crate::orchestrator::node::NodeId;

/// Closed vocabulary of plan/follow-up actions. Shared between the planning
/// node and the action tokenizer so an offered suggestion always names an
/// action the orchestrator knows how to dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ExtractPreferences,
    SearchFlights,
    SearchHotels,
    SearchActivities,
    ComposeItinerary,
    ModifyItinerary,
    CheckBudget,
    ExploreDestination,
    FinalizePlan,
    SelectDestination,
    ShowMoreDestinations,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::ExtractPreferences => "extract_preferences",
            ActionKind::SearchFlights => "search_flights",
            ActionKind::SearchHotels => "search_hotels",
            ActionKind::SearchActivities => "search_activities",
            ActionKind::ComposeItinerary => "compose_itinerary",
            ActionKind::ModifyItinerary => "modify_itinerary",
            ActionKind::CheckBudget => "check_budget",
            ActionKind::ExploreDestination => "explore_destination",
            ActionKind::FinalizePlan => "finalize_plan",
            ActionKind::SelectDestination => "select_destination",
            ActionKind::ShowMoreDestinations => "show_more_destinations",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "extract_preferences" => Some(ActionKind::ExtractPreferences),
            "search_flights" => Some(ActionKind::SearchFlights),
            "search_hotels" => Some(ActionKind::SearchHotels),
            "search_activities" => Some(ActionKind::SearchActivities),
            "compose_itinerary" => Some(ActionKind::ComposeItinerary),
            "modify_itinerary" => Some(ActionKind::ModifyItinerary),
            "check_budget" => Some(ActionKind::CheckBudget),
            "explore_destination" => Some(ActionKind::ExploreDestination),
            "finalize_plan" => Some(ActionKind::FinalizePlan),
            "select_destination" => Some(ActionKind::SelectDestination),
            "show_more_destinations" => Some(ActionKind::ShowMoreDestinations),
            _ => None,
        }
    }

    /// The node this action dispatches to when chosen from a suggestion batch.
    pub fn target_node(&self) -> NodeId {
        match self {
            ActionKind::ExtractPreferences => NodeId::Planner,
            ActionKind::SearchFlights => NodeId::Flight,
            ActionKind::SearchHotels => NodeId::Hotel,
            ActionKind::SearchActivities => NodeId::Activity,
            ActionKind::ComposeItinerary => NodeId::Itinerary,
            ActionKind::ModifyItinerary => NodeId::Itinerary,
            ActionKind::CheckBudget => NodeId::Validator,
            ActionKind::ExploreDestination => NodeId::Activity,
            ActionKind::FinalizePlan => NodeId::Validator,
            ActionKind::SelectDestination => NodeId::Planner,
            ActionKind::ShowMoreDestinations => NodeId::DestinationPlanner,
        }
    }
}

/// One step of an execution plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub action: ActionKind,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub executed: bool,
}

impl PlanStep {
    pub fn new(id: impl Into<String>, action: ActionKind) -> Self {
        Self {
            id: id.into(),
            action,
            params: serde_json::json!({}),
            executed: false,
        }
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }
}

/// Structured plan owned exclusively by the orchestrator and replaced
/// wholesale by the planning node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExecutionPlan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps, notes: None }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn executed_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.executed).count()
    }

    pub fn has_pending_steps(&self) -> bool {
        self.steps.iter().any(|step| !step.executed)
    }
}
