//! Follow-up suggestions: tokenize next actions from final state and resolve
//! a chosen token back to a routing directive.
//!
//! Suggestions are drawn from a static registry of actions with availability
//! predicates. The classifier may rank the candidates but its answer is
//! intersected with the precomputed available set, so an offered token always
//! points at a destination the orchestrator can actually dispatch.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::orchestrator::classifier::{Classifier, ValidationContext};
use crate::orchestrator::constants::MAX_SUGGESTIONS;
use crate::orchestrator::message::Message;
use crate::orchestrator::node::{Directive, NodeId};
use crate::orchestrator::plan::ActionKind;
use crate::orchestrator::state::{StateDelta, TripState};

/// One tokenized next action. `target` is resolved at generation time, so
/// selecting the token later never depends on state that may have changed in
/// between.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub token: String,
    pub action: ActionKind,
    pub description: String,
    pub target: NodeId,
    /// Destination payload for the two-phase destination-selection variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// A registry entry: an action, how to describe it, and when it applies.
pub struct ActionEntry {
    pub action: ActionKind,
    describe: fn(&TripState) -> String,
    available: fn(&TripState) -> bool,
}

impl ActionEntry {
    pub fn is_available(&self, state: &TripState) -> bool {
        (self.available)(state)
    }

    pub fn describe(&self, state: &TripState) -> String {
        (self.describe)(state)
    }
}

/// Static catalog of follow-up actions.
pub struct ActionRegistry {
    entries: Vec<ActionEntry>,
}

fn destination_name(state: &TripState) -> Option<String> {
    state
        .preferences
        .get("destination")
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
}

fn place_suffix(state: &TripState) -> String {
    destination_name(state)
        .map(|name| format!(" for {}", name))
        .unwrap_or_default()
}

impl ActionRegistry {
    pub fn standard() -> Self {
        Self {
            entries: vec![
                ActionEntry {
                    action: ActionKind::SearchFlights,
                    describe: |state| format!("Search for flight options{}", place_suffix(state)),
                    available: |state| !state.side_results.contains_key("flight_search"),
                },
                ActionEntry {
                    action: ActionKind::SearchHotels,
                    describe: |state| format!("Find accommodation{}", place_suffix(state)),
                    available: |state| !state.side_results.contains_key("hotel_search"),
                },
                ActionEntry {
                    action: ActionKind::SearchActivities,
                    describe: |state| format!("Find things to do{}", place_suffix(state)),
                    available: |state| !state.side_results.contains_key("activity_search"),
                },
                ActionEntry {
                    action: ActionKind::ComposeItinerary,
                    describe: |_state| "Put together a day-by-day itinerary".to_string(),
                    available: |state| {
                        state.itinerary.is_none() && !state.side_results.is_empty()
                    },
                },
                ActionEntry {
                    action: ActionKind::ModifyItinerary,
                    describe: |_state| "Adjust the current itinerary".to_string(),
                    available: |state| state.itinerary.is_some(),
                },
                ActionEntry {
                    action: ActionKind::CheckBudget,
                    describe: |_state| "Review and optimize the budget".to_string(),
                    available: |state| !state.side_results.is_empty(),
                },
                ActionEntry {
                    action: ActionKind::ExploreDestination,
                    describe: |state| match destination_name(state) {
                        Some(name) => format!("Learn more about {}", name),
                        None => "Learn more about the destination".to_string(),
                    },
                    available: |state| state.preferences.contains_key("destination"),
                },
                ActionEntry {
                    action: ActionKind::FinalizePlan,
                    describe: |_state| "Review and finalize the trip".to_string(),
                    available: |state| state.itinerary.is_some(),
                },
            ],
        }
    }

    pub fn available_actions(&self, state: &TripState) -> Vec<ActionKind> {
        self.entries
            .iter()
            .filter(|entry| entry.is_available(state))
            .map(|entry| entry.action)
            .collect()
    }

    fn entry(&self, action: ActionKind) -> Option<&ActionEntry> {
        self.entries.iter().find(|entry| entry.action == action)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Derive a suggestion batch from final state.
///
/// The returned delta appends the user-facing listing and stores the batch in
/// `meta.last_offered`, which invalidates any previously offered tokens.
pub async fn generate_suggestions(
    state: &TripState,
    classifier: &dyn Classifier,
    registry: &ActionRegistry,
) -> StateDelta {
    let mut batch = Vec::new();
    if state.meta.awaiting_destination && !state.meta.destination_selected {
        batch = destination_batch(state);
        if batch.is_empty() {
            debug!("destination phase without recommendations, offering standard actions");
        }
    }
    if batch.is_empty() {
        batch = standard_batch(state, classifier, registry).await;
    }

    let mut delta = StateDelta::default();
    if batch.is_empty() {
        delta.meta.last_offered = Some(Vec::new());
        delta.messages.push(Message::assistant(
            "Anything else I can help you with?",
        ));
        return delta;
    }

    let mut lines = vec!["What would you like to do next?".to_string()];
    for suggestion in &batch {
        lines.push(format!("  [{}] {}", suggestion.token, suggestion.description));
    }
    lines.push("Select an option or ask me anything.".to_string());

    delta.messages.push(
        Message::assistant(lines.join("\n")).with_annotation(
            "suggestions",
            serde_json::to_value(&batch).unwrap_or(serde_json::Value::Null),
        ),
    );
    delta.meta.last_offered = Some(batch);
    delta
}

async fn standard_batch(
    state: &TripState,
    classifier: &dyn Classifier,
    registry: &ActionRegistry,
) -> Vec<Suggestion> {
    let available = registry.available_actions(state);
    if available.is_empty() {
        return Vec::new();
    }

    let mut chosen = match classifier
        .rank_actions(ValidationContext::from_state(state), available.clone())
        .await
    {
        Ok(ranked) => {
            // The classifier can reorder or drop, never invent: intersect
            // with the available set and dedupe.
            let mut seen = Vec::new();
            for action in ranked {
                if available.contains(&action) && !seen.contains(&action) {
                    seen.push(action);
                }
            }
            seen
        }
        Err(err) => {
            warn!(error = %err, "ranking failed, using deterministic order");
            Vec::new()
        }
    };
    if chosen.is_empty() {
        chosen = available;
    }
    chosen.truncate(MAX_SUGGESTIONS);

    chosen
        .into_iter()
        .enumerate()
        .map(|(index, action)| {
            let description = registry
                .entry(action)
                .map(|entry| entry.describe(state))
                .unwrap_or_else(|| action.as_str().to_string());
            Suggestion {
                token: format!("A{}", index + 1),
                action,
                description,
                target: action.target_node(),
                destination: None,
            }
        })
        .collect()
}

/// Two-phase destination variant: one entry per recommended candidate plus a
/// "show different options" escape hatch.
fn destination_batch(state: &TripState) -> Vec<Suggestion> {
    let candidates = state
        .side_results
        .get("destination_recommendations")
        .and_then(|value| value.get("recommendations"))
        .and_then(|value| value.as_array())
        .map(|values| {
            values
                .iter()
                .filter_map(|value| value.get("destination"))
                .filter_map(|value| value.as_str())
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut batch: Vec<Suggestion> = candidates
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .enumerate()
        .map(|(index, destination)| Suggestion {
            token: format!("D{}", index + 1),
            action: ActionKind::SelectDestination,
            description: format!("Plan the trip around {}", destination),
            target: ActionKind::SelectDestination.target_node(),
            destination: Some(destination),
        })
        .collect();

    if batch.is_empty() {
        return batch;
    }

    batch.push(Suggestion {
        token: format!("D{}", batch.len() + 1),
        action: ActionKind::ShowMoreDestinations,
        description: "Show different destination options".to_string(),
        target: ActionKind::ShowMoreDestinations.target_node(),
        destination: None,
    });
    batch
}

/// Resolve a chosen token against the currently valid batch.
///
/// On a hit the returned delta jumps straight to the suggestion's pre-resolved
/// target, bypassing the Router, and consumes the batch. `None` means the
/// token is stale or unknown and the caller should fall back to routing the
/// raw input as an ordinary message.
pub fn resolve_token(state: &TripState, token: &str) -> Option<StateDelta> {
    let wanted = token.trim();
    let suggestion = state
        .meta
        .last_offered
        .iter()
        .find(|suggestion| suggestion.token.eq_ignore_ascii_case(wanted))?
        .clone();

    debug!(token = %suggestion.token, target = suggestion.target.as_str(), "token resolved");
    let mut delta = StateDelta::message(
        Message::user(format!("I'd like to: {}", suggestion.description))
            .with_annotation("selected_token", serde_json::json!(suggestion.token)),
    )
    .with_directive(Directive::Node(suggestion.target));
    // Tokens are single-use: consuming one invalidates the whole batch.
    delta.meta.last_offered = Some(Vec::new());

    if let Some(destination) = &suggestion.destination {
        delta
            .preferences
            .insert("destination".to_string(), serde_json::json!(destination));
        delta.meta.destination_selected = Some(true);
        delta.meta.awaiting_destination = Some(false);
    }
    Some(delta)
}
