//! Session state and the delta-merge contract.
//!
//! Nodes never mutate state in place. Each node receives the current state by
//! value and returns a [`StateDelta`]; the run loop owns the authoritative
//! copy and applies deltas one at a time, so merges cannot interleave within
//! a single run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::orchestrator::followup::Suggestion;
use crate::orchestrator::message::Message;
use crate::orchestrator::node::{Directive, TerminationReason};
use crate::orchestrator::plan::ExecutionPlan;

/// Counters and flags private to the orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    /// Incremented exactly once per Validator execution, never decremented.
    pub validation_iterations: u32,
    pub forced_end: bool,
    pub termination: Option<TerminationReason>,
    /// Destination discovery is waiting on the user to pick a candidate.
    pub awaiting_destination: bool,
    /// Set when a destination token is selected; read by the Router before
    /// its next classification.
    pub destination_selected: bool,
    /// The currently valid suggestion batch. Offering a new batch replaces
    /// (and so invalidates) the previous one.
    #[serde(default)]
    pub last_offered: Vec<Suggestion>,
}

/// Partial update to [`SessionMeta`]. Only `Some` fields are applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaDelta {
    pub validation_iterations: Option<u32>,
    pub forced_end: Option<bool>,
    pub termination: Option<TerminationReason>,
    pub awaiting_destination: Option<bool>,
    pub destination_selected: Option<bool>,
    pub last_offered: Option<Vec<Suggestion>>,
}

impl MetaDelta {
    pub fn is_empty(&self) -> bool {
        *self == MetaDelta::default()
    }
}

/// The session state record threaded through every step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripState {
    pub session_id: String,
    /// Append-only conversation transcript; insertion order is the
    /// conversation order.
    pub history: Vec<Message>,
    pub plan: Option<ExecutionPlan>,
    /// Composed itinerary artifact; shape is owned by the itinerary handler.
    pub itinerary: Option<serde_json::Value>,
    /// Handler outputs keyed by producer; overwritten per key, never deleted.
    pub side_results: BTreeMap<String, serde_json::Value>,
    /// User-declared constraints, best-effort present.
    pub preferences: BTreeMap<String, serde_json::Value>,
    /// Transient routing directive, consumed by the run loop each step.
    pub directive: Option<Directive>,
    pub meta: SessionMeta,
}

impl TripState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            history: Vec::new(),
            plan: None,
            itinerary: None,
            side_results: BTreeMap::new(),
            preferences: BTreeMap::new(),
            directive: None,
            meta: SessionMeta::default(),
        }
    }

    pub fn push_message(&mut self, message: Message) {
        self.history.push(message);
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.history.last()
    }

    /// Merge a node's delta into the authoritative state.
    ///
    /// `history` appends; `plan`/`itinerary` replace when present;
    /// `side_results` and `preferences` insert-or-overwrite per key, which
    /// makes re-applying the same delta idempotent for those maps.
    pub fn apply(&mut self, delta: StateDelta) {
        self.history.extend(delta.messages);
        if let Some(plan) = delta.plan {
            self.plan = Some(plan);
        }
        if let Some(itinerary) = delta.itinerary {
            self.itinerary = Some(itinerary);
        }
        for (key, value) in delta.side_results {
            self.side_results.insert(key, value);
        }
        for (key, value) in delta.preferences {
            self.preferences.insert(key, value);
        }
        if delta.directive.is_some() {
            self.directive = delta.directive;
        }
        self.apply_meta(delta.meta);
    }

    fn apply_meta(&mut self, delta: MetaDelta) {
        if let Some(iterations) = delta.validation_iterations {
            self.meta.validation_iterations = iterations;
        }
        if let Some(forced_end) = delta.forced_end {
            self.meta.forced_end = forced_end;
        }
        if delta.termination.is_some() {
            self.meta.termination = delta.termination;
        }
        if let Some(awaiting) = delta.awaiting_destination {
            self.meta.awaiting_destination = awaiting;
        }
        if let Some(selected) = delta.destination_selected {
            self.meta.destination_selected = selected;
        }
        if let Some(batch) = delta.last_offered {
            self.meta.last_offered = batch;
        }
    }
}

/// Partial state update returned by a node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    #[serde(default)]
    pub messages: Vec<Message>,
    pub plan: Option<ExecutionPlan>,
    pub itinerary: Option<serde_json::Value>,
    #[serde(default)]
    pub side_results: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub preferences: BTreeMap<String, serde_json::Value>,
    pub directive: Option<Directive>,
    #[serde(default)]
    pub meta: MetaDelta,
}

impl StateDelta {
    pub fn message(message: Message) -> Self {
        Self {
            messages: vec![message],
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directive = Some(directive);
        self
    }

    pub fn with_side_result(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.side_results.insert(key.into(), value);
        self
    }
}
