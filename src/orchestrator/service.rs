//! The turn-level service: submit a message or select a suggestion token,
//! get back the new transcript slice and a fresh suggestion batch.
//!
//! Turns on the same session are serialized with a per-session lock; the
//! stored state only ever reflects a completed turn. Turns on different
//! sessions run independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::executor::block_on;
use tracing::{info, warn};

use crate::orchestrator::classifier::Classifier;
use crate::orchestrator::executor::CompiledGraph;
use crate::orchestrator::followup::{generate_suggestions, resolve_token, ActionRegistry, Suggestion};
use crate::orchestrator::message::Message;
use crate::orchestrator::node::TerminationReason;
use crate::orchestrator::session::SessionStore;
use crate::orchestrator::state::TripState;

/// What the caller gets back from one turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    /// Messages appended during this turn, in conversation order. The
    /// caller's own input is not echoed back.
    pub messages: Vec<Message>,
    /// The currently valid suggestion batch.
    pub suggestions: Vec<Suggestion>,
    pub termination: Option<TerminationReason>,
}

/// Front door for conversational trip planning sessions.
pub struct PlannerService {
    graph: CompiledGraph,
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn SessionStore>,
    registry: ActionRegistry,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PlannerService {
    pub fn new(
        graph: CompiledGraph,
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            graph,
            classifier,
            store,
            registry: ActionRegistry::standard(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Process a free-form user message.
    ///
    /// Blocks until the run terminates; concurrent calls for the same session
    /// queue behind each other, calls for different sessions do not.
    pub fn submit(&self, session_id: &str, text: &str) -> TurnOutcome {
        let lock = self.turn_lock(session_id);
        let _guard = acquire(&lock);

        let mut state = self.checkout(session_id);
        state.push_message(Message::user(text));
        self.run_turn(state)
    }

    /// Act on a previously offered suggestion token.
    ///
    /// A valid token jumps straight to its pre-resolved node without a fresh
    /// routing round. A stale or unknown token is treated as an ordinary
    /// message and routed normally.
    pub fn select(&self, session_id: &str, token: &str) -> TurnOutcome {
        let lock = self.turn_lock(session_id);
        let _guard = acquire(&lock);

        let mut state = self.checkout(session_id);
        match resolve_token(&state, token) {
            Some(delta) => state.apply(delta),
            None => {
                warn!(session_id, token, "token did not resolve, routing as plain text");
                state.push_message(Message::user(token));
            }
        }
        self.run_turn(state)
    }

    fn run_turn(&self, mut state: TripState) -> TurnOutcome {
        // Turn-scoped bookkeeping starts clean; the directive (if any) was
        // set by token resolution and must survive into the run.
        state.meta.validation_iterations = 0;
        state.meta.forced_end = false;
        state.meta.termination = None;

        let baseline = state.history.len();
        info!(session_id = %state.session_id, "turn started");

        let mut state = block_on(self.graph.run(state));
        let followup = block_on(generate_suggestions(
            &state,
            self.classifier.as_ref(),
            &self.registry,
        ));
        state.apply(followup);
        self.store.put(state.clone());

        info!(
            session_id = %state.session_id,
            termination = ?state.meta.termination,
            "turn finished"
        );
        TurnOutcome {
            messages: state.history[baseline..].to_vec(),
            suggestions: state.meta.last_offered,
            termination: state.meta.termination,
        }
    }

    /// Load the session, or start a fresh one when the id is unknown. An
    /// unknown id on `select` also lands here, so a stale client keeps
    /// working instead of erroring out.
    fn checkout(&self, session_id: &str) -> TripState {
        match self.store.get(session_id) {
            Some(state) => state,
            None => TripState::new(session_id),
        }
    }

    fn turn_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

fn acquire(lock: &Arc<Mutex<()>>) -> std::sync::MutexGuard<'_, ()> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
