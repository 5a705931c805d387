//! Validator node: decide whether the session's goal is satisfied, with a
//! hard bound on how many times it can send work back into the graph.

use std::sync::Arc;

use tracing::{info, warn};

use crate::orchestrator::classifier::{Classifier, ValidationContext};
use crate::orchestrator::constants::MAX_VALIDATION_ITERATIONS;
use crate::orchestrator::message::Message;
use crate::orchestrator::node::{Directive, NodeId, NodeSpec, RouteTarget, TerminationReason};
use crate::orchestrator::state::{MetaDelta, StateDelta, TripState};

/// Build the Validator node around a classifier.
///
/// Every execution increments `validation_iterations` exactly once, before
/// any transition is evaluated. The forced-end transition is checked first so
/// the bound holds no matter what the classifier answers, and a classifier
/// failure counts as Satisfied (fail open toward the user).
pub fn validator_node(classifier: Arc<dyn Classifier>) -> NodeSpec {
    NodeSpec::new(NodeId::Validator, move |state: TripState| {
        let classifier = Arc::clone(&classifier);
        async move {
            let iterations = state.meta.validation_iterations.saturating_add(1);
            let mut delta = StateDelta {
                meta: MetaDelta {
                    validation_iterations: Some(iterations),
                    ..MetaDelta::default()
                },
                ..StateDelta::default()
            };

            if iterations >= MAX_VALIDATION_ITERATIONS {
                warn!(
                    session_id = %state.session_id,
                    iterations,
                    "validation budget exhausted, forcing end"
                );
                delta.meta.forced_end = Some(true);
                delta.meta.termination = Some(TerminationReason::ValidationBudgetExhausted);
                delta.directive = Some(Directive::End);
                delta.messages.push(Message::assistant(
                    "I've refined this as far as I can for now. Here's where we landed.",
                ));
                return Ok(delta);
            }

            let verdict = match classifier.validate(ValidationContext::from_state(&state)).await {
                Ok(verdict) => verdict,
                Err(err) => {
                    warn!(error = %err, "validation classification failed, treating as satisfied");
                    crate::orchestrator::classifier::ValidationVerdict::satisfied()
                }
            };

            if verdict.satisfied {
                info!(session_id = %state.session_id, "validation passed");
                delta.directive = Some(Directive::End);
                delta
                    .messages
                    .push(Message::assistant("Everything checks out so far."));
            } else {
                // An absent or terminal next target means there is nothing
                // actionable left; hand control back to the user.
                let directive = verdict
                    .next_target
                    .unwrap_or(RouteTarget::End)
                    .directive();
                info!(directive = ?directive, "validation requests more work");
                delta.directive = Some(directive);
                delta.messages.push(Message::assistant(
                    "There's more to fill in; continuing.",
                ));
            }
            Ok(delta)
        }
    })
}
