//! Shared constants for graph execution.

/// Global ceiling on node executions within a single `run()` invocation.
/// Hitting it forces termination with `TerminationReason::StepBudgetExhausted`.
pub const MAX_STEPS: usize = 50;

/// Upper bound on Validator executions per run. Once the counter reaches this
/// value the Validator forces a terminal transition regardless of what the
/// classifier says.
pub const MAX_VALIDATION_ITERATIONS: u32 = 2;

/// Cap on the number of follow-up suggestions offered in one batch.
pub const MAX_SUGGESTIONS: usize = 5;
