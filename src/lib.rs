//! Wayfinder: a graph-driven orchestrator for conversational trip planning.

pub mod orchestrator;
