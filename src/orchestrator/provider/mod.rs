//! Classifier backends.

pub mod openai;

pub use openai::{OpenAiClassifier, OpenAiClassifierConfig};
