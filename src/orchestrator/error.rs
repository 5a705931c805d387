//! Error types for the orchestration graph.

use crate::orchestrator::node::NodeId;

/// Errors raised while building or driving the graph.
///
/// Node and classifier failures never escape `CompiledGraph::run`; they are
/// absorbed at the execution boundary and converted into synthetic deltas.
/// Build-time problems (`InvalidGraph`) are the only errors a caller of the
/// public API is expected to handle.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphError {
    /// The graph failed structural validation at compile time.
    InvalidGraph { message: String },
    /// A node failed while executing.
    Execution { node: NodeId, message: String },
    /// The classifier dependency timed out or returned garbage.
    Classifier { message: String },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidGraph { message } => write!(f, "invalid graph: {}", message),
            GraphError::Execution { node, message } => {
                write!(f, "node {} failed: {}", node.as_str(), message)
            }
            GraphError::Classifier { message } => write!(f, "classifier failed: {}", message),
        }
    }
}

impl std::error::Error for GraphError {}

pub type GraphResult<T> = Result<T, GraphError>;

pub(crate) fn classifier_error(message: impl Into<String>) -> GraphError {
    GraphError::Classifier {
        message: message.into(),
    }
}
