//! Error handling for ugen-mirror
//!
//! Compile-time errors abort the enclosing construction or compile call.
//! Transport errors are reported but never abort local graph work.

use thiserror::Error;

use crate::ugen::NodeId;

/// Result type alias for ugen-mirror operations
pub type Result<T> = std::result::Result<T, UgenError>;

/// Main error type for graph construction, codegen and mirroring
#[derive(Error, Debug)]
pub enum UgenError {
    // Compilation Errors
    #[error("Operator '{operator}' needs at least one argument")]
    EmptyOperator { operator: &'static str },

    #[error("'{function}' takes {expected} argument(s), got {actual}")]
    Arity {
        function: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot compile node {node}: {reason}")]
    Compilation { node: NodeId, reason: String },

    #[error("Node {node} is reachable from itself")]
    CyclicGraph { node: NodeId },

    #[error("Cannot evaluate node {node}: {reason}")]
    Evaluation { node: NodeId, reason: String },

    // Mirroring Errors
    #[error("Snapshot of node {node} overflowed at depth {depth}")]
    SerializationOverflow { node: NodeId, depth: usize },

    #[error("Transport error: {reason}")]
    Transport { reason: String },

    #[error("Unknown object reference: {id}")]
    UnknownReference { id: NodeId },

    #[error("Unknown constructor: {name}")]
    UnknownConstructor { name: String },

    // Method Errors
    #[error("Node {node} has no method '{method}'")]
    UnknownMethod { node: NodeId, method: String },

    #[error("Invalid argument for '{method}': {reason}")]
    InvalidArgument { method: String, reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UgenError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            UgenError::EmptyOperator { .. } => "EMPTY_OPERATOR",
            UgenError::Arity { .. } => "ARITY",
            UgenError::Compilation { .. } => "COMPILATION_ERROR",
            UgenError::CyclicGraph { .. } => "CYCLIC_GRAPH",
            UgenError::Evaluation { .. } => "EVALUATION_ERROR",
            UgenError::SerializationOverflow { .. } => "SERIALIZATION_OVERFLOW",
            UgenError::Transport { .. } => "TRANSPORT_ERROR",
            UgenError::UnknownReference { .. } => "UNKNOWN_REFERENCE",
            UgenError::UnknownConstructor { .. } => "UNKNOWN_CONSTRUCTOR",
            UgenError::UnknownMethod { .. } => "UNKNOWN_METHOD",
            UgenError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            UgenError::Config { .. } => "CONFIG_ERROR",
            UgenError::Io(_) => "IO_ERROR",
            UgenError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error belongs to the compilation family
    pub fn is_compilation_error(&self) -> bool {
        matches!(
            self,
            UgenError::EmptyOperator { .. }
                | UgenError::Arity { .. }
                | UgenError::Compilation { .. }
                | UgenError::CyclicGraph { .. }
        )
    }

    /// Check if this error is recoverable
    ///
    /// Transport failures only cost a mirrored message; everything else
    /// leaves the graph or snapshot unusable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UgenError::Transport { .. }
                | UgenError::UnknownMethod { .. }
                | UgenError::InvalidArgument { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            UgenError::EmptyOperator { .. } => Some("Pass at least one scalar or node to the operator."),
            UgenError::Arity { .. } => Some("Check the argument count of the function."),
            UgenError::CyclicGraph { .. } => {
                Some("Break the cycle: a node cannot feed into its own inputs.")
            }
            UgenError::SerializationOverflow { .. } => {
                Some("Sequence producers must not reference each other in a cycle.")
            }
            UgenError::Transport { .. } => {
                Some("The receiving context is gone; local processing continues unmirrored.")
            }
            UgenError::UnknownReference { .. } => {
                Some("Send the Create message for the object before referencing it.")
            }
            UgenError::UnknownConstructor { .. } => {
                Some("Register the constructor with the receiving context.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = UgenError::EmptyOperator { operator: "+" };
        assert_eq!(err.error_code(), "EMPTY_OPERATOR");
        assert!(err.is_compilation_error());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_transport_is_recoverable() {
        let err = UgenError::Transport {
            reason: "receiver dropped".to_string(),
        };
        assert!(err.is_recoverable());
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_display_includes_node() {
        let err = UgenError::SerializationOverflow {
            node: NodeId::from_raw(7),
            depth: 3,
        };
        assert_eq!(err.to_string(), "Snapshot of node 7 overflowed at depth 3");
    }
}
