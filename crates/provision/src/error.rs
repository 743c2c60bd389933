//! Error types for provisioning operations.
//!
//! Errors are categorized to enable retry logic and appropriate operator
//! feedback: topology and planning errors abort before any external side
//! effect, transient provider errors are retried with backoff, and defect
//! errors indicate an internal ordering bug rather than an external failure.

use thiserror::Error;

/// Categories of provisioning errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid declaration set (duplicate ids, dangling references)
    Topology,
    /// The reference graph cannot be ordered
    Plan,
    /// Transient provider failure (rate limits, eventual consistency, timeouts)
    Transient,
    /// Provider rejected the request; retrying cannot help
    Terminal,
    /// Internal ordering or idempotence invariant was violated
    Defect,
}

impl ErrorCategory {
    /// Whether this error category is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Errors that can occur while declaring, planning, or applying a stack.
#[derive(Debug, Error)]
pub enum Error {
    /// A node id was declared twice
    #[error("duplicate node id: {id}")]
    DuplicateId {
        /// The offending logical name
        id: String,
    },

    /// An attribute references a node that was never declared
    #[error("node {node} references undeclared node {target}")]
    UnknownReference {
        /// Node carrying the reference
        node: String,
        /// The missing target
        target: String,
    },

    /// The reference graph contains a cycle
    #[error("dependency cycle: {}", .chain.join(" -> "))]
    Cycle {
        /// The offending node chain, first node repeated at the end
        chain: Vec<String>,
    },

    /// Outputs were requested from a node that has not reached Ready
    #[error("outputs of node {node} are not available yet")]
    NotReady {
        /// Node whose outputs were requested
        node: String,
    },

    /// A Ready node does not expose the requested output key
    #[error("node {node} has no output named {key}")]
    MissingOutput {
        /// Node whose outputs were inspected
        node: String,
        /// The missing output key
        key: String,
    },

    /// A recorded output was re-recorded with a different value
    #[error("output {key} of node {node} changed from {existing:?} to {requested:?}")]
    OutputConflict {
        /// Node whose output diverged
        node: String,
        /// Output key
        key: String,
        /// Previously recorded value
        existing: String,
        /// Conflicting new value
        requested: String,
    },

    /// A node was torn down while a dependent still referenced it
    #[error("node {node} destroyed before dependent {dependent}")]
    DestroyOrdering {
        /// Node being destroyed
        node: String,
        /// Dependent that is not yet Destroyed
        dependent: String,
    },

    /// Transient provider failure
    #[error("transient provider error: {message}")]
    Transient {
        /// Detail from the failed provider operation
        message: String,
    },

    /// Terminal provider failure
    #[error("provider rejected request: {message}")]
    Terminal {
        /// Detail from the rejected provider operation
        message: String,
    },
}

impl Error {
    /// Get the error category for retry and reporting logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::DuplicateId { .. } | Error::UnknownReference { .. } => ErrorCategory::Topology,
            Error::Cycle { .. } => ErrorCategory::Plan,
            Error::Transient { .. } => ErrorCategory::Transient,
            Error::Terminal { .. } => ErrorCategory::Terminal,
            Error::NotReady { .. }
            | Error::MissingOutput { .. }
            | Error::OutputConflict { .. }
            | Error::DestroyOrdering { .. } => ErrorCategory::Defect,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Convenience constructor for transient provider failures.
    pub fn transient(message: impl Into<String>) -> Self {
        Error::Transient {
            message: message.into(),
        }
    }

    /// Convenience constructor for terminal provider failures.
    pub fn terminal(message: impl Into<String>) -> Self {
        Error::Terminal {
            message: message.into(),
        }
    }
}

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_is_retryable() {
        assert!(Error::transient("throttled").is_retryable());
        assert!(!Error::terminal("bad config").is_retryable());
    }

    #[test]
    fn declaration_errors_are_topology() {
        let err = Error::DuplicateId {
            id: "ContactsTable".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Topology);
        assert!(!err.is_retryable());
    }

    #[test]
    fn ordering_errors_are_defects() {
        let err = Error::NotReady {
            node: "Gateway".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Defect);
    }

    #[test]
    fn cycle_display_names_the_chain() {
        let err = Error::Cycle {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
    }
}
