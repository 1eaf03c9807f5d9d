use thiserror::Error;

/// Failures raised by the graph data model.
///
/// Every operation either completes or fails before touching any state, so
/// none of these carry partial results.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Malformed constructor or update arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two walks were joined but share no boundary node.
    #[error("cannot concatenate walk ending at {left} with walk spanning {right}")]
    IncompatibleEndpoints { left: String, right: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Re-binding a bound entity, or binding with an inconsistent pair.
    #[error("binding error: {0}")]
    Binding(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl GraphError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        GraphError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GraphError::invalid("empty relationship type");
        assert_eq!(err.to_string(), "invalid argument: empty relationship type");

        let err = GraphError::IncompatibleEndpoints {
            left: "(_1)".into(),
            right: "(_2)..(_3)".into(),
        };
        assert!(err.to_string().contains("(_2)..(_3)"));
    }
}
