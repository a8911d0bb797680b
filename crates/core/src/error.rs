//! Error types for the cognitor domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all cognitor operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Planner errors ---
    #[error("Planner error: {0}")]
    Planner(#[from] PlannerError),

    // --- Planner reply parsing ---
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    // --- Argument binding ---
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    // --- Capability errors ---
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    // --- Registry construction ---
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the external planner oracle. All of these end the current query.
#[derive(Debug, Clone, Error)]
pub enum PlannerError {
    #[error("Planner did not answer within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by planner, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Planner not configured: {0}")]
    NotConfigured(String),
}

/// The planner answered, but the reply could not be understood.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("reply is missing required field `{0}`")]
    MissingField(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("empty reply")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("{capability} expects at least {required} arguments, got {given}")]
    MissingArguments {
        capability: String,
        required: usize,
        given: usize,
    },

    #[error("parameter `{parameter}` expects {expected}, got {value}")]
    Coercion {
        parameter: String,
        expected: String,
        value: String,
    },

    #[error("arguments must be a list or an object, got {0}")]
    InvalidShape(String),
}

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Unknown capability: {0}")]
    NotFound(String),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("{capability} failed: {reason}")]
    ExecutionFailed { capability: String, reason: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl CapabilityError {
    pub fn failed(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            capability: capability.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("capability already registered: {0}")]
    Duplicate(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_timeout_displays_seconds() {
        let err = Error::Planner(PlannerError::Timeout { timeout_secs: 10 });
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn unknown_capability_message() {
        let err = CapabilityError::NotFound("teleport".into());
        assert_eq!(err.to_string(), "Unknown capability: teleport");
    }

    /// Every top-level error names the context it came from.
    fn context(err: &Error) -> &'static str {
        match err {
            Error::Planner(_) => "planner",
            Error::Parse(_) => "parse",
            Error::Binding(_) => "binding",
            Error::Capability(_) => "capability",
            Error::Registry(_) => "registry",
            Error::Memory(_) => "memory",
            Error::Config { .. } => "config",
            Error::Serialization(_) => "serialization",
        }
    }

    #[test]
    fn top_level_errors_carry_their_context() {
        let err: Error = CapabilityError::NotFound("teleport".into()).into();
        assert_eq!(context(&err), "capability");
        let err = Error::Config { message: "bad port".into() };
        assert_eq!(context(&err), "config");
        assert_eq!(err.to_string(), "Configuration error: bad port");
    }

    #[test]
    fn binding_error_converts_transparently() {
        let err: CapabilityError = BindingError::InvalidShape("a number".into()).into();
        assert!(err.to_string().starts_with("arguments must be"));
    }
}
