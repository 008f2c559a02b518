//! Workflow error taxonomy.
//!
//! Every variant is non-fatal: the action that produced it is rejected and
//! all prior state is left untouched.

/// Domain errors raised by pipeline stages and session actions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError
{
    /// A required field or selection is missing
    #[error("incomplete input: {0}")]
    Incomplete(String),

    /// A requested key has no matching record
    #[error("{kind} not found: {key}")]
    NotFound
    {
        kind: &'static str,
        key: String,
    },

    /// An uploaded file could not be decoded
    #[error("failed to parse {input}: {reason}")]
    Parse
    {
        input: String,
        reason: String,
    },

    /// Several catalog entries match where exactly one is required
    #[error("{candidates} catalog entries match \"{description}\"; pick one")]
    Ambiguous
    {
        description: String,
        candidates: usize,
    },

    /// A CAID is already owned by another block
    #[error("CAID {caid} is already assigned to block \"{block}\"")]
    AlreadyAssigned
    {
        caid: String,
        block: String,
    },

    /// A uniqueness or range constraint was violated
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl WorkflowError
{
    pub fn incomplete(msg: impl Into<String>) -> Self
    {
        Self::Incomplete(msg.into())
    }

    pub fn not_found(
        kind: &'static str,
        key: impl Into<String>,
    ) -> Self
    {
        Self::NotFound { kind, key: key.into() }
    }

    pub fn parse(
        input: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self
    {
        Self::Parse { input: input.into(), reason: reason.to_string() }
    }
}

/// Result alias for pipeline operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
