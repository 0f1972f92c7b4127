use thiserror::Error;

/// A malformed or unrecognized message off the venue socket. Per spec,
/// parse errors are logged and the offending message dropped — sequence
/// continuity resumes from the next parseable message.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown event type: {0}")]
    UnknownType(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
