use serde::{Deserialize, Serialize};

/// Data-health signal distinguishing usable updates from updates observed
/// during recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// No update has been emitted yet.
    Unknown,
    /// A sequence gap was detected; recovery is in progress.
    Gapped,
    /// Book and trades reflect a clean, in-sequence application.
    Ok,
}

impl Default for Status {
    fn default() -> Self {
        Status::Unknown
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Unknown => write!(f, "UNKNOWN"),
            Status::Gapped => write!(f, "GAPPED"),
            Status::Ok => write!(f, "OK"),
        }
    }
}
