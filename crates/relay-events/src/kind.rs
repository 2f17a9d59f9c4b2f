use std::fmt;

/// Harbor event types the relay knows how to render.
///
/// Anything else is kept verbatim in [`EventKind::Other`] so it can still be
/// looked up in the policy and logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    PushArtifact,
    PullArtifact,
    DeleteArtifact,
    ScanningStopped,
    ScanningCompleted,
    Other(String),
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "PUSH_ARTIFACT" => Self::PushArtifact,
            "PULL_ARTIFACT" => Self::PullArtifact,
            "DELETE_ARTIFACT" => Self::DeleteArtifact,
            "SCANNING_STOPPED" => Self::ScanningStopped,
            "SCANNING_COMPLETED" => Self::ScanningCompleted,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire tag, as used in payloads and in the `[events]` config table.
    pub fn tag(&self) -> &str {
        match self {
            Self::PushArtifact => "PUSH_ARTIFACT",
            Self::PullArtifact => "PULL_ARTIFACT",
            Self::DeleteArtifact => "DELETE_ARTIFACT",
            Self::ScanningStopped => "SCANNING_STOPPED",
            Self::ScanningCompleted => "SCANNING_COMPLETED",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
