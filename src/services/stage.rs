use serde::Serialize;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

/// Per-request lifecycle: Idle → FileReceived → RemoteUploaded → TransformFetched → Rendered → CleanedUp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequestState {
    Idle,
    FileReceived,
    RemoteUploaded,
    TransformFetched,
    Rendered,
    CleanedUp,
}

impl RequestState {
    /// The state that must follow this one, if any
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::FileReceived),
            Self::FileReceived => Some(Self::RemoteUploaded),
            Self::RemoteUploaded => Some(Self::TransformFetched),
            Self::TransformFetched => Some(Self::Rendered),
            Self::Rendered => Some(Self::CleanedUp),
            Self::CleanedUp => None,
        }
    }
}

/// Which step of the flow produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    RemoteUpload,
    TransformFetch,
    Presentation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Intake => "intake",
            Stage::RemoteUpload => "remote upload",
            Stage::TransformFetch => "transform fetch",
            Stage::Presentation => "presentation",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum UpscaleError {
    #[error("Input rejected: {0}")]
    InputRejected(String),

    #[error("Local I/O error: {0}")]
    LocalIo(#[from] std::io::Error),

    #[error("Remote upload failed: {0}")]
    RemoteUpload(String),

    #[error("Fetching upscaled image failed: {0}")]
    RemoteFetch(String),

    #[error("Could not decode image: {0}")]
    Decode(String),
}

impl UpscaleError {
    pub fn stage(&self) -> Stage {
        match self {
            UpscaleError::InputRejected(_) => Stage::Intake,
            UpscaleError::LocalIo(_) => Stage::Intake,
            UpscaleError::RemoteUpload(_) => Stage::RemoteUpload,
            UpscaleError::RemoteFetch(_) => Stage::TransformFetch,
            UpscaleError::Decode(_) => Stage::Presentation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_advance_in_order() {
        let mut state = RequestState::Idle;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            assert!(next > state);
            state = next;
            seen.push(state);
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(state, RequestState::CleanedUp);
    }

    #[test]
    fn test_error_stage_mapping() {
        assert_eq!(UpscaleError::InputRejected("x".into()).stage(), Stage::Intake);
        assert_eq!(UpscaleError::RemoteUpload("x".into()).stage(), Stage::RemoteUpload);
        assert_eq!(UpscaleError::RemoteFetch("x".into()).stage(), Stage::TransformFetch);
        assert_eq!(UpscaleError::Decode("x".into()).stage(), Stage::Presentation);
    }
}
