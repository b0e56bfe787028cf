use serde::{Deserialize, Serialize};

use crate::calendar::CheckpointParseError;
use crate::retry::RemoteCallError;

pub const ASSUME_ROLE_DURATION_SECONDS: i32 = 3_600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub key: String,
    pub size: i64,
    pub storage_class: String,
}

/// Short-lived credentials for the copy role. Deliberately not serializable,
/// and `Debug` keeps the secret parts out of log output.
#[derive(Clone, PartialEq, Eq)]
pub struct ScopedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl std::fmt::Debug for ScopedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CopySummary {
    pub objects_copied: usize,
    pub bytes_copied: i64,
}

impl CopySummary {
    pub fn merge(&mut self, other: &CopySummary) {
        self.objects_copied += other.objects_copied;
        self.bytes_copied += other.bytes_copied;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    Remote(RemoteCallError),
    RetriesExhausted { attempts: u32, last: RemoteCallError },
    Checkpoint(CheckpointParseError),
}

impl std::fmt::Display for MirrorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(error) => write!(f, "{error}"),
            Self::RetriesExhausted { attempts, last } => {
                write!(f, "retries exhausted after {attempts} attempts: {last}")
            }
            Self::Checkpoint(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Remote(error) => Some(error),
            Self::RetriesExhausted { last, .. } => Some(last),
            Self::Checkpoint(error) => Some(error),
        }
    }
}

impl From<RemoteCallError> for MirrorError {
    fn from(error: RemoteCallError) -> Self {
        MirrorError::Remote(error)
    }
}

impl From<CheckpointParseError> for MirrorError {
    fn from(error: CheckpointParseError) -> Self {
        MirrorError::Checkpoint(error)
    }
}
