//! Error taxonomy for evrec.
//!
//! Recording, annotation, and persistence errors that callers need to tell
//! apart get their own variants; everything else is wrapped I/O.

use crate::session::SessionState;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input device unavailable, busy, or unable to honor the fixed
    /// 16 kHz mono recording format. The session that hit this is dead;
    /// a fresh one must be constructed.
    #[error("audio device error: {0}")]
    Device(String),

    /// A requested sample passage is missing. Other passages stay usable.
    #[error("sample '{0}' not found in the samples directory")]
    SampleNotFound(String),

    /// A required annotation category was left unset at save time.
    /// Recoverable: the session stays in Reviewing.
    #[error("annotation '{field}' must be set before saving")]
    IncompleteAnnotation { field: &'static str },

    /// An operation was invoked outside its valid session state. This is a
    /// contract violation, not a user-facing path.
    #[error("'{operation}' is not valid while the session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// All 65536 four-hex-digit identifiers are taken. Fatal, never retried.
    #[error("recording identifier space exhausted (all 65536 ids in use)")]
    IdSpaceExhausted,

    /// Metadata write failed after the audio file was already written.
    /// The orphaned audio file is left in place for manual reconciliation.
    #[error(
        "metadata write failed ({source}); audio was saved and kept at {}",
        audio_path.display()
    )]
    MetadataWrite {
        audio_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
