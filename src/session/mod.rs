//! Audio capture session: one record/review/save-or-discard cycle.
//!
//! The session is a small state machine (`Idle -> Recording -> Reviewing ->
//! Saved | Discarded`) owning the capture buffer for exactly one take. After
//! a save or discard the session is dropped and a fresh one is constructed
//! for the next take, so stale buffers can never leak between recordings.

pub mod input;
pub mod playback;

use crate::annotations::Annotations;
use crate::dataset::{DatasetStore, Recording};
use crate::error::{Error, Result};
use crate::samples::SampleText;
use input::AudioInput;
use std::sync::{Arc, Mutex};

/// Fixed recording sample rate in Hz. Part of the dataset contract.
pub const SAMPLE_RATE: u32 = 16_000;
/// Fixed channel count. Multi-channel devices are downmixed on capture.
pub const CHANNELS: u16 = 1;

/// Lifecycle of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Reviewing,
    Saved,
    Discarded,
}

/// Equipment used for the take, fixed at session construction.
#[derive(Debug, Clone)]
pub struct Equipment {
    /// Display name of the microphone in use.
    pub microphone: String,
}

/// One recording take. The buffer is append-only while `Recording` and
/// frozen once `stop` returns; capture callbacks and readers synchronize on
/// the buffer mutex, and `stop` drops the stream before any read happens.
pub struct RecordingSession {
    sample: SampleText,
    equipment: Equipment,
    input: Box<dyn AudioInput>,
    buffer: Arc<Mutex<Vec<i16>>>,
    state: SessionState,
    duration_seconds: f64,
}

impl RecordingSession {
    pub fn new(sample: SampleText, equipment: Equipment, input: Box<dyn AudioInput>) -> Self {
        RecordingSession {
            sample,
            equipment,
            input,
            buffer: Arc::new(Mutex::new(Vec::new())),
            state: SessionState::Idle,
            duration_seconds: 0.0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn sample(&self) -> &SampleText {
        &self.sample
    }

    pub fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    /// Duration of the frozen take. Meaningful from `Reviewing` onward.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Number of frames captured so far.
    pub fn frame_count(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    /// Snapshot of the captured frames.
    pub fn frames(&self) -> Vec<i16> {
        self.buffer.lock().unwrap().clone()
    }

    /// Opens the input device and begins capturing.
    ///
    /// # Errors
    /// - `Error::InvalidState` if the session is not `Idle`
    /// - `Error::Device` if the device is unavailable, busy, or cannot honor
    ///   16 kHz mono; the session is unusable afterwards and must be replaced
    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(Error::InvalidState {
                operation: "start",
                state: self.state,
            });
        }
        self.input.open(Arc::clone(&self.buffer))?;
        self.state = SessionState::Recording;
        tracing::info!("Recording started: sample '{}'", self.sample.name);
        Ok(())
    }

    /// Stops capturing and freezes the buffer.
    ///
    /// Closing the input is the synchronization point: no capture callback
    /// can append after this returns.
    ///
    /// # Errors
    /// - `Error::InvalidState` if the session is not `Recording`
    pub fn stop(&mut self) -> Result<f64> {
        if self.state != SessionState::Recording {
            return Err(Error::InvalidState {
                operation: "stop",
                state: self.state,
            });
        }
        self.input.close();
        let frame_count = self.frame_count();
        self.duration_seconds = frame_count as f64 / SAMPLE_RATE as f64;
        self.state = SessionState::Reviewing;
        tracing::info!(
            "Recording stopped: {:.2}s ({} frames at {} Hz)",
            self.duration_seconds,
            frame_count,
            SAMPLE_RATE
        );
        Ok(self.duration_seconds)
    }

    /// Plays the frozen take through the system audio player. Read-only and
    /// repeatable.
    ///
    /// # Errors
    /// - `Error::InvalidState` if the session is not `Reviewing`
    /// - If the temp WAV cannot be written or no player is available
    pub fn playback(&self) -> Result<()> {
        if self.state != SessionState::Reviewing {
            return Err(Error::InvalidState {
                operation: "playback",
                state: self.state,
            });
        }
        playback::play_frames(&self.frames())
    }

    /// Persists the take through the dataset store.
    ///
    /// On any persistence error the session stays in `Reviewing` so the user
    /// can fix the problem and retry.
    ///
    /// # Errors
    /// - `Error::InvalidState` if the session is not `Reviewing`
    /// - Whatever `DatasetStore::persist` raises
    pub fn save(&mut self, annotations: &Annotations, store: &DatasetStore) -> Result<Recording> {
        if self.state != SessionState::Reviewing {
            return Err(Error::InvalidState {
                operation: "save",
                state: self.state,
            });
        }
        let recording = store.persist(self, annotations)?;
        self.state = SessionState::Saved;
        Ok(recording)
    }

    /// Drops the take. No file side effects.
    ///
    /// # Errors
    /// - `Error::InvalidState` if the session is not `Reviewing`
    pub fn discard(&mut self) -> Result<()> {
        if self.state != SessionState::Reviewing {
            return Err(Error::InvalidState {
                operation: "discard",
                state: self.state,
            });
        }
        self.buffer.lock().unwrap().clear();
        self.state = SessionState::Discarded;
        tracing::info!("Recording discarded");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn lifecycle_idle_recording_reviewing() {
        let mut session = session_with_frames(vec![0; 1600]);
        assert_eq!(session.state(), SessionState::Idle);

        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Recording);
        assert_eq!(session.frame_count(), 1600);

        let duration = session.stop().unwrap();
        assert_eq!(session.state(), SessionState::Reviewing);
        assert!((duration - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_is_frames_over_sample_rate() {
        let mut session = session_with_frames(vec![0; 32_000]);
        session.start().unwrap();
        let duration = session.stop().unwrap();
        assert_eq!(duration, 2.0);
    }

    #[test]
    fn start_is_only_valid_from_idle() {
        let mut session = session_with_frames(vec![0; 16]);
        session.start().unwrap();
        // A second start while recording is a contract violation; the single
        // session owns the device exclusively, so two concurrent Recording
        // states cannot exist.
        assert!(matches!(
            session.start(),
            Err(Error::InvalidState {
                operation: "start",
                state: SessionState::Recording,
            })
        ));
    }

    #[test]
    fn stop_and_discard_require_their_states() {
        let mut session = session_with_frames(vec![0; 16]);
        assert!(matches!(
            session.stop(),
            Err(Error::InvalidState { operation: "stop", .. })
        ));
        assert!(matches!(
            session.discard(),
            Err(Error::InvalidState {
                operation: "discard",
                ..
            })
        ));

        session.start().unwrap();
        session.stop().unwrap();
        session.discard().unwrap();
        assert_eq!(session.state(), SessionState::Discarded);
        assert_eq!(session.frame_count(), 0);

        // No re-arming: a finished session stays finished.
        assert!(session.start().is_err());
    }

    #[test]
    fn playback_is_only_valid_while_reviewing() {
        let session = session_with_frames(vec![0; 16]);
        assert!(matches!(
            session.playback(),
            Err(Error::InvalidState {
                operation: "playback",
                state: SessionState::Idle,
            })
        ));
    }

    #[test]
    fn device_failure_aborts_start() {
        let mut session = RecordingSession::new(
            test_sample(),
            test_equipment(),
            Box::new(FakeInput::unavailable()),
        );
        assert!(matches!(session.start(), Err(Error::Device(_))));
        assert_eq!(session.state(), SessionState::Idle);
    }
}
