//! Identifier allocation and dataset persistence.
//!
//! A saved take becomes a pair of files in `{dataset}/audio/`: `{id}.wav`
//! (16 kHz mono PCM) and `{id}.json` (the metadata sidecar). The audio file
//! is written and fsynced before the sidecar, so a crash mid-save can never
//! leave metadata pointing at a missing or truncated WAV. The dataset is
//! append-only: there is no update or delete.

use crate::annotations::{Annotations, FinalAnnotations};
use crate::error::{Error, Result};
use crate::session::{RecordingSession, SessionState, CHANNELS, SAMPLE_RATE};
use hound::WavWriter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// Identifier space: four lowercase hex digits.
const ID_SPACE: usize = 1 << 16;

/// Equipment block of the metadata sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentInfo {
    pub microphone: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// One persisted recording. Field names and nesting are the on-disk contract
/// consumed by the downstream evaluation pipeline; do not reorder or rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Four lowercase hex characters.
    pub id: String,
    /// Sample display name.
    pub sample: String,
    /// Source passage file name.
    pub sample_file: String,
    pub word_count: usize,
    pub duration_seconds: f64,
    pub annotations: FinalAnnotations,
    pub equipment: EquipmentInfo,
    /// Dataset-relative audio path, "audio/{id}.wav".
    pub audio: String,
}

/// Persistence manager for one dataset directory.
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DatasetStore { root: root.into() }
    }

    /// Directory holding the paired wav/json artifacts.
    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    /// Scans the audio directory for identifiers already in use.
    ///
    /// The directory is rescanned on every save rather than cached: it is
    /// the single source of truth and files may appear between saves.
    ///
    /// # Errors
    /// - If the directory exists but cannot be read
    pub fn existing_ids(&self) -> Result<HashSet<String>> {
        let audio_dir = self.audio_dir();
        if !audio_dir.exists() {
            return Ok(HashSet::new());
        }
        let mut ids = HashSet::new();
        for entry in fs::read_dir(&audio_dir)? {
            let path = entry?.path();
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_recording_id(stem) {
                    ids.insert(stem.to_string());
                }
            }
        }
        Ok(ids)
    }

    /// Persists the session's frozen take with the given annotations.
    ///
    /// Validation happens before any I/O: the session must be in `Reviewing`
    /// and the annotations must be complete. On success the recording is
    /// immutable on disk; re-recording allocates a new id.
    ///
    /// # Errors
    /// - `Error::InvalidState` if the session is not `Reviewing`
    /// - `Error::IncompleteAnnotation` if a required tag is unset
    /// - `Error::IdSpaceExhausted` if all 65536 ids are taken
    /// - `Error::MetadataWrite` if the sidecar fails after the WAV was
    ///   written; the WAV is left in place, never rolled back
    pub fn persist(
        &self,
        session: &RecordingSession,
        annotations: &Annotations,
    ) -> Result<Recording> {
        if session.state() != SessionState::Reviewing {
            return Err(Error::InvalidState {
                operation: "persist",
                state: session.state(),
            });
        }
        let annotations = annotations.finalize()?;

        fs::create_dir_all(self.audio_dir())?;
        let id = allocate_id(&self.existing_ids()?)?;

        let sample = session.sample();
        let recording = Recording {
            id: id.clone(),
            sample: sample.name.clone(),
            sample_file: sample.file_name.clone(),
            word_count: sample.word_count,
            duration_seconds: round2(session.duration_seconds()),
            annotations,
            equipment: EquipmentInfo {
                microphone: session.equipment().microphone.clone(),
                sample_rate: SAMPLE_RATE,
                channels: CHANNELS,
            },
            audio: format!("audio/{id}.wav"),
        };

        self.write_recording(&id, &session.frames(), &recording)?;
        tracing::info!(
            "Saved recording {}: {:.2}s, sample '{}'",
            id,
            recording.duration_seconds,
            recording.sample
        );
        Ok(recording)
    }

    /// Writes the WAV, fsyncs it, then writes the metadata sidecar.
    ///
    /// Ordering is the crash-safety contract: the sidecar only ever refers
    /// to a fully flushed audio file. If the sidecar write fails, the WAV is
    /// reported and kept.
    pub(crate) fn write_recording(
        &self,
        id: &str,
        frames: &[i16],
        recording: &Recording,
    ) -> Result<()> {
        let wav_path = self.audio_dir().join(format!("{id}.wav"));
        let json_path = self.audio_dir().join(format!("{id}.json"));

        let spec = hound::WavSpec {
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&wav_path, spec)?;
        for &frame in frames {
            writer.write_sample(frame)?;
        }
        writer.finalize()?;
        fs::File::open(&wav_path)?.sync_all()?;

        // Serialize in memory first so a failure here leaves no partial
        // sidecar on disk.
        let json = serde_json::to_string_pretty(recording)
            .map_err(|e| Error::MetadataWrite {
                audio_path: wav_path.clone(),
                source: std::io::Error::from(e),
            })?;
        fs::write(&json_path, json).map_err(|e| Error::MetadataWrite {
            audio_path: wav_path.clone(),
            source: e,
        })?;

        Ok(())
    }

    /// Reads a persisted recording back from its sidecar.
    ///
    /// # Errors
    /// - If the sidecar is missing or malformed
    pub fn load_recording(&self, id: &str) -> Result<Recording> {
        let json_path = self.audio_dir().join(format!("{id}.json"));
        let json = fs::read_to_string(&json_path)?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Io(std::io::Error::from(e)))
    }
}

/// Allocates a 4-hex-digit identifier not present in `existing`.
///
/// Draws from uuid-v4 hex and resamples on collision. The exhaustion check
/// runs up front so a full id space fails fast instead of looping forever.
///
/// # Errors
/// - `Error::IdSpaceExhausted` if every identifier is taken
pub fn allocate_id(existing: &HashSet<String>) -> Result<String> {
    if existing.len() >= ID_SPACE {
        return Err(Error::IdSpaceExhausted);
    }
    loop {
        let candidate = uuid::Uuid::new_v4().simple().to_string()[..4].to_string();
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }
}

fn is_recording_id(stem: &str) -> bool {
    stem.len() == 4 && stem.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{BackgroundNoise, MicDistance, Pace};
    use crate::session::testing::session_with_frames;

    fn complete_annotations() -> Annotations {
        Annotations {
            pace: Some(Pace::Normal),
            mic_distance: Some(MicDistance::Close),
            background_noise: Some(BackgroundNoise::Silence),
            notes: String::new(),
        }
    }

    fn file_count(store: &DatasetStore) -> usize {
        match fs::read_dir(store.audio_dir()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn allocate_id_matches_format_and_avoids_collisions() {
        let mut existing = HashSet::new();
        existing.insert("0000".to_string());
        for _ in 0..10_000 {
            let id = allocate_id(&existing).unwrap();
            assert_eq!(id.len(), 4);
            assert!(id.chars().all(|c| "0123456789abcdef".contains(c)));
            assert!(!existing.contains(&id));
            existing.insert(id);
        }
    }

    #[test]
    fn allocate_id_fails_when_space_is_exhausted() {
        let existing: HashSet<String> = (0..ID_SPACE).map(|n| format!("{n:04x}")).collect();
        assert!(matches!(
            allocate_id(&existing),
            Err(Error::IdSpaceExhausted)
        ));
    }

    #[test]
    fn save_writes_paired_wav_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());

        let mut session = session_with_frames(vec![100; 32_000]);
        session.start().unwrap();
        session.stop().unwrap();

        let recording = session.save(&complete_annotations(), &store).unwrap();
        assert_eq!(recording.duration_seconds, 2.0);
        assert_eq!(recording.word_count, 3);
        assert_eq!(recording.annotations.pace, Pace::Normal);
        assert!(is_recording_id(&recording.id));
        assert_eq!(recording.audio, format!("audio/{}.wav", recording.id));

        let wav = store.audio_dir().join(format!("{}.wav", recording.id));
        let json = store.audio_dir().join(format!("{}.json", recording.id));
        assert!(wav.exists());
        assert!(json.exists());
        assert_eq!(file_count(&store), 2);

        let mut reader = hound::WavReader::open(&wav).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, CHANNELS);
        assert_eq!(reader.samples::<i16>().count(), 32_000);
    }

    #[test]
    fn metadata_round_trips_field_for_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());

        let mut session = session_with_frames(vec![-5; 16_000]);
        session.start().unwrap();
        session.stop().unwrap();
        let mut annotations = complete_annotations();
        annotations.notes = "window open".to_string();

        let written = session.save(&annotations, &store).unwrap();
        let read_back = store.load_recording(&written.id).unwrap();
        assert_eq!(written, read_back);
        assert_eq!(read_back.equipment.sample_rate, 16_000);
        assert_eq!(read_back.equipment.channels, 1);
        assert_eq!(read_back.annotations.notes, "window open");
    }

    #[test]
    fn sidecar_uses_the_exact_wire_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());

        let mut session = session_with_frames(vec![0; 1600]);
        session.start().unwrap();
        session.stop().unwrap();
        let recording = session.save(&complete_annotations(), &store).unwrap();

        let json = fs::read_to_string(store.audio_dir().join(format!("{}.json", recording.id)))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();
        let keys: Vec<_> = object.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "id",
                "sample",
                "sample_file",
                "word_count",
                "duration_seconds",
                "annotations",
                "equipment",
                "audio"
            ]
        );
        assert_eq!(value["annotations"]["pace"], "normal");
        assert_eq!(value["annotations"]["notes"], "");
        assert_eq!(value["equipment"]["sample_rate"], 16_000);
        assert_eq!(value["equipment"]["channels"], 1);
    }

    #[test]
    fn incomplete_annotations_leave_the_dataset_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());

        let mut session = session_with_frames(vec![0; 1600]);
        session.start().unwrap();
        session.stop().unwrap();

        let mut annotations = complete_annotations();
        annotations.background_noise = None;
        let err = session.save(&annotations, &store).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteAnnotation {
                field: "background_noise"
            }
        ));
        assert_eq!(session.state(), SessionState::Reviewing);
        assert_eq!(file_count(&store), 0);

        // Completing the tags makes the retry succeed from Reviewing.
        session.save(&complete_annotations(), &store).unwrap();
        assert_eq!(file_count(&store), 2);
    }

    #[test]
    fn discard_leaves_file_count_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());

        let mut session = session_with_frames(vec![0; 1600]);
        session.start().unwrap();
        session.stop().unwrap();
        session.discard().unwrap();
        assert_eq!(file_count(&store), 0);
    }

    #[test]
    fn save_outside_reviewing_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());

        let mut session = session_with_frames(vec![0; 1600]);
        session.start().unwrap();
        assert!(matches!(
            session.save(&complete_annotations(), &store),
            Err(Error::InvalidState {
                operation: "save",
                state: SessionState::Recording,
            })
        ));
    }

    #[test]
    fn failed_sidecar_write_keeps_the_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        fs::create_dir_all(store.audio_dir()).unwrap();
        // A directory squatting on the sidecar path makes the json write fail
        // right after the WAV has been written and synced.
        fs::create_dir(store.audio_dir().join("abcd.json")).unwrap();

        let recording = Recording {
            id: "abcd".to_string(),
            sample: "Test Passage".to_string(),
            sample_file: "test_passage.txt".to_string(),
            word_count: 3,
            duration_seconds: 0.1,
            annotations: complete_annotations().finalize().unwrap(),
            equipment: EquipmentInfo {
                microphone: "Test Microphone".to_string(),
                sample_rate: SAMPLE_RATE,
                channels: CHANNELS,
            },
            audio: "audio/abcd.wav".to_string(),
        };

        let err = store
            .write_recording("abcd", &[0; 1600], &recording)
            .unwrap_err();
        let wav_path = store.audio_dir().join("abcd.wav");
        match err {
            Error::MetadataWrite { audio_path, .. } => assert_eq!(audio_path, wav_path),
            other => panic!("expected MetadataWrite, got {other:?}"),
        }
        // Orphaned audio survives; no partial sidecar appears as a file.
        assert!(wav_path.exists());
        assert!(store.audio_dir().join("abcd.json").is_dir());
    }

    #[test]
    fn existing_ids_scans_both_artifact_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        fs::create_dir_all(store.audio_dir()).unwrap();
        fs::write(store.audio_dir().join("00ff.wav"), b"").unwrap();
        fs::write(store.audio_dir().join("a1b2.json"), b"{}").unwrap();
        fs::write(store.audio_dir().join("notes.txt"), b"").unwrap();
        fs::write(store.audio_dir().join("ABCD.wav"), b"").unwrap();

        let ids = store.existing_ids().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("00ff"));
        assert!(ids.contains("a1b2"));
    }
}
