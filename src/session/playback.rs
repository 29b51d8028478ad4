//! Review playback through the system audio player.
//!
//! The frozen take is written to a temp WAV and handed to whatever player
//! the platform provides. Playback blocks until the player exits so the
//! review menu does not race the audio.

use crate::error::{Error, Result};
use crate::session::{CHANNELS, SAMPLE_RATE};
use hound::WavWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Writes `frames` to a temp WAV and plays it. Repeatable; the temp file is
/// overwritten on each call.
pub fn play_frames(frames: &[i16]) -> Result<()> {
    let path = temp_wav_path();
    write_wav(frames, &path)?;
    play_wav(&path)
}

fn temp_wav_path() -> PathBuf {
    std::env::temp_dir().join(format!("evrec_review_{}.wav", std::process::id()))
}

fn write_wav(frames: &[i16], path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &frame in frames {
        writer.write_sample(frame)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Plays a WAV file with the platform audio player, blocking until done.
///
/// macOS: afplay. Linux: aplay, then paplay, ffplay, mpv as fallbacks.
fn play_wav(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        let status = Command::new("afplay")
            .arg(path)
            .status()
            .map_err(|e| Error::Device(format!("failed to launch afplay: {e}")))?;
        if !status.success() {
            return Err(Error::Device("afplay exited with an error".to_string()));
        }
        Ok(())
    }

    #[cfg(not(target_os = "macos"))]
    {
        let players: [(&str, &[&str]); 4] = [
            ("aplay", &["-q"]),
            ("paplay", &[]),
            ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "error"]),
            ("mpv", &["--really-quiet"]),
        ];
        for (player, args) in players {
            match Command::new(player).args(args).arg(path).status() {
                Ok(status) if status.success() => return Ok(()),
                Ok(status) => {
                    tracing::warn!("{} exited with {}", player, status);
                }
                Err(_) => continue,
            }
        }
        Err(Error::Device(
            "no audio player found; install aplay, paplay, ffplay, or mpv".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_wav_produces_readable_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        write_wav(&[0, 100, -100, i16::MAX], &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.channels, CHANNELS);
        assert_eq!(spec.bits_per_sample, 16);
        let frames: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(frames, vec![0, 100, -100, i16::MAX]);
    }
}
