//! Audio input backends for the capture session.
//!
//! The session records through the `AudioInput` seam so the state machine can
//! be exercised in tests without a physical microphone. `CpalInput` is the
//! real backend: it opens the chosen device at the fixed 16 kHz rate and
//! downmixes multi-channel frames to mono while appending to the session
//! buffer under its mutex.

use crate::error::{Error, Result};
use crate::session::SAMPLE_RATE;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Source of captured PCM frames for one recording session.
///
/// `open` begins appending mono i16 frames at 16 kHz to `sink`; `close` is a
/// synchronization point after which no further appends may happen.
pub trait AudioInput {
    fn open(&mut self, sink: Arc<Mutex<Vec<i16>>>) -> Result<()>;
    fn close(&mut self);
}

/// Real microphone input via cpal.
pub struct CpalInput {
    /// "default", a numeric index, or a device name.
    device_spec: String,
    /// Active stream, kept alive while recording.
    stream: Option<cpal::Stream>,
}

impl CpalInput {
    pub fn new(device_spec: impl Into<String>) -> Self {
        CpalInput {
            device_spec: device_spec.into(),
            stream: None,
        }
    }
}

impl AudioInput for CpalInput {
    fn open(&mut self, sink: Arc<Mutex<Vec<i16>>>) -> Result<()> {
        let device = with_alsa_quiet(|| {
            let host = cpal::default_host();
            if self.device_spec == "default" {
                host.default_input_device()
                    .ok_or_else(|| Error::Device("no audio input device available".to_string()))
            } else {
                find_device(&host, &self.device_spec)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());

        // The dataset contract fixes the format, so unlike a general-purpose
        // recorder we refuse devices that cannot run at 16 kHz instead of
        // falling back to their native rate.
        let supported = device
            .supported_input_configs()
            .map_err(|e| Error::Device(format!("failed to query '{device_name}': {e}")))?
            .find_map(|range| range.try_with_sample_rate(cpal::SampleRate(SAMPLE_RATE)))
            .ok_or_else(|| {
                Error::Device(format!(
                    "device '{device_name}' cannot record at {SAMPLE_RATE} Hz"
                ))
            })?;

        let channels = supported.channels() as usize;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        tracing::info!(
            "Recording device: {} ({} Hz, {} channels, {:?})",
            device_name,
            config.sample_rate.0,
            channels,
            sample_format
        );

        let err_fn = |err| tracing::error!("Audio stream error: {}", err);
        let stream = match sample_format {
            cpal::SampleFormat::I16 => device
                .build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        append_mono(&sink, data, channels);
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| Error::Device(format!("failed to open stream: {e}")))?,
            cpal::SampleFormat::F32 => device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<i16> = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect();
                        append_mono(&sink, &converted, channels);
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| Error::Device(format!("failed to open stream: {e}")))?,
            other => {
                return Err(Error::Device(format!(
                    "unsupported sample format {other:?} on '{device_name}'"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| Error::Device(format!("failed to start stream: {e}")))?;
        self.stream = Some(stream);
        tracing::debug!("Audio stream started");
        Ok(())
    }

    fn close(&mut self) {
        // Dropping the stream stops the callback; after this returns no
        // further appends can reach the session buffer.
        self.stream = None;
        tracing::debug!("Audio stream closed");
    }
}

/// Appends captured frames to the session buffer, downmixing to mono by
/// averaging channels.
fn append_mono(sink: &Arc<Mutex<Vec<i16>>>, data: &[i16], num_channels: usize) {
    let mut frames = sink.lock().unwrap();
    match num_channels {
        0 | 1 => frames.extend_from_slice(data),
        2 => {
            for pair in data.chunks_exact(2) {
                let mono = (pair[0] as i32 + pair[1] as i32) / 2;
                frames.push(mono as i16);
            }
        }
        n => {
            for chunk in data.chunks_exact(n) {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                frames.push((sum / n as i32) as i16);
            }
        }
    }
}

/// One enumerated input device, for the interactive picker.
pub struct InputDevice {
    pub name: String,
    pub is_default: bool,
}

/// Lists input devices on the default host, marking the system default.
///
/// # Errors
/// - If the host cannot enumerate devices
pub fn list_input_devices() -> Result<Vec<InputDevice>> {
    with_alsa_quiet(|| {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        let devices = host
            .input_devices()
            .map_err(|e| Error::Device(format!("failed to enumerate devices: {e}")))?
            .filter_map(|d| d.name().ok())
            .map(|name| InputDevice {
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            })
            .collect();
        Ok(devices)
    })
}

/// Finds an input device by name or numeric index.
fn find_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let devices: Vec<_> = host
        .input_devices()
        .map_err(|e| Error::Device(format!("failed to enumerate devices: {e}")))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        return devices.into_iter().nth(index).ok_or_else(|| {
            Error::Device(format!("device index {index} is out of range"))
        });
    }

    devices
        .into_iter()
        .find(|d| d.name().map(|n| n == device_spec).unwrap_or(false))
        .ok_or_else(|| Error::Device(format!("audio input device '{device_spec}' not found")))
}

/// Temporarily redirects stderr to /dev/null so ALSA's library chatter does
/// not corrupt the prompt UI. No-op off Linux.
#[cfg(target_os = "linux")]
fn with_alsa_quiet<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| Error::Device(format!("failed to open /dev/null: {e}")))?;
    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(Error::Device("failed to duplicate stderr".to_string()));
    }

    if unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(Error::Device("failed to redirect stderr".to_string()));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
fn with_alsa_quiet<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_mono_averages_stereo_pairs() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        append_mono(&sink, &[100, 200, -50, 50], 2);
        assert_eq!(*sink.lock().unwrap(), vec![150, 0]);
    }

    #[test]
    fn append_mono_passes_mono_through() {
        let sink = Arc::new(Mutex::new(vec![1i16]));
        append_mono(&sink, &[2, 3], 1);
        assert_eq!(*sink.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn append_mono_averages_all_channels() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        append_mono(&sink, &[3, 6, 9], 3);
        assert_eq!(*sink.lock().unwrap(), vec![6]);
    }
}
