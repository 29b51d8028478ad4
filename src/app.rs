//! Application orchestration.
//!
//! One entry point, no subcommands: launch, pick a microphone and passage
//! interactively, then run record/review/save cycles until the user quits.

use crate::config::EvrecConfig;
use crate::dataset::DatasetStore;
use crate::error::Error;
use crate::samples::{SampleLibrary, SampleText};
use crate::session::input::CpalInput;
use crate::session::{Equipment, RecordingSession};
use crate::{logging, setup, ui};
use clap::Parser;

/// Record annotated speech samples for ASR accuracy evaluation.
///
/// Each saved take becomes a 16 kHz mono WAV plus a JSON metadata sidecar in
/// the dataset directory, tagged with pace, mic distance, and background
/// noise for the downstream evaluation pipeline.
#[derive(Parser)]
#[command(name = "evrec")]
#[command(version)]
#[command(about = "Record annotated speech samples for ASR accuracy evaluation")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/evrec/evrec.toml\n    Logs:               ~/.local/state/evrec/evrec.log.*\n\nMicrophone and directory choices are made interactively at launch."
)]
struct Cli {}

/// Runs the recorder.
///
/// # Errors
/// - If logging or first-run setup fails
/// - If no usable input device or passages exist
/// - On fatal persistence errors (exhausted id space, orphaned audio)
pub fn run() -> anyhow::Result<()> {
    let _cli = Cli::parse();

    logging::init_logging()?;
    tracing::info!("=== evrec started ===");

    setup::ensure_config()?;
    let mut config = EvrecConfig::load()?;

    ctrlc::set_handler(move || {})
        .map_err(|e| anyhow::anyhow!("Failed to set Ctrl-C handler: {e}"))?;

    ui::intro()?;

    let (device_spec, microphone) = ui::pick_device(&config.audio.device)?;
    if device_spec != config.audio.device {
        config.audio.device = device_spec.clone();
        config.save()?;
    }

    setup::seed_samples(&config.paths.samples_dir)?;
    let library = SampleLibrary::load(&config.paths.samples_dir)?;
    if library.is_empty() {
        return Err(anyhow::anyhow!(
            "No sample passages found in {}",
            config.paths.samples_dir.display()
        ));
    }

    let store = DatasetStore::new(&config.paths.dataset_dir);

    loop {
        let Some(name) = ui::pick_sample(&library)? else {
            break;
        };
        let sample = library.get(&name)?.clone();
        run_take(sample, &device_spec, &microphone, &store)?;
        if !ui::another_take()? {
            break;
        }
    }

    ui::outro("Done. Dataset is ready for evaluation.")?;
    tracing::info!("=== evrec exited ===");
    Ok(())
}

/// One complete take: record, review, then save or discard.
///
/// A fresh session is constructed per take and dropped at the end; there is
/// no reset-to-Idle reuse, so a stale buffer can never bleed into the next
/// recording.
fn run_take(
    sample: SampleText,
    device_spec: &str,
    microphone: &str,
    store: &DatasetStore,
) -> anyhow::Result<()> {
    let equipment = Equipment {
        microphone: microphone.to_string(),
    };
    let mut session = RecordingSession::new(
        sample,
        equipment,
        Box::new(CpalInput::new(device_spec)),
    );

    ui::show_passage(session.sample());

    if let Err(e) = session.start() {
        tracing::error!("Failed to start recording: {}", e);
        cliclack::note("Recording error", format!("{e}\n\nThe take was aborted."))?;
        return Ok(());
    }

    ui::wait_for_stop()?;
    let duration = session.stop()?;

    let mut annotations = crate::annotations::Annotations::default();
    loop {
        match ui::review_menu(duration)? {
            ui::ReviewAction::Playback => {
                if let Err(e) = session.playback() {
                    tracing::warn!("Playback failed: {}", e);
                    cliclack::note("Playback error", e.to_string())?;
                }
            }
            ui::ReviewAction::Save => {
                annotations = ui::collect_annotations(&annotations)?;
                match session.save(&annotations, store) {
                    Ok(recording) => {
                        cliclack::note(
                            "Saved",
                            format!(
                                "{} ({}, {} at {})",
                                recording.id,
                                ui::format_duration(recording.duration_seconds),
                                recording.sample,
                                recording.audio
                            ),
                        )?;
                        return Ok(());
                    }
                    Err(e @ Error::IncompleteAnnotation { .. }) => {
                        // Session stays in Reviewing; loop back to the menu.
                        cliclack::note("Incomplete annotations", e.to_string())?;
                    }
                    Err(e @ Error::MetadataWrite { .. }) => {
                        // The audio file has value on its own; report the
                        // orphan and stop so a human can reconcile it.
                        tracing::error!("{}", e);
                        cliclack::note("Save failed", e.to_string())?;
                        return Err(e.into());
                    }
                    Err(e @ Error::IdSpaceExhausted) => {
                        tracing::error!("{}", e);
                        return Err(e.into());
                    }
                    Err(e) => {
                        // Recoverable write failure: the take survives in
                        // Reviewing for another attempt.
                        tracing::error!("Save failed: {}", e);
                        cliclack::note("Save failed", format!("{e}\n\nYou can retry."))?;
                    }
                }
            }
            ui::ReviewAction::Discard => {
                session.discard()?;
                cliclack::note("Discarded", "Nothing was written.")?;
                return Ok(());
            }
        }
    }
}
