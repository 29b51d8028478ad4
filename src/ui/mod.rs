//! Interactive prompts for the recording flow.
//!
//! All configuration happens through these prompts rather than flags: the
//! microphone picker, passage picker, review menu, and annotation
//! collection. Built on cliclack so the flow reads as one guided session.

use crate::annotations::{Annotations, BackgroundNoise, MicDistance, Pace};
use crate::samples::{SampleLibrary, SampleText};
use crate::session::input;
use console::style;

/// What the user chose in the review menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Playback,
    Save,
    Discard,
}

/// Prints the banner and opening intro.
pub fn intro() -> std::io::Result<()> {
    println!();
    cliclack::intro(style(" evrec ").on_white().black())
}

pub fn outro(message: &str) -> std::io::Result<()> {
    cliclack::outro(message)
}

/// Microphone picker over the enumerated input devices.
///
/// Returns `(device_spec, microphone_name)`: the spec goes into the config
/// and the session input, the name into the persisted equipment block. The
/// system default is marked and preselected unless the saved config names
/// another device.
///
/// # Errors
/// - If device enumeration fails or no input device exists
pub fn pick_device(configured: &str) -> anyhow::Result<(String, String)> {
    let devices = input::list_input_devices()?;
    if devices.is_empty() {
        return Err(anyhow::anyhow!(
            "No audio input devices found on this system"
        ));
    }

    let mut select = cliclack::select("Select microphone:");
    let mut initial = 0usize;
    for (i, device) in devices.iter().enumerate() {
        let hint = if device.is_default { "system default" } else { "" };
        select = select.item(i, &device.name, hint);
        if device.name == configured || (configured == "default" && device.is_default) {
            initial = i;
        }
    }
    let chosen = select.initial_value(initial).interact()?;
    let name = devices[chosen].name.clone();
    tracing::info!("Microphone selected: {}", name);
    Ok((name.clone(), name))
}

/// Passage picker. Returns the chosen passage name, or `None` on quit.
pub fn pick_sample(library: &SampleLibrary) -> anyhow::Result<Option<String>> {
    let samples = library.list();
    let mut select = cliclack::select("Choose a passage to read:");
    for (i, sample) in samples.iter().enumerate() {
        select = select.item(i, &sample.name, format!("{} words", sample.word_count));
    }
    select = select.item(samples.len(), "Quit", "");
    let chosen = select.interact()?;
    Ok(samples.get(chosen).map(|s| s.name.clone()))
}

/// Prints the passage text for the reader.
pub fn show_passage(sample: &SampleText) {
    println!();
    println!(
        "{}",
        style(format!("  {} ({} words)", sample.name, sample.word_count)).bold()
    );
    println!();
    for line in sample.body.lines() {
        println!("  {line}");
    }
    println!();
}

/// Blocks while recording until the user presses Enter.
pub fn wait_for_stop() -> anyhow::Result<()> {
    let spinner = cliclack::spinner();
    spinner.start("Recording... press Enter to stop");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    spinner.stop("Recording stopped");
    Ok(())
}

/// Review menu shown after stopping, repeated until save or discard.
pub fn review_menu(duration_seconds: f64) -> anyhow::Result<ReviewAction> {
    let prompt = format!("Take is {} long. What next?", format_duration(duration_seconds));
    let action = cliclack::select(prompt)
        .item(ReviewAction::Playback, "Play back", "listen before deciding")
        .item(ReviewAction::Save, "Save", "annotate and write to the dataset")
        .item(ReviewAction::Discard, "Discard", "drop this take")
        .interact()?;
    Ok(action)
}

/// Collects the categorical tags and notes for the take.
///
/// Previous choices within the session are kept as the initial selection so
/// a retry after a failed save does not start from scratch.
pub fn collect_annotations(previous: &Annotations) -> anyhow::Result<Annotations> {
    let mut pace_select = cliclack::select("Speaking pace:");
    for (i, pace) in Pace::ALL.iter().enumerate() {
        pace_select = pace_select.item(i, pace.label(), "");
    }
    let pace_initial = previous
        .pace
        .and_then(|p| Pace::ALL.iter().position(|&q| q == p))
        .unwrap_or(2); // Normal
    let pace = Pace::ALL[pace_select.initial_value(pace_initial).interact()?];

    let mut distance_select = cliclack::select("Mic distance:");
    for (i, distance) in MicDistance::ALL.iter().enumerate() {
        distance_select = distance_select.item(i, distance.label(), "");
    }
    let distance_initial = previous
        .mic_distance
        .and_then(|d| MicDistance::ALL.iter().position(|&q| q == d))
        .unwrap_or(1);
    let mic_distance =
        MicDistance::ALL[distance_select.initial_value(distance_initial).interact()?];

    let mut noise_select = cliclack::select("Background noise:");
    for (i, noise) in BackgroundNoise::ALL.iter().enumerate() {
        noise_select = noise_select.item(i, noise.label(), "");
    }
    let noise_initial = previous
        .background_noise
        .and_then(|n| BackgroundNoise::ALL.iter().position(|&q| q == n))
        .unwrap_or(0);
    let background_noise =
        BackgroundNoise::ALL[noise_select.initial_value(noise_initial).interact()?];

    let notes: String = cliclack::input("Notes (optional):")
        .placeholder("noise source, volume level, ambient conditions...")
        .default_input(&previous.notes)
        .required(false)
        .interact()?;

    Ok(Annotations {
        pace: Some(pace),
        mic_distance: Some(mic_distance),
        background_noise: Some(background_noise),
        notes: notes.trim().to_string(),
    })
}

/// Asks whether to record another take.
pub fn another_take() -> anyhow::Result<bool> {
    Ok(cliclack::confirm("Record another take?").interact()?)
}

/// "125.0s" -> "02:05"
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
