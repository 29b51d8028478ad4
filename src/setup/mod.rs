//! First-run setup.
//!
//! Writes the embedded default configuration if none exists and seeds the
//! samples directory with the built-in passage set. Passages ship embedded
//! in the binary so the dataset's reference texts are versioned with the
//! tool.

use anyhow::anyhow;
use std::fs;
use std::path::Path;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../assets/evrec.toml");

/// Embedded reading passages, seeded into the samples directory.
const BUILTIN_SAMPLES: [(&str, &str); 5] = [
    (
        "backyard_astronomy.txt",
        include_str!("../../assets/samples/backyard_astronomy.txt"),
    ),
    (
        "city_transit_update.txt",
        include_str!("../../assets/samples/city_transit_update.txt"),
    ),
    (
        "morning_weather_report.txt",
        include_str!("../../assets/samples/morning_weather_report.txt"),
    ),
    (
        "numbers_and_measurements.txt",
        include_str!("../../assets/samples/numbers_and_measurements.txt"),
    ),
    (
        "sourdough_starter_basics.txt",
        include_str!("../../assets/samples/sourdough_starter_basics.txt"),
    ),
];

/// Writes the default config file if it does not exist yet.
///
/// # Errors
/// Returns an error if the config directory or file cannot be created.
pub fn ensure_config() -> anyhow::Result<()> {
    let config_path = crate::config::config_path()?;
    if config_path.exists() {
        return Ok(());
    }
    let config_dir = config_path
        .parent()
        .ok_or_else(|| anyhow!("Config path has no parent directory"))?;
    fs::create_dir_all(config_dir)?;
    fs::write(&config_path, DEFAULT_CONFIG)?;
    tracing::info!("Wrote default configuration to {}", config_path.display());
    Ok(())
}

/// Seeds the samples directory with the built-in passages if it is missing
/// or holds no `*.txt` files. Existing passages are never overwritten.
///
/// # Errors
/// Returns an error if the directory or a passage file cannot be written.
pub fn seed_samples(samples_dir: &Path) -> anyhow::Result<()> {
    if has_passages(samples_dir) {
        return Ok(());
    }
    fs::create_dir_all(samples_dir)?;
    for (file_name, body) in BUILTIN_SAMPLES {
        let path = samples_dir.join(file_name);
        if !path.exists() {
            fs::write(&path, body)?;
        }
    }
    tracing::info!(
        "Seeded {} built-in passages into {}",
        BUILTIN_SAMPLES.len(),
        samples_dir.display()
    );
    Ok(())
}

fn has_passages(samples_dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(samples_dir) else {
        return false;
    };
    entries
        .filter_map(|e| e.ok())
        .any(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_populates_an_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let samples = dir.path().join("samples");
        seed_samples(&samples).unwrap();

        let count = fs::read_dir(&samples).unwrap().count();
        assert_eq!(count, BUILTIN_SAMPLES.len());
    }

    #[test]
    fn seed_leaves_existing_passages_alone() {
        let dir = tempfile::tempdir().unwrap();
        let samples = dir.path();
        fs::write(samples.join("custom.txt"), "my own passage").unwrap();

        seed_samples(samples).unwrap();
        assert_eq!(
            fs::read_to_string(samples.join("custom.txt")).unwrap(),
            "my own passage"
        );
        // Directory already had passages, so nothing was seeded.
        assert_eq!(fs::read_dir(samples).unwrap().count(), 1);
    }
}
