//! Sample library: fixed reading passages for recording sessions.
//!
//! Passages are plain `*.txt` files in the samples directory, loaded once at
//! startup. The word count is computed by whitespace tokenization and cached
//! for the life of the process so downstream WPM math stays reproducible.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// One reading passage, immutable after load.
#[derive(Debug, Clone)]
pub struct SampleText {
    /// Display name derived from the file stem ("morning_weather" -> "Morning Weather").
    pub name: String,
    /// Raw file stem, used as the topic key.
    pub topic: String,
    /// Source file name, recorded in the metadata sidecar.
    pub file_name: String,
    /// Full passage text shown to the reader.
    pub body: String,
    /// Whitespace-token count of `body`, computed once.
    pub word_count: usize,
}

/// All passages found in the samples directory, sorted by file name.
#[derive(Debug)]
pub struct SampleLibrary {
    samples: Vec<SampleText>,
}

impl SampleLibrary {
    /// Loads every `*.txt` file in `dir` as a passage.
    ///
    /// # Errors
    /// - If the directory cannot be read
    /// - If a passage file cannot be read
    pub fn load(dir: &Path) -> Result<Self> {
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().is_some_and(|ext| ext == "txt") {
                    Some(path)
                } else {
                    None
                }
            })
            .collect();
        paths.sort();

        let mut samples = Vec::with_capacity(paths.len());
        for path in paths {
            let body = fs::read_to_string(&path)?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let file_name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            samples.push(SampleText {
                name: display_name(&stem),
                topic: stem,
                file_name,
                word_count: word_count(&body),
                body,
            });
        }

        tracing::info!("Loaded {} sample passages from {}", samples.len(), dir.display());
        Ok(SampleLibrary { samples })
    }

    /// All loaded passages, in file-name order.
    pub fn list(&self) -> &[SampleText] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Looks up a passage by display name.
    ///
    /// # Errors
    /// - `Error::SampleNotFound` if no passage with that name was loaded
    pub fn get(&self, name: &str) -> Result<&SampleText> {
        self.samples
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::SampleNotFound(name.to_string()))
    }
}

/// Counts words by whitespace tokenization. Must stay stable: downstream
/// evaluators divide this by recording duration to compute WPM.
pub fn word_count(body: &str) -> usize {
    body.split_whitespace().count()
}

/// "morning_weather_report" -> "Morning Weather Report"
fn display_name(stem: &str) -> String {
    stem.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_splits_on_whitespace() {
        assert_eq!(word_count("one two three"), 3);
        assert_eq!(word_count("  padded\n\ttokens  here "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn display_name_title_cases_stems() {
        assert_eq!(display_name("morning_weather_report"), "Morning Weather Report");
        assert_eq!(display_name("solo"), "Solo");
    }

    #[test]
    fn load_scans_txt_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_second.txt"), "two words").unwrap();
        std::fs::write(dir.path().join("a_first.txt"), "one two three").unwrap();
        std::fs::write(dir.path().join("ignored.md"), "not a passage").unwrap();

        let library = SampleLibrary::load(dir.path()).unwrap();
        let names: Vec<_> = library.list().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A First", "B Second"]);
        assert_eq!(library.list()[0].word_count, 3);
        assert_eq!(library.list()[0].file_name, "a_first.txt");
    }

    #[test]
    fn get_unknown_name_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let library = SampleLibrary::load(dir.path()).unwrap();
        assert!(matches!(
            library.get("missing"),
            Err(Error::SampleNotFound(name)) if name == "missing"
        ));
    }
}
