//! Annotation collector: categorical tags attached to a recording at save time.
//!
//! Each category is a closed enum; unknown wire values are rejected at the
//! serde boundary instead of being persisted as free-form strings. The
//! in-progress `Annotations` holder is mutable until save, then copied into
//! an owned `FinalAnnotations` so later UI edits cannot touch a saved record.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Speaking pace of the take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    AsFastAsPossible,
    QuickerThanNormal,
    Normal,
    CarefulEnunciation,
    DeliberatelySlow,
    Mumbled,
    Whispered,
    AsLoudAsPossible,
    WeirdVoice,
}

impl Pace {
    pub const ALL: [Pace; 9] = [
        Pace::AsFastAsPossible,
        Pace::QuickerThanNormal,
        Pace::Normal,
        Pace::CarefulEnunciation,
        Pace::DeliberatelySlow,
        Pace::Mumbled,
        Pace::Whispered,
        Pace::AsLoudAsPossible,
        Pace::WeirdVoice,
    ];

    /// Human-readable label for the selection prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Pace::AsFastAsPossible => "As fast as possible",
            Pace::QuickerThanNormal => "Quicker than normal",
            Pace::Normal => "Normal/conversational",
            Pace::CarefulEnunciation => "Careful enunciation",
            Pace::DeliberatelySlow => "Deliberately slow",
            Pace::Mumbled => "Mumbled/unclear",
            Pace::Whispered => "Whispered",
            Pace::AsLoudAsPossible => "As loud as possible",
            Pace::WeirdVoice => "Weird/altered voice",
        }
    }
}

/// Distance between speaker and microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicDistance {
    Close,
    Normal,
    Far,
}

impl MicDistance {
    pub const ALL: [MicDistance; 3] = [MicDistance::Close, MicDistance::Normal, MicDistance::Far];

    pub fn label(&self) -> &'static str {
        match self {
            MicDistance::Close => "Close (< 6 inches)",
            MicDistance::Normal => "Normal (6-12 inches)",
            MicDistance::Far => "Far (> 12 inches)",
        }
    }
}

/// Ambient noise present during the take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundNoise {
    Silence,
    Cafe,
    Office,
    Market,
    Music,
    ConversationSameLanguage,
    ConversationOtherLanguage,
    ConversationMixed,
    Traffic,
    Wind,
    Other,
}

impl BackgroundNoise {
    pub const ALL: [BackgroundNoise; 11] = [
        BackgroundNoise::Silence,
        BackgroundNoise::Cafe,
        BackgroundNoise::Office,
        BackgroundNoise::Market,
        BackgroundNoise::Music,
        BackgroundNoise::ConversationSameLanguage,
        BackgroundNoise::ConversationOtherLanguage,
        BackgroundNoise::ConversationMixed,
        BackgroundNoise::Traffic,
        BackgroundNoise::Wind,
        BackgroundNoise::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BackgroundNoise::Silence => "Silence (quiet room)",
            BackgroundNoise::Cafe => "Coffee shop/cafe",
            BackgroundNoise::Office => "Busy office",
            BackgroundNoise::Market => "Busy market",
            BackgroundNoise::Music => "Background music",
            BackgroundNoise::ConversationSameLanguage => "Conversation (same language)",
            BackgroundNoise::ConversationOtherLanguage => "Conversation (other language)",
            BackgroundNoise::ConversationMixed => "Conversation (mixed languages)",
            BackgroundNoise::Traffic => "Traffic",
            BackgroundNoise::Wind => "Wind (outdoor)",
            BackgroundNoise::Other => "Other (see notes)",
        }
    }
}

/// In-progress annotations for the current session. Mutable until save.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    pub pace: Option<Pace>,
    pub mic_distance: Option<MicDistance>,
    pub background_noise: Option<BackgroundNoise>,
    /// Free-form notes, optional and unconstrained.
    pub notes: String,
}

/// Validated annotation set as persisted in the metadata sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnnotations {
    pub pace: Pace,
    pub mic_distance: MicDistance,
    pub background_noise: BackgroundNoise,
    /// Possibly empty, but always a string on the wire.
    pub notes: String,
}

impl Annotations {
    /// Copies the current tags into an owned, fully-populated set.
    ///
    /// # Errors
    /// - `Error::IncompleteAnnotation` naming the first unset required field
    pub fn finalize(&self) -> Result<FinalAnnotations> {
        let pace = self
            .pace
            .ok_or(Error::IncompleteAnnotation { field: "pace" })?;
        let mic_distance = self.mic_distance.ok_or(Error::IncompleteAnnotation {
            field: "mic_distance",
        })?;
        let background_noise = self.background_noise.ok_or(Error::IncompleteAnnotation {
            field: "background_noise",
        })?;
        Ok(FinalAnnotations {
            pace,
            mic_distance,
            background_noise,
            notes: self.notes.clone(),
        })
    }
}
