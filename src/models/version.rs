//! Version model: one localized release of a game.

use serde::{Deserialize, Serialize};

/// Console platform a version was released on.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Platform {
    PSP,
    PSVITA,
    PS1,
    PS2,
    PS3,
    PS4,
    PS5,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::PSP,
        Platform::PSVITA,
        Platform::PS1,
        Platform::PS2,
        Platform::PS3,
        Platform::PS4,
        Platform::PS5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::PSP => "PSP",
            Platform::PSVITA => "PSVITA",
            Platform::PS1 => "PS1",
            Platform::PS2 => "PS2",
            Platform::PS3 => "PS3",
            Platform::PS4 => "PS4",
            Platform::PS5 => "PS5",
        }
    }

    /// Parse a stored or submitted platform name. Matching ignores case.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|p| p.as_str() == upper)
    }
}

/// Audio or subtitle language.
///
/// Variants are declared in the alphabetical order of their display names so
/// the derived `Ord` matches a plain string sort.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    Arabic,
    #[serde(rename = "Chinese (Simplified)")]
    ChineseSimplified,
    #[serde(rename = "Chinese (Traditional)")]
    ChineseTraditional,
    Croatian,
    Czech,
    Dutch,
    English,
    #[serde(rename = "French (France)")]
    FrenchFrance,
    German,
    Greek,
    Hungarian,
    Italian,
    Japanese,
    Korean,
    Other,
    Polish,
    #[serde(rename = "Portuguese (Brazil)")]
    PortugueseBrazil,
    #[serde(rename = "Portuguese (Portugal)")]
    PortuguesePortugal,
    Russian,
    Spanish,
    Thai,
    Turkish,
}

impl Language {
    pub const ALL: [Language; 22] = [
        Language::Arabic,
        Language::ChineseSimplified,
        Language::ChineseTraditional,
        Language::Croatian,
        Language::Czech,
        Language::Dutch,
        Language::English,
        Language::FrenchFrance,
        Language::German,
        Language::Greek,
        Language::Hungarian,
        Language::Italian,
        Language::Japanese,
        Language::Korean,
        Language::Other,
        Language::Polish,
        Language::PortugueseBrazil,
        Language::PortuguesePortugal,
        Language::Russian,
        Language::Spanish,
        Language::Thai,
        Language::Turkish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Arabic => "Arabic",
            Language::ChineseSimplified => "Chinese (Simplified)",
            Language::ChineseTraditional => "Chinese (Traditional)",
            Language::Croatian => "Croatian",
            Language::Czech => "Czech",
            Language::Dutch => "Dutch",
            Language::English => "English",
            Language::FrenchFrance => "French (France)",
            Language::German => "German",
            Language::Greek => "Greek",
            Language::Hungarian => "Hungarian",
            Language::Italian => "Italian",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Other => "Other",
            Language::Polish => "Polish",
            Language::PortugueseBrazil => "Portuguese (Brazil)",
            Language::PortuguesePortugal => "Portuguese (Portugal)",
            Language::Russian => "Russian",
            Language::Spanish => "Spanish",
            Language::Thai => "Thai",
            Language::Turkish => "Turkish",
        }
    }

    /// Exact match on the display name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

/// Normalized, storable version fields shared by catalog versions and posts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionFields {
    pub platform: Platform,
    pub code: String,
    pub voice_languages: Vec<Language>,
    pub subtitles_languages: Vec<Language>,
}

/// A version embedded in a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub created_by: String,
    pub platform: Platform,
    pub code: String,
    pub voice_languages: Vec<Language>,
    pub subtitles_languages: Vec<Language>,
    pub is_official: bool,
}

/// A normalized version ready to be written, stamped with its submitter.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub created_by: String,
    pub is_official: bool,
    pub fields: VersionFields,
}

/// Raw version fields as submitted by a client.
///
/// Everything is a string here; the normalizer decides what is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSubmission {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub voice_languages: Vec<String>,
    #[serde(default)]
    pub subtitles_languages: Vec<String>,
}

impl From<&VersionFields> for VersionSubmission {
    fn from(fields: &VersionFields) -> Self {
        Self {
            platform: fields.platform.as_str().to_string(),
            code: fields.code.clone(),
            voice_languages: fields
                .voice_languages
                .iter()
                .map(|l| l.as_str().to_string())
                .collect(),
            subtitles_languages: fields
                .subtitles_languages
                .iter()
                .map(|l| l.as_str().to_string())
                .collect(),
        }
    }
}
