//! Canonicalization of submitted version fields.
//!
//! Everything here is pure: no I/O, and normalizing an already normalized
//! record yields the same record.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::FieldError;
use crate::models::{
    CurrentUser, GameRequest, Language, NewVersion, Platform, PostRequest, VersionFields,
    VersionSubmission,
};

/// Allowed game name length, in characters, after trimming.
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;

/// Separator between the letter prefix and the digits of a region code.
pub const CODE_SEPARATOR: char = '_';

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{7}|[A-Z]{4}_\d{5})$").expect("valid code pattern"));

static SEPARATOR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_]+").expect("valid separator pattern"));

/// Normalize a region code: trim, uppercase, and collapse runs of whitespace
/// or underscores into the canonical separator.
pub fn normalize_code(raw: &str) -> Result<String, FieldError> {
    let upper = raw.trim().to_uppercase();
    let code = SEPARATOR_RUN
        .replace_all(&upper, CODE_SEPARATOR.to_string().as_str())
        .into_owned();

    if code.is_empty() {
        return Err(FieldError::new("code", "Code is required"));
    }
    if !CODE_PATTERN.is_match(&code) {
        return Err(FieldError::new(
            "code",
            format!(
                "Code \"{}\" must be 7 digits or 4 letters followed by 5 digits (e.g. CUSA_12345)",
                raw.trim()
            ),
        ));
    }
    Ok(code)
}

/// Normalize a game name: trim and check the length bounds.
pub fn normalize_name(field: &str, raw: &str) -> Result<String, FieldError> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(FieldError::new(
            field,
            format!(
                "Name must be between {} and {} characters",
                NAME_MIN_LEN, NAME_MAX_LEN
            ),
        ));
    }
    Ok(name.to_string())
}

/// Key used for case-insensitive name lookup and uniqueness.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_platform(raw: &str) -> Result<Platform, FieldError> {
    Platform::parse(raw).ok_or_else(|| {
        let allowed: Vec<&str> = Platform::ALL.iter().map(|p| p.as_str()).collect();
        FieldError::new(
            "platform",
            format!(
                "Platform \"{}\" is not one of {}",
                raw.trim(),
                allowed.join(", ")
            ),
        )
    })
}

/// Parse, de-duplicate and sort a language list.
fn normalize_languages(field: &str, raw: &[String]) -> Result<Vec<Language>, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut set = BTreeSet::new();

    for (i, name) in raw.iter().enumerate() {
        match Language::parse(name.trim()) {
            Some(lang) => {
                set.insert(lang);
            }
            None => errors.push(FieldError::new(
                format!("{}[{}]", field, i),
                format!("\"{}\" is not a supported language", name),
            )),
        }
    }

    if raw.is_empty() {
        errors.push(FieldError::new(field, "At least one language is required"));
    }

    if errors.is_empty() {
        Ok(set.into_iter().collect())
    } else {
        Err(errors)
    }
}

/// Normalize a raw submission, collecting every violated field.
pub fn normalize_version(submission: &VersionSubmission) -> Result<VersionFields, Vec<FieldError>> {
    let mut errors = Vec::new();

    let platform = normalize_platform(&submission.platform).map_err(|e| errors.push(e));
    let code = normalize_code(&submission.code).map_err(|e| errors.push(e));
    let voice = normalize_languages("voiceLanguages", &submission.voice_languages)
        .map_err(|e| errors.extend(e));
    let subtitles = normalize_languages("subtitlesLanguages", &submission.subtitles_languages)
        .map_err(|e| errors.extend(e));

    match (platform, code, voice, subtitles) {
        (Ok(platform), Ok(code), Ok(voice_languages), Ok(subtitles_languages)) => {
            Ok(VersionFields {
                platform,
                code,
                voice_languages,
                subtitles_languages,
            })
        }
        _ => Err(errors),
    }
}

/// Normalize a batch of submissions, prefixing each error with its position.
pub fn normalize_versions(
    field: &str,
    submissions: &[VersionSubmission],
) -> Result<Vec<VersionFields>, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut out = Vec::with_capacity(submissions.len());

    for (i, submission) in submissions.iter().enumerate() {
        match normalize_version(submission) {
            Ok(fields) => out.push(fields),
            Err(errs) => {
                let parent = format!("{}[{}]", field, i);
                errors.extend(errs.into_iter().map(|e| e.within(&parent)));
            }
        }
    }

    if submissions.is_empty() {
        errors.push(FieldError::new(field, "At least one version is required"));
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

/// Drop later entries whose code already appeared earlier in the batch.
///
/// Returns the kept versions and one warning per dropped entry.
pub fn dedupe_by_code(versions: Vec<VersionFields>) -> (Vec<VersionFields>, Vec<String>) {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::with_capacity(versions.len());
    let mut warnings = Vec::new();

    for version in versions {
        if seen.insert(version.code.clone()) {
            kept.push(version);
        } else {
            warnings.push(format!(
                "Duplicated version {} was removed",
                version.code
            ));
        }
    }

    (kept, warnings)
}

/// Normalize a full game submission: its name and every version.
pub fn normalize_game(request: &GameRequest) -> Result<(String, Vec<VersionFields>), Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = normalize_name("name", &request.name).map_err(|e| errors.push(e));
    let versions = normalize_versions("versions", &request.versions).map_err(|e| errors.extend(e));

    match (name, versions) {
        (Ok(name), Ok(versions)) => Ok((name, versions)),
        _ => Err(errors),
    }
}

/// Normalize a post submission into its game name and version fields.
pub fn normalize_post(request: &PostRequest) -> Result<(String, VersionFields), Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = normalize_name("gameName", &request.game_name).map_err(|e| errors.push(e));
    let fields = normalize_version(&VersionSubmission {
        platform: request.platform.clone(),
        code: request.code.clone(),
        voice_languages: request.voice_languages.clone(),
        subtitles_languages: request.subtitles_languages.clone(),
    })
    .map_err(|e| errors.extend(e));

    match (name, fields) {
        (Ok(name), Ok(fields)) => Ok((name, fields)),
        _ => Err(errors),
    }
}

/// Stamp normalized fields with their submitter.
///
/// `isOfficial` is captured from the submitter's admin status at this moment
/// and never re-derived later.
pub fn stamp(fields: VersionFields, submitter: &CurrentUser) -> NewVersion {
    NewVersion {
        created_by: submitter.id.clone(),
        is_official: submitter.is_admin,
        fields,
    }
}
