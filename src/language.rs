//! Target languages offered by the translator.
//!
//! The list below is what the UI selector shows. It is not a validation
//! boundary: a target language outside the list is passed to the provider
//! verbatim, and the provider decides what to make of it.

use serde::Serialize;

/// A language offered in the target-language selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    /// English display name, also the value sent to the provider
    pub name: &'static str,
    /// Name of the language in its own script
    pub native_name: &'static str,
}

pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language {
        name: "English",
        native_name: "English",
    },
    Language {
        name: "Hindi",
        native_name: "हिन्दी",
    },
    Language {
        name: "Spanish",
        native_name: "Español",
    },
    Language {
        name: "French",
        native_name: "Français",
    },
    Language {
        name: "German",
        native_name: "Deutsch",
    },
];

/// Target language used when the caller does not pick one.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Look up a supported language by display name (case-insensitive).
pub fn find(name: &str) -> Option<&'static Language> {
    let name = name.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| lang.name.eq_ignore_ascii_case(name))
}

pub fn is_supported(name: &str) -> bool {
    find(name).is_some()
}

/// Resolve the target language the prompt will carry.
///
/// Missing or blank input becomes [`DEFAULT_LANGUAGE`]. A known language is
/// normalized to its canonical display name. Anything else is returned
/// unchanged.
pub fn resolve(requested: Option<&str>) -> String {
    match requested.map(str::trim) {
        None | Some("") => DEFAULT_LANGUAGE.to_string(),
        Some(name) => match find(name) {
            Some(lang) => lang.name.to_string(),
            None => requested.unwrap_or_default().to_string(),
        },
    }
}
