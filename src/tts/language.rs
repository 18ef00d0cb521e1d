use serde::Serialize;

/// Language family an accent code belongs to.
///
/// Every English accent (`EN`, `EN-US`, `EN-BR`, ...) is served by a single
/// multi-speaker engine, so they all collapse to [`LanguageFamily::English`].
/// Any other code is its own family and is passed to the engine loader as-is.
/// Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageFamily {
    English,
    Other(String),
}

impl LanguageFamily {
    pub fn classify(code: &str) -> Self {
        if code.starts_with("EN") {
            Self::English
        } else {
            Self::Other(code.to_string())
        }
    }

    /// Key used for engine caching and model lookup.
    pub fn base_language(&self) -> &str {
        match self {
            Self::English => "EN",
            Self::Other(code) => code.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccentVoice {
    pub code: &'static str,
    pub voice: &'static str,
}

/// Accent code -> voice name inside the English engine's speaker registry.
pub const ACCENT_VOICES: &[AccentVoice] = &[
    AccentVoice {
        code: "EN-US",
        voice: "EN-US",
    },
    AccentVoice {
        code: "EN-BR",
        voice: "EN-BR",
    },
    AccentVoice {
        code: "EN-IN",
        voice: "EN_INDIA",
    },
    AccentVoice {
        code: "EN-AU",
        voice: "EN-AU",
    },
    AccentVoice {
        code: "EN",
        voice: "EN-US",
    },
];

pub fn accent_voice(code: &str) -> Option<&'static str> {
    ACCENT_VOICES
        .iter()
        .find(|entry| entry.code == code)
        .map(|entry| entry.voice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_accents_collapse() {
        for code in ["EN", "EN-US", "EN-BR", "EN-IN", "EN-AU", "EN-ZZ"] {
            assert_eq!(LanguageFamily::classify(code), LanguageFamily::English);
            assert_eq!(LanguageFamily::classify(code).base_language(), "EN");
        }
    }

    #[test]
    fn test_other_codes_pass_through() {
        let family = LanguageFamily::classify("FR");
        assert_eq!(family, LanguageFamily::Other("FR".into()));
        assert_eq!(family.base_language(), "FR");

        assert_eq!(LanguageFamily::classify("en-us").base_language(), "en-us");
    }

    #[test]
    fn test_indian_english_uses_underscore_voice() {
        assert_eq!(accent_voice("EN-IN"), Some("EN_INDIA"));
    }

    #[test]
    fn test_bare_en_defaults_to_us() {
        assert_eq!(accent_voice("EN"), Some("EN-US"));
        assert_eq!(accent_voice("EN-BR"), Some("EN-BR"));
        assert_eq!(accent_voice("EN-AU"), Some("EN-AU"));
    }

    #[test]
    fn test_unknown_accent_has_no_voice() {
        assert_eq!(accent_voice("EN-ZZ"), None);
        assert_eq!(accent_voice("en-us"), None);
    }
}
