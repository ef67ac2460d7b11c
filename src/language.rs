use std::collections::HashMap;

/// Built-in mapping from local language names to remote judge compiler ids
const BUILTIN_LANGUAGES: &[(&str, u32)] = &[
    ("python", 116),
    ("python3", 116),
    ("cpp", 54),
    ("c++", 54),
    ("c", 11),
    ("java", 62),
    ("go", 114),
    ("rust", 93),
    ("javascript", 56),
    ("kotlin", 47),
];

/// Looks up a language in the built-in table only
pub fn remote_language_id(language: &str) -> Option<u32> {
    BUILTIN_LANGUAGES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, id)| *id)
}

/// Language lookup table: built-ins plus overrides from configuration
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    overrides: HashMap<String, u32>,
}

impl LanguageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<String, u32>) -> Self {
        Self { overrides }
    }

    /// Lowercases the identifier before looking it up, overrides first.
    pub fn resolve(&self, language: &str) -> Option<u32> {
        let key = language.trim().to_ascii_lowercase();
        self.overrides
            .get(&key)
            .copied()
            .or_else(|| remote_language_id(&key))
    }
}
