use std::collections::BTreeMap;

use tutor_core::config::RelevanceSettings;
use tutor_core::traits::Classifier;

const DEFAULT_KEYWORDS: &[(&str, &[&str])] = &[
    ("English", &["reading", "writing", "story", "words", "sentence", "book", "letter"]),
    ("Mathematics", &["number", "count", "add", "subtract", "multiply", "divide", "shape"]),
    ("Science", &["plant", "animal", "weather", "space", "rock", "water", "light", "sound"]),
];

/// Trigger keywords per subject, stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTable {
    subjects: BTreeMap<String, Vec<String>>,
}

impl KeywordTable {
    /// Blank keywords are dropped; the empty string is a substring of every query.
    pub fn new(subjects: BTreeMap<String, Vec<String>>) -> Self {
        let subjects = subjects
            .into_iter()
            .map(|(subject, words)| {
                let words = words.into_iter().filter(|w| !w.trim().is_empty()).map(|w| w.to_lowercase()).collect();
                (subject, words)
            })
            .collect();
        Self { subjects }
    }

    /// Built-in table with `overrides` replacing whole subjects.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        let mut subjects = Self::default().subjects;
        subjects.extend(overrides.iter().map(|(s, w)| (s.clone(), w.clone())));
        Self::new(subjects)
    }

    pub fn keywords(&self, subject: &str) -> Option<&[String]> {
        self.subjects.get(subject).map(Vec::as_slice)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_KEYWORDS
                .iter()
                .map(|(subject, words)| (subject.to_string(), words.iter().map(|w| w.to_string()).collect()))
                .collect(),
        )
    }
}

/// Substring keyword match against the lower-cased query.
///
/// Subjects with no keyword list are never relevant.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    table: KeywordTable,
}

impl KeywordClassifier {
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    pub fn from_settings(settings: &RelevanceSettings) -> Self {
        Self::new(KeywordTable::with_overrides(&settings.keywords))
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }
}

impl Classifier for KeywordClassifier {
    fn is_relevant(&self, query: &str, subject: &str) -> bool {
        let query = query.to_lowercase();
        self.table.keywords(subject).is_some_and(|words| words.iter().any(|w| query.contains(w.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ignores_case() {
        let c = KeywordClassifier::default();
        assert!(c.is_relevant("PLANT life", "Science"));
        assert_eq!(c.is_relevant("PLANT life", "Science"), c.is_relevant("plant life", "Science"));
    }

    #[test]
    fn keywords_match_as_substrings() {
        let c = KeywordClassifier::default();
        assert!(c.is_relevant("plant growth", "Science"));
        assert!(c.is_relevant("Counting to ten", "Mathematics"));
        assert!(c.is_relevant("my favourite storybook", "English"));
    }

    #[test]
    fn off_topic_query_is_not_relevant() {
        let c = KeywordClassifier::default();
        assert!(!c.is_relevant("CPU", "Science"));
        assert!(!c.is_relevant("", "Science"));
    }

    #[test]
    fn unknown_subject_is_never_relevant() {
        let c = KeywordClassifier::default();
        for q in ["plant", "reading", "number", "anything at all"] {
            assert!(!c.is_relevant(q, "Technologies"));
        }
    }

    #[test]
    fn overrides_replace_subjects_and_lowercase_keywords() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Science".to_string(), vec!["Volcano".to_string()]);
        overrides.insert("Technologies".to_string(), vec!["CPU".to_string()]);
        let c = KeywordClassifier::from_settings(&RelevanceSettings { keywords: overrides });
        assert!(c.is_relevant("cpu design", "Technologies"));
        assert!(c.is_relevant("volcanoes", "Science"));
        assert!(!c.is_relevant("plant", "Science"));
        assert!(c.is_relevant("add two numbers", "Mathematics"));
    }

    #[test]
    fn blank_keywords_do_not_match_everything() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Science".to_string(), vec![String::new(), "  ".to_string(), "Volcano".to_string()]);
        let c = KeywordClassifier::from_settings(&RelevanceSettings { keywords: overrides });
        assert!(!c.is_relevant("CPU", "Science"));
        assert!(c.is_relevant("volcano facts", "Science"));
        assert_eq!(c.table().keywords("Science"), Some(&["volcano".to_string()][..]));
    }
}
