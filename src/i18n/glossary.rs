//! Glossary post-processing for translated text.
//!
//! Machine translation renders domain terms inconsistently ("Event" becomes
//! three different Kurdish words depending on context). The glossary pins
//! those terms: after translation every whole-word occurrence of a source term
//! is replaced by the fixed target term for the output locale.
//!
//! Matchers are compiled once per locale when the glossary is built. The table
//! is validated at the same time so that applying it is idempotent:
//!
//! - source and target terms start and end with a word character,
//! - a source term is defined at most once per locale,
//! - no word of a target term is also a word of a source term in that locale.

use crate::error::GlossaryError;
use crate::i18n::Locale;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

/// One fixed term translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub source_term: String,
    pub locale: Locale,
    pub target_term: String,
}

impl GlossaryEntry {
    pub fn new(source_term: &str, locale: Locale, target_term: &str) -> Self {
        Self {
            source_term: source_term.to_string(),
            locale,
            target_term: target_term.to_string(),
        }
    }
}

#[derive(Debug)]
struct LocaleMatcher {
    pattern: Regex,
    replacements: HashMap<String, String>,
}

/// A validated glossary with one precompiled matcher per locale.
#[derive(Debug)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
    matchers: HashMap<Locale, LocaleMatcher>,
}

static WORD_REGEX: OnceLock<Regex> = OnceLock::new();

fn word_regex() -> &'static Regex {
    WORD_REGEX.get_or_init(|| Regex::new(r"\w+").unwrap())
}

/// Word tokens of a term, using the same definition of "word" as `\b`.
fn words(term: &str) -> impl Iterator<Item = &str> {
    word_regex().find_iter(term).map(|m| m.as_str())
}

/// Whether the first and last characters of `term` are word characters.
fn has_word_edges(term: &str) -> bool {
    let is_word = |c: char| {
        let mut buf = [0u8; 4];
        word_regex().is_match(c.encode_utf8(&mut buf))
    };
    match (term.chars().next(), term.chars().last()) {
        (Some(first), Some(last)) => is_word(first) && is_word(last),
        _ => false,
    }
}

impl Glossary {
    /// Validate `entries` and compile the per-locale matchers.
    pub fn new(entries: Vec<GlossaryEntry>) -> Result<Self, GlossaryError> {
        let mut by_locale: HashMap<Locale, Vec<&GlossaryEntry>> = HashMap::new();

        for entry in &entries {
            if entry.source_term.trim().is_empty() || entry.target_term.trim().is_empty() {
                return Err(GlossaryError::EmptyTerm {
                    locale: entry.locale,
                });
            }
            for term in [&entry.source_term, &entry.target_term] {
                if !has_word_edges(term) {
                    return Err(GlossaryError::NonWordEdge { term: term.clone() });
                }
            }
            by_locale.entry(entry.locale).or_default().push(entry);
        }

        let mut matchers = HashMap::new();
        for (locale, locale_entries) in by_locale {
            let mut replacements = HashMap::new();
            for entry in &locale_entries {
                if replacements
                    .insert(entry.source_term.clone(), entry.target_term.clone())
                    .is_some()
                {
                    return Err(GlossaryError::DuplicateSource {
                        term: entry.source_term.clone(),
                        locale,
                    });
                }
            }

            check_idempotent(locale, &locale_entries)?;

            // Longest first so "Event Hall" wins over "Event" at the same position
            let mut terms: Vec<&str> = replacements.keys().map(String::as_str).collect();
            terms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
            let alternation = terms
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = Regex::new(&format!(r"\b(?:{})\b", alternation))?;

            debug!(
                "Compiled glossary matcher for {} with {} terms",
                locale,
                replacements.len()
            );
            matchers.insert(
                locale,
                LocaleMatcher {
                    pattern,
                    replacements,
                },
            );
        }

        Ok(Self { entries, matchers })
    }

    /// A glossary that leaves all text untouched.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            matchers: HashMap::new(),
        }
    }

    /// The glossary shipped with the application.
    pub fn builtin() -> Result<Self, GlossaryError> {
        Self::new(builtin_entries())
    }

    /// Parse a JSON array of `{source_term, locale, target_term}` objects.
    pub fn from_json_str(json: &str) -> Result<Self, GlossaryError> {
        let entries: Vec<GlossaryEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GlossaryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let glossary = Self::from_json_str(&json)?;
        info!(
            "Loaded {} glossary entries from {}",
            glossary.len(),
            path.display()
        );
        Ok(glossary)
    }

    /// Replace every whole-word source term for `locale` with its target term.
    pub fn apply(&self, text: &str, locale: Locale) -> String {
        let Some(matcher) = self.matchers.get(&locale) else {
            return text.to_string();
        };

        matcher
            .pattern
            .replace_all(text, |caps: &Captures| {
                let found = &caps[0];
                matcher
                    .replacements
                    .get(found)
                    .cloned()
                    .unwrap_or_else(|| found.to_string())
            })
            .into_owned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Glossary {
    fn default() -> Self {
        Self::empty()
    }
}

fn check_idempotent(locale: Locale, entries: &[&GlossaryEntry]) -> Result<(), GlossaryError> {
    let source_words: HashMap<&str, &str> = entries
        .iter()
        .flat_map(|e| words(&e.source_term).map(move |w| (w, e.source_term.as_str())))
        .collect();

    for entry in entries {
        let target_words: HashSet<&str> = words(&entry.target_term).collect();
        for word in target_words {
            if let Some(source_term) = source_words.get(word) {
                return Err(GlossaryError::NonIdempotent {
                    target: entry.target_term.clone(),
                    source_term: source_term.to_string(),
                    locale,
                });
            }
        }
    }
    Ok(())
}

fn builtin_entries() -> Vec<GlossaryEntry> {
    vec![
        GlossaryEntry::new("Event", Locale::AR, "فعالية"),
        GlossaryEntry::new("Event", Locale::KU, "بۆنە"),
        GlossaryEntry::new("Venue", Locale::AR, "مكان"),
        GlossaryEntry::new("Venue", Locale::KU, "شوێن"),
        GlossaryEntry::new("Ticket", Locale::AR, "تذكرة"),
        GlossaryEntry::new("Ticket", Locale::KU, "بلیت"),
        GlossaryEntry::new("Baghdad", Locale::AR, "بغداد"),
        GlossaryEntry::new("Baghdad", Locale::KU, "بەغدا"),
        GlossaryEntry::new("Erbil", Locale::AR, "أربيل"),
        GlossaryEntry::new("Erbil", Locale::KU, "هەولێر"),
    ]
}
