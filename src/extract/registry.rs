use crate::config::CustomExtractor;
use crate::extract::catalog::BUILTIN_RULES;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// Errors raised while building or running extractors
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid pattern for field type '{field}': {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

/// Field type name -> deduplicated values
pub type FieldResultSet = HashMap<String, HashSet<String>>;

/// A single compiled extraction rule
///
/// Extractors hold no match state between calls; one extractor never sees
/// another's matches.
#[derive(Debug, Clone)]
pub struct Extractor {
    name: String,
    regex: Regex,
}

impl Extractor {
    /// Compiles an extractor for the given field type
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, ExtractionError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| ExtractionError::Pattern {
            field: name.clone(),
            source,
        })?;
        Ok(Self { name, regex })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collects every non-overlapping match in `content`, flattened and trimmed
    pub fn extract(&self, content: &str) -> HashSet<String> {
        self.regex
            .captures_iter(content)
            .map(|caps| flatten_match(&caps))
            .collect()
    }
}

/// Turns one regex match into a single value
///
/// Without capture groups the whole match is used. With groups, the groups are
/// concatenated in order (unmatched groups contribute nothing). The result is
/// trimmed of surrounding whitespace.
fn flatten_match(caps: &Captures<'_>) -> String {
    let value = if caps.len() == 1 {
        caps.get(0).map_or("", |m| m.as_str()).to_string()
    } else {
        caps.iter()
            .skip(1)
            .map(|group| group.map_or("", |m| m.as_str()))
            .collect::<String>()
    };
    value.trim().to_string()
}

/// The catalog of extractors available to jobs
#[derive(Debug, Clone)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<String, Extractor>,
}

impl ExtractorRegistry {
    /// Builds a registry holding only the built-in field types
    pub fn builtin() -> Result<Self, ExtractionError> {
        let mut registry = Self {
            extractors: BTreeMap::new(),
        };
        for rule in BUILTIN_RULES {
            registry.register(Extractor::new(rule.name, rule.pattern)?);
        }
        Ok(registry)
    }

    /// Builds the built-in registry plus user-defined field types
    pub fn with_custom(custom: &[CustomExtractor]) -> Result<Self, ExtractionError> {
        let mut registry = Self::builtin()?;
        for entry in custom {
            registry.register(Extractor::new(entry.name.as_str(), &entry.pattern)?);
        }
        Ok(registry)
    }

    /// Adds an extractor, replacing any existing one with the same name
    pub fn register(&mut self, extractor: Extractor) {
        self.extractors.insert(extractor.name.clone(), extractor);
    }

    pub fn contains(&self, field_type: &str) -> bool {
        self.extractors.contains_key(field_type)
    }

    /// Known field type names, sorted
    pub fn field_types(&self) -> impl Iterator<Item = &str> {
        self.extractors.keys().map(String::as_str)
    }

    /// Applies every requested extractor to `content`
    ///
    /// Requested names outside the catalog are skipped silently and produce no
    /// entry in the result. A requested type with no matches maps to an empty set.
    pub fn extract(&self, content: &str, requested: &BTreeSet<String>) -> FieldResultSet {
        let mut results = FieldResultSet::new();

        for field_type in requested {
            match self.extractors.get(field_type) {
                Some(extractor) => {
                    let values = extractor.extract(content);
                    tracing::debug!("Extracted {} value(s) for {}", values.len(), field_type);
                    results.insert(field_type.clone(), values);
                }
                None => tracing::debug!("Ignoring unknown field type: {}", field_type),
            }
        }

        results
    }
}
