use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KiraError;

/// Value written to the `organism_name` column when no title was resolved.
pub const UNKNOWN_ORGANISM: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Accession(String);

impl Accession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Accession {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty()
            && !normalized
                .chars()
                .any(|ch| ch.is_whitespace() || ch == ',');
        if !is_valid {
            return Err(KiraError::InvalidAccession(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

impl TryFrom<String> for Accession {
    type Error = KiraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Accession> for String {
    fn from(value: Accession) -> Self {
        value.0
    }
}

/// One BLAST outfmt 6 row, columns in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    pub query_id: String,
    pub subject_id: Accession,
    pub percent_identity: f64,
    pub query_coverage: f64,
    pub alignment_length: u64,
    pub bit_score: f64,
    pub evalue: f64,
    pub taxonomy_ids: String,
}

/// Unique subject accessions of a ranked subset, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessionSet(Vec<Accession>);

impl AccessionSet {
    pub fn from_records(records: &[AlignmentRecord]) -> Self {
        let mut seen = HashSet::new();
        let unique = records
            .iter()
            .filter(|record| seen.insert(record.subject_id.as_str()))
            .map(|record| record.subject_id.clone())
            .collect();
        Self(unique)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Accession] {
        &self.0
    }

    /// Consecutive batches of at most `size` accessions. `size` must be non-zero.
    pub fn batches(&self, size: usize) -> std::slice::Chunks<'_, Accession> {
        self.0.chunks(size)
    }
}

impl FromIterator<Accession> for AccessionSet {
    fn from_iter<T: IntoIterator<Item = Accession>>(iter: T) -> Self {
        let mut seen = HashSet::new();
        Self(
            iter.into_iter()
                .filter(|acc| seen.insert(acc.clone()))
                .collect(),
        )
    }
}

/// Accession.version -> title, as returned by esummary. Grows only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TitleMapping(BTreeMap<String, String>);

impl TitleMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, accession: impl Into<String>, title: impl Into<String>) {
        self.0.insert(accession.into(), title.into());
    }

    pub fn get(&self, accession: &str) -> Option<&str> {
        self.0.get(accession).map(String::as_str)
    }

    pub fn contains(&self, accession: &str) -> bool {
        self.0.contains_key(accession)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<(String, String)> for TitleMapping {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: AlignmentRecord,
    pub organism_name: Option<String>,
}

impl EnrichedRecord {
    pub fn organism_name_or_placeholder(&self) -> &str {
        self.organism_name.as_deref().unwrap_or(UNKNOWN_ORGANISM)
    }
}
