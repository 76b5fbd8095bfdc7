//! Order detail records
//!
//! Checkout field values come from a flat two-column fixture file, one
//! `key,value` pair per line. The record is a plain lookup table; which keys
//! the checkout form actually consumes is decided by the fill step.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::outcome::{StepError, StepResult};

/// Field values for the checkout form, keyed by record key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDetails {
    fields: BTreeMap<String, String>,
}

impl OrderDetails {
    /// Load a record from disk. A missing or unreadable file is a
    /// recoverable data failure, reported as `ConfigMissing` for the caller
    /// to act on.
    pub fn load(path: &Path) -> StepResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StepError::config_missing(format!("order details file {}: {}", path.display(), e))
        })?;
        let record = Self::parse(&content);
        info!(
            path = %path.display(),
            fields = record.fields.len(),
            "loaded order details"
        );
        Ok(record)
    }

    /// Parse `key,value` lines, splitting on the first comma so values may
    /// themselves contain commas. Blank and malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut fields = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once(',') {
                Some((key, value)) => {
                    fields.insert(key.trim().to_string(), value.trim().to_string());
                }
                None => warn!(line, "order details line has no value, skipping"),
            }
        }
        Self { fields }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
