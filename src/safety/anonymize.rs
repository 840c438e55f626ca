//! IPv4 anonymization — swaps every IP literal in a batch of text for a
//! sequential placeholder (`ip1`, `ip2`, ...) before the text leaves
//! the process.
//!
//! Labels are assigned in order of first appearance, scanning strings
//! left to right in batch order. The mapping lives for one call only.

use super::ip_pattern::IP_PATTERN;
use crate::config::AnonymizerConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// How a matched literal is written back into the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMode {
    /// Replace every textual occurrence of the matched literal in the
    /// string, including occurrences inside longer digit runs.
    #[default]
    AllOccurrences,
    /// Replace only the spans the scanner matched.
    MatchedSpan,
}

impl FromStr for ReplaceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all_occurrences" => Ok(Self::AllOccurrences),
            "matched_span" => Ok(Self::MatchedSpan),
            other => Err(format!("Unknown replace mode: {}", other)),
        }
    }
}

/// Real literal to label, scoped to one call.
#[derive(Debug, Clone)]
pub struct LabelMapping {
    prefix: String,
    counter: usize,
    index: HashMap<String, usize>,
    entries: Vec<(String, String)>,
}

impl LabelMapping {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: 0,
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Label for `literal`, assigning the next counter value if unseen.
    pub fn label_for(&mut self, literal: &str) -> &str {
        if let Some(&idx) = self.index.get(literal) {
            return &self.entries[idx].1;
        }

        self.counter += 1;
        let label = format!("{}{}", self.prefix, self.counter);
        let idx = self.entries.len();
        self.index.insert(literal.to_string(), idx);
        self.entries.push((literal.to_string(), label));
        &self.entries[idx].1
    }

    pub fn get(&self, literal: &str) -> Option<&str> {
        self.index
            .get(literal)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(literal, label)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, r)| (l.as_str(), r.as_str()))
    }
}

/// Output of one call plus the mapping it used.
///
/// The mapping holds real addresses. Keep it local; never log it.
#[derive(Debug, Clone)]
pub struct AnonymizeReport {
    pub lines: Vec<String>,
    pub mapping: LabelMapping,
}

#[derive(Debug, thiserror::Error)]
pub enum AnonymizeError {
    #[error("Batch element {index} is missing")]
    InvalidInput { index: usize },

    #[error("Invalid IP pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Batch of {len} strings exceeds limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("Batch text of {len} bytes exceeds limit of {max}")]
    TextTooLarge { len: usize, max: usize },
}

/// Replaces IPv4 literals with per-call sequential labels.
///
/// Holds only the compiled pattern and config, so one instance can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct IpAnonymizer {
    pattern: Regex,
    config: AnonymizerConfig,
}

impl Default for IpAnonymizer {
    fn default() -> Self {
        Self::new()
    }
}

impl IpAnonymizer {
    /// Canonical IP pattern, default config.
    pub fn new() -> Self {
        Self::from_config(AnonymizerConfig::default())
    }

    pub fn from_config(config: AnonymizerConfig) -> Self {
        Self {
            pattern: IP_PATTERN.clone(),
            config,
        }
    }

    /// Use an externally supplied pattern. Compile errors are returned as-is.
    pub fn with_pattern(pattern: &str) -> Result<Self, AnonymizeError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            config: AnonymizerConfig::default(),
        })
    }

    pub fn with_config(mut self, config: AnonymizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnonymizerConfig {
        &self.config
    }

    /// Anonymize a batch. Output has the same length and order.
    ///
    /// Only fails when a configured size cap is exceeded.
    pub fn anonymize<S: AsRef<str>>(&self, batch: &[S]) -> Result<Vec<String>, AnonymizeError> {
        Ok(self.anonymize_with_report(batch)?.lines)
    }

    /// Like [`anonymize`](Self::anonymize) for batches whose elements may
    /// be absent. The first `None` fails with `InvalidInput`.
    pub fn anonymize_nullable<S: AsRef<str>>(
        &self,
        batch: &[Option<S>],
    ) -> Result<Vec<String>, AnonymizeError> {
        let present = batch
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_ref()
                    .map(|s| s.as_ref())
                    .ok_or(AnonymizeError::InvalidInput { index })
            })
            .collect::<Result<Vec<&str>, _>>()
            .inspect_err(|e| log::warn!("[SAFETY] Rejected IP anonymization batch: {}", e))?;

        self.anonymize(&present)
    }

    pub fn anonymize_with_report<S: AsRef<str>>(
        &self,
        batch: &[S],
    ) -> Result<AnonymizeReport, AnonymizeError> {
        self.check_limits(batch)
            .inspect_err(|e| log::warn!("[SAFETY] Rejected IP anonymization batch: {}", e))?;
        Ok(self.scrub_batch(batch))
    }

    fn check_limits<S: AsRef<str>>(&self, batch: &[S]) -> Result<(), AnonymizeError> {
        if let Some(max) = self.config.max_batch_len {
            if batch.len() > max {
                return Err(AnonymizeError::BatchTooLarge {
                    len: batch.len(),
                    max,
                });
            }
        }

        if let Some(max) = self.config.max_text_len {
            let len: usize = batch.iter().map(|s| s.as_ref().len()).sum();
            if len > max {
                return Err(AnonymizeError::TextTooLarge { len, max });
            }
        }

        Ok(())
    }

    fn scrub_batch<S: AsRef<str>>(&self, batch: &[S]) -> AnonymizeReport {
        let mut mapping = LabelMapping::new(&self.config.label_prefix);
        let mut lines = Vec::with_capacity(batch.len());

        for text in batch {
            lines.push(self.scrub_line(text.as_ref(), &mut mapping));
        }

        log::debug!(
            "[SAFETY] Anonymized {} lines, {} distinct IPs",
            lines.len(),
            mapping.len()
        );

        AnonymizeReport { lines, mapping }
    }

    fn scrub_line(&self, text: &str, mapping: &mut LabelMapping) -> String {
        match self.config.replace_mode {
            ReplaceMode::AllOccurrences => {
                // Matches come from the original text; each literal is then
                // replaced everywhere in the text built so far.
                let mut result = text.to_string();
                for m in self.pattern.find_iter(text) {
                    let label = mapping.label_for(m.as_str());
                    if result.contains(m.as_str()) {
                        result = result.replace(m.as_str(), label);
                    }
                }
                result
            }
            ReplaceMode::MatchedSpan => {
                let mut result = String::with_capacity(text.len());
                let mut last = 0;
                for m in self.pattern.find_iter(text) {
                    result.push_str(&text[last..m.start()]);
                    result.push_str(mapping.label_for(m.as_str()));
                    last = m.end();
                }
                result.push_str(&text[last..]);
                result
            }
        }
    }
}

/// Anonymize with the canonical pattern and default config.
pub fn anonymize_ips<S: AsRef<str>>(batch: &[S]) -> Vec<String> {
    IpAnonymizer::new().scrub_batch(batch).lines
}
