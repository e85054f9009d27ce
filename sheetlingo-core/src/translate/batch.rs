//! Batch translation over the delimiter protocol
//!
//! Unique strings are grouped into batches, each batch is joined with a
//! reserved delimiter and sent as one provider call, and the response is
//! split back on the same delimiter. A batch whose response cannot be split
//! into the right number of parts (or whose call fails) is degraded to one
//! call per string. Failures never abort a run: a string that cannot be
//! translated maps to itself.

use super::{TranslationMap, Translator};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default number of strings per count-bounded batch
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Default character budget per character-bounded batch
pub const DEFAULT_MAX_CHARS: usize = 3500;

/// How unique strings are grouped into batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicy {
    /// Fixed number of strings per batch
    Count,
    /// Strings accumulated up to a combined character budget
    Chars,
}

impl BatchPolicy {
    /// Character budgets only make sense for providers that take long payloads
    pub fn for_translator(translator: &dyn Translator) -> Self {
        if translator.accepts_long_input() {
            BatchPolicy::Chars
        } else {
            BatchPolicy::Count
        }
    }

    pub fn delimiter(&self) -> Delimiter {
        match self {
            BatchPolicy::Count => Delimiter::pipes(),
            BatchPolicy::Chars => Delimiter::sep_marker(),
        }
    }
}

/// Reserved separator used to merge a batch into a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub primary: String,
    /// Forms providers are known to rewrite the primary into
    pub variants: Vec<String>,
}

impl Delimiter {
    pub fn new(primary: impl Into<String>, variants: &[&str]) -> Self {
        Self {
            primary: primary.into(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn pipes() -> Self {
        Self::new(" ||| ", &["|||"])
    }

    pub fn sep_marker() -> Self {
        Self::new(" [SEP] ", &["[SEP]", " [sep] ", "[sep]"])
    }

    pub fn join(&self, items: &[String]) -> String {
        items.join(&self.primary)
    }

    /// Split a merged response into exactly `expected` parts.
    ///
    /// Parts split on the primary delimiter are returned verbatim; parts
    /// split on a variant are trimmed. `None` signals a protocol failure.
    pub fn split(&self, text: &str, expected: usize) -> Option<Vec<String>> {
        let parts: Vec<String> = text.split(self.primary.as_str()).map(String::from).collect();
        if parts.len() == expected {
            return Some(parts);
        }

        self.variants.iter().find_map(|variant| {
            let parts: Vec<String> = text
                .split(variant.as_str())
                .map(|p| p.trim().to_string())
                .collect();
            (parts.len() == expected).then_some(parts)
        })
    }

    /// Per-item overhead charged against a character budget
    pub fn overhead(&self) -> usize {
        self.primary.chars().count()
    }
}

/// Tuning knobs for a batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Forced policy; `None` picks one from the translator
    pub policy: Option<BatchPolicy>,
    pub batch_size: usize,
    pub max_chars: usize,
    /// Pause between consecutive batches (sequential runs only)
    pub delay: Duration,
    /// Pause between per-item calls of a degraded batch
    pub item_delay: Duration,
    /// Batches dispatched concurrently; 1 means sequential
    pub workers: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            policy: None,
            batch_size: DEFAULT_BATCH_SIZE,
            max_chars: DEFAULT_MAX_CHARS,
            delay: Duration::from_secs(1),
            item_delay: Duration::ZERO,
            workers: 1,
        }
    }
}

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Strings requested, duplicates and blanks included
    pub requested: usize,
    /// Distinct non-blank strings actually translated
    pub unique: usize,
    pub batches: usize,
    /// Batches that fell back to per-item calls
    pub degraded_batches: usize,
    /// Strings left untranslated after every attempt
    pub failed_items: usize,
    pub provider_calls: usize,
}

impl BatchReport {
    fn absorb(&mut self, outcome: &BatchOutcome) {
        self.batches += 1;
        self.provider_calls += outcome.calls;
        self.failed_items += outcome.failed;
        if outcome.degraded {
            self.degraded_batches += 1;
        }
    }

    pub fn merge(&mut self, other: &BatchReport) {
        self.requested += other.requested;
        self.unique += other.unique;
        self.batches += other.batches;
        self.degraded_batches += other.degraded_batches;
        self.failed_items += other.failed_items;
        self.provider_calls += other.provider_calls;
    }
}

/// Result of one merged call
#[derive(Debug)]
enum BatchAttempt {
    /// One translation per batch member, in order
    Complete(Vec<String>),
    /// Merged call unusable; members must be translated one by one
    Degraded(String),
}

/// Translations produced for one batch
#[derive(Debug, Default)]
struct BatchOutcome {
    pairs: Vec<(String, String)>,
    degraded: bool,
    failed: usize,
    calls: usize,
}

/// Turns a list of strings into translations through any [`Translator`]
pub struct BatchTranslator<'a> {
    translator: &'a dyn Translator,
    options: BatchOptions,
    policy: BatchPolicy,
    delimiter: Delimiter,
}

impl<'a> BatchTranslator<'a> {
    pub fn new(translator: &'a dyn Translator, options: BatchOptions) -> Self {
        let policy = options
            .policy
            .unwrap_or_else(|| BatchPolicy::for_translator(translator));
        Self {
            translator,
            options,
            policy,
            delimiter: policy.delimiter(),
        }
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Translate `texts` preserving length and order.
    ///
    /// Blank entries come back as `""`; entries that could not be
    /// translated come back unchanged.
    pub fn translate_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        let (map, _) = self.translate_unique(texts);
        texts
            .iter()
            .map(|text| {
                let text = text.as_ref();
                if text.trim().is_empty() {
                    String::new()
                } else {
                    map.get(text).cloned().unwrap_or_else(|| text.to_string())
                }
            })
            .collect()
    }

    /// Translate the distinct non-blank members of `texts` into a map
    pub fn translate_unique<S: AsRef<str>>(&self, texts: &[S]) -> (TranslationMap, BatchReport) {
        let mut report = BatchReport {
            requested: texts.len(),
            ..Default::default()
        };
        let mut map = TranslationMap::new();

        let unique = unique_texts(texts);
        report.unique = unique.len();
        if unique.is_empty() {
            return (map, report);
        }

        let batches = match self.policy {
            BatchPolicy::Count => partition_by_count(&unique, self.options.batch_size),
            BatchPolicy::Chars => {
                partition_by_chars(&unique, self.options.max_chars, self.delimiter.overhead())
            }
        };

        info!(
            provider = self.translator.name(),
            requested = texts.len(),
            unique = unique.len(),
            batches = batches.len(),
            policy = ?self.policy,
            "Starting batch translation"
        );

        let outcomes = if self.options.workers > 1 && batches.len() > 1 {
            self.run_parallel(&batches)
        } else {
            self.run_sequential(&batches)
        };

        for outcome in outcomes {
            report.absorb(&outcome);
            map.extend(outcome.pairs);
        }

        // Every unique key must be present, even if a provider dropped it
        for text in unique {
            map.entry(text.clone()).or_insert(text);
        }

        (map, report)
    }

    fn run_sequential(&self, batches: &[Vec<String>]) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(batches.len());
        for (index, batch) in batches.iter().enumerate() {
            debug!(batch = index, size = batch.len(), "Translating batch");
            outcomes.push(self.run_batch(batch));

            if index + 1 < batches.len() && !self.options.delay.is_zero() {
                thread::sleep(self.options.delay);
            }
        }
        outcomes
    }

    fn run_parallel(&self, batches: &[Vec<String>]) -> Vec<BatchOutcome> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "Could not start worker pool, translating sequentially");
                return self.run_sequential(batches);
            }
        };

        pool.install(|| batches.par_iter().map(|batch| self.run_batch(batch)).collect())
    }

    fn run_batch(&self, batch: &[String]) -> BatchOutcome {
        match self.attempt(batch) {
            BatchAttempt::Complete(parts) => BatchOutcome {
                pairs: batch.iter().cloned().zip(parts).collect(),
                degraded: false,
                failed: 0,
                calls: 1,
            },
            BatchAttempt::Degraded(reason) => {
                warn!(
                    provider = self.translator.name(),
                    size = batch.len(),
                    reason = %reason,
                    "Batch translation degraded, translating items one by one"
                );
                let mut outcome = self.translate_each(batch);
                outcome.degraded = true;
                outcome.calls += 1;
                outcome
            }
        }
    }

    fn attempt(&self, batch: &[String]) -> BatchAttempt {
        let joined = self.delimiter.join(batch);
        match self.translator.translate(&joined) {
            Ok(translated) => match self.delimiter.split(&translated, batch.len()) {
                Some(parts) => BatchAttempt::Complete(parts),
                None => BatchAttempt::Degraded(format!(
                    "response could not be split into {} parts",
                    batch.len()
                )),
            },
            Err(e) => BatchAttempt::Degraded(e.to_string()),
        }
    }

    fn translate_each(&self, batch: &[String]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (index, text) in batch.iter().enumerate() {
            if index > 0 && !self.options.item_delay.is_zero() {
                thread::sleep(self.options.item_delay);
            }

            outcome.calls += 1;
            let translated = match self.translator.translate(text) {
                Ok(translated) => translated,
                Err(e) => {
                    warn!(
                        provider = self.translator.name(),
                        text = %preview(text),
                        error = %e,
                        "Translation failed, keeping original text"
                    );
                    outcome.failed += 1;
                    text.clone()
                }
            };
            outcome.pairs.push((text.clone(), translated));
        }
        outcome
    }
}

/// Distinct non-blank strings in first-occurrence order
pub fn unique_texts<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    texts
        .iter()
        .map(AsRef::as_ref)
        .filter(|text| !text.trim().is_empty())
        .filter(|text| seen.insert(*text))
        .map(String::from)
        .collect()
}

/// Fixed-size chunks of `size` strings
pub fn partition_by_count(items: &[String], size: usize) -> Vec<Vec<String>> {
    items.chunks(size.max(1)).map(<[String]>::to_vec).collect()
}

/// Accumulate strings until the joined length would exceed `max_chars`.
///
/// `overhead` is the separator length charged per joined item. A string
/// longer than the whole budget forms its own batch.
pub fn partition_by_chars(items: &[String], max_chars: usize, overhead: usize) -> Vec<Vec<String>> {
    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_chars = 0;

    for text in items {
        let len = text.chars().count();
        if len > max_chars {
            batches.push(vec![text.clone()]);
            continue;
        }

        if !current.is_empty() && current_chars + len + current.len() * overhead > max_chars {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        current.push(text.clone());
        current_chars += len;
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}

fn preview(text: &str) -> String {
    let mut short: String = text.chars().take(30).collect();
    if text.chars().count() > 30 {
        short.push_str("...");
    }
    short
}
