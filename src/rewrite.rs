/**
This module rewrites articles with a text generator while keeping their entity mentions, and
checks afterwards which mentions survived.

The generator itself is abstract: anything implementing [`TextGenerator`] can be plugged in, a
closure included.

```rust
use vner_eval::rewrite::{ArticleRewriter, RewriteOutcome};
use vner_eval::dataset::Record;
use vner_eval::EntityMap;
use either::Either;

let rewriter = ArticleRewriter::new(|_prompt: &str| -> vner_eval::Result<String> {
    Ok(String::from("  Bài viết mới.  "))
});
let record = Record {
    id: Either::Left(1),
    topic: String::from("Thể thao"),
    title: String::new(),
    text: String::from("Bài viết cũ."),
    ground_truth: EntityMap::new(),
    rewrite: None,
};
assert_eq!(rewriter.rewrite(&record), RewriteOutcome::Success(String::from("Bài viết mới.")));
```
*/
use crate::dataset::{save_json, Record};
use crate::entity::{EntityMap, EntityType};
use crate::error::Result;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 50;

/// A model that completes a prompt.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<F> TextGenerator for F
where
    F: Fn(&str) -> Result<String>,
{
    fn generate(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

/// Outcome of a single rewrite. The caller decides what to do with a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Success(String),
    Failure(String),
}

impl RewriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RewriteOutcome::Success(_))
    }

    /// The rewritten text, or `original` on failure.
    pub fn or_original(self, original: &str) -> String {
        match self {
            RewriteOutcome::Success(text) => text,
            RewriteOutcome::Failure(_) => String::from(original),
        }
    }
}

fn joined_or_none(ground_truth: &EntityMap, entity_type: EntityType) -> String {
    let mentions = ground_truth.normalized(entity_type);
    if mentions.is_empty() {
        String::from("None")
    } else {
        mentions.join(", ")
    }
}

/// The rewriting prompt of a record: its mentions, grouped by type, and its text.
pub fn rewrite_prompt(record: &Record) -> String {
    let gt = &record.ground_truth;
    format!(
        "You are a professional Vietnamese text rewriter for Named Entity Recognition (NER) tasks.

Task: Rewrite the following Vietnamese article while preserving ALL named entities EXACTLY as they appear.

Requirements:
1. Keep ALL entity mentions (people, organizations, addresses) EXACTLY the same
2. Rewrite the surrounding text naturally in Vietnamese, keeping the meaning and context
3. Keep the article length similar (within 20%)
4. Do NOT translate entities or change entity spellings
5. Preserve entity titles and descriptors (\"NSND\", \"CEO\", \"Công ty\")

Named Entities to Preserve:
- Persons: {}
- Organizations: {}
- Addresses: {}

Original Article:
{}

Rewritten Article (Vietnamese only, no explanations):
",
        joined_or_none(gt, EntityType::Person),
        joined_or_none(gt, EntityType::Organizations),
        joined_or_none(gt, EntityType::Address),
        record.text
    )
}

/// Rewrites single articles through a [`TextGenerator`].
#[derive(Debug, Clone)]
pub struct ArticleRewriter<G> {
    generator: G,
}

impl<G: TextGenerator> ArticleRewriter<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Generates the rewrite of `record`. The generated text is trimmed; an empty generation is a
    /// failure.
    pub fn rewrite(&self, record: &Record) -> RewriteOutcome {
        let start = Instant::now();
        match self.generator.generate(&rewrite_prompt(record)) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    warn!(id = %record.id_key(), "empty rewrite");
                    return RewriteOutcome::Failure(String::from("empty generation"));
                }
                debug!(id = %record.id_key(), elapsed = ?start.elapsed(), "rewrote article");
                RewriteOutcome::Success(String::from(text))
            }
            Err(e) => {
                error!(id = %record.id_key(), error = %e, "failed to rewrite article");
                RewriteOutcome::Failure(e.to_string())
            }
        }
    }
}

/// Which ground-truth mentions appear verbatim in a text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreservationReport {
    pub all_preserved: bool,
    pub missing: Vec<(EntityType, String)>,
    pub preserved: usize,
    pub total: usize,
}

/// Checks every mention of `ground_truth` for substring containment in `text`.
pub fn verify_entities_preserved(ground_truth: &EntityMap, text: &str) -> PreservationReport {
    let mut report = PreservationReport {
        all_preserved: true,
        ..Default::default()
    };
    for (entity_type, _) in ground_truth.iter() {
        for mention in ground_truth.normalized(entity_type) {
            report.total += 1;
            if text.contains(mention.as_ref()) {
                report.preserved += 1;
            } else {
                report.all_preserved = false;
                report.missing.push((entity_type, mention.into_owned()));
            }
        }
    }
    report
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewriteConfig {
    /// A checkpoint is written every `checkpoint_interval` records. Zero disables checkpoints.
    pub checkpoint_interval: usize,
    pub checkpoint_dir: PathBuf,
    pub output_file: PathBuf,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            checkpoint_dir: PathBuf::from("."),
            output_file: PathBuf::from("train_new.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RewriteStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub entities_preserved: usize,
    pub entities_missing: usize,
    pub elapsed: Duration,
}

impl RewriteStats {
    /// Share of checked mentions found in the rewrites, `None` when nothing was checked.
    pub fn preservation_rate(&self) -> Option<f64> {
        let checked = self.entities_preserved + self.entities_missing;
        if checked == 0 {
            None
        } else {
            Some(self.entities_preserved as f64 / checked as f64)
        }
    }
}

impl Display for RewriteStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total articles:         {}", self.total)?;
        writeln!(f, "Successfully rewritten: {}", self.success)?;
        writeln!(f, "Failed:                 {}", self.failed)?;
        writeln!(f, "Total time:             {:.1}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "Entities preserved:     {}", self.entities_preserved)?;
        write!(f, "Entities missing:       {}", self.entities_missing)?;
        if let Some(rate) = self.preservation_rate() {
            write!(f, "\nPreservation rate:      {:.1}%", rate * 100.0)?;
        }
        Ok(())
    }
}

/// Sequential rewrite of a list of records with periodic checkpoints.
#[derive(Debug, Clone)]
pub struct RewritePipeline<G> {
    rewriter: ArticleRewriter<G>,
    config: RewriteConfig,
}

impl<G: TextGenerator> RewritePipeline<G> {
    pub fn new(generator: G, config: RewriteConfig) -> Self {
        Self {
            rewriter: ArticleRewriter::new(generator),
            config,
        }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Rewrites every record, in order. Each output record is a copy of its input with `rewrite`
    /// set, to the original text when the rewrite failed. Only writing a checkpoint or the output
    /// file can fail.
    pub fn run(&self, records: &[Record]) -> Result<(Vec<Record>, RewriteStats)> {
        let start = Instant::now();
        let mut stats = RewriteStats {
            total: records.len(),
            ..Default::default()
        };
        let mut output: Vec<Record> = Vec::with_capacity(records.len());
        info!(total = records.len(), "rewriting articles");
        for (i, record) in records.iter().enumerate() {
            let outcome = self.rewriter.rewrite(record);
            if outcome.is_success() {
                stats.success += 1;
            } else {
                stats.failed += 1;
            }
            let was_rewritten = outcome.is_success();
            let text = outcome.or_original(&record.text);
            if was_rewritten {
                let report = verify_entities_preserved(&record.ground_truth, &text);
                stats.entities_preserved += report.preserved;
                stats.entities_missing += report.missing.len();
                if !report.all_preserved {
                    warn!(
                        id = %record.id_key(),
                        missing = report.missing.len(),
                        "entities missing in rewrite"
                    );
                }
            } else {
                warn!(id = %record.id_key(), "keeping the original text");
            }
            output.push(Record {
                rewrite: Some(text),
                ..record.clone()
            });

            let processed = i + 1;
            if self.config.checkpoint_interval > 0 && processed % self.config.checkpoint_interval == 0
            {
                let path = self
                    .config
                    .checkpoint_dir
                    .join(format!("checkpoint_{}.json", processed));
                save_json(&path, &output)?;
                info!(path = %path.display(), records = processed, "saved checkpoint");
            }
        }
        stats.elapsed = start.elapsed();
        let path = save_json(&self.config.output_file, &output)?;
        info!(
            path = %path.display(),
            success = stats.success,
            failed = stats.failed,
            "saved rewritten articles"
        );
        Ok((output, stats))
    }
}
