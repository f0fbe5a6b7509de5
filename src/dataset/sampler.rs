/**
This module builds the small validation subsets and the few-shot examples used by the prompts.
Every random choice goes through a `StdRng` seeded by the caller, so a given seed always produces
the same subset.
*/
use super::{save_json, Record};
use crate::entity::EntityMap;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_VALIDATION_SIZE: usize = 30;
pub const DEFAULT_FEW_SHOT_EXAMPLES: usize = 3;
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 800;

/// How the validation subset is drawn from the dev split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplingStrategy {
    /// Uniform sample without replacement.
    Random,
    /// The examples with the most entities spread over the most types.
    #[default]
    Diverse,
    /// The same number of examples from every topic.
    Balanced,
}

impl Display for SamplingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            SamplingStrategy::Random => "random",
            SamplingStrategy::Diverse => "diverse",
            SamplingStrategy::Balanced => "balanced",
        };
        write!(f, "{}", str_content)
    }
}

impl FromStr for SamplingStrategy {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(SamplingStrategy::Random),
            "diverse" => Ok(SamplingStrategy::Diverse),
            "balanced" => Ok(SamplingStrategy::Balanced),
            _ => Err(Error::parse("SamplingStrategy", s)),
        }
    }
}

/// A worked example shown to the model: an input text and its expected entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub input: String,
    pub output: EntityMap,
}

impl From<&Record> for FewShotExample {
    fn from(record: &Record) -> Self {
        Self {
            input: record.text.clone(),
            output: record.ground_truth.clone(),
        }
    }
}

/// Diversity score: number of mentions times number of represented types.
fn diversity(record: &Record) -> usize {
    record.ground_truth.total_entities() * record.ground_truth.non_empty_types()
}

/// Draws at most `size` records from the dev split.
pub fn create_validation_set(
    dev: &[Record],
    size: usize,
    strategy: SamplingStrategy,
    seed: u64,
) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(seed);
    match strategy {
        SamplingStrategy::Random => dev
            .choose_multiple(&mut rng, size.min(dev.len()))
            .cloned()
            .collect(),
        SamplingStrategy::Diverse => {
            let mut scored: Vec<&Record> = dev.iter().collect();
            // Stable: ties keep their order in the split.
            scored.sort_by_key(|record| Reverse(diversity(record)));
            scored.into_iter().take(size).cloned().collect()
        }
        SamplingStrategy::Balanced => {
            let mut by_topic: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
            for record in dev {
                by_topic.entry(record.topic.as_str()).or_default().push(record);
            }
            if by_topic.is_empty() {
                return Vec::new();
            }
            let per_topic = size / by_topic.len();
            let mut result: Vec<Record> = Vec::new();
            for records in by_topic.values() {
                result.extend(
                    records
                        .choose_multiple(&mut rng, per_topic.min(records.len()))
                        .map(|record| (*record).clone()),
                );
            }
            result.truncate(size);
            result
        }
    }
}

/// Picks `num_examples` worked examples from the train split.
///
/// With `quality_filter`, a candidate has at least three mentions, covers every entity type and
/// is no longer than `max_text_length` characters. Without it, one mention and the length limit
/// are enough.
pub fn create_few_shot_examples(
    train: &[Record],
    num_examples: usize,
    quality_filter: bool,
    max_text_length: usize,
    seed: u64,
) -> Vec<FewShotExample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let all_types = crate::entity::EntityType::all_types().len();
    let candidates: Vec<&Record> = train
        .iter()
        .filter(|record| {
            let entity_count = record.ground_truth.total_entities();
            let length_ok = record.text.chars().count() <= max_text_length;
            if quality_filter {
                let has_all_types = record.ground_truth.non_empty_types() == all_types;
                entity_count >= 3 && has_all_types && length_ok
            } else {
                entity_count > 0 && length_ok
            }
        })
        .collect();
    candidates
        .choose_multiple(&mut rng, num_examples.min(candidates.len()))
        .map(|record| FewShotExample::from(*record))
        .collect()
}

/// Writes `validation_set.json` and `few_shot_examples.json` into `output_dir`.
pub fn save_validation_and_examples(
    output_dir: &Path,
    validation_set: &[Record],
    few_shot_examples: &[FewShotExample],
) -> Result<(PathBuf, PathBuf)> {
    let validation_path = save_json(&output_dir.join("validation_set.json"), validation_set)?;
    let examples_path = save_json(&output_dir.join("few_shot_examples.json"), few_shot_examples)?;
    info!(
        validation = validation_set.len(),
        examples = few_shot_examples.len(),
        dir = %output_dir.display(),
        "saved validation set and few-shot examples"
    );
    Ok((validation_path, examples_path))
}
