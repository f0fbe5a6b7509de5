/*!
This library evaluates large language models on Vietnamese named entity recognition. Models are
asked to extract the people, organizations and addresses of news articles from the VLSP 2018
corpus; their free-form answers are parsed, matched against the annotations and scored.

# Scoring
Exact string equality is too harsh on model outputs: a model writes `"UBND tỉnh Quảng Nam"` where
the annotation says `"UBND tỉnh Quảng Nam."`. Entities are therefore matched with a similarity
ratio (twice the number of matching characters over the total number of characters, the same
measure as difflib's `SequenceMatcher`). A predicted entity counts as a true positive when its
ratio with some ground-truth entity is strictly above the threshold (`0.8` by default).

Per entity type, the counts over every example give a precision, a recall, an F1 and an
accuracy, the fraction of examples whose type was predicted perfectly. The overall metrics are
the micro average, along with the macro and support-weighted averages.

# Terminology
* An entity type is one of `person`, `organizations` and `address`.
* A mention is a string naming an entity in the text, such as `"Đức Phúc"`.
* A ground truth is the annotated `EntityMap` of an example; a prediction is the `EntityMap`
    parsed from a model answer.
* A method is a prompting strategy (zero-shot, few-shot, chain-of-thought, ...) whose
    predictions are compared with other methods.

# Layout
The scoring path (`matcher`, `metrics`, `parser`, `reporter`) is pure and infallible. The
`dataset`, `corpus` and `rewrite` modules touch the file system and return `Result`s.
*/

mod config;
pub mod corpus;
pub mod dataset;
mod entity;
mod error;
mod matcher;
mod metrics;
mod parser;
pub mod prompt;
mod reporter;
pub mod rewrite;

// The public api starts here
pub use entity::{
    entity_set, fold_entity, normalize_entities, EntityMap, EntitySet, EntityType, EntityValue,
};

pub use error::{Error, Result};

pub use matcher::{
    fuzzy_match, matching_blocks, similarity_ratio, MatchPolicy, MatchResult, MatchingBlock,
    TypeOutcome, DEFAULT_THRESHOLD,
};

pub use metrics::{
    score, score_entity_type, score_with, AveragedScores, MetricsReport, OutputScale,
    OverallMetrics, TypeMetrics,
};

pub use parser::parse_response;

pub use reporter::{
    percent, Average, ClassMetrics, Comparison, ComparisonSummary, DetailedComparison,
    MethodDisplay, Reporter, SortBy,
};

pub use config::{ScoringConfig, ScoringConfigBuilder};

/// Scores the predictions against the ground truths and returns a `Reporter`. Instead of taking
/// in the raw parameters, this function takes a `ScoringConfig` and uses its sensible defaults:
/// every entity type, fuzzy matching at `0.8` and scores in `[0, 1]`.
///
/// * `predictions`: Parsed model answers, paired by position with the ground truths
/// * `ground_truths`: Annotated entities of each example
/// * `config`: Entity types, matching policy and output scale.
///
/// #Example
/// ```rust
/// use vner_eval::{score_conf, EntityMap, EntityType, ScoringConfigBuilder, MatchPolicy};
///
/// let gt = vec![EntityMap::new()
///     .with(EntityType::Person, ["Đức Phúc"])
///     .with(EntityType::Address, ["Hà Nội", "Huế"])];
/// let pred = vec![EntityMap::new()
///     .with(EntityType::Person, ["đức phúc"])
///     .with(EntityType::Address, ["Hà Nội"])];
/// let config = ScoringConfigBuilder::new()
///     .entity_types([EntityType::Person, EntityType::Address])
///     .policy(MatchPolicy::Exact)
///     .build();
///
/// let reporter = score_conf(&pred, &gt, config);
/// let expected_report = "Class, Precision, Recall, Fscore, Support
/// Overall_Weighted, 1, 0.6666666666666666, 0.7777777777777777, 3
/// Overall_Micro, 1, 0.6666666666666666, 0.8, 3
/// Overall_Macro, 1, 0.75, 0.8333333333333333, 3
/// person, 1, 1, 1, 1
/// address, 1, 0.5, 0.6666666666666666, 2\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
pub fn score_conf(
    predictions: &[EntityMap],
    ground_truths: &[EntityMap],
    config: ScoringConfig,
) -> Reporter {
    let report = score_with(predictions, ground_truths, &config);
    let (entity_types, policy, scale): (Vec<EntityType>, MatchPolicy, OutputScale) = config.into();
    tracing::debug!(
        entity_types = entity_types.len(),
        %policy,
        %scale,
        accuracy = report.accuracy,
        "built report"
    );
    Reporter::from(&report)
}
