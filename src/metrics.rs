/**
This module aggregates per-example match outcomes into precision, recall, F1 and accuracy, per
entity type and overall.

Counts are accumulated per entity type in a `PerTypeCounters`. Once every example has been seen,
the counters are turned into arrays (one cell per entity type) and the scores are derived with
array operations. A zero denominator always yields a score of zero.
*/
use crate::config::ScoringConfig;
use crate::entity::{EntityMap, EntityType};
use crate::error::Error;
use crate::matcher::{MatchPolicy, TypeOutcome};
use itertools::{multizip, Itertools};
use ndarray::{Array1, Zip};
use ndarray_stats::SummaryStatisticsExt;
use num::{Float, Num};
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;
use tracing::trace;

/// Scale of the reported scores. Counts are never scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputScale {
    /// Scores in `[0, 1]`.
    #[default]
    Ratio,
    /// Scores in `[0, 100]`.
    Percentage,
}

impl OutputScale {
    pub fn factor(&self) -> f64 {
        match self {
            OutputScale::Ratio => 1.0,
            OutputScale::Percentage => 100.0,
        }
    }

    /// Converts a score expressed in this scale into a percentage.
    pub fn to_percent(&self, value: f64) -> f64 {
        value * 100.0 / self.factor()
    }
}

impl Display for OutputScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for OutputScale {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ratio" => Ok(OutputScale::Ratio),
            "percentage" | "percent" | "%" => Ok(OutputScale::Percentage),
            _ => Err(Error::parse("OutputScale", s)),
        }
    }
}

/// Accumulator for one entity type. It is updated once per example and read once all examples
/// have been processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PerTypeCounters {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// Number of examples where this type was fully and exactly matched.
    pub correct_samples: usize,
}

impl PerTypeCounters {
    pub(crate) fn record(&mut self, outcome: &TypeOutcome) {
        self.true_positives += outcome.true_positives;
        self.false_positives += outcome.false_positives;
        self.false_negatives += outcome.false_negatives;
        if outcome.type_correct {
            self.correct_samples += 1;
        }
    }

    /// Number of ground-truth entities seen for this type.
    pub fn support(&self) -> usize {
        self.true_positives + self.false_negatives
    }
}

/// Scores of one entity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeMetrics {
    pub entity_type: EntityType,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Share of examples where this type was fully and exactly matched.
    pub accuracy: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub correct_samples: usize,
    /// `true_positives + false_negatives`
    pub support: usize,
}

impl TypeMetrics {
    fn empty(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            accuracy: 0.0,
            true_positives: 0,
            false_positives: 0,
            false_negatives: 0,
            correct_samples: 0,
            support: 0,
        }
    }
}

/// Micro-averaged scores: derived from the counts summed over every entity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

/// Average of the per-type scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AveragedScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Immutable result of a scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    /// Exact-match accuracy: share of examples where every scored type is type-correct.
    pub accuracy: f64,
    pub correct_examples: usize,
    /// Number of ground-truth examples.
    pub total_examples: usize,
    pub scale: OutputScale,
    /// One entry per scored entity type, in the configured order.
    pub per_type: Vec<TypeMetrics>,
    /// Micro-averaged scores. This is the canonical overall score.
    pub overall: OverallMetrics,
    pub macro_average: AveragedScores,
    /// Per-type scores weighted by their support.
    pub weighted_average: AveragedScores,
}

impl MetricsReport {
    pub fn type_metrics(&self, entity_type: EntityType) -> Option<&TypeMetrics> {
        self.per_type.iter().find(|m| m.entity_type == entity_type)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.per_type.iter().map(|m| m.entity_type)
    }

    pub(crate) fn from_counters(
        entity_types: &[EntityType],
        counters: &[PerTypeCounters],
        correct_examples: usize,
        total_examples: usize,
        scale: OutputScale,
    ) -> Self {
        let factor = scale.factor();
        let tp_sum = Array1::from_iter(counters.iter().map(|c| c.true_positives as f64));
        let pred_sum = Array1::from_iter(
            counters
                .iter()
                .map(|c| (c.true_positives + c.false_positives) as f64),
        );
        let true_sum = Array1::from_iter(counters.iter().map(|c| c.support() as f64));
        let correct_sum = Array1::from_iter(counters.iter().map(|c| c.correct_samples as f64));

        let precision = prf_divide(&tp_sum, &pred_sum);
        let recall = prf_divide(&tp_sum, &true_sum);
        let f_score = f1_score(&precision, &recall);
        let type_accuracy = correct_sum / non_zero(total_examples as f64);

        let per_type = multizip((
            entity_types.iter(),
            counters.iter(),
            precision.iter(),
            recall.iter(),
            f_score.iter(),
            type_accuracy.iter(),
        ))
        .map(|(entity_type, counter, p, r, f, acc)| TypeMetrics {
            entity_type: *entity_type,
            precision: p * factor,
            recall: r * factor,
            f1: f * factor,
            accuracy: acc * factor,
            true_positives: counter.true_positives,
            false_positives: counter.false_positives,
            false_negatives: counter.false_negatives,
            correct_samples: counter.correct_samples,
            support: counter.support(),
        })
        .collect();

        // Micro average over the summed counts.
        let micro_tp = Array1::from_elem(1, tp_sum.sum());
        let micro_precision = prf_divide(&micro_tp, &Array1::from_elem(1, pred_sum.sum()));
        let micro_recall = prf_divide(&micro_tp, &Array1::from_elem(1, true_sum.sum()));
        let micro_f_score = f1_score(&micro_precision, &micro_recall);
        let overall = OverallMetrics {
            precision: micro_precision[0] * factor,
            recall: micro_recall[0] * factor,
            f1: micro_f_score[0] * factor,
            true_positives: counters.iter().map(|c| c.true_positives).sum(),
            false_positives: counters.iter().map(|c| c.false_positives).sum(),
            false_negatives: counters.iter().map(|c| c.false_negatives).sum(),
        };

        let support: usize = counters.iter().map(PerTypeCounters::support).sum();
        let macro_average = AveragedScores {
            precision: precision.mean().unwrap_or(0.0) * factor,
            recall: recall.mean().unwrap_or(0.0) * factor,
            f1: f_score.mean().unwrap_or(0.0) * factor,
            support,
        };
        let weighted_average = if support == 0 {
            AveragedScores {
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
                support,
            }
        } else {
            AveragedScores {
                precision: precision.weighted_mean(&true_sum).unwrap_or(0.0) * factor,
                recall: recall.weighted_mean(&true_sum).unwrap_or(0.0) * factor,
                f1: f_score.weighted_mean(&true_sum).unwrap_or(0.0) * factor,
                support,
            }
        };

        let accuracy = correct_examples as f64 / non_zero(total_examples as f64) * factor;
        MetricsReport {
            accuracy,
            correct_examples,
            total_examples,
            scale,
            per_type,
            overall,
            macro_average,
            weighted_average,
        }
    }
}

/// Replaces a zero denominator by one. The numerator paired with a zero denominator is always
/// zero here, so the quotient is zero as well.
fn non_zero(denominator: f64) -> f64 {
    if denominator == 0.0 {
        1.0
    } else {
        denominator
    }
}

/// Element-wise division where cells with a zero denominator are set to zero.
fn prf_divide<I: Num + Copy>(numerator: &Array1<I>, denominator: &Array1<I>) -> Array1<I> {
    let (result, zero_mask) = prf_divide_results_and_mask(numerator, denominator);
    result * zero_mask
}

/// Divides after replacing the zeros of the denominator by ones, and returns the quotient along
/// with a mask holding zero where the denominator was zero and one elsewhere.
fn prf_divide_results_and_mask<I: Num + Copy>(
    numerator: &Array1<I>,
    denominator: &Array1<I>,
) -> (Array1<I>, Array1<I>) {
    let zero_at_mask = denominator.mapv(|d| if d == I::zero() { I::zero() } else { I::one() });
    let denominator = replace(denominator, I::zero(), I::one());
    let result = Zip::from(numerator)
        .and(&denominator)
        .map_collect(|&n, &d| n / d);
    (result, zero_at_mask)
}

/// Helper function to replace values from an array.
fn replace<I: PartialEq + Copy>(array: &Array1<I>, replaced: I, new_value: I) -> Array1<I> {
    array.mapv(|v| if v == replaced { new_value } else { v })
}

/// Harmonic mean of precision and recall, zero where both are zero.
fn f1_score<F: Float>(precision: &Array1<F>, recall: &Array1<F>) -> Array1<F> {
    let two = F::one() + F::one();
    let denom = replace(&(precision + recall), F::zero(), F::one());
    Zip::from(precision)
        .and(recall)
        .and(&denom)
        .map_collect(|&p, &r, &d| two * p * r / d)
}

/// Sums the outcome of every (example, entity type) pair. Returns the counters, in the order of
/// `entity_types`, and the number of exactly matched examples.
fn accumulate(
    predictions: &[EntityMap],
    ground_truths: &[EntityMap],
    entity_types: &[EntityType],
    policy: MatchPolicy,
) -> (Vec<PerTypeCounters>, usize) {
    let mut counters = vec![PerTypeCounters::default(); entity_types.len()];
    let mut correct_examples = 0;
    // Pairs beyond the shorter list are dropped.
    for (pred, gt) in predictions.iter().zip(ground_truths.iter()) {
        let mut example_correct = true;
        for (entity_type, counter) in entity_types.iter().zip(counters.iter_mut()) {
            let outcome = policy.compare(pred.get(*entity_type), gt.get(*entity_type));
            counter.record(&outcome);
            example_correct &= outcome.type_correct;
        }
        if example_correct {
            correct_examples += 1;
        }
    }
    (counters, correct_examples)
}

/// Scores the predictions against the ground truths with the given configuration. Duplicate
/// entity types in the configuration are scored once.
pub fn score_with(
    predictions: &[EntityMap],
    ground_truths: &[EntityMap],
    config: &ScoringConfig,
) -> MetricsReport {
    let entity_types: Vec<EntityType> = config.entity_types().iter().copied().unique().collect();
    let (counters, correct_examples) =
        accumulate(predictions, ground_truths, &entity_types, config.policy());
    trace!(
        predictions = predictions.len(),
        ground_truths = ground_truths.len(),
        correct_examples,
        "scored predictions"
    );
    MetricsReport::from_counters(
        &entity_types,
        &counters,
        correct_examples,
        ground_truths.len(),
        config.scale(),
    )
}

/// Scores the predictions against the ground truths with greedy fuzzy matching. Predictions and
/// ground truths are paired by position; the accuracy denominator is the number of ground truths.
///
/// ```rust
/// use vner_eval::{score, EntityMap, EntityType};
///
/// let gt = vec![EntityMap::new().with(EntityType::Person, ["Nguyễn Văn A", "Trần Thị B"])];
/// let pred = vec![EntityMap::new().with(EntityType::Person, ["Nguyễn Văn A"])];
/// let report = score(&pred, &gt, &EntityType::all_types(), 0.8);
///
/// let person = report.type_metrics(EntityType::Person).unwrap();
/// assert_eq!(person.precision, 1.0);
/// assert_eq!(person.recall, 0.5);
/// assert_eq!(report.accuracy, 0.0);
/// ```
pub fn score(
    predictions: &[EntityMap],
    ground_truths: &[EntityMap],
    entity_types: &[EntityType],
    threshold: f64,
) -> MetricsReport {
    let config = ScoringConfig {
        entity_types: entity_types.to_vec(),
        policy: MatchPolicy::Fuzzy { threshold },
        scale: OutputScale::Ratio,
    };
    score_with(predictions, ground_truths, &config)
}

/// Scores a single entity type. The policy and the scale are taken from the configuration, its
/// entity types are ignored.
pub fn score_entity_type(
    predictions: &[EntityMap],
    ground_truths: &[EntityMap],
    entity_type: EntityType,
    config: &ScoringConfig,
) -> TypeMetrics {
    let (counters, _) = accumulate(predictions, ground_truths, &[entity_type], config.policy());
    MetricsReport::from_counters(&[entity_type], &counters, 0, ground_truths.len(), config.scale())
        .per_type
        .into_iter()
        .next()
        .unwrap_or_else(|| TypeMetrics::empty(entity_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfigBuilder;
    use ndarray::array;
    use quickcheck::{QuickCheck, TestResult};
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn person(entities: &[&str]) -> EntityMap {
        EntityMap::new().with(EntityType::Person, entities.iter().copied())
    }

    #[test]
    fn test_prf_divide_results_and_mask() {
        let numerator = array![1.0, 0.0, 2.0];
        let denominator = array![2.0, 0.0, 4.0];
        let (result, mask) = prf_divide_results_and_mask(&numerator, &denominator);
        assert_eq!(result, array![0.5, 0.0, 0.5]);
        assert_eq!(mask, array![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_prf_divide_zero_denominator() {
        let actual = prf_divide(&array![3.0, 0.0], &array![0.0, 0.0]);
        assert_eq!(actual, array![0.0, 0.0]);
    }

    #[test]
    fn test_f1_score() {
        let actual = f1_score(&array![1.0, 0.0, 0.5], &array![0.5, 0.0, 1.0]);
        let expected = [2.0 / 3.0, 0.0, 2.0 / 3.0];
        for (a, e) in actual.iter().zip(expected) {
            assert!(close(*a, e))
        }
    }

    #[test]
    fn test_replace_0s_by_1s() {
        let actual = replace(&array![0, 1, 0, 3], 0, 1);
        assert_eq!(actual, array![1, 1, 1, 3]);
    }

    #[test]
    fn test_scenario_identical_prediction() {
        let gt = vec![person(&["Nguyễn Văn A"])];
        let pred = gt.clone();
        let report = score(&pred, &gt, &EntityType::all_types(), 0.8);
        let person = report.type_metrics(EntityType::Person).unwrap();
        assert_eq!(
            (person.precision, person.recall, person.f1),
            (1.0, 1.0, 1.0)
        );
        assert_eq!(
            (
                report.overall.precision,
                report.overall.recall,
                report.overall.f1
            ),
            (1.0, 1.0, 1.0)
        );
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.correct_examples, 1);
    }

    #[test]
    fn test_scenario_partial_recall() {
        let gt = vec![person(&["Nguyễn Văn A", "Trần Thị B"])];
        let pred = vec![person(&["Nguyễn Văn A"])];
        let report = score(&pred, &gt, &EntityType::all_types(), 0.8);
        let person = report.type_metrics(EntityType::Person).unwrap();
        assert_eq!(
            (
                person.true_positives,
                person.false_negatives,
                person.false_positives
            ),
            (1, 1, 0)
        );
        assert_eq!(person.recall, 0.5);
        assert_eq!(person.precision, 1.0);
        assert!(close(person.f1, 2.0 / 3.0));
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(person.accuracy, 0.0);
    }

    #[test]
    fn test_scenario_short_overlap() {
        let gt = vec![person(&["Đức Phúc"])];
        let pred = vec![person(&["Phúc"])];
        let report = score(&pred, &gt, &EntityType::all_types(), 0.8);
        let person = report.type_metrics(EntityType::Person).unwrap();
        assert_eq!(
            (
                person.true_positives,
                person.false_negatives,
                person.false_positives
            ),
            (0, 1, 1)
        );
        assert_eq!((person.precision, person.recall, person.f1), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_averages() {
        let gt = vec![EntityMap::new()
            .with(EntityType::Person, ["Nguyễn Văn A", "Trần Thị B"])
            .with(EntityType::Address, ["Hà Nội"])];
        let pred = vec![EntityMap::new()
            .with(EntityType::Person, ["Nguyễn Văn A"])
            .with(EntityType::Address, ["Hà Nội", "TP.HCM"])];
        let report = score(&pred, &gt, &EntityType::all_types(), 0.8);

        assert!(close(report.overall.precision, 2.0 / 3.0));
        assert!(close(report.overall.recall, 2.0 / 3.0));
        assert!(close(report.overall.f1, 2.0 / 3.0));
        assert_eq!(
            (
                report.overall.true_positives,
                report.overall.false_positives,
                report.overall.false_negatives
            ),
            (2, 1, 1)
        );

        assert!(close(report.macro_average.precision, 0.5));
        assert!(close(report.macro_average.recall, 0.5));
        assert!(close(report.macro_average.f1, 4.0 / 9.0));
        assert_eq!(report.macro_average.support, 3);

        assert!(close(report.weighted_average.precision, 2.5 / 3.0));
        assert!(close(report.weighted_average.recall, 2.0 / 3.0));
        assert!(close(report.weighted_average.f1, 2.0 / 3.0));

        // No organizations anywhere: the type is trivially correct.
        let organizations = report.type_metrics(EntityType::Organizations).unwrap();
        assert_eq!(organizations.accuracy, 1.0);
        assert_eq!(organizations.support, 0);
        assert_eq!(report.accuracy, 0.0);
    }

    #[test]
    fn test_percentage_scale() {
        let gt = vec![person(&["Nguyễn Văn A", "Trần Thị B"]), person(&["Lê Văn C"])];
        let pred = vec![person(&["Nguyễn Văn A"]), person(&["Lê Văn C"])];
        let config = ScoringConfigBuilder::default()
            .scale(OutputScale::Percentage)
            .build();
        let report = score_with(&pred, &gt, &config);
        assert!(close(report.accuracy, 50.0));
        assert_eq!(report.correct_examples, 1);
        let person = report.type_metrics(EntityType::Person).unwrap();
        assert!(close(person.precision, 100.0));
        assert!(close(person.recall, 200.0 / 3.0));
        assert_eq!(person.true_positives, 2);
    }

    #[test]
    fn test_missing_predictions_count_against_accuracy() {
        let gt = vec![person(&["Nguyễn Văn A"]), person(&["Trần Thị B"])];
        let pred = vec![person(&["Nguyễn Văn A"])];
        let report = score(&pred, &gt, &EntityType::all_types(), 0.8);
        assert_eq!(report.total_examples, 2);
        assert_eq!(report.correct_examples, 1);
        assert_eq!(report.accuracy, 0.5);
        // The unpaired ground truth adds no false negative.
        assert_eq!(report.overall.false_negatives, 0);
    }

    #[test]
    fn test_empty_input() {
        let report = score(&[], &[], &EntityType::all_types(), 0.8);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.total_examples, 0);
        assert_eq!(report.per_type.len(), 3);
        assert_eq!(report.overall.f1, 0.0);
        assert_eq!(report.macro_average.f1, 0.0);
        assert_eq!(report.weighted_average.f1, 0.0);
    }

    #[test]
    fn test_exact_policy() {
        let gt = vec![person(&["Nguyễn Văn A"])];
        let pred = vec![person(&["nguyễn văn a "])];
        let exact = ScoringConfigBuilder::default()
            .policy(MatchPolicy::Exact)
            .build();
        let report = score_with(&pred, &gt, &exact);
        assert_eq!(report.accuracy, 1.0);

        // A near miss that fuzzy matching accepts is rejected by the exact policy.
        let pred = vec![person(&["Nguyễn Văn An"])];
        assert_eq!(score_with(&pred, &gt, &exact).accuracy, 0.0);
        assert_eq!(score(&pred, &gt, &[EntityType::Person], 0.8).accuracy, 1.0);
    }

    #[test]
    fn test_only_configured_types_decide_accuracy() {
        let gt = vec![EntityMap::new()
            .with(EntityType::Person, ["Nguyễn Văn A"])
            .with(EntityType::Address, ["Hà Nội"])];
        let pred = vec![person(&["Nguyễn Văn A"])];
        let report = score(&pred, &gt, &[EntityType::Person], 0.8);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.per_type.len(), 1);
        let report = score(&pred, &gt, &EntityType::all_types(), 0.8);
        assert_eq!(report.accuracy, 0.0);
    }

    #[test]
    fn test_duplicate_types_are_scored_once() {
        let gt = vec![person(&["Nguyễn Văn A"])];
        let report = score(&gt, &gt, &[EntityType::Person, EntityType::Person], 0.8);
        assert_eq!(report.per_type.len(), 1);
        assert_eq!(report.overall.true_positives, 1);
    }

    #[test]
    fn test_score_entity_type() {
        let gt = vec![person(&["Nguyễn Văn A", "Trần Thị B"])];
        let pred = vec![person(&["Nguyễn Văn A"])];
        let metrics = score_entity_type(&pred, &gt, EntityType::Person, &ScoringConfig::default());
        assert_eq!(metrics.entity_type, EntityType::Person);
        assert_eq!(metrics.support, 2);
        assert_eq!(metrics.recall, 0.5);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let gt = vec![
            person(&["Nguyễn Văn A", "Trần Thị B"]),
            EntityMap::new().with(EntityType::Organizations, ["FIFA", "UEFA"]),
        ];
        let pred = vec![
            person(&["Nguyễn Văn An", "Trần Thị"]),
            EntityMap::new().with(EntityType::Organizations, ["FIFA"]),
        ];
        let first = score(&pred, &gt, &EntityType::all_types(), 0.8);
        let second = score(&pred, &gt, &EntityType::all_types(), 0.8);
        assert_eq!(first, second);
    }

    #[rstest]
    #[case("ratio", OutputScale::Ratio)]
    #[case("Percentage", OutputScale::Percentage)]
    #[case("%", OutputScale::Percentage)]
    fn test_output_scale_from_str(#[case] raw: &str, #[case] expected: OutputScale) {
        assert_eq!(raw.parse::<OutputScale>().unwrap(), expected)
    }

    #[rstest]
    #[case(OutputScale::Ratio, 0.5, 50.0)]
    #[case(OutputScale::Percentage, 50.0, 50.0)]
    fn test_to_percent(#[case] scale: OutputScale, #[case] value: f64, #[case] expected: f64) {
        assert_eq!(scale.to_percent(value), expected)
    }

    #[test]
    fn test_propertie_scores_are_bounded() {
        fn propertie_bounded(counts: Vec<(u8, u8, u8)>, correct: u8, total: u8) -> TestResult {
            if counts.len() > 3 || correct > total {
                return TestResult::discard();
            }
            let types: Vec<EntityType> = EntityType::all_types()
                .into_iter()
                .take(counts.len())
                .collect();
            let counters: Vec<PerTypeCounters> = counts
                .iter()
                .map(|(tp, fp, fn_)| PerTypeCounters {
                    true_positives: *tp as usize,
                    false_positives: *fp as usize,
                    false_negatives: *fn_ as usize,
                    correct_samples: 0,
                })
                .collect();
            let report = MetricsReport::from_counters(
                &types,
                &counters,
                correct as usize,
                total as usize,
                OutputScale::Ratio,
            );
            let in_range = |v: f64| (0.0..=1.0).contains(&v);
            let mut scores = vec![
                report.accuracy,
                report.overall.precision,
                report.overall.recall,
                report.overall.f1,
                report.macro_average.f1,
                report.weighted_average.f1,
            ];
            for m in report.per_type.iter() {
                scores.extend([m.precision, m.recall, m.f1]);
            }
            TestResult::from_bool(scores.into_iter().all(in_range))
        }
        let mut qc = QuickCheck::new().tests(1000);
        qc.quickcheck(propertie_bounded as fn(Vec<(u8, u8, u8)>, u8, u8) -> TestResult)
    }
}
