/**
This modules gives a few tools to prettyprint the output for all the entity types and the overall
metrics: a CSV-like `Reporter`, a single method block and multi-method comparison tables.
*/
use crate::entity::EntityType;
use crate::error::Error;
use crate::metrics::{MetricsReport, OutputScale};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// The reporter holds the metrics of every entity type and the overall metrics. It can be used to
/// display the results as if they were collected into a dataframe and can be consumed to obtain a
/// `HashSet` containing the metrics.
///
/// # Example
///
/// ```rust
/// use vner_eval::{score, EntityMap, EntityType, Reporter};
///
/// let gt = vec![EntityMap::new().with(EntityType::Person, ["Nguyễn Văn A", "Trần Thị B"])];
/// let pred = vec![EntityMap::new().with(EntityType::Person, ["Nguyễn Văn A"])];
/// let report = score(&pred, &gt, &[EntityType::Person], 0.8);
///
/// let expected_report = "Class, Precision, Recall, Fscore, Support
/// Overall_Weighted, 1, 0.5, 0.6666666666666666, 2
/// Overall_Micro, 1, 0.5, 0.6666666666666666, 2
/// Overall_Macro, 1, 0.5, 0.6666666666666666, 2
/// person, 1, 0.5, 0.6666666666666666, 2\n";
///
/// assert_eq!(expected_report, Reporter::from(&report).to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Reporter {
    pub(crate) classes: BTreeSet<ClassMetricsInner>,
}

/// By converting the reporter into a `HashSet` of `ClassMetrics`, you lose the ordering of the
/// rows.
impl From<Reporter> for HashSet<ClassMetrics> {
    fn from(value: Reporter) -> Self {
        value.classes.into_iter().map(ClassMetrics::from).collect()
    }
}

impl From<&MetricsReport> for Reporter {
    fn from(report: &MetricsReport) -> Self {
        let mut reporter = Reporter::default();
        for m in report.per_type.iter() {
            reporter.insert(ClassMetricsInner {
                class: m.entity_type.to_string(),
                average: Average::None,
                precision: m.precision,
                recall: m.recall,
                fscore: m.f1,
                support: m.support,
            });
        }
        let overall = &report.overall;
        reporter.insert(ClassMetricsInner::new_overall(
            OverallAverage::Micro,
            overall.precision,
            overall.recall,
            overall.f1,
            overall.true_positives + overall.false_negatives,
        ));
        for (average, scores) in [
            (OverallAverage::Macro, &report.macro_average),
            (OverallAverage::Weighted, &report.weighted_average),
        ] {
            reporter.insert(ClassMetricsInner::new_overall(
                average,
                scores.precision,
                scores.recall,
                scores.f1,
                scores.support,
            ));
        }
        reporter
    }
}

impl Reporter {
    pub(crate) fn insert(&mut self, metrics: ClassMetricsInner) -> bool {
        self.classes.insert(metrics)
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Class, Precision, Recall, Fscore, Support")?;
        for v in self.classes.iter().rev() {
            //Must call `.rev()` because the iter is in ascending order
            writeln!(f, "{}", v)?
        }
        Ok(())
    }
}

#[derive(Debug)]
/// Datastructure holding metrics about a given entity type or average.
pub struct ClassMetrics {
    /// The class, such as "person" or "Overall_Micro".
    pub class: String,
    /// The average used to compute this class' metrics
    pub average: Average,
    /// Precision metric
    pub precision: f64,
    /// Recall metric
    pub recall: f64,
    /// Fscore metric
    pub fscore: f64,
    /// Support metric
    pub support: usize,
}

impl Hash for ClassMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        self.average.hash(state)
    }
}

impl PartialEq for ClassMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetrics {}

impl From<ClassMetricsInner> for ClassMetrics {
    fn from(value: ClassMetricsInner) -> Self {
        Self {
            class: value.class,
            average: value.average,
            precision: value.precision,
            recall: value.recall,
            fscore: value.fscore,
            support: value.support,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// ClassMetricsInner hold the metrics for a single row. They implement a special version of the
/// `Display` trait, allowing them to be treated as the line of a dataframe, and are ordered by
/// average first, then by class.
pub(crate) struct ClassMetricsInner {
    pub(crate) class: String,
    pub(crate) average: Average,
    pub(crate) precision: f64,
    pub(crate) recall: f64,
    pub(crate) fscore: f64,
    pub(crate) support: usize,
}
impl PartialEq for ClassMetricsInner {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetricsInner {}

impl PartialOrd for ClassMetricsInner {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassMetricsInner {
    fn cmp(&self, other: &Self) -> Ordering {
        self.average
            .cmp(&other.average)
            .then_with(|| self.class.cmp(&other.class))
    }
}

impl ClassMetricsInner {
    pub(crate) fn new_overall(
        average: OverallAverage,
        precision: f64,
        recall: f64,
        fscore: f64,
        support: usize,
    ) -> Self {
        let class = average.to_string();
        ClassMetricsInner {
            class,
            average: average.into(),
            precision,
            recall,
            fscore,
            support,
        }
    }
}

/// The ClassMetricsInner struct acts as a line in a dataframe when displayed.
impl Display for ClassMetricsInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.class, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Enumeration of the rows of a `Reporter`. `None` is a single entity type. &str can be parsed to
/// create an `Average`. Rows without average sort before the averaged ones.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize, Deserialize,
)]
pub enum Average {
    None,
    Macro,
    Micro,
    Weighted,
}
impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl FromStr for Average {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Average::None),
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            _ => Err(Error::parse("Average", s)),
        }
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum OverallAverage {
    Micro,
    Macro,
    Weighted,
}

impl Display for OverallAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::Micro => "Overall_Micro",
            Self::Macro => "Overall_Macro",
            Self::Weighted => "Overall_Weighted",
        };
        write!(f, "{}", str_content)
    }
}

impl From<OverallAverage> for Average {
    fn from(value: OverallAverage) -> Self {
        match value {
            OverallAverage::Micro => Average::Micro,
            OverallAverage::Macro => Average::Macro,
            OverallAverage::Weighted => Average::Weighted,
        }
    }
}

const RULE_WIDTH: usize = 100;

/// Formats a score of the given scale as a percentage with one decimal, like `66.7%`.
pub fn percent(value: f64, scale: OutputScale) -> String {
    format!("{:.1}%", scale.to_percent(value))
}

fn rule(c: char) -> String {
    std::iter::repeat(c).take(RULE_WIDTH).collect()
}

/// Detailed block for a single method, built with `MetricsReport::display_as`.
pub struct MethodDisplay<'a> {
    method: &'a str,
    report: &'a MetricsReport,
}

impl MetricsReport {
    /// Renders the report as a block titled with the method name.
    pub fn display_as<'a>(&'a self, method: &'a str) -> MethodDisplay<'a> {
        MethodDisplay {
            method,
            report: self,
        }
    }
}

impl Display for MethodDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let report = self.report;
        let pct = |v: f64| percent(v, report.scale);
        let separator: String = std::iter::repeat('=').take(80).collect();
        writeln!(f, "{}", separator)?;
        writeln!(f, "  {} Evaluation Results", self.method)?;
        writeln!(f, "{}", separator)?;
        writeln!(f)?;
        writeln!(f, "Exact Match Accuracy: {}", pct(report.accuracy))?;
        writeln!(
            f,
            "  Correct: {}/{}",
            report.correct_examples, report.total_examples
        )?;
        writeln!(f)?;
        let overall = &report.overall;
        writeln!(f, "Overall Entity-Level Metrics:")?;
        writeln!(f, "  Precision: {}", pct(overall.precision))?;
        writeln!(f, "  Recall:    {}", pct(overall.recall))?;
        writeln!(f, "  F1-Score:  {}", pct(overall.f1))?;
        writeln!(
            f,
            "  TP/FP/FN: {}/{}/{}",
            overall.true_positives, overall.false_positives, overall.false_negatives
        )?;
        writeln!(f)?;
        writeln!(f, "Per-Entity-Type Metrics:")?;
        writeln!(
            f,
            "{:<15} {:<12} {:<12} {:<12} {:<12}",
            "Type", "Precision", "Recall", "F1-Score", "TP/FP/FN"
        )?;
        writeln!(f, "{}", "-".repeat(80))?;
        for m in report.per_type.iter() {
            let counts = format!(
                "{}/{}/{}",
                m.true_positives, m.false_positives, m.false_negatives
            );
            writeln!(
                f,
                "{:<15} {:<12} {:<12} {:<12} {:<12}",
                m.entity_type.as_str(),
                pct(m.precision),
                pct(m.recall),
                pct(m.f1),
                counts
            )?;
        }
        Ok(())
    }
}

/// Ordering of the methods of a comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Overall (micro) F1, descending.
    #[default]
    F1,
    /// Exact-match accuracy, descending.
    Accuracy,
    /// Insertion order.
    Unsorted,
}

impl Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            SortBy::F1 => "F1",
            SortBy::Accuracy => "ACCURACY",
            SortBy::Unsorted => "INSERTION ORDER",
        };
        write!(f, "{}", str_content)
    }
}

impl FromStr for SortBy {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f1" => Ok(SortBy::F1),
            "accuracy" => Ok(SortBy::Accuracy),
            "none" | "unsorted" => Ok(SortBy::Unsorted),
            _ => Err(Error::parse("SortBy", s)),
        }
    }
}

/// Reports of several methods, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Comparison {
    entries: Vec<(String, MetricsReport)>,
}

impl Comparison {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, method: impl Into<String>, report: MetricsReport) {
        self.entries.push((method.into(), report));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, method: &str) -> Option<&MetricsReport> {
        self.entries
            .iter()
            .find(|(name, _)| name == method)
            .map(|(_, report)| report)
    }

    /// Methods in the requested order. Sorting is stable and descending.
    pub fn sorted(&self, sort_by: SortBy) -> Vec<(&str, &MetricsReport)> {
        let mut entries: Vec<(&str, &MetricsReport)> = self
            .entries
            .iter()
            .map(|(name, report)| (name.as_str(), report))
            .collect();
        let key = |report: &MetricsReport| match sort_by {
            SortBy::F1 => Some(report.scale.to_percent(report.overall.f1)),
            SortBy::Accuracy => Some(report.scale.to_percent(report.accuracy)),
            SortBy::Unsorted => None,
        };
        entries.sort_by(|(_, a), (_, b)| {
            key(b)
                .partial_cmp(&key(a))
                .unwrap_or(Ordering::Equal)
        });
        entries
    }

    /// Method table (exact match, precision, recall, F1) followed by a per-type F1 table.
    pub fn summary(&self, sort_by: SortBy) -> ComparisonSummary<'_> {
        ComparisonSummary {
            comparison: self,
            sort_by,
        }
    }

    /// Accuracy, overall and per-type sections for the given entity types.
    pub fn detailed<'a>(&'a self, entity_types: &'a [EntityType]) -> DetailedComparison<'a> {
        DetailedComparison {
            comparison: self,
            entity_types,
        }
    }
}

pub struct ComparisonSummary<'a> {
    comparison: &'a Comparison,
    sort_by: SortBy,
}

impl Display for ComparisonSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sorted = self.comparison.sorted(self.sort_by);
        writeln!(f, "{}", rule('='))?;
        writeln!(f, "  Method Comparison (sorted by {})", self.sort_by)?;
        writeln!(f, "{}", rule('='))?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<20} {:<15} {:<12} {:<12} {:<12}",
            "Method", "Exact Match", "Precision", "Recall", "F1-Score"
        )?;
        writeln!(f, "{}", rule('-'))?;
        for (method, report) in sorted.iter() {
            let pct = |v: f64| percent(v, report.scale);
            writeln!(
                f,
                "{:<20} {:<15} {:<12} {:<12} {:<12}",
                method,
                pct(report.accuracy),
                pct(report.overall.precision),
                pct(report.overall.recall),
                pct(report.overall.f1)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{}", rule('='))?;
        writeln!(f, "  Per-Type F1-Score Comparison")?;
        writeln!(f, "{}", rule('='))?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<20} {:<12} {:<15} {:<12}",
            "Method", "Person", "Organizations", "Address"
        )?;
        writeln!(f, "{}", rule('-'))?;
        for (method, report) in sorted.iter() {
            let f1 = |entity_type: EntityType| {
                report
                    .type_metrics(entity_type)
                    .map_or_else(|| String::from("N/A"), |m| percent(m.f1, report.scale))
            };
            writeln!(
                f,
                "{:<20} {:<12} {:<15} {:<12}",
                method,
                f1(EntityType::Person),
                f1(EntityType::Organizations),
                f1(EntityType::Address)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{}", rule('='))
    }
}

pub struct DetailedComparison<'a> {
    comparison: &'a Comparison,
    entity_types: &'a [EntityType],
}

impl Display for DetailedComparison<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = &self.comparison.entries;
        writeln!(f, "{}", rule('='))?;
        writeln!(f, "COMPREHENSIVE EVALUATION RESULTS")?;
        writeln!(f, "{}", rule('='))?;

        writeln!(f)?;
        writeln!(f, "OVERALL EXACT MATCH ACCURACY:")?;
        writeln!(f, "{}", rule('-'))?;
        writeln!(f, "{:<25} {:<15} {:<20}", "Method", "Accuracy", "Correct/Total")?;
        writeln!(f, "{}", rule('-'))?;
        for (method, report) in entries.iter() {
            let ratio = format!("{}/{}", report.correct_examples, report.total_examples);
            writeln!(
                f,
                "{:<25} {:<15} {:<20}",
                method,
                percent(report.accuracy, report.scale),
                ratio
            )?;
        }

        writeln!(f)?;
        writeln!(f, "OVERALL ENTITY-LEVEL METRICS:")?;
        writeln!(f, "{}", rule('-'))?;
        writeln!(
            f,
            "{:<25} {:<15} {:<15} {:<15}",
            "Method", "Precision", "Recall", "F1-Score"
        )?;
        writeln!(f, "{}", rule('-'))?;
        for (method, report) in entries.iter() {
            let pct = |v: f64| percent(v, report.scale);
            writeln!(
                f,
                "{:<25} {:<15} {:<15} {:<15}",
                method,
                pct(report.overall.precision),
                pct(report.overall.recall),
                pct(report.overall.f1)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "PER-ENTITY-TYPE METRICS:")?;
        writeln!(f, "{}", rule('-'))?;
        for entity_type in self.entity_types.iter() {
            writeln!(f)?;
            writeln!(f, "  {}:", entity_type.as_str().to_uppercase())?;
            writeln!(
                f,
                "  {:<25} {:<15} {:<15} {:<15} {:<15}",
                "Method", "Precision", "Recall", "F1-Score", "Accuracy"
            )?;
            writeln!(f, "  {}", "-".repeat(RULE_WIDTH - 2))?;
            for (method, report) in entries.iter() {
                // Methods that did not score this type are left out of its section.
                if let Some(m) = report.type_metrics(*entity_type) {
                    let pct = |v: f64| percent(v, report.scale);
                    writeln!(
                        f,
                        "  {:<25} {:<15} {:<15} {:<15} {:<15}",
                        method,
                        pct(m.precision),
                        pct(m.recall),
                        pct(m.f1),
                        pct(m.accuracy)
                    )?;
                }
            }
        }
        writeln!(f)?;
        writeln!(f, "{}", rule('='))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfigBuilder;
    use crate::entity::EntityMap;
    use crate::metrics::{score, score_with};
    use rstest::rstest;

    pub trait CloseEnough {
        fn are_close(&self, other: &Self, eps: f64) -> bool;
    }

    // ClassMetricsInner does not have the default PartialEq implementation.
    impl CloseEnough for ClassMetricsInner {
        fn are_close(&self, other: &Self, eps: f64) -> bool {
            let are_equal = self == other;
            let precision_is_equal = f64::abs(self.precision - other.precision) < eps;
            let recall_is_equal = f64::abs(self.recall - other.recall) < eps;
            let fscore_is_equal = f64::abs(self.fscore - other.fscore) < eps;
            let support_is_equal = self.support == other.support;
            are_equal && precision_is_equal && recall_is_equal && fscore_is_equal && support_is_equal
        }
    }
    impl CloseEnough for Reporter {
        fn are_close(&self, other: &Self, eps: f64) -> bool {
            self.classes.len() == other.classes.len()
                && self
                    .classes
                    .iter()
                    .zip(other.classes.iter())
                    .all(|(c1, c2)| c1.are_close(c2, eps))
        }
    }

    fn row(class: &str, p: f64, r: f64, f: f64, support: usize) -> ClassMetricsInner {
        ClassMetricsInner {
            class: String::from(class),
            average: Average::None,
            precision: p,
            recall: r,
            fscore: f,
            support,
        }
    }

    fn two_types_report() -> MetricsReport {
        let gt = vec![EntityMap::new()
            .with(EntityType::Person, ["Nguyễn Văn A", "Trần Thị B"])
            .with(EntityType::Address, ["Hà Nội"])];
        let pred = vec![EntityMap::new()
            .with(EntityType::Person, ["Nguyễn Văn A"])
            .with(EntityType::Address, ["Hà Nội", "TP.HCM"])];
        score(&pred, &gt, &EntityType::all_types(), 0.8)
    }

    #[test]
    fn test_reporter_output() {
        let actual = Reporter::from(&two_types_report());
        let expected = Reporter {
            classes: BTreeSet::from_iter(vec![
                row("person", 1.0, 0.5, 2.0 / 3.0, 2),
                row("organizations", 0.0, 0.0, 0.0, 0),
                row("address", 0.5, 1.0, 2.0 / 3.0, 1),
                ClassMetricsInner::new_overall(
                    OverallAverage::Micro,
                    2.0 / 3.0,
                    2.0 / 3.0,
                    2.0 / 3.0,
                    3,
                ),
                ClassMetricsInner::new_overall(OverallAverage::Macro, 0.5, 0.5, 4.0 / 9.0, 3),
                ClassMetricsInner::new_overall(
                    OverallAverage::Weighted,
                    2.5 / 3.0,
                    2.0 / 3.0,
                    2.0 / 3.0,
                    3,
                ),
            ]),
        };
        assert!(actual.are_close(&expected, 1e-9));
    }

    #[test]
    fn test_reporter_row_order() {
        let reporter = Reporter::from(&two_types_report());
        let classes: Vec<String> = reporter
            .to_string()
            .lines()
            .map(|l| l.split(", ").next().unwrap_or_default().to_string())
            .collect();
        let expected = vec![
            "Class",
            "Overall_Weighted",
            "Overall_Micro",
            "Overall_Macro",
            "person",
            "organizations",
            "address",
        ];
        assert_eq!(classes, expected);
    }

    #[test]
    fn test_reporter_into_hashset() {
        let set: HashSet<ClassMetrics> = Reporter::from(&two_types_report()).into();
        assert_eq!(set.len(), 6);
        let address = set
            .iter()
            .find(|m| m.class == "address")
            .unwrap();
        assert_eq!(address.average, Average::None);
        assert_eq!(address.support, 1);
    }

    #[rstest]
    #[case(0.6666, OutputScale::Ratio, "66.7%")]
    #[case(66.66, OutputScale::Percentage, "66.7%")]
    #[case(0.0, OutputScale::Ratio, "0.0%")]
    #[case(1.0, OutputScale::Ratio, "100.0%")]
    fn test_percent(#[case] value: f64, #[case] scale: OutputScale, #[case] expected: &str) {
        assert_eq!(percent(value, scale), expected)
    }

    #[test]
    fn test_display_as() {
        let report = two_types_report();
        let rendered = report.display_as("zero_shot").to_string();
        assert!(rendered.contains("  zero_shot Evaluation Results"));
        assert!(rendered.contains("Exact Match Accuracy: 0.0%"));
        assert!(rendered.contains("  Correct: 0/1"));
        assert!(rendered.contains("  F1-Score:  66.7%"));
        assert!(rendered.contains("  TP/FP/FN: 2/1/1"));
        assert!(rendered.contains("person          100.0%       50.0%        66.7%        1/0/1"));
    }

    #[test]
    fn test_summary_sorting() {
        let gt = vec![EntityMap::new().with(EntityType::Person, ["Nguyễn Văn A", "Trần Thị B"])];
        let weak = vec![EntityMap::new().with(EntityType::Person, ["Nguyễn Văn A"])];
        let mut comparison = Comparison::new();
        comparison.push("weak", score(&weak, &gt, &EntityType::all_types(), 0.8));
        comparison.push("perfect", score(&gt, &gt, &EntityType::all_types(), 0.8));
        let percentage = ScoringConfigBuilder::default()
            .scale(OutputScale::Percentage)
            .build();
        comparison.push("perfect_pct", score_with(&gt, &gt, &percentage));

        let order: Vec<&str> = comparison
            .sorted(SortBy::F1)
            .into_iter()
            .map(|(m, _)| m)
            .collect();
        assert_eq!(order, vec!["perfect", "perfect_pct", "weak"]);
        let order: Vec<&str> = comparison
            .sorted(SortBy::Unsorted)
            .into_iter()
            .map(|(m, _)| m)
            .collect();
        assert_eq!(order, vec!["weak", "perfect", "perfect_pct"]);

        let rendered = comparison.summary(SortBy::Accuracy).to_string();
        assert!(rendered.contains("Method Comparison (sorted by ACCURACY)"));
        assert!(rendered.contains("perfect_pct          100.0%"));
    }

    #[test]
    fn test_detailed_skips_unscored_types() {
        let gt = vec![EntityMap::new().with(EntityType::Person, ["Nguyễn Văn A"])];
        let mut comparison = Comparison::new();
        comparison.push("person_only", score(&gt, &gt, &[EntityType::Person], 0.8));
        let rendered = comparison
            .detailed(&[EntityType::Person, EntityType::Address])
            .to_string();
        assert!(rendered.contains("  PERSON:"));
        assert!(rendered.contains("  ADDRESS:"));
        assert_eq!(rendered.matches("person_only").count(), 3);
        assert!(rendered.contains("1/1"));
    }

    #[test]
    fn test_summary_missing_type_is_na() {
        let gt = vec![EntityMap::new().with(EntityType::Person, ["Nguyễn Văn A"])];
        let mut comparison = Comparison::new();
        comparison.push("person_only", score(&gt, &gt, &[EntityType::Person], 0.8));
        let rendered = comparison.summary(SortBy::F1).to_string();
        assert!(rendered.contains("N/A"));
    }

    #[rstest]
    #[case("f1", SortBy::F1)]
    #[case("Accuracy", SortBy::Accuracy)]
    #[case("none", SortBy::Unsorted)]
    fn test_sort_by_from_str(#[case] raw: &str, #[case] expected: SortBy) {
        assert_eq!(raw.parse::<SortBy>().unwrap(), expected)
    }

    #[rstest]
    #[case("micro", Average::Micro)]
    #[case("Weighted", Average::Weighted)]
    fn test_average_from_str(#[case] raw: &str, #[case] expected: Average) {
        assert_eq!(raw.parse::<Average>().unwrap(), expected)
    }
}
