/**
This module implements the approximate string matching used to decide whether a predicted entity
corresponds to a ground-truth entity.

The similarity is the classic sequence-matching ratio `2 * M / T`, where `M` is the number of
characters in the matching blocks found by recursively taking the longest common substring and
`T` is the combined length of both strings. Strings are compared as sequences of Unicode scalar
values, so `"Đức"` has length 3.
*/
use crate::entity::{EntitySet, EntityValue};
use crate::error::Error;
use ahash::AHashMap;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

/// Default similarity threshold. A pair matches when its ratio is strictly greater than it.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Below this length of the second sequence, every character can seed a match.
const AUTOJUNK_MIN_LEN: usize = 200;

/// A run of equal characters: `a[a_start..a_start + size] == b[b_start..b_start + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Pre-indexed pair of character sequences.
struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    /// Positions of every non-popular character of `b`, in increasing order.
    b2j: AHashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let mut b2j: AHashMap<char, Vec<usize>> = AHashMap::default();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        // Characters that are too frequent in a long `b` do not seed matches. They can still
        // extend one.
        if b.len() >= AUTOJUNK_MIN_LEN {
            let ntest = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= ntest);
        }
        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`. Ties are broken by the
    /// earliest start in `a`, then the earliest start in `b`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut j2len: AHashMap<usize, usize> = AHashMap::default();
        for i in alo..ahi {
            let mut new_j2len: AHashMap<usize, usize> = AHashMap::default();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }
        MatchingBlock {
            a_start: best_i,
            b_start: best_j,
            size: best_size,
        }
    }

    fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            let (i, j, k) = (block.a_start, block.b_start, block.size);
            blocks.push(block);
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        blocks.sort_unstable();
        blocks
    }
}

/// Matching blocks of `a` and `b`, sorted by position. The trailing zero-sized sentinel some
/// implementations add is not included.
pub fn matching_blocks(a: &str, b: &str) -> Vec<MatchingBlock> {
    SequenceMatcher::new(a, b).matching_blocks()
}

/// Similarity ratio of two strings, in `[0, 1]`. Two empty strings have a ratio of `1`.
///
/// ```rust
/// use vner_eval::similarity_ratio;
///
/// assert_eq!(similarity_ratio("Hà Nội", "Hà Nội"), 1.0);
/// // "Phúc" is the only common block: 2 * 4 / (8 + 4)
/// assert!((similarity_ratio("Đức Phúc", "Phúc") - 2.0 / 3.0).abs() < 1e-12);
/// ```
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let matcher = SequenceMatcher::new(a, b);
    let total = matcher.a.len() + matcher.b.len();
    if total == 0 {
        return 1.0;
    }
    let matches: usize = matcher.matching_blocks().iter().map(|b| b.size).sum();
    2.0 * matches as f64 / total as f64
}

/// The ground-truth entities matched by at least one predicted entity. It is always a subset of
/// the ground-truth set it was computed from, and its length is the true-positive count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult<'a> {
    matched: BTreeSet<&'a str>,
}

impl<'a> MatchResult<'a> {
    pub fn len(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.matched.contains(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &&'a str> {
        self.matched.iter()
    }
}

/// Greedy, first-match-wins fuzzy matching.
///
/// Every predicted entity scans the ground-truth set in its iteration order and claims the first
/// entity whose similarity is strictly greater than `threshold`, then stops. A ground-truth entity
/// claimed several times is counted once: the result is a union, not a one-to-one assignment.
pub fn fuzzy_match<'a>(
    predicted: &EntitySet<'_>,
    ground_truth: &'a EntitySet<'_>,
    threshold: f64,
) -> MatchResult<'a> {
    let mut matched = BTreeSet::new();
    for pred_entity in predicted.iter() {
        let claimed = ground_truth
            .iter()
            .find(|gt_entity| similarity_ratio(pred_entity, gt_entity) > threshold);
        if let Some(gt_entity) = claimed {
            matched.insert(&**gt_entity);
        }
    }
    MatchResult { matched }
}

/// Outcome of comparing the predicted and ground-truth entities of one type for one example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeOutcome {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// Every ground-truth entity is matched and there is exactly as many predicted entities.
    pub type_correct: bool,
}

/// How predicted entities are compared with ground-truth entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchPolicy {
    /// Greedy fuzzy matching with a strict similarity threshold.
    Fuzzy { threshold: f64 },
    /// Set comparison of trimmed, lowercased strings.
    Exact,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy::Fuzzy {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::Fuzzy { threshold } => write!(f, "fuzzy (threshold > {})", threshold),
            MatchPolicy::Exact => write!(f, "exact"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = Error;
    /// Accepts `exact`, `fuzzy` (default threshold) or `fuzzy:<threshold>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.split_once(':') {
            None if lowered == "exact" => Ok(MatchPolicy::Exact),
            None if lowered == "fuzzy" => Ok(MatchPolicy::default()),
            Some(("fuzzy", threshold)) => threshold
                .trim()
                .parse::<f64>()
                .map(|threshold| MatchPolicy::Fuzzy { threshold })
                .map_err(|_| Error::parse("MatchPolicy", s)),
            _ => Err(Error::parse("MatchPolicy", s)),
        }
    }
}

impl MatchPolicy {
    /// Compares the raw values of one entity type. Values are normalized first; with the exact
    /// policy they are also folded.
    pub fn compare(&self, predicted: &[EntityValue], ground_truth: &[EntityValue]) -> TypeOutcome {
        match *self {
            MatchPolicy::Fuzzy { threshold } => {
                let pred_set = crate::entity::entity_set(predicted);
                let gt_set = crate::entity::entity_set(ground_truth);
                let matched = fuzzy_match(&pred_set, &gt_set, threshold);
                let tp = matched.len();
                TypeOutcome {
                    true_positives: tp,
                    false_positives: pred_set.len() - tp,
                    false_negatives: gt_set.len() - tp,
                    type_correct: tp == gt_set.len() && pred_set.len() == gt_set.len(),
                }
            }
            MatchPolicy::Exact => {
                let pred_set = crate::entity::folded_entity_set(predicted);
                let gt_set = crate::entity::folded_entity_set(ground_truth);
                TypeOutcome {
                    true_positives: pred_set.intersection(&gt_set).count(),
                    false_positives: pred_set.difference(&gt_set).count(),
                    false_negatives: gt_set.difference(&pred_set).count(),
                    type_correct: pred_set == gt_set,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};
    use rstest::rstest;
    use std::borrow::Cow;

    fn set<'a>(entities: &[&'a str]) -> EntitySet<'a> {
        entities.iter().map(|s| Cow::from(*s)).collect()
    }

    #[rstest]
    #[case("Hà Nội", "Hà Nội", 1.0)]
    #[case("", "", 1.0)]
    #[case("abc", "", 0.0)]
    #[case("Đức Phúc", "Phúc", 8.0 / 12.0)]
    #[case("abcd", "abce", 0.75)]
    #[case("Bộ GD", "Bộ GT", 0.8)]
    #[case("Nguyễn Văn A", "Nguyễn Văn An", 24.0 / 25.0)]
    #[case("abc", "xyz", 0.0)]
    fn test_similarity_ratio(#[case] a: &str, #[case] b: &str, #[case] expected: f64) {
        let actual = similarity_ratio(a, b);
        assert!(
            (actual - expected).abs() < 1e-12,
            "ratio({a:?}, {b:?}) = {actual}, expected {expected}"
        )
    }

    #[rstest]
    #[case("Đức Phúc", "Phúc")]
    #[case("Bộ GD", "Bộ GT")]
    #[case("Hà Nội", "TP Hà Nội")]
    fn test_similarity_ratio_is_symmetric(#[case] a: &str, #[case] b: &str) {
        assert_eq!(similarity_ratio(a, b), similarity_ratio(b, a))
    }

    #[test]
    fn test_matching_blocks_recurse_on_both_sides() {
        // "ab" then "cd" are separated by a mismatch on both sides.
        let blocks = matching_blocks("abXcd", "abYcd");
        let expected = vec![
            MatchingBlock {
                a_start: 0,
                b_start: 0,
                size: 2,
            },
            MatchingBlock {
                a_start: 3,
                b_start: 3,
                size: 2,
            },
        ];
        assert_eq!(blocks, expected)
    }

    #[test]
    fn test_find_longest_match_prefers_earliest() {
        let matcher = SequenceMatcher::new("abab", "ab");
        let block = matcher.find_longest_match(0, 4, 0, 2);
        assert_eq!(
            block,
            MatchingBlock {
                a_start: 0,
                b_start: 0,
                size: 2
            }
        )
    }

    #[test]
    fn test_popular_characters_do_not_seed_long_sequences() {
        // In a 200 char `b`, 'a' appears far more than 1% of the time and cannot seed a match.
        let b: String = std::iter::repeat('a').take(200).collect();
        let blocks = matching_blocks("xa", &b);
        assert!(blocks.is_empty());
        assert_eq!(similarity_ratio("xa", &b), 0.0);
        // The same pair below the limit matches normally.
        let short_b: String = std::iter::repeat('a').take(199).collect();
        assert_eq!(matching_blocks("xa", &short_b).len(), 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        // ratio("Bộ GD", "Bộ GT") is exactly 0.8
        let pred = set(&["Bộ GD"]);
        let gt = set(&["Bộ GT"]);
        assert!(fuzzy_match(&pred, &gt, 0.8).is_empty());
        assert_eq!(fuzzy_match(&pred, &gt, 0.79).len(), 1);
    }

    #[test]
    fn test_short_overlap_does_not_match() {
        let pred = set(&["Phúc"]);
        let gt = set(&["Đức Phúc"]);
        assert!(fuzzy_match(&pred, &gt, DEFAULT_THRESHOLD).is_empty())
    }

    #[test]
    fn test_first_match_wins_and_union() {
        // Both predictions are close to both ground truths; each claims the first ground truth in
        // iteration order, which is counted once.
        let pred = set(&["Nguyễn Văn An", "Nguyễn Văn Am"]);
        let gt = set(&["Nguyễn Văn A", "Nguyễn Văn Ai"]);
        let matched = fuzzy_match(&pred, &gt, DEFAULT_THRESHOLD);
        assert_eq!(matched.len(), 1);
        assert!(matched.contains("Nguyễn Văn A"));
    }

    #[rstest]
    #[case(&[], &["Hà Nội"])]
    #[case(&["Hà Nội"], &[])]
    #[case(&[], &[])]
    fn test_empty_sets_match_nothing(#[case] pred: &[&str], #[case] gt: &[&str]) {
        let pred = set(pred);
        let gt = set(gt);
        assert!(fuzzy_match(&pred, &gt, 0.0).is_empty())
    }

    #[test]
    fn test_compare_fuzzy_counts() {
        let pred: Vec<EntityValue> = vec!["Nguyễn Văn A".into(), "Hà Nội".into()];
        let gt: Vec<EntityValue> = vec!["Nguyễn Văn A".into(), "Trần Thị B".into()];
        let outcome = MatchPolicy::default().compare(&pred, &gt);
        let expected = TypeOutcome {
            true_positives: 1,
            false_positives: 1,
            false_negatives: 1,
            type_correct: false,
        };
        assert_eq!(outcome, expected)
    }

    #[test]
    fn test_compare_requires_equal_cardinality() {
        // Every ground truth is matched, but a spurious prediction breaks type correctness.
        let pred: Vec<EntityValue> = vec!["FIFA".into(), "UEFA".into()];
        let gt: Vec<EntityValue> = vec!["FIFA".into()];
        let outcome = MatchPolicy::default().compare(&pred, &gt);
        assert_eq!(outcome.true_positives, 1);
        assert_eq!(outcome.false_positives, 1);
        assert!(!outcome.type_correct);
    }

    #[test]
    fn test_compare_exact_folds() {
        let pred: Vec<EntityValue> = vec![" hà nội".into(), "Huế".into()];
        let gt: Vec<EntityValue> = vec!["Hà Nội".into(), "Đà Nẵng".into()];
        let outcome = MatchPolicy::Exact.compare(&pred, &gt);
        let expected = TypeOutcome {
            true_positives: 1,
            false_positives: 1,
            false_negatives: 1,
            type_correct: false,
        };
        assert_eq!(outcome, expected);
        let same = MatchPolicy::Exact.compare(&gt, &gt);
        assert!(same.type_correct);
    }

    #[rstest]
    #[case("exact", MatchPolicy::Exact)]
    #[case("Fuzzy", MatchPolicy::Fuzzy { threshold: 0.8 })]
    #[case("fuzzy:0.9", MatchPolicy::Fuzzy { threshold: 0.9 })]
    fn test_match_policy_from_str(#[case] raw: &str, #[case] expected: MatchPolicy) {
        assert_eq!(raw.parse::<MatchPolicy>().unwrap(), expected)
    }

    #[test]
    fn test_match_policy_from_str_invalid() {
        assert!("fuzzy:high".parse::<MatchPolicy>().is_err());
        assert!("levenshtein".parse::<MatchPolicy>().is_err());
    }

    #[test]
    fn test_propertie_match_is_subset_of_ground_truth() {
        fn propertie_subset(pred: Vec<String>, gt: Vec<String>, threshold: u8) -> TestResult {
            let threshold = f64::from(threshold) / 255.0;
            let pred_set: EntitySet = pred.iter().map(|s| Cow::from(s.as_str())).collect();
            let gt_set: EntitySet = gt.iter().map(|s| Cow::from(s.as_str())).collect();
            let matched = fuzzy_match(&pred_set, &gt_set, threshold);
            if matched.len() > gt_set.len() || matched.len() > pred_set.len() {
                return TestResult::failed();
            }
            for entity in matched.iter() {
                if !gt_set.contains(*entity) {
                    return TestResult::failed();
                }
            }
            TestResult::passed()
        }
        let mut qc = QuickCheck::new().tests(500);
        qc.quickcheck(propertie_subset as fn(Vec<String>, Vec<String>, u8) -> TestResult)
    }

    #[test]
    fn test_propertie_ratio_bounds_and_identity() {
        fn propertie_ratio(a: String, b: String) -> TestResult {
            let ratio = similarity_ratio(&a, &b);
            if !(0.0..=1.0).contains(&ratio) {
                return TestResult::failed();
            }
            if similarity_ratio(&a, &a) != 1.0 {
                return TestResult::failed();
            }
            TestResult::passed()
        }
        let mut qc = QuickCheck::new().tests(500);
        qc.quickcheck(propertie_ratio as fn(String, String) -> TestResult)
    }
}
