/*
 * This modules contains the `ScoringConfig` struct, which implements the default trait. This
 * config can be passed to the `score_conf` function to choose the entity types to score, the
 * matching policy and the scale of the reported values.
*/
use crate::entity::EntityType;
use crate::matcher::MatchPolicy;
use crate::metrics::OutputScale;
use either::Either as LeftOrRight;
use std::fmt::Display;

#[derive(Clone, Debug, PartialEq)]
/// Config struct used to simplify the inputs of the scoring functions. It implements the default
/// trait: every entity type, fuzzy matching with a threshold of 0.8 and ratios in `[0, 1]`.
pub struct ScoringConfig {
    /// Entity types that are scored. An example is an exact match only if every one of them is
    /// fully and exactly matched.
    pub(crate) entity_types: Vec<EntityType>,
    /// How predicted entities are compared to the ground truth.
    pub(crate) policy: MatchPolicy,
    /// Scale of precision, recall, F1 and accuracy in the report.
    pub(crate) scale: OutputScale,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            entity_types: EntityType::all_types(),
            policy: MatchPolicy::default(),
            scale: OutputScale::Ratio,
        }
    }
}

impl ScoringConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn scale(&self) -> OutputScale {
        self.scale
    }
}

impl From<ScoringConfigBuilder> for ScoringConfig {
    fn from(value: ScoringConfigBuilder) -> Self {
        let policy = value
            .policy
            .either(|threshold| MatchPolicy::Fuzzy { threshold }, |policy| policy);
        Self {
            entity_types: value
                .entity_types
                .unwrap_or_else(EntityType::all_types),
            policy,
            scale: value.scale,
        }
    }
}

impl From<ScoringConfig> for (Vec<EntityType>, MatchPolicy, OutputScale) {
    fn from(value: ScoringConfig) -> Self {
        (value.entity_types, value.policy, value.scale)
    }
}

impl Display for ScoringConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<&str> = self.entity_types.iter().map(EntityType::as_str).collect();
        write!(
            f,
            "Entity types: {}\n Matching policy: {}\n Output scale: {:?}",
            types.join(", "),
            self.policy,
            self.scale
        )
    }
}

/// This builder can be used to build and customize a `ScoringConfig` structure.
///
/// ```rust
/// use vner_eval::{EntityType, OutputScale, ScoringConfigBuilder};
///
/// let config = ScoringConfigBuilder::default()
///     .entity_types([EntityType::Person])
///     .threshold(0.9)
///     .scale(OutputScale::Percentage)
///     .build();
/// assert_eq!(config.entity_types(), &[EntityType::Person]);
/// ```
#[derive(Clone, Debug)]
pub struct ScoringConfigBuilder {
    entity_types: Option<Vec<EntityType>>,
    /// Either a fuzzy threshold or a full policy.
    policy: LeftOrRight<f64, MatchPolicy>,
    scale: OutputScale,
}

impl Default for ScoringConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringConfigBuilder {
    pub fn entity_types<I: IntoIterator<Item = EntityType>>(mut self, entity_types: I) -> Self {
        self.entity_types = Some(entity_types.into_iter().collect());
        self
    }
    /// Fuzzy matching with the given strict threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.policy = LeftOrRight::Left(threshold);
        self
    }
    pub fn policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = LeftOrRight::Right(policy);
        self
    }
    pub fn scale(mut self, scale: OutputScale) -> Self {
        self.scale = scale;
        self
    }
    pub fn new() -> Self {
        Self {
            entity_types: None,
            policy: LeftOrRight::Right(MatchPolicy::default()),
            scale: OutputScale::Ratio,
        }
    }
    pub fn build(self) -> ScoringConfig {
        ScoringConfig::from(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.entity_types, EntityType::all_types());
        assert_eq!(config.policy, MatchPolicy::Fuzzy { threshold: 0.8 });
        assert_eq!(config.scale, OutputScale::Ratio);
        assert_eq!(ScoringConfigBuilder::default().build(), config);
    }

    #[rstest]
    #[case(0.5)]
    #[case(0.8)]
    #[case(0.95)]
    fn test_builder_setters_threshold(#[case] threshold: f64) {
        let builder = ScoringConfigBuilder::default();
        let config = builder.threshold(threshold).build();
        assert_eq!(config.policy, MatchPolicy::Fuzzy { threshold })
    }

    #[rstest]
    #[case(MatchPolicy::Exact)]
    #[case(MatchPolicy::Fuzzy { threshold: 0.7 })]
    fn test_builder_setters_policy(#[case] policy: MatchPolicy) {
        let builder = ScoringConfigBuilder::default();
        let config = builder.policy(policy).build();
        assert_eq!(config.policy, policy)
    }

    #[test]
    fn test_builder_last_policy_setter_wins() {
        let config = ScoringConfigBuilder::default()
            .policy(MatchPolicy::Exact)
            .threshold(0.6)
            .build();
        assert_eq!(config.policy, MatchPolicy::Fuzzy { threshold: 0.6 })
    }

    #[rstest]
    #[case(OutputScale::Ratio)]
    #[case(OutputScale::Percentage)]
    fn test_builder_setters_scale(#[case] scale: OutputScale) {
        let builder = ScoringConfigBuilder::default();
        let config = builder.scale(scale).build();
        assert_eq!(config.scale, scale)
    }

    #[test]
    fn test_builder_setters_entity_types() {
        let builder = ScoringConfigBuilder::default();
        let config = builder
            .entity_types(vec![EntityType::Address, EntityType::Person])
            .build();
        assert_eq!(
            config.entity_types,
            vec![EntityType::Address, EntityType::Person]
        )
    }

    #[test]
    fn test_config_into_tuple() {
        let (types, policy, scale) = ScoringConfig::default().into();
        assert_eq!(types.len(), 3);
        assert_eq!(policy, MatchPolicy::default());
        assert_eq!(scale, OutputScale::Ratio);
    }
}
