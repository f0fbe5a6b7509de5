use super::Record;
use crate::entity::EntityType;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Summary of a list of records. Every field is zero for an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStatistics {
    pub total_examples: usize,
    /// Number of ground-truth mentions per entity type.
    pub entity_counts: BTreeMap<EntityType, usize>,
    pub total_entities: usize,
    pub avg_entities_per_example: f64,
    /// Average text length, in characters.
    pub avg_text_length: f64,
    /// Number of examples with at least one mention of every entity type.
    pub examples_with_all_types: usize,
}

impl DatasetStatistics {
    pub fn from_records(records: &[Record]) -> Self {
        let mut entity_counts: BTreeMap<EntityType, usize> = EntityType::all_types()
            .into_iter()
            .map(|t| (t, 0))
            .collect();
        let mut total_text_length = 0;
        let mut examples_with_all_types = 0;
        for record in records {
            for (entity_type, values) in record.ground_truth.iter() {
                *entity_counts.entry(entity_type).or_default() += values.len();
            }
            if record.ground_truth.non_empty_types() == entity_counts.len() {
                examples_with_all_types += 1;
            }
            total_text_length += record.text.chars().count();
        }
        let total_entities = entity_counts.values().sum();
        let (avg_entities_per_example, avg_text_length) = if records.is_empty() {
            (0.0, 0.0)
        } else {
            let n = records.len() as f64;
            (total_entities as f64 / n, total_text_length as f64 / n)
        };
        Self {
            total_examples: records.len(),
            entity_counts,
            total_entities,
            avg_entities_per_example,
            avg_text_length,
            examples_with_all_types,
        }
    }
}

impl Display for DatasetStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total examples: {}", self.total_examples)?;
        writeln!(f, "Entity counts:")?;
        for (entity_type, count) in self.entity_counts.iter() {
            writeln!(f, "  {:<15} {}", entity_type.as_str(), count)?;
        }
        writeln!(f, "Total entities: {}", self.total_entities)?;
        writeln!(
            f,
            "Avg entities per example: {:.2}",
            self.avg_entities_per_example
        )?;
        writeln!(f, "Avg text length: {:.1}", self.avg_text_length)?;
        writeln!(f, "Examples with all types: {}", self.examples_with_all_types)
    }
}
