/**
This module holds the entity data model and the normalizer that turns heterogeneous entity values
into comparable strings.
*/
use crate::error::Error;
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

/// The three NER categories of the dataset. The serialized form is the key used in the dataset
/// files and in model responses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Organizations,
    Address,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Organizations => "organizations",
            EntityType::Address => "address",
        }
    }

    /// Every entity type, in canonical order.
    pub fn all_types() -> Vec<EntityType> {
        all::<EntityType>().collect()
    }

    /// Maps the `TYPE` attribute of an ENAMEX tag onto an entity type. Unknown tags (such as
    /// `MISC`) are not part of the dataset and map to `None`.
    pub fn from_enamex_tag(tag: &str) -> Option<EntityType> {
        match tag.trim().to_uppercase().as_str() {
            "PERSON" => Some(EntityType::Person),
            "ORGANIZATION" | "ORGANISATION" | "ORG" => Some(EntityType::Organizations),
            "LOCATION" | "LOC" => Some(EntityType::Address),
            _ => None,
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "person" | "persons" | "per" => Ok(EntityType::Person),
            "organizations" | "organization" | "org" => Ok(EntityType::Organizations),
            "address" | "addresses" | "location" | "loc" => Ok(EntityType::Address),
            _ => Err(Error::parse("EntityType", s)),
        }
    }
}

/// A raw entity value as found in a model response or a dataset file. Models do not always return
/// plain strings; some return small records such as `{"text": "Hà Nội", "type": "LOC"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum EntityValue {
    /// A plain string mention.
    Plain(String),
    /// A record, normally carrying a `text` or a `name` field.
    Record(Map<String, Value>),
    /// Any other scalar or array.
    Other(Value),
    /// A null value. It is skipped by the normalizer.
    Null,
}

impl From<Value> for EntityValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => EntityValue::Plain(s),
            Value::Object(map) => EntityValue::Record(map),
            Value::Null => EntityValue::Null,
            other => EntityValue::Other(other),
        }
    }
}

impl From<EntityValue> for Value {
    fn from(value: EntityValue) -> Self {
        match value {
            EntityValue::Plain(s) => Value::String(s),
            EntityValue::Record(map) => Value::Object(map),
            EntityValue::Other(v) => v,
            EntityValue::Null => Value::Null,
        }
    }
}

impl From<&str> for EntityValue {
    fn from(value: &str) -> Self {
        EntityValue::Plain(String::from(value))
    }
}

impl From<String> for EntityValue {
    fn from(value: String) -> Self {
        EntityValue::Plain(value)
    }
}

/// String form of a JSON value: strings are taken verbatim, anything else is rendered as JSON.
fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

impl EntityValue {
    /// Extracts the comparable text of the value. The lookup order is: the string itself, the
    /// `text` field of a record, the `name` field of a record, and finally the JSON rendering of
    /// the whole value. Only `Null` has no text.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            EntityValue::Plain(s) => Some(Cow::Borrowed(s.as_str())),
            EntityValue::Record(map) => Some(match map.get("text").or_else(|| map.get("name")) {
                Some(field) => value_text(field),
                None => Cow::Owned(Value::Object(map.clone()).to_string()),
            }),
            EntityValue::Other(v) => Some(Cow::Owned(v.to_string())),
            EntityValue::Null => None,
        }
    }
}

/// Coerces a sequence of raw entity values into plain strings, in order. Null values are dropped,
/// every other value yields exactly one string.
pub fn normalize_entities(values: &[EntityValue]) -> Vec<Cow<'_, str>> {
    values.iter().filter_map(EntityValue::text).collect()
}

/// Set of normalized entity strings for one (example, entity type) pair. Duplicates collapse and
/// iteration is in lexicographic order.
pub type EntitySet<'a> = BTreeSet<Cow<'a, str>>;

/// Builds the normalized set of a sequence of raw values.
pub fn entity_set(values: &[EntityValue]) -> EntitySet<'_> {
    values.iter().filter_map(EntityValue::text).collect()
}

/// Case and whitespace folding used by the exact (non fuzzy) matching policy.
pub fn fold_entity(entity: &str) -> String {
    entity.trim().to_lowercase()
}

/// Builds the folded set of a sequence of raw values.
pub fn folded_entity_set(values: &[EntityValue]) -> EntitySet<'static> {
    values
        .iter()
        .filter_map(EntityValue::text)
        .map(|text| Cow::Owned(fold_entity(&text)))
        .collect()
}

/// Mapping from entity type to the ordered mentions of that type, for a single example. Unknown
/// keys are ignored when deserializing and missing keys are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMap {
    #[serde(default)]
    pub person: Vec<EntityValue>,
    #[serde(default)]
    pub organizations: Vec<EntityValue>,
    #[serde(default)]
    pub address: Vec<EntityValue>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style setter, mostly useful to write ground truths by hand.
    ///
    /// ```rust
    /// use vner_eval::{EntityMap, EntityType};
    ///
    /// let gt = EntityMap::new()
    ///     .with(EntityType::Person, ["Nguyễn Văn A"])
    ///     .with(EntityType::Address, ["Hà Nội", "TP.HCM"]);
    /// assert_eq!(gt.get(EntityType::Address).len(), 2);
    /// assert!(gt.get(EntityType::Organizations).is_empty());
    /// ```
    pub fn with<I, S>(mut self, entity_type: EntityType, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<EntityValue>,
    {
        *self.get_mut(entity_type) = entities.into_iter().map(Into::into).collect();
        self
    }

    pub fn get(&self, entity_type: EntityType) -> &[EntityValue] {
        match entity_type {
            EntityType::Person => &self.person,
            EntityType::Organizations => &self.organizations,
            EntityType::Address => &self.address,
        }
    }

    pub fn get_mut(&mut self, entity_type: EntityType) -> &mut Vec<EntityValue> {
        match entity_type {
            EntityType::Person => &mut self.person,
            EntityType::Organizations => &mut self.organizations,
            EntityType::Address => &mut self.address,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityType, &[EntityValue])> {
        all::<EntityType>().map(move |t| (t, self.get(t)))
    }

    /// Number of raw mentions over all types.
    pub fn total_entities(&self) -> usize {
        self.iter().map(|(_, values)| values.len()).sum()
    }

    /// Number of types with at least one mention.
    pub fn non_empty_types(&self) -> usize {
        self.iter().filter(|(_, values)| !values.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.total_entities() == 0
    }

    /// Normalized strings of a single type, in order.
    pub fn normalized(&self, entity_type: EntityType) -> Vec<Cow<'_, str>> {
        normalize_entities(self.get(entity_type))
    }
}
