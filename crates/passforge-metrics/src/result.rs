use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single measured value in an evaluation signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: f64,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub higher_is_better: bool,
}

/// The signal an evaluator returns: joint metric key → measured value.
///
/// Insertion order is preserved so serialized results list metrics the way
/// the evaluator produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricResult(IndexMap<String, MetricValue>);

impl MetricResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetricValue) {
        self.0.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.0.get(key)
    }

    /// Measured value for a joint key, when present.
    #[must_use]
    pub fn value_of(&self, key: &str) -> Option<f64> {
        self.0.get(key).map(|v| v.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricValue)> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this signal carries a value for every given joint key.
    #[must_use]
    pub fn covers(&self, keys: &[&str]) -> bool {
        keys.iter().all(|k| self.0.contains_key(*k))
    }
}

impl FromIterator<(String, MetricValue)> for MetricResult {
    fn from_iter<T: IntoIterator<Item = (String, MetricValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
