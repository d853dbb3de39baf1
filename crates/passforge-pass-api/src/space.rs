use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One strategy-chosen configuration for a pass: parameter name → value.
pub type SearchPoint = IndexMap<String, serde_json::Value>;

/// The categorical search space a pass exposes for one accelerator.
///
/// Parameter order is preserved; an empty space means the pass has exactly
/// one configuration (its fixed config).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchSpace(IndexMap<String, Vec<serde_json::Value>>);

impl SearchSpace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, param: impl Into<String>, choices: Vec<serde_json::Value>) {
        self.0.insert(param.into(), choices);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn choices(&self, param: &str) -> Option<&[serde_json::Value]> {
        self.0.get(param).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<serde_json::Value>)> {
        self.0.iter()
    }

    /// Number of points in the cross-product of all parameters.
    ///
    /// The empty space has exactly one point (the fixed configuration).
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    /// Whether `point` selects a declared choice for every parameter of
    /// this space, and nothing else.
    #[must_use]
    pub fn contains_point(&self, point: &SearchPoint) -> bool {
        if point.len() != self.0.len() {
            return false;
        }
        self.0.iter().all(|(param, choices)| {
            point
                .get(param)
                .is_some_and(|chosen| choices.contains(chosen))
        })
    }
}

impl FromIterator<(String, Vec<serde_json::Value>)> for SearchSpace {
    fn from_iter<T: IntoIterator<Item = (String, Vec<serde_json::Value>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
