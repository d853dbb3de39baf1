use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use passforge_pass_api::SearchPoint;

/// One proposed advance through the pipeline.
///
/// Starting from `model_id`, apply `passes` in order and evaluate the
/// terminal output. `search_point` is the same selection keyed by pass name,
/// kept alongside for feedback bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub model_id: String,
    pub search_point: IndexMap<String, SearchPoint>,
    pub passes: Vec<(String, SearchPoint)>,
}

impl Step {
    /// A step that applies every listed pass to `model_id` with the given
    /// per-pass points.
    #[must_use]
    pub fn new(model_id: impl Into<String>, passes: Vec<(String, SearchPoint)>) -> Self {
        let search_point = passes
            .iter()
            .map(|(name, point)| (name.clone(), point.clone()))
            .collect();
        Self {
            model_id: model_id.into(),
            search_point,
            passes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_point_mirrors_the_pass_list() {
        let mut point = SearchPoint::new();
        point.insert("opt_level".to_string(), json!(2));

        let step = Step::new("abc123", vec![("Opt".to_string(), point.clone())]);

        assert_eq!(step.search_point.get("Opt"), Some(&point));
        assert_eq!(step.passes.len(), 1);
    }
}
