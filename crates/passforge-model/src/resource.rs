use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Where a model's backing artifact lives.
///
/// `Name` covers models addressed by a registry identifier rather than a
/// path (for example a hub model name); those need no materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResourcePath {
    Local(Utf8PathBuf),
    Remote(String),
    Name(String),
}

impl ResourcePath {
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    #[must_use]
    pub const fn is_string_name(&self) -> bool {
        matches!(self, Self::Name(_))
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_predicates() {
        assert!(ResourcePath::Local(Utf8PathBuf::from("/tmp/model")).is_local());
        assert!(ResourcePath::Remote("https://models.example/m".to_string()).is_remote());
        assert!(ResourcePath::Name("resnet50".to_string()).is_string_name());
    }

    #[test]
    fn serialization_is_tagged() {
        let path = ResourcePath::Remote("https://models.example/m".to_string());
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json["kind"], "remote");
        let back: ResourcePath = serde_json::from_value(json).unwrap();
        assert_eq!(back, path);
    }
}
