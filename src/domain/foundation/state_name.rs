//! Interned state identifiers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Name of a state within a workflow.
///
/// Cheap to clone: the underlying string is shared. Two names are equal
/// when their text is equal, regardless of where they were created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateName(Arc<str>);

impl StateName {
    /// Creates a state name from any string-like value.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the name is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StateName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StateName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for StateName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&StateName> for StateName {
    fn from(name: &StateName) -> Self {
        name.clone()
    }
}

impl PartialEq<str> for StateName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for StateName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn names_with_same_text_are_equal() {
        assert_eq!(StateName::from("draft"), StateName::from(String::from("draft")));
    }

    #[test]
    fn compares_against_plain_strings() {
        let name = StateName::from("published");
        assert_eq!(name, "published");
        assert!(name != "draft");
    }

    #[test]
    fn can_be_looked_up_by_str() {
        let mut map = HashMap::new();
        map.insert(StateName::from("archived"), 1);
        assert_eq!(map.get("archived"), Some(&1));
    }

    #[test]
    fn blank_detection() {
        assert!(StateName::from("").is_blank());
        assert!(StateName::from("   ").is_blank());
        assert!(!StateName::from("draft").is_blank());
    }

    #[test]
    fn serializes_as_plain_string() {
        let name = StateName::from("lotioning");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"lotioning\"");

        let back: StateName = serde_json::from_str("\"lotioning\"").unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn display_prints_raw_name() {
        assert_eq!(format!("{}", StateName::from("tanning")), "tanning");
    }
}
