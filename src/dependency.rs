use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

/// One "blocked by" entry taken from an issue body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyReference {
    /// `owner/repo` for cross-repository references, `None` for same-repo ones.
    pub repository: Option<String>,
    pub number: u64,
}

impl DependencyReference {
    pub fn local(number: u64) -> Self {
        DependencyReference {
            repository: None,
            number,
        }
    }

    pub fn external(repository: &str, number: u64) -> Self {
        DependencyReference {
            repository: Some(repository.to_string()),
            number,
        }
    }

    pub fn is_external(&self) -> bool {
        self.repository.is_some()
    }
}

impl Serialize for DependencyReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DependencyReference", 3)?;
        state.serialize_field("repository", &self.repository)?;
        state.serialize_field("number", &self.number)?;
        state.serialize_field("isExternal", &self.is_external())?;
        state.end()
    }
}

impl fmt::Display for DependencyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repository {
            Some(repo) => write!(f, "{repo}#{}", self.number),
            None => write!(f, "#{}", self.number),
        }
    }
}
