use std::fmt;
use std::str::FromStr;

use crate::error::FetchError;

/// Identifier of a published bundle on the hub, e.g. `sentence-transformers/all-MiniLM-L6-v2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId(String);

impl ModelId {
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let id = raw.trim();
        let invalid = || FetchError::InvalidIdentifier(raw.to_string());

        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        if id.starts_with('/') || id.ends_with('/') {
            return Err(invalid());
        }
        if id.split('/').any(|segment| segment.is_empty() || segment == "..") {
            return Err(invalid());
        }

        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModelId {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_namespaced_and_bare_ids() {
        let id = ModelId::parse("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        assert_eq!(id.as_str(), "sentence-transformers/all-MiniLM-L6-v2");

        let bare = ModelId::parse("gpt2").unwrap();
        assert_eq!(bare.as_str(), "gpt2");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let id: ModelId = "  org/example-tokenizer\n".parse().unwrap();
        assert_eq!(id.to_string(), "org/example-tokenizer");
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "   ", "org/ name", "/org/name", "org/name/", "org//name", "../etc"] {
            assert!(
                matches!(ModelId::parse(raw), Err(FetchError::InvalidIdentifier(_))),
                "expected {raw:?} to be rejected"
            );
        }
    }
}
