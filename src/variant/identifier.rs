//! Identifiers derived from skin file names

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Lowercase the name, turn anything outside `[a-z0-9_]` into `_`,
/// collapse runs of `_` and trim them from both ends
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' };
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// A validated variant identifier: non-empty `[a-z0-9_]`, no leading,
/// trailing or doubled underscores
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantId(String);

impl VariantId {
    /// Accept an already-sanitized identifier
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || sanitize(&id) != id {
            return Err(Error::format(format!("'{}' is not a valid variant identifier", id)));
        }
        Ok(Self(id))
    }

    /// Sanitize a file stem into an identifier
    pub fn from_stem(stem: &str) -> Result<Self> {
        let id = sanitize(stem);
        if id.is_empty() {
            return Err(Error::format(format!("'{}' yields an empty identifier", stem)));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for VariantId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<VariantId> for String {
    fn from(id: VariantId) -> Self {
        id.0
    }
}

/// Title-cased display name from a file stem: "steve_hat" -> "Steve Hat"
pub fn display_name_from_stem(stem: &str) -> String {
    stem.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
