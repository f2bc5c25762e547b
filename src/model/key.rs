//! Identifiers and the composite keys built from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator placed between a type tag and an identifier in a [`CacheKey`].
pub const KEY_SEPARATOR: &str = "::";

/// Identifier of a cached entity within its type.
///
/// Non-positive integers and blank strings are the invalid sentinels: a
/// lookup with one of them never touches the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Str(String),
}

impl Identifier {
    pub fn is_valid(&self) -> bool {
        match self {
            Identifier::Int(n) => *n > 0,
            Identifier::Str(s) => !s.trim().is_empty(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Identifier::Int(n) => write!(f, "{}", n),
            Identifier::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier::Int(n)
    }
}

impl From<i32> for Identifier {
    fn from(n: i32) -> Self {
        Identifier::Int(n.into())
    }
}

impl From<u32> for Identifier {
    fn from(n: u32) -> Self {
        Identifier::Int(n.into())
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Str(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::Str(s)
    }
}

/// Lookup key shared by the hard cache and the weak registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(
        tag: &str,
        id: &Identifier,
    ) -> Self {
        Self(format!("{}{}{}", tag, KEY_SEPARATOR, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
