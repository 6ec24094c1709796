use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;
use std::{fmt, iter};
use unicode_width::UnicodeWidthStr;

/// Wraps a secret so it never shows up in logs.
///
/// Serialization stays transparent because the wrapped value still has to be
/// persisted (password hashes) or read from request bodies (raw passwords).
#[derive(Shrinkwrap, Serialize, Deserialize, Clone, Eq, PartialEq, Hash, Default)]
#[serde(transparent)]
pub struct Redacted<T>(T);

impl<T> Redacted<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Redacted<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

fn mask(shown: &str) -> String {
    iter::repeat("█")
        .take(UnicodeWidthStr::width(shown))
        .collect()
}

impl<T: fmt::Debug> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask(&format!("{:?}", self.0)))
    }
}

impl<T: fmt::Display> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask(&format!("{}", self.0)))
    }
}
