//! Workspace identity derived from a display name.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const SEPARATOR: char = '-';

/// Normalized machine key of a workspace.
///
/// Only ever contains `[a-z0-9]` runs joined by single `-`, with no leading
/// or trailing separator. It may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Derive the identity of `display_name`.
    ///
    /// Applies compatibility decomposition, drops combining marks, collapses
    /// every run of non-ASCII-alphanumeric characters into one separator,
    /// trims separators and lowercases.
    pub fn derive(display_name: &str) -> Self {
        let mut out = String::with_capacity(display_name.len());
        let mut pending_separator = false;

        for c in display_name.nfkd().filter(|c| !is_combining_mark(*c)) {
            if c.is_ascii_alphanumeric() {
                if pending_separator && !out.is_empty() {
                    out.push(SEPARATOR);
                }
                pending_separator = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_separator = true;
            }
        }

        Identity(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn derive_identity(display_name: &str) -> Identity {
    Identity::derive(display_name)
}
