//! Sysconfig artifact documents
//!
//! Each underlying subsystem persists its port settings in a sysconfig-style
//! text file of `KEY="value"` entries. The engine edits specific keys in
//! these files and must leave everything else untouched: comments, blank
//! lines, unknown keys, and their ordering survive a round-trip
//! byte-for-byte.

use std::path::{Path, PathBuf};

use crate::error::{PortError, PortResult};
use crate::store::ArtifactStore;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// Comment, blank line, or anything that is not a key/value pair
    Verbatim(String),
    /// A `KEY=value` line; `raw` is the original text, kept until edited
    Entry {
        key: String,
        value: String,
        raw: String,
    },
}

/// An editable view of one sysconfig file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<Line>,
    trailing_newline: bool,
}

impl Document {
    /// Parse file content into an editable document. Never fails: lines
    /// that are not key/value pairs are carried through verbatim.
    pub fn parse(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| {
                let stripped = line.trim();
                if stripped.is_empty() || stripped.starts_with('#') {
                    return Line::Verbatim(line.to_string());
                }
                match stripped.split_once('=') {
                    Some((key, value)) => Line::Entry {
                        key: key.trim().to_string(),
                        value: unquote(value.trim()).to_string(),
                        raw: line.to_string(),
                    },
                    None => Line::Verbatim(line.to_string()),
                }
            })
            .collect::<Vec<_>>();

        // split('\n') yields a trailing empty element when the text ends
        // with a newline; drop it and remember.
        let mut doc = Self {
            lines,
            trailing_newline: text.ends_with('\n'),
        };
        if doc.trailing_newline {
            doc.lines.pop();
        }
        doc
    }

    /// Empty document for a not-yet-existing artifact file
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            trailing_newline: true,
        }
    }

    /// Unquoted value of the first entry with `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set `key` to `value`, rewriting the first matching entry line in
    /// place as `KEY="value"`, or appending a new entry at the end.
    pub fn set(&mut self, key: &str, value: &str) {
        let rendered = format!("{key}=\"{value}\"");
        for line in &mut self.lines {
            if let Line::Entry { key: k, value: v, raw } = line {
                if k == key {
                    *v = value.to_string();
                    *raw = rendered;
                    return;
                }
            }
        }
        self.lines.push(Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
            raw: rendered,
        });
        self.trailing_newline = true;
    }

    /// Render the document back to file content
    pub fn render(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(|line| match line {
                Line::Verbatim(raw) => raw.as_str(),
                Line::Entry { raw, .. } => raw.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Load the artifact at `file` through the store; a missing file reads
    /// as an empty document (subsystem not installed / not yet configured).
    pub fn load(store: &dyn ArtifactStore, file: &Path) -> PortResult<Self> {
        match store.read(file)? {
            Some(text) => Ok(Self::parse(&text)),
            None => Ok(Self::empty()),
        }
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// A fully-qualified key inside an artifact file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    pub file: PathBuf,
    pub key: String,
}

impl ArtifactRef {
    pub fn new(file: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.key)
    }
}

/// Helper for building the `ParseError` the taxonomy requires: it must name
/// the file, the key, and the raw value it could not understand.
pub fn parse_error(file: &Path, key: &str, value: &str) -> PortError {
    PortError::ParseError {
        file: file.to_path_buf(),
        key: key.to_string(),
        value: value.to_string(),
    }
}
