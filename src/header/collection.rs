//! Ordered, deduplicating collection of header lines.
//!
//! Lines keep their insertion order. Structured lines are unique per
//! `(key, ID)` namespace; unstructured lines are keyed by key plus a
//! content hash, so two `##source=` lines with different text coexist
//! while byte-identical repeats collapse to one.
//!
//! The collection always knows its version. [`HeaderLineCollection::set_version`]
//! is monotonic (the version can only move forward) and transactional:
//! every line is re-validated against the new version first, and on any
//! failure the collection is left untouched.

use crate::config::DecodeOptions;
use crate::error::{LineViolation, Result, VcfError};
use crate::header::line::{HeaderLine, StructuredLine};
use crate::version::VcfVersion;
use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Insertion-ordered set of header lines with `(key, ID)` uniqueness.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLineCollection {
    lines: Vec<HeaderLine>,
    index: HashMap<String, usize>,
    version: VcfVersion,
    options: DecodeOptions,
}

impl HeaderLineCollection {
    /// Create an empty collection at the given version.
    pub fn new(version: VcfVersion) -> Self {
        Self::with_options(version, DecodeOptions::default())
    }

    /// Create an empty collection with explicit strictness options.
    pub fn with_options(version: VcfVersion, options: DecodeOptions) -> Self {
        HeaderLineCollection {
            lines: Vec::new(),
            index: HashMap::new(),
            version,
            options,
        }
    }

    /// The collection's current version.
    pub fn version(&self) -> VcfVersion {
        self.version
    }

    /// Number of lines (the version line is implicit and not counted).
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when no metadata lines are present.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one line, validating it against the current version.
    ///
    /// A structured line colliding with a different existing line on the
    /// same `(key, ID)` keeps the existing line and warns, unless
    /// [`DecodeOptions::strict_duplicates`] makes it an error. Identical
    /// repeats are dropped silently.
    pub fn add_line(&mut self, line: HeaderLine) -> Result<()> {
        if let Err(message) = line.validate(self.version) {
            if self.options.strict_ids && self.version.strict_id_validation() {
                return Err(VcfError::header_parse(line.to_string(), message));
            }
            tracing::warn!(line = %line, "{message}");
        }

        let key = namespace_key(&line);
        match self.index.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(self.lines.len());
                self.lines.push(line);
                Ok(())
            }
            Entry::Occupied(slot) => {
                let existing = &self.lines[*slot.get()];
                if *existing == line {
                    return Ok(());
                }
                if self.options.strict_duplicates {
                    return Err(VcfError::header_parse(
                        line.to_string(),
                        format!("duplicate header line for {}", describe(&line)),
                    ));
                }
                tracing::warn!(
                    kept = %existing,
                    dropped = %line,
                    "duplicate header line for {}; keeping the first occurrence",
                    describe(&line)
                );
                Ok(())
            }
        }
    }

    /// Structured-line lookup by `(key, ID)`.
    pub fn get(&self, key: &str, id: &str) -> Option<&HeaderLine> {
        self.index
            .get(&format!("{key}:{id}"))
            .map(|&i| &self.lines[i])
    }

    /// All lines with the given metadata key, in input order.
    pub fn of_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a HeaderLine> {
        self.lines.iter().filter(move |l| l.key() == key)
    }

    /// All lines in input order.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderLine> {
        self.lines.iter()
    }

    /// All lines sorted lexicographically by their serialized text.
    pub fn sorted(&self) -> Vec<&HeaderLine> {
        let mut lines: Vec<&HeaderLine> = self.lines.iter().collect();
        lines.sort_by_key(|l| l.to_string());
        lines
    }

    /// The contig lines, in input order (the sequence dictionary).
    pub fn contigs(&self) -> impl Iterator<Item = &StructuredLine> {
        self.of_key("contig").filter_map(HeaderLine::as_structured)
    }

    /// Replace the whole sequence dictionary, preserving the relative
    /// order of all other lines.
    pub fn replace_contigs(&mut self, contigs: Vec<HeaderLine>) -> Result<()> {
        let mut rebuilt = Self::with_options(self.version, self.options);
        for line in self.lines.drain(..) {
            if line.key() != "contig" {
                rebuilt.add_line(line)?;
            }
        }
        for line in contigs {
            rebuilt.add_line(line)?;
        }
        *self = rebuilt;
        Ok(())
    }

    /// Upgrade the collection to a newer version.
    ///
    /// Transactional: all lines are validated against `target` first and
    /// every violation is reported in one [`VcfError::VersionValidation`];
    /// the collection is unchanged on failure. Moving backward is always
    /// an error.
    pub fn set_version(&mut self, target: VcfVersion) -> Result<()> {
        if target < self.version {
            return Err(VcfError::HeaderFormat(format!(
                "cannot change header version from {} back to {target}",
                self.version
            )));
        }
        let violations: Vec<LineViolation> = self
            .lines
            .iter()
            .filter_map(|line| {
                line.validate(target).err().map(|message| LineViolation {
                    line: line.to_string(),
                    message,
                })
            })
            .collect();
        if !violations.is_empty() {
            if target.strict_id_validation() && self.options.strict_ids {
                return Err(VcfError::VersionValidation {
                    target: target.literal().to_string(),
                    violations,
                });
            }
            for v in &violations {
                tracing::warn!(line = %v.line, "{}", v.message);
            }
        }
        self.version = target;
        Ok(())
    }
}

fn namespace_key(line: &HeaderLine) -> String {
    match line.id() {
        Some(id) => format!("{}:{id}", line.key()),
        None => {
            let mut hasher = DefaultHasher::new();
            line.to_string().hash(&mut hasher);
            format!("OTHER:{}:{:x}", line.key(), hasher.finish())
        }
    }
}

fn describe(line: &HeaderLine) -> String {
    match line.id() {
        Some(id) => format!("{}:{id}", line.key()),
        None => line.key().to_string(),
    }
}
