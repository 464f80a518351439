//! Header metadata line model.
//!
//! A VCF metadata line is either unstructured (`##source=myprog`) or
//! structured (`##FILTER=<ID=q10,Description="Quality below 10">`). INFO
//! and FORMAT lines are "compound": on top of the structured attributes
//! they carry a decoded value [`ValueType`] and a cardinality
//! [`FieldCount`] that drive record parsing and serialization.
//!
//! Lines are immutable after construction. Repairs (such as coercing a
//! `Type=Flag` line's `Number` to 0) build a new line rather than editing
//! in place.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::header::line::{HeaderLine, ValueType, FieldCount};
//! use vcfcodec::version::VcfVersion;
//!
//! let line = HeaderLine::parse(
//!     r#"INFO=<ID=AF,Number=A,Type=Float,Description="Allele frequency">"#,
//!     VcfVersion::V4_2,
//! ).unwrap();
//!
//! let compound = line.as_compound().unwrap();
//! assert_eq!(compound.id(), "AF");
//! assert_eq!(compound.value_type(), ValueType::Float);
//! assert_eq!(compound.count_spec(), FieldCount::AltAlleles);
//! // One value per alternate allele:
//! assert_eq!(compound.count(3, 2), 2);
//! ```

use crate::error::{Result, VcfError};
use crate::genotype::expected_genotype_count;
use crate::version::VcfVersion;
use std::fmt;

/// Attribute values that always serialize quoted, regardless of content.
/// `Description` quoting is legacy behavior and version-independent.
const ALWAYS_QUOTED: &[&str] = &["Description"];

/// Whether a compound line declares INFO or FORMAT semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundKind {
    /// Site-level annotations (the INFO column).
    Info,
    /// Per-sample annotations (the FORMAT column).
    Format,
}

impl CompoundKind {
    /// The metadata key for this kind.
    pub fn key(self) -> &'static str {
        match self {
            CompoundKind::Info => "INFO",
            CompoundKind::Format => "FORMAT",
        }
    }

    /// Map a metadata key to a compound kind, if it is one.
    pub fn from_key(key: &str) -> Option<CompoundKind> {
        match key {
            "INFO" => Some(CompoundKind::Info),
            "FORMAT" => Some(CompoundKind::Format),
            _ => None,
        }
    }
}

/// Declared type of an INFO/FORMAT value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Signed integer.
    Integer,
    /// Floating point.
    Float,
    /// Free-form string.
    String,
    /// Single character.
    Character,
    /// Boolean presence flag (INFO only, always `Number=0`).
    Flag,
}

impl ValueType {
    /// Parse the `Type` attribute value.
    pub fn from_str(text: &str) -> Option<ValueType> {
        match text {
            "Integer" => Some(ValueType::Integer),
            "Float" => Some(ValueType::Float),
            "String" => Some(ValueType::String),
            "Character" => Some(ValueType::Character),
            "Flag" => Some(ValueType::Flag),
            _ => None,
        }
    }

    /// The attribute value as written in a header line.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::String => "String",
            ValueType::Character => "Character",
            ValueType::Flag => "Flag",
        }
    }
}

/// Declared cardinality (`Number`) of an INFO/FORMAT field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCount {
    /// A fixed, non-negative number of values.
    Fixed(u32),
    /// One value per alternate allele (`A`).
    AltAlleles,
    /// One value per allele, reference included (`R`).
    Alleles,
    /// One value per possible genotype (`G`).
    Genotypes,
    /// Unknown or unbounded (`.`).
    Unbounded,
}

impl FieldCount {
    /// Parse the `Number` attribute value, honoring the version that
    /// introduced each symbolic letter.
    pub fn parse(text: &str, version: VcfVersion) -> Option<FieldCount> {
        match text {
            "A" if version.symbolic_count_allowed('A') => Some(FieldCount::AltAlleles),
            "R" if version.symbolic_count_allowed('R') => Some(FieldCount::Alleles),
            "G" if version.symbolic_count_allowed('G') => Some(FieldCount::Genotypes),
            "." => Some(FieldCount::Unbounded),
            _ => text.parse::<u32>().ok().map(FieldCount::Fixed),
        }
    }

    /// The attribute value as written in a header line.
    pub fn to_header_value(self) -> String {
        match self {
            FieldCount::Fixed(n) => n.to_string(),
            FieldCount::AltAlleles => "A".to_string(),
            FieldCount::Alleles => "R".to_string(),
            FieldCount::Genotypes => "G".to_string(),
            FieldCount::Unbounded => ".".to_string(),
        }
    }

    /// Concrete value count for a record with `allele_count` total alleles
    /// (reference included) and the given ploidy.
    ///
    /// Returns `-1` for [`FieldCount::Unbounded`]. Ploidy defaults to 2
    /// when the caller passes `None`.
    pub fn count(self, allele_count: usize, ploidy: Option<u32>) -> i64 {
        match self {
            FieldCount::Fixed(n) => i64::from(n),
            FieldCount::Unbounded => -1,
            FieldCount::AltAlleles => allele_count as i64 - 1,
            FieldCount::Alleles => allele_count as i64,
            FieldCount::Genotypes => {
                expected_genotype_count(allele_count, ploidy.unwrap_or(2)) as i64
            }
        }
    }
}

/// A structured header line: ordered attributes with a leading `ID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredLine {
    key: String,
    attributes: Vec<(String, String)>,
}

impl StructuredLine {
    /// Build from a key and pre-validated attribute list.
    ///
    /// # Errors
    ///
    /// The first attribute must be `ID`.
    pub fn new(key: impl Into<String>, attributes: Vec<(String, String)>) -> Result<Self> {
        let key = key.into();
        match attributes.first() {
            Some((name, _)) if name == "ID" => Ok(StructuredLine { key, attributes }),
            _ => Err(VcfError::header_parse(
                format!("{key}=<...>"),
                "first attribute of a structured header line must be ID",
            )),
        }
    }

    /// Parse the `<A=v,B="v,v",...>` body of a structured line.
    pub fn parse(key: &str, body: &str) -> Result<Self> {
        let inner = body
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(|| {
                VcfError::header_parse(
                    format!("{key}={body}"),
                    "structured header line must be enclosed in <...>",
                )
            })?;
        let attributes = split_attributes(inner)
            .map_err(|reason| VcfError::header_parse(format!("{key}={body}"), reason))?;
        StructuredLine::new(key, attributes)
    }

    /// The metadata key (`FILTER`, `contig`, ...).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The line's unique identifier within its key namespace.
    pub fn id(&self) -> &str {
        // Constructor guarantees the first attribute is ID.
        &self.attributes[0].1
    }

    /// Attribute lookup by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in declaration order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// A copy with one attribute replaced (or appended). The original is
    /// untouched; header lines are immutable.
    pub fn with_attribute(&self, name: &str, value: impl Into<String>) -> StructuredLine {
        let mut attributes = self.attributes.clone();
        let value = value.into();
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => attributes.push((name.to_string(), value)),
        }
        StructuredLine {
            key: self.key.clone(),
            attributes,
        }
    }
}

impl fmt::Display for StructuredLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "##{}=<", self.key)?;
        for (i, (name, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if needs_quoting(name, value) {
                write!(f, "{name}=\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))?;
            } else {
                write!(f, "{name}={value}")?;
            }
        }
        f.write_str(">")
    }
}

/// An INFO or FORMAT declaration: structured attributes plus decoded
/// `Type` and `Number`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundLine {
    kind: CompoundKind,
    line: StructuredLine,
    value_type: ValueType,
    count: FieldCount,
}

impl CompoundLine {
    /// Decode `Number` and `Type` out of a structured INFO/FORMAT line.
    ///
    /// A missing or unrecognized `Type`/`Number` is a hard parse failure.
    /// A `Type=Flag` line whose `Number` is not 0 is repaired to
    /// `Number=0` with a warning.
    pub fn from_structured(
        kind: CompoundKind,
        line: StructuredLine,
        version: VcfVersion,
    ) -> Result<Self> {
        let number = line.get("Number").ok_or_else(|| {
            VcfError::header_parse(line.to_string(), "missing Number attribute")
        })?;
        let count = FieldCount::parse(number, version).ok_or_else(|| {
            VcfError::header_parse(
                line.to_string(),
                format!("unrecognized Number value `{number}` for {version}"),
            )
        })?;
        let type_text = line
            .get("Type")
            .ok_or_else(|| VcfError::header_parse(line.to_string(), "missing Type attribute"))?;
        let value_type = ValueType::from_str(type_text).ok_or_else(|| {
            VcfError::header_parse(
                line.to_string(),
                format!("unrecognized Type value `{type_text}`"),
            )
        })?;

        // Flag fields carry no value, so their count must be 0 at every
        // version. Repair rather than reject: historical writers got this
        // wrong routinely.
        let (line, count) = if value_type == ValueType::Flag && count != FieldCount::Fixed(0) {
            tracing::warn!(
                id = line.id(),
                "{} line declares Type=Flag with Number={number}; coercing Number to 0",
                kind.key()
            );
            (line.with_attribute("Number", "0"), FieldCount::Fixed(0))
        } else {
            (line, count)
        };

        Ok(CompoundLine {
            kind,
            line,
            value_type,
            count,
        })
    }

    /// INFO or FORMAT.
    pub fn kind(&self) -> CompoundKind {
        self.kind
    }

    /// The field identifier.
    pub fn id(&self) -> &str {
        self.line.id()
    }

    /// The `Description` attribute, if present.
    pub fn description(&self) -> Option<&str> {
        self.line.get("Description")
    }

    /// The declared value type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// The declared cardinality.
    pub fn count_spec(&self) -> FieldCount {
        self.count
    }

    /// Concrete value count for a record with `allele_count` alleles and
    /// ploidy 2; see [`FieldCount::count`].
    pub fn count(&self, allele_count: usize, ploidy: u32) -> i64 {
        self.count.count(allele_count, Some(ploidy))
    }

    /// The underlying structured line.
    pub fn structured(&self) -> &StructuredLine {
        &self.line
    }

    /// A copy with the given type and count, for merge promotion.
    pub(crate) fn promoted(&self, value_type: ValueType, count: FieldCount) -> CompoundLine {
        let line = self
            .line
            .with_attribute("Number", count.to_header_value())
            .with_attribute("Type", value_type.as_str());
        CompoundLine {
            kind: self.kind,
            line,
            value_type,
            count,
        }
    }
}

/// A single parsed metadata line.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderLine {
    /// Free-text line, e.g. `##source=myprogram`.
    Unstructured {
        /// Metadata key (text before the first `=`).
        key: String,
        /// Everything after the first `=`.
        value: String,
    },
    /// Structured line without INFO/FORMAT type semantics
    /// (FILTER, ALT, contig, PEDIGREE, META, SAMPLE, unknown keys).
    Simple(StructuredLine),
    /// INFO or FORMAT declaration.
    Compound(CompoundLine),
}

impl HeaderLine {
    /// Parse the text after the `##` prefix into a header line.
    ///
    /// # Errors
    ///
    /// Fails on missing `=`, malformed `<...>` syntax, a structured line
    /// without a leading `ID`, or an INFO/FORMAT line with a bad
    /// `Number`/`Type`.
    pub fn parse(text: &str, version: VcfVersion) -> Result<HeaderLine> {
        let (key, value) = text
            .split_once('=')
            .ok_or_else(|| VcfError::header_parse(text, "expected KEY=value"))?;
        if key.is_empty() {
            return Err(VcfError::header_parse(text, "empty metadata key"));
        }
        if value.starts_with('<') {
            let line = StructuredLine::parse(key, value)?;
            match CompoundKind::from_key(key) {
                Some(kind) => Ok(HeaderLine::Compound(CompoundLine::from_structured(
                    kind, line, version,
                )?)),
                None => Ok(HeaderLine::Simple(line)),
            }
        } else {
            Ok(HeaderLine::Unstructured {
                key: key.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// The metadata key.
    pub fn key(&self) -> &str {
        match self {
            HeaderLine::Unstructured { key, .. } => key,
            HeaderLine::Simple(line) => line.key(),
            HeaderLine::Compound(line) => line.structured().key(),
        }
    }

    /// The ID for structured lines, `None` for unstructured ones.
    pub fn id(&self) -> Option<&str> {
        match self {
            HeaderLine::Unstructured { .. } => None,
            HeaderLine::Simple(line) => Some(line.id()),
            HeaderLine::Compound(line) => Some(line.id()),
        }
    }

    /// Downcast helper.
    pub fn as_compound(&self) -> Option<&CompoundLine> {
        match self {
            HeaderLine::Compound(line) => Some(line),
            _ => None,
        }
    }

    /// Downcast helper.
    pub fn as_structured(&self) -> Option<&StructuredLine> {
        match self {
            HeaderLine::Simple(line) => Some(line),
            HeaderLine::Compound(line) => Some(line.structured()),
            _ => None,
        }
    }

    /// Validate this line against a target version.
    ///
    /// Returns the violation message rather than an error so callers can
    /// collect violations across a whole collection, or downgrade them to
    /// warnings below 4.3.
    pub fn validate(&self, version: VcfVersion) -> std::result::Result<(), String> {
        match self {
            HeaderLine::Unstructured { .. } => Ok(()),
            HeaderLine::Simple(line) => {
                if line.key() == "contig" && !is_valid_contig_id(line.id()) {
                    return Err(format!(
                        "contig ID `{}` contains characters not permitted by {version}",
                        line.id()
                    ));
                }
                Ok(())
            }
            HeaderLine::Compound(line) => {
                if !is_valid_field_id(line.id()) {
                    return Err(format!(
                        "{} ID `{}` does not match [A-Za-z_][0-9A-Za-z_.]*",
                        line.kind().key(),
                        line.id()
                    ));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for HeaderLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderLine::Unstructured { key, value } => write!(f, "##{key}={value}"),
            HeaderLine::Simple(line) => line.fmt(f),
            HeaderLine::Compound(line) => line.structured().fmt(f),
        }
    }
}

/// INFO/FORMAT ID rule: `[A-Za-z_][0-9A-Za-z_.]*`.
pub fn is_valid_field_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Contig ID rule: printable ASCII without whitespace or the punctuation
/// that collides with header syntax, and no leading `*` or `=`.
pub fn is_valid_contig_id(id: &str) -> bool {
    if id.is_empty() || id.starts_with('*') || id.starts_with('=') {
        return false;
    }
    id.chars().all(|c| {
        c.is_ascii_graphic()
            && !matches!(
                c,
                '\\' | ',' | '"' | '\'' | '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>'
            )
    })
}

fn needs_quoting(name: &str, value: &str) -> bool {
    ALWAYS_QUOTED.contains(&name) || value.contains(',') || value.contains(' ')
}

/// Split `A=v,B="v,v",...` on top-level commas, respecting quotes and
/// backslash escapes, preserving attribute order.
fn split_attributes(inner: &str) -> std::result::Result<Vec<(String, String)>, String> {
    let mut attributes = Vec::new();
    let mut name = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut in_quotes = false;
    let mut escaped = false;

    let mut push = |name: &mut String, value: &mut String, in_value: bool| {
        if name.is_empty() && value.is_empty() && !in_value {
            return Err("empty attribute".to_string());
        }
        if !in_value {
            return Err(format!("attribute `{name}` has no value"));
        }
        attributes.push((std::mem::take(name), std::mem::take(value)));
        Ok(())
    };

    for c in inner.chars() {
        if escaped {
            value.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' if in_value => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                push(&mut name, &mut value, in_value)?;
                in_value = false;
            }
            '=' if !in_value => in_value = true,
            _ if in_value => value.push(c),
            _ => name.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    push(&mut name, &mut value, in_value)?;
    Ok(attributes)
}
