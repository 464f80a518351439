//! Codec configuration.
//!
//! Strictness and tolerance knobs live here instead of process-wide
//! globals. Each decoder/encoder/merger instance is constructed with its
//! own copy, so tests and concurrent pipelines cannot interfere with one
//! another.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::config::{DecodeOptions, EncodeOptions};
//!
//! let strict = DecodeOptions {
//!     strict_ids: true,
//!     strict_duplicates: true,
//! };
//! assert!(!DecodeOptions::default().strict_ids);
//!
//! let lenient = EncodeOptions {
//!     allow_undeclared: true,
//!     ..EncodeOptions::default()
//! };
//! assert!(lenient.allow_undeclared);
//! ```

/// Options controlling header and record decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Fail (rather than warn) on ID character-set violations at VCF 4.3+.
    ///
    /// Below 4.3 violations always warn regardless of this flag.
    pub strict_ids: bool,

    /// Fail (rather than warn-and-keep-first) when two structured header
    /// lines collide on the same `(key, ID)`.
    pub strict_duplicates: bool,
}

/// Options controlling record encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Tolerate INFO/FORMAT/FILTER keys that are not declared in the
    /// header. Off by default: the encoder fails loudly on the first
    /// undeclared key it meets.
    pub allow_undeclared: bool,

    /// Emit trailing missing-value (`.`) genotype fields instead of
    /// trimming them.
    pub keep_trailing_fields: bool,
}
