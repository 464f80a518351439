//! VCF 4.3 percent-encoding.
//!
//! From VCF 4.3 on, characters that would collide with field and record
//! delimiters are escaped as `%XX` (two uppercase hex digits) inside
//! free-text values. Earlier versions pass text through unchanged; the
//! caller gates on [`VcfVersion::percent_encoding`](crate::version::VcfVersion::percent_encoding).
//!
//! The reserved set is `%`, `;`, `:`, `=`, `,`, newline, carriage return,
//! and tab.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::percent::{percent_encode, percent_decode};
//!
//! assert_eq!(percent_encode("a=b;c"), "a%3Db%3Bc");
//! assert_eq!(percent_decode("%3D%41").unwrap(), "=A");
//! // Untouched text borrows instead of allocating.
//! assert_eq!(percent_encode("plain"), "plain");
//! ```

use crate::error::{Result, VcfError};
use std::borrow::Cow;

/// Characters that must be escaped in 4.3+ free text.
const RESERVED: &[char] = &['%', ';', ':', '=', ',', '\n', '\r', '\t'];

fn is_reserved(c: char) -> bool {
    RESERVED.contains(&c)
}

/// Escapes reserved characters as `%XX`.
///
/// Returns a borrowed string when no escaping was needed.
pub fn percent_encode(text: &str) -> Cow<'_, str> {
    if !text.contains(is_reserved) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if is_reserved(c) {
            out.push_str(&format!("%{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Decodes every `%XX` escape to its codepoint.
///
/// Returns a borrowed string when the input contains no `%`.
///
/// # Errors
///
/// A `%` not followed by two hex digits is a fatal decode error.
pub fn percent_decode(text: &str) -> Result<Cow<'_, str>> {
    if !text.contains('%') {
        return Ok(Cow::Borrowed(text));
    }
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .ok_or_else(|| truncated_escape(text))?;
            let value = u8::from_str_radix(
                std::str::from_utf8(hex).map_err(|_| truncated_escape(text))?,
                16,
            )
            .map_err(|_| {
                VcfError::HeaderFormat(format!(
                    "invalid percent escape `%{}` in `{text}`",
                    String::from_utf8_lossy(hex)
                ))
            })?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out)
        .map(Cow::Owned)
        .map_err(|_| VcfError::HeaderFormat(format!("percent escapes in `{text}` decode to invalid UTF-8")))
}

fn truncated_escape(text: &str) -> VcfError {
    VcfError::HeaderFormat(format!("truncated percent escape at end of `{text}`"))
}
