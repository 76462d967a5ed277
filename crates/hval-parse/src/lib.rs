// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Header field lines to typed values.
//!
//! This crate binds header names to the value types of `hval-core`:
//! - [`HeaderName`]: registered names with canonical casing, unknown names kept as written
//! - [`TypedHeader`]: one variant per registered header, plus raw text for the rest
//! - [`parse_header_line`] and [`parse_header_block`]: `Name: value` lines,
//!   with obsolete line folding undone
//!
//! Accepted and rejected headers are reported to the `hval-observe` metrics
//! sink and logged at debug level.

use bytes::Bytes;
use hval_core::{HeaderValueError, Result};
use hval_observe::{parse_metrics, span_for_header};
use tracing::debug;

pub mod name;
pub mod typed;

pub use name::{known_headers, lookup, HeaderKind, HeaderName};
pub use typed::{parse_header_value, TypedHeader};

pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;

/// One parsed header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: HeaderName,
    pub value: TypedHeader,
}

impl Header {
    pub fn new(name: HeaderName, value: TypedHeader) -> Self {
        Self { name, value }
    }

    /// `Name: value` in canonical form.
    pub fn to_header_line(&self) -> String {
        parse_metrics().on_header_formatted(&self.name.to_lowercase());
        format!("{}: {}", self.name, self.value.to_header_text())
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Parses the value of `name`, reporting the outcome to the metrics sink.
pub fn parse_field(name: HeaderName, text: &str) -> Result<Header> {
    let _span = span_for_header("parse", name.as_str()).entered();
    let metric_name = name.to_lowercase();
    match parse_header_value(&name, text) {
        Ok(value) => {
            debug!(header = %name, "header parsed");
            parse_metrics().on_header_parsed(&metric_name);
            Ok(Header::new(name, value))
        }
        Err(e) => {
            debug!(header = %name, error = %e, "header rejected");
            parse_metrics().on_header_rejected(&metric_name, rejection_reason(&e));
            Err(e)
        }
    }
}

/// Parses one unfolded `Name: value` line.
pub fn parse_header_line(line: &str) -> Result<Header> {
    let (name, value) = split_field(line)?;
    let name = HeaderName::parse(name)?;
    parse_field(name, value.trim_matches(|c| c == ' ' || c == '\t'))
}

/// Parses a CRLF separated header section, stopping at the first empty line.
pub fn parse_header_block(block: &Bytes) -> Result<Vec<Header>> {
    parse_header_block_with_limit(block, DEFAULT_MAX_LINE_LENGTH)
}

/// Like [`parse_header_block`] with an explicit per-line length limit.
pub fn parse_header_block_with_limit(block: &Bytes, max_line_length: usize) -> Result<Vec<Header>> {
    let text = std::str::from_utf8(block.as_ref())
        .map_err(|e| HeaderValueError::invalid(format!("Header block is not UTF-8: {}", e)))?;
    unfold_lines(text, max_line_length)?
        .iter()
        .map(|line| parse_header_line(line))
        .collect()
}

/// Splits `text` into logical header lines, joining folded continuation
/// lines with a single space.
pub fn unfold_lines(text: &str, max_line_length: usize) -> Result<Vec<String>> {
    let mut lines: Vec<String> = Vec::new();
    for line in text.split("\r\n") {
        if line.is_empty() {
            break;
        }
        if line.len() > max_line_length {
            return Err(HeaderValueError::invalid(format!(
                "Header line longer than {} bytes",
                max_line_length
            )));
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            let current = lines.last_mut().ok_or_else(|| {
                HeaderValueError::invalid(format!("Continuation line {:?} without a header", line))
            })?;
            let continuation = line.trim();
            if !continuation.is_empty() {
                current.push(' ');
                current.push_str(continuation);
            }
            continue;
        }
        lines.push(line.to_owned());
    }
    Ok(lines)
}

fn split_field(line: &str) -> Result<(&str, &str)> {
    use nom::{bytes::complete::take_while1, character::complete::char, combinator::rest, sequence::tuple};

    let mut parser = tuple((
        take_while1::<_, _, nom::error::Error<_>>(name::is_tchar),
        char::<_, nom::error::Error<_>>(':'),
        rest::<_, nom::error::Error<_>>,
    ));
    match parser(line) {
        Ok((_, (name, _, value))) => Ok((name, value)),
        Err(_) => Err(match line.find(|c: char| !name::is_tchar(c)) {
            Some(position) => HeaderValueError::invalid_character(line, position),
            None => HeaderValueError::missing(":", line),
        }),
    }
}

/// Short, low-cardinality description of why a header was rejected.
fn rejection_reason(error: &HeaderValueError) -> &'static str {
    match error.root_cause() {
        HeaderValueError::InvalidCharacter { .. } => "invalid character",
        HeaderValueError::MissingValue { .. } => "missing value",
        HeaderValueError::EmptyToken { .. } => "empty token",
        HeaderValueError::Unterminated { .. } => "unterminated",
        HeaderValueError::CommentPresent { .. } => "comment present",
        HeaderValueError::EmptyList { .. } => "empty list",
        HeaderValueError::Invalid(_) => "invalid",
        HeaderValueError::NotAcceptable(_) => "not acceptable",
        HeaderValueError::TypeMismatch { .. } => "type mismatch",
        HeaderValueError::Conversion { .. } => "conversion",
    }
}
