// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Range` and `Content-Range` (RFC 7233).
//!
//! ```text
//! Range         = range-unit "=" range-spec *( OWS "," OWS range-spec )
//! range-spec    = first-pos "-" [ last-pos ] / "-" suffix-length
//! Content-Range = range-unit SP ( first-pos "-" last-pos / "*" ) "/" ( length / "*" )
//! ```

use smol_str::SmolStr;

use crate::chars::RFC2045_TOKEN;
use crate::error::{HeaderValueError, Result};
use crate::parameters::{header_text, HeaderValue};
use crate::scanner::{parse_with, Cursor, Event, Grammar};

pub const BYTES: &str = "bytes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `first-last`, both inclusive.
    FromTo(u64, u64),
    /// `first-`
    From(u64),
    /// `-length`: the final `length` units.
    Suffix(u64),
}

impl RangeSpec {
    /// Inclusive bounds within a representation of `length` units, or `None`
    /// when the spec is not satisfiable.
    pub fn to_bounds(&self, length: u64) -> Option<(u64, u64)> {
        if length == 0 {
            return None;
        }
        match *self {
            RangeSpec::FromTo(first, last) if first < length => Some((first, last.min(length - 1))),
            RangeSpec::From(first) if first < length => Some((first, length - 1)),
            RangeSpec::Suffix(suffix) if suffix > 0 => Some((length.saturating_sub(suffix), length - 1)),
            _ => None,
        }
    }
}

impl std::fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeSpec::FromTo(first, last) => write!(f, "{}-{}", first, last),
            RangeSpec::From(first) => write!(f, "{}-", first),
            RangeSpec::Suffix(suffix) => write!(f, "-{}", suffix),
        }
    }
}

fn digits(cursor: &mut Cursor<'_>, what: &'static str) -> Result<u64> {
    let start = cursor.position();
    let text = cursor.take_while(|c| c.is_ascii_digit());
    if text.is_empty() {
        return Err(match cursor.peek() {
            None => cursor.missing(what),
            Some(_) => cursor.invalid_character(),
        });
    }
    text.parse().map_err(|_| {
        HeaderValueError::invalid(format!(
            "Number too large at {} in {:?}",
            start,
            cursor.text()
        ))
    })
}

#[derive(Debug)]
enum State {
    Unit,
    Spec,
    AfterSpec,
}

struct RangeGrammar {
    state: State,
    unit: Option<SmolStr>,
    specs: Vec<RangeSpec>,
}

impl RangeGrammar {
    fn spec(cursor: &mut Cursor<'_>) -> Result<RangeSpec> {
        if cursor.consume_if('-') {
            return Ok(RangeSpec::Suffix(digits(cursor, "suffix length")?));
        }
        let first = digits(cursor, "first position")?;
        cursor.expect('-', "range separator")?;
        if !matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
            return Ok(RangeSpec::From(first));
        }
        let last = digits(cursor, "last position")?;
        if last < first {
            return Err(HeaderValueError::invalid(format!(
                "Range end {} before start {} in {:?}",
                last,
                first,
                cursor.text()
            )));
        }
        Ok(RangeSpec::FromTo(first, last))
    }
}

impl Grammar for RangeGrammar {
    type Output = Range;

    fn on_event(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<()> {
        match (&self.state, event) {
            (State::Unit, Event::Token) => {
                let unit = cursor.token(&RFC2045_TOKEN);
                self.unit = Some(SmolStr::new(unit.to_ascii_lowercase()));
                cursor.expect('=', "range set")?;
                self.state = State::Spec;
            }
            (State::Spec | State::AfterSpec, Event::Whitespace) => {
                cursor.bump();
            }
            (State::Spec, Event::Token) => {
                self.specs.push(Self::spec(cursor)?);
                self.state = State::AfterSpec;
            }
            (State::AfterSpec, Event::MultiValueSeparator) => {
                cursor.bump();
                self.state = State::Spec;
            }
            _ => return Err(cursor.invalid_character()),
        }
        Ok(())
    }

    fn end_of_text(self, cursor: &Cursor<'_>) -> Result<Range> {
        match (self.state, self.unit) {
            (State::AfterSpec, Some(unit)) => Ok(Range {
                unit,
                specs: self.specs,
            }),
            (State::Unit, _) => Err(cursor.missing("range unit")),
            _ => Err(cursor.missing("range spec")),
        }
    }
}

/// `Range`: a unit and one or more specs in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    unit: SmolStr,
    specs: Vec<RangeSpec>,
}

impl Range {
    pub fn bytes(specs: Vec<RangeSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(HeaderValueError::empty_list("Range"));
        }
        for spec in &specs {
            if let RangeSpec::FromTo(first, last) = spec {
                if last < first {
                    return Err(HeaderValueError::invalid(format!("Invalid range {}", spec)));
                }
            }
        }
        Ok(Self {
            unit: SmolStr::new_inline(BYTES),
            specs,
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        parse_with(
            text,
            RangeGrammar {
                state: State::Unit,
                unit: None,
                specs: Vec::new(),
            },
        )
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn specs(&self) -> &[RangeSpec] {
        &self.specs
    }

    /// Satisfiable bounds for a representation of `length` units, in
    /// request order.
    pub fn satisfiable(&self, length: u64) -> Vec<(u64, u64)> {
        self.specs
            .iter()
            .filter_map(|spec| spec.to_bounds(length))
            .collect()
    }
}

impl HeaderValue for Range {
    fn to_header_text(&self) -> String {
        let specs: Vec<String> = self.specs.iter().map(RangeSpec::to_string).collect();
        format!("{}={}", self.unit, specs.join(", "))
    }
}

header_text!(Range, Range::parse);

/// `Content-Range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRange {
    unit: SmolStr,
    range: Option<(u64, u64)>,
    complete_length: Option<u64>,
}

impl ContentRange {
    pub fn new(unit: &str, range: Option<(u64, u64)>, complete_length: Option<u64>) -> Result<Self> {
        if let Some((position, _)) = RFC2045_TOKEN.first_invalid(unit) {
            return Err(HeaderValueError::invalid_character(unit, position));
        }
        if unit.is_empty() {
            return Err(HeaderValueError::missing("range unit", unit));
        }
        let content_range = Self {
            unit: SmolStr::new(unit.to_ascii_lowercase()),
            range,
            complete_length,
        };
        content_range.check()?;
        Ok(content_range)
    }

    fn check(&self) -> Result<()> {
        match (self.range, self.complete_length) {
            (None, None) => Err(HeaderValueError::invalid(
                "Content-Range needs a range or a complete length",
            )),
            (Some((first, last)), _) if last < first => Err(HeaderValueError::invalid(format!(
                "Range end {} before start {}",
                last, first
            ))),
            (Some((_, last)), Some(length)) if last >= length => Err(HeaderValueError::invalid(
                format!("Range end {} not below complete length {}", last, length),
            )),
            _ => Ok(()),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut cursor = Cursor::new(text);
        let unit = cursor.required_token(&RFC2045_TOKEN, "range unit")?;
        cursor.expect(' ', "range")?;
        let range = if cursor.consume_if('*') {
            None
        } else {
            let first = digits(&mut cursor, "first position")?;
            cursor.expect('-', "last position")?;
            let last = digits(&mut cursor, "last position")?;
            Some((first, last))
        };
        cursor.expect('/', "complete length")?;
        let complete_length = if cursor.consume_if('*') {
            None
        } else {
            Some(digits(&mut cursor, "complete length")?)
        };
        cursor.expect_end()?;
        Self::new(unit, range, complete_length)
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn range(&self) -> Option<(u64, u64)> {
        self.range
    }

    pub fn complete_length(&self) -> Option<u64> {
        self.complete_length
    }

    /// `*/length`, sent with 416 responses.
    pub fn is_unsatisfied(&self) -> bool {
        self.range.is_none()
    }
}

impl HeaderValue for ContentRange {
    fn to_header_text(&self) -> String {
        let range = match self.range {
            Some((first, last)) => format!("{}-{}", first, last),
            None => "*".to_owned(),
        };
        let length = match self.complete_length {
            Some(length) => length.to_string(),
            None => "*".to_owned(),
        };
        format!("{} {}/{}", self.unit, range, length)
    }
}

header_text!(ContentRange, ContentRange::parse);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_spec_forms() {
        let range = Range::parse("bytes=0-499, 500-, -200").unwrap();
        assert_eq!(range.unit(), "bytes");
        assert_eq!(
            range.specs(),
            &[
                RangeSpec::FromTo(0, 499),
                RangeSpec::From(500),
                RangeSpec::Suffix(200)
            ]
        );
        assert_eq!(range.to_header_text(), "bytes=0-499, 500-, -200");
    }

    #[test]
    fn rejects_malformed_ranges() {
        assert!(Range::parse("bytes=500-100").is_err());
        assert!(Range::parse("bytes=").is_err());
        assert!(Range::parse("bytes=0-1,").is_err());
        assert!(Range::parse("bytes").is_err());
        assert!(Range::parse("bytes=a-b").is_err());
        assert!(Range::parse("").is_err());
    }

    #[test]
    fn satisfiable_bounds() {
        let range = Range::parse("bytes=0-99, 9000-, -50, 200-300").unwrap();
        assert_eq!(range.satisfiable(250), vec![(0, 99), (200, 249), (200, 249)]);
        assert!(Range::bytes(vec![RangeSpec::Suffix(0)]).unwrap().satisfiable(10).is_empty());
    }

    #[test]
    fn content_range_forms() {
        let full = ContentRange::parse("bytes 0-499/1234").unwrap();
        assert_eq!(full.range(), Some((0, 499)));
        assert_eq!(full.complete_length(), Some(1234));
        assert_eq!(full.to_header_text(), "bytes 0-499/1234");

        let unsatisfied = ContentRange::parse("bytes */1234").unwrap();
        assert!(unsatisfied.is_unsatisfied());
        assert_eq!(unsatisfied.to_header_text(), "bytes */1234");

        let unknown = ContentRange::parse("bytes 0-499/*").unwrap();
        assert_eq!(unknown.complete_length(), None);
    }

    #[test]
    fn content_range_validation() {
        assert!(ContentRange::parse("bytes */*").is_err());
        assert!(ContentRange::parse("bytes 10-5/100").is_err());
        assert!(ContentRange::parse("bytes 0-100/100").is_err());
        assert!(ContentRange::parse("bytes 0-1/10 ").is_err());
    }
}
