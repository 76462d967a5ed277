// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entity tags (RFC 7232 section 2.3).
//!
//! ```text
//! entity-tag = [ "W/" ] DQUOTE *etagc DQUOTE
//! If-Match   = "*" / 1#entity-tag
//! ```
//!
//! The grammar accepts `*` anywhere in a list; callers decide where the
//! wildcard is allowed.

use smol_str::SmolStr;

use crate::chars::{ETAG_CHARS, RFC2045_TOKEN};
use crate::error::{HeaderValueError, Result};
use crate::handler::HeaderValueHandler;
use crate::parameters::{header_text, join_values, HeaderValue};
use crate::scanner::{parse_with, Cursor, Event, Grammar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ETagValidator {
    Strong,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ETag {
    Wildcard,
    Tag {
        value: SmolStr,
        validator: ETagValidator,
    },
}

impl ETag {
    pub fn strong(value: &str) -> Result<Self> {
        Self::tag(value, ETagValidator::Strong)
    }

    pub fn weak(value: &str) -> Result<Self> {
        Self::tag(value, ETagValidator::Weak)
    }

    fn tag(value: &str, validator: ETagValidator) -> Result<Self> {
        if let Some((position, _)) = ETAG_CHARS.first_invalid(value) {
            return Err(HeaderValueError::invalid_character(value, position));
        }
        Ok(ETag::Tag {
            value: SmolStr::new(value),
            validator,
        })
    }

    /// Exactly one entity tag or `*`.
    pub fn parse(text: &str) -> Result<Self> {
        parse_with(text, ETagGrammar::new(false))?
            .pop()
            .ok_or_else(|| HeaderValueError::missing("etag", text))
    }

    /// A comma separated list; at least one element.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        let tags = parse_with(text, ETagGrammar::new(true))?;
        if tags.is_empty() {
            return Err(HeaderValueError::missing("etag", text));
        }
        Ok(tags)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            ETag::Wildcard => None,
            ETag::Tag { value, .. } => Some(value),
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(
            self,
            ETag::Tag {
                validator: ETagValidator::Weak,
                ..
            }
        )
    }

    /// RFC 7232 strong comparison: both strong and identical. A wildcard
    /// compares equal to any tag.
    pub fn strong_eq(&self, other: &ETag) -> bool {
        match (self, other) {
            (ETag::Wildcard, _) | (_, ETag::Wildcard) => true,
            (
                ETag::Tag {
                    value: a,
                    validator: ETagValidator::Strong,
                },
                ETag::Tag {
                    value: b,
                    validator: ETagValidator::Strong,
                },
            ) => a == b,
            _ => false,
        }
    }

    /// RFC 7232 weak comparison: opaque values identical.
    pub fn weak_eq(&self, other: &ETag) -> bool {
        match (self, other) {
            (ETag::Wildcard, _) | (_, ETag::Wildcard) => true,
            (ETag::Tag { value: a, .. }, ETag::Tag { value: b, .. }) => a == b,
        }
    }
}

impl HeaderValue for ETag {
    fn to_header_text(&self) -> String {
        match self {
            ETag::Wildcard => "*".to_owned(),
            ETag::Tag {
                value,
                validator: ETagValidator::Strong,
            } => format!("\"{}\"", value),
            ETag::Tag {
                value,
                validator: ETagValidator::Weak,
            } => format!("W/\"{}\"", value),
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, ETag::Wildcard)
    }
}

header_text!(ETag, ETag::parse);

/// Writes a list of tags as a header value.
pub fn format_list(tags: &[ETag]) -> String {
    join_values(tags)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Value,
    AfterValue,
}

struct ETagGrammar {
    multiple: bool,
    state: State,
    tags: Vec<ETag>,
    separated: bool,
}

impl ETagGrammar {
    fn new(multiple: bool) -> Self {
        Self {
            multiple,
            state: State::Value,
            tags: Vec::new(),
            separated: false,
        }
    }

    fn opaque(cursor: &mut Cursor<'_>, validator: ETagValidator) -> Result<ETag> {
        let span = cursor.quoted_span(&ETAG_CHARS, false)?;
        Ok(ETag::Tag {
            value: SmolStr::new(&span[1..span.len() - 1]),
            validator,
        })
    }

    fn weak(cursor: &mut Cursor<'_>) -> Result<ETag> {
        let start = cursor.position();
        let incomplete = || {
            HeaderValueError::invalid(format!(
                "incomplete weak indicator at {} in {:?}",
                start,
                cursor.text()
            ))
        };
        let rest = cursor.remaining();
        if rest.starts_with("W/*") {
            return Err(HeaderValueError::invalid("wildcard etag must be strong"));
        }
        if !rest.starts_with("W/\"") {
            return Err(incomplete());
        }
        cursor.bump();
        cursor.bump();
        Self::opaque(cursor, ETagValidator::Weak)
    }
}

impl Grammar for ETagGrammar {
    type Output = Vec<ETag>;

    fn on_event(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<()> {
        match (self.state, event) {
            (_, Event::Whitespace) => {
                cursor.bump();
            }
            (State::Value, Event::Wildcard) => {
                cursor.bump();
                if matches!(cursor.peek(), Some(c) if RFC2045_TOKEN.test(c) || c == '"') {
                    return Err(cursor.invalid_character());
                }
                self.tags.push(ETag::Wildcard);
                self.state = State::AfterValue;
            }
            (State::Value, Event::QuotedText) => {
                self.tags.push(Self::opaque(cursor, ETagValidator::Strong)?);
                self.state = State::AfterValue;
            }
            (State::Value, Event::Token) if cursor.peek() == Some('W') => {
                self.tags.push(Self::weak(cursor)?);
                self.state = State::AfterValue;
            }
            (State::AfterValue, Event::MultiValueSeparator) if self.multiple => {
                cursor.bump();
                self.separated = true;
                self.state = State::Value;
            }
            (_, Event::CommentOpen) => return Err(cursor.comment_present()),
            _ => return Err(cursor.invalid_character()),
        }
        Ok(())
    }

    fn end_of_text(self, cursor: &Cursor<'_>) -> Result<Vec<ETag>> {
        if self.state == State::Value && self.separated {
            return Err(cursor.missing("etag"));
        }
        Ok(self.tags)
    }
}

/// Handler form of [`ETag::parse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ETagHandler;

impl HeaderValueHandler for ETagHandler {
    type Value = ETag;

    fn parse(&self, text: &str) -> Result<ETag> {
        ETag::parse(text)
    }

    fn check(&self, value: &ETag) -> Result<()> {
        match value {
            ETag::Wildcard => Ok(()),
            ETag::Tag { value, validator } => ETag::tag(value, *validator).map(|_| ()),
        }
    }

    fn format(&self, value: &ETag) -> String {
        value.to_header_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_and_weak() {
        let strong = ETag::parse("\"xyzzy\"").unwrap();
        assert_eq!(strong, ETag::strong("xyzzy").unwrap());
        let weak = ETag::parse("W/\"xyzzy\"").unwrap();
        assert!(weak.is_weak());
        assert_eq!(weak.to_header_text(), "W/\"xyzzy\"");
        assert_eq!(ETag::parse("\"\"").unwrap().value(), Some(""));
    }

    #[test]
    fn wildcard() {
        assert_eq!(ETag::parse("*").unwrap(), ETag::Wildcard);
        assert!(ETag::parse("*").unwrap().is_wildcard());
    }

    #[test]
    fn weak_wildcard_rejected() {
        let err = ETag::parse("W/*").unwrap_err();
        assert_eq!(err.to_string(), "wildcard etag must be strong");
    }

    #[test]
    fn incomplete_weak_indicator() {
        for text in ["W", "W/", "W\"a\"", "W/a"] {
            let err = ETag::parse(text).unwrap_err();
            assert!(
                err.to_string().starts_with("incomplete weak indicator"),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn unquoted_tag_rejected() {
        assert!(matches!(
            ETag::parse("xyzzy"),
            Err(HeaderValueError::InvalidCharacter { position: 0, .. })
        ));
        assert!(ETag::parse("\"abc").is_err());
        assert!(ETag::parse("\"a\" \"b\"").is_err());
    }

    #[test]
    fn lists() {
        let tags = ETag::parse_list("\"xyzzy\", W/\"r2d2xxxx\", \"c3piozzzz\"").unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(
            format_list(&tags),
            "\"xyzzy\", W/\"r2d2xxxx\", \"c3piozzzz\""
        );
        assert!(ETag::parse_list("\"a\",").is_err());
        assert!(ETag::parse_list("").is_err());
    }

    #[test]
    fn comparison_functions() {
        let w1 = ETag::weak("1").unwrap();
        let w2 = ETag::weak("2").unwrap();
        let s1 = ETag::strong("1").unwrap();
        assert!(!w1.strong_eq(&w1));
        assert!(w1.weak_eq(&s1));
        assert!(!w1.weak_eq(&w2));
        assert!(s1.strong_eq(&s1.clone()));
        assert!(ETag::Wildcard.strong_eq(&s1));
    }
}
