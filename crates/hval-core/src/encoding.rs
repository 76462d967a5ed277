// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content codings: `Accept-Encoding` and `Content-Encoding`.

use std::hash::{Hash, Hasher};

use once_cell::sync::Lazy;
use smol_str::SmolStr;

use crate::chars::RFC2045_TOKEN;
use crate::error::{HeaderValueError, Result};
use crate::handler::{QWeightHandler, DEFAULT_STRING};
use crate::parameters::{
    header_text, join_values, parse_list, write_with_parameters, HeaderParameterName,
    HeaderValue, HeaderValueWithParameters, ParameterNameRegistry, Parameters, ValueGrammar,
};
use crate::qweight::{sort_by_q_weight, QWeight};
use crate::scanner::{Cursor, Event};

/// A content coding token, or `*` in `Accept-Encoding`. Compared without
/// regard to case.
#[derive(Debug, Clone, Eq)]
pub enum ContentCoding {
    Wildcard,
    Token(SmolStr),
}

impl ContentCoding {
    pub const GZIP: ContentCoding = ContentCoding::Token(SmolStr::new_inline("gzip"));
    pub const DEFLATE: ContentCoding = ContentCoding::Token(SmolStr::new_inline("deflate"));
    pub const BR: ContentCoding = ContentCoding::Token(SmolStr::new_inline("br"));
    pub const COMPRESS: ContentCoding = ContentCoding::Token(SmolStr::new_inline("compress"));
    pub const IDENTITY: ContentCoding = ContentCoding::Token(SmolStr::new_inline("identity"));

    pub fn parse(text: &str) -> Result<Self> {
        if text == "*" {
            return Ok(ContentCoding::Wildcard);
        }
        if text.is_empty() {
            return Err(HeaderValueError::missing("content coding", text));
        }
        if let Some((position, _)) = RFC2045_TOKEN.first_invalid(text) {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        Ok(ContentCoding::Token(SmolStr::new(text)))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContentCoding::Wildcard => "*",
            ContentCoding::Token(token) => token,
        }
    }

    pub fn matches(&self, other: &ContentCoding) -> bool {
        match (self, other) {
            (ContentCoding::Wildcard, _) | (_, ContentCoding::Wildcard) => true,
            (ContentCoding::Token(a), ContentCoding::Token(b)) => a.eq_ignore_ascii_case(b),
        }
    }
}

impl PartialEq for ContentCoding {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContentCoding::Wildcard, ContentCoding::Wildcard) => true,
            (ContentCoding::Token(a), ContentCoding::Token(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl Hash for ContentCoding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.as_str().bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl HeaderValue for ContentCoding {
    fn to_header_text(&self) -> String {
        self.as_str().to_owned()
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, ContentCoding::Wildcard)
    }
}

header_text!(ContentCoding, ContentCoding::parse);

pub static Q: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("q", &QWeightHandler));

pub static ACCEPT_ENCODING_PARAMETERS: Lazy<ParameterNameRegistry> = Lazy::new(|| {
    ParameterNameRegistry::new("Accept-Encoding", [Q.clone()], &DEFAULT_STRING)
});

/// One element of `Accept-Encoding`, extension parameters included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptEncodingValue {
    coding: ContentCoding,
    parameters: Parameters,
}

impl AcceptEncodingValue {
    pub fn new(coding: ContentCoding) -> Self {
        Self {
            coding,
            parameters: Parameters::new(),
        }
    }

    pub fn coding(&self) -> &ContentCoding {
        &self.coding
    }
}

impl HeaderValue for AcceptEncodingValue {
    fn to_header_text(&self) -> String {
        write_with_parameters(self.coding.as_str(), &self.parameters, ";")
    }

    fn is_wildcard(&self) -> bool {
        self.coding.is_wildcard()
    }
}

impl HeaderValueWithParameters for AcceptEncodingValue {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Result<Self> {
        Ok(Self {
            coding: self.coding.clone(),
            parameters,
        })
    }
}

/// Shared by both headers; `Content-Encoding` turns everything but the bare
/// token off.
struct EncodingGrammar<'r> {
    registry: &'r ParameterNameRegistry,
    accept: bool,
}

impl ValueGrammar for EncodingGrammar<'_> {
    type Head = ContentCoding;
    type Value = AcceptEncodingValue;

    fn registry(&self) -> &ParameterNameRegistry {
        self.registry
    }

    fn allow_multiple_values(&self) -> bool {
        true
    }

    fn allow_comments(&self) -> bool {
        self.accept
    }

    fn allow_parameters(&self) -> bool {
        self.accept
    }

    fn head(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<ContentCoding> {
        if event == Event::Wildcard && !self.accept {
            return Err(cursor.invalid_character());
        }
        ContentCoding::parse(cursor.required_token(&RFC2045_TOKEN, "content coding")?)
    }

    fn build(&mut self, coding: ContentCoding, parameters: Parameters) -> Result<AcceptEncodingValue> {
        Ok(AcceptEncodingValue { coding, parameters })
    }
}

/// `Accept-Encoding`, ordered by descending q weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptEncoding(Vec<AcceptEncodingValue>);

impl AcceptEncoding {
    pub fn parse(text: &str) -> Result<Self> {
        let mut values = parse_list(
            text,
            EncodingGrammar {
                registry: &ACCEPT_ENCODING_PARAMETERS,
                accept: true,
            },
        )?;
        sort_by_q_weight(&mut values, |v| v.q_weight());
        Ok(Self(values))
    }

    pub fn values(&self) -> &[AcceptEncodingValue] {
        &self.0
    }

    /// Weight given to `coding`: an exact entry first, then `*`. Identity
    /// is acceptable unless excluded; anything else unlisted weighs zero.
    pub fn q_weight_of(&self, coding: &ContentCoding) -> QWeight {
        let exact = self.0.iter().find(|v| v.coding == *coding);
        let wildcard = || self.0.iter().find(|v| v.coding.is_wildcard());
        match exact.or_else(wildcard) {
            Some(value) => value.q_weight(),
            None if *coding == ContentCoding::IDENTITY => QWeight::DEFAULT,
            None => QWeight::MIN,
        }
    }

    pub fn accepts(&self, coding: &ContentCoding) -> bool {
        !self.q_weight_of(coding).is_zero()
    }

    /// The acceptable coding from `available` with the highest weight;
    /// earlier entries of `available` win ties.
    pub fn best_match<'a>(&self, available: &'a [ContentCoding]) -> Option<&'a ContentCoding> {
        let mut best: Option<(&ContentCoding, QWeight)> = None;
        for coding in available {
            let q = self.q_weight_of(coding);
            if q.is_zero() {
                continue;
            }
            if best.map_or(true, |(_, best_q)| q > best_q) {
                best = Some((coding, q));
            }
        }
        best.map(|(coding, _)| coding)
    }
}

impl HeaderValue for AcceptEncoding {
    fn to_header_text(&self) -> String {
        join_values(&self.0)
    }
}

header_text!(AcceptEncoding, AcceptEncoding::parse);

/// `Content-Encoding`: codings in the order they were applied. Never empty,
/// no wildcard, parameters or comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEncoding(Vec<ContentCoding>);

impl ContentEncoding {
    pub fn new(codings: Vec<ContentCoding>) -> Result<Self> {
        if codings.is_empty() {
            return Err(HeaderValueError::empty_list("Content-Encoding"));
        }
        if codings.iter().any(HeaderValue::is_wildcard) {
            return Err(HeaderValueError::invalid("Wildcard not allowed in Content-Encoding"));
        }
        Ok(Self(codings))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let values = parse_list(
            text,
            EncodingGrammar {
                registry: &ACCEPT_ENCODING_PARAMETERS,
                accept: false,
            },
        )?;
        Self::new(values.into_iter().map(|v| v.coding).collect())
    }

    pub fn codings(&self) -> &[ContentCoding] {
        &self.0
    }
}

impl HeaderValue for ContentEncoding {
    fn to_header_text(&self) -> String {
        join_values(&self.0)
    }
}

header_text!(ContentEncoding, ContentEncoding::parse);
