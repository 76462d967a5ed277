// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Charset names and the `Accept-Charset` header.
//!
//! ```text
//! Accept-Charset = 1#( ( charset / "*" ) [ weight ] )
//! ```

use std::hash::{Hash, Hasher};

use once_cell::sync::Lazy;
use smol_str::SmolStr;

use crate::chars::RFC2045_TOKEN;
use crate::error::{HeaderValueError, Result};
use crate::handler::{HeaderValueHandler, QWeightHandler, DEFAULT_STRING};
use crate::parameters::{
    header_text, parse_list, write_with_parameters, HeaderParameterName, HeaderValue,
    HeaderValueWithParameters, ParameterNameRegistry, Parameters, ValueGrammar,
};
use crate::qweight::{sort_by_q_weight, QWeight};
use crate::scanner::{Cursor, Event};

/// A charset name, or `*` in `Accept-Charset`.
///
/// Names compare without regard to case and keep the spelling they were
/// parsed with.
#[derive(Debug, Clone, Eq)]
pub enum CharsetName {
    Wildcard,
    Named(SmolStr),
}

impl CharsetName {
    pub const UTF_8: CharsetName = CharsetName::Named(SmolStr::new_inline("UTF-8"));
    pub const US_ASCII: CharsetName = CharsetName::Named(SmolStr::new_inline("US-ASCII"));
    pub const ISO_8859_1: CharsetName = CharsetName::Named(SmolStr::new_inline("ISO-8859-1"));
    pub const UTF_16: CharsetName = CharsetName::Named(SmolStr::new_inline("UTF-16"));

    pub fn parse(text: &str) -> Result<Self> {
        if text == "*" {
            return Ok(CharsetName::Wildcard);
        }
        Self::named(text)
    }

    /// A non-wildcard name.
    pub fn named(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(HeaderValueError::missing("charset", text));
        }
        if let Some((position, _)) = RFC2045_TOKEN.first_invalid(text) {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        if text == "*" {
            return Err(HeaderValueError::invalid_character(text, 0));
        }
        Ok(CharsetName::Named(SmolStr::new(text)))
    }

    pub fn as_str(&self) -> &str {
        match self {
            CharsetName::Wildcard => "*",
            CharsetName::Named(name) => name,
        }
    }

    /// Charsets this crate can encode and decode.
    pub fn is_supported(&self) -> bool {
        self.encoding().is_some()
    }

    /// Wildcard matches every charset; names match ignoring case.
    pub fn matches(&self, other: &CharsetName) -> bool {
        match (self, other) {
            (CharsetName::Wildcard, _) | (_, CharsetName::Wildcard) => true,
            (CharsetName::Named(a), CharsetName::Named(b)) => a.eq_ignore_ascii_case(b),
        }
    }

    fn encoding(&self) -> Option<Encoding> {
        let name = match self {
            CharsetName::Wildcard => return None,
            CharsetName::Named(name) => name,
        };
        if name.eq_ignore_ascii_case("UTF-8") {
            Some(Encoding::Utf8)
        } else if name.eq_ignore_ascii_case("US-ASCII") {
            Some(Encoding::Ascii)
        } else if name.eq_ignore_ascii_case("ISO-8859-1") {
            Some(Encoding::Latin1)
        } else {
            None
        }
    }

    fn unsupported(&self) -> HeaderValueError {
        HeaderValueError::invalid(format!("Unsupported charset {:?}", self.as_str()))
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self.encoding().ok_or_else(|| self.unsupported())? {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { Ok(c as u8) } else { Err(c) })
                .collect::<std::result::Result<Vec<u8>, char>>()
                .map_err(|c| self.unencodable(c)),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| c))
                .collect::<std::result::Result<Vec<u8>, char>>()
                .map_err(|c| self.unencodable(c)),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self.encoding().ok_or_else(|| self.unsupported())? {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| {
                HeaderValueError::invalid(format!("Invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()))
            }),
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(i) => Err(HeaderValueError::invalid(format!(
                    "Invalid US-ASCII byte 0x{:02x} at {}",
                    bytes[i], i
                ))),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    fn unencodable(&self, c: char) -> HeaderValueError {
        HeaderValueError::invalid(format!("{:?} cannot be encoded as {}", c, self.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Ascii,
    Latin1,
}

impl PartialEq for CharsetName {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CharsetName::Wildcard, CharsetName::Wildcard) => true,
            (CharsetName::Named(a), CharsetName::Named(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl Hash for CharsetName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.as_str().bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl HeaderValue for CharsetName {
    fn to_header_text(&self) -> String {
        self.as_str().to_owned()
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, CharsetName::Wildcard)
    }
}

header_text!(CharsetName, CharsetName::parse);

/// `charset` parameter values: a single name, never the wildcard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharsetNameHandler;

impl HeaderValueHandler for CharsetNameHandler {
    type Value = CharsetName;

    fn parse(&self, text: &str) -> Result<CharsetName> {
        CharsetName::named(text)
    }

    fn check(&self, value: &CharsetName) -> Result<()> {
        match value {
            CharsetName::Wildcard => Err(HeaderValueError::invalid(
                "Wildcard charset not allowed here",
            )),
            CharsetName::Named(name) => CharsetName::named(name).map(|_| ()),
        }
    }

    fn format(&self, value: &CharsetName) -> String {
        value.as_str().to_owned()
    }
}

pub static Q: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("q", &QWeightHandler));

pub static ACCEPT_CHARSET_PARAMETERS: Lazy<ParameterNameRegistry> = Lazy::new(|| {
    ParameterNameRegistry::new("Accept-Charset", [Q.clone()], &DEFAULT_STRING)
});

/// One element of `Accept-Charset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharsetValue {
    charset: CharsetName,
    parameters: Parameters,
}

impl CharsetValue {
    pub fn new(charset: CharsetName) -> Self {
        Self {
            charset,
            parameters: Parameters::new(),
        }
    }

    pub fn with_q_weight(charset: CharsetName, q: QWeight) -> Result<Self> {
        Ok(Self {
            charset,
            parameters: Parameters::new().with(&Q, q)?,
        })
    }

    pub fn charset(&self) -> &CharsetName {
        &self.charset
    }
}

impl HeaderValue for CharsetValue {
    fn to_header_text(&self) -> String {
        write_with_parameters(self.charset.as_str(), &self.parameters, ";")
    }

    fn is_wildcard(&self) -> bool {
        self.charset.is_wildcard()
    }
}

impl HeaderValueWithParameters for CharsetValue {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Result<Self> {
        Ok(Self {
            charset: self.charset.clone(),
            parameters,
        })
    }
}

struct AcceptCharsetGrammar<'r> {
    registry: &'r ParameterNameRegistry,
}

impl ValueGrammar for AcceptCharsetGrammar<'_> {
    type Head = CharsetName;
    type Value = CharsetValue;

    fn registry(&self) -> &ParameterNameRegistry {
        self.registry
    }

    fn allow_multiple_values(&self) -> bool {
        true
    }

    fn head(&mut self, _event: Event, cursor: &mut Cursor<'_>) -> Result<CharsetName> {
        CharsetName::parse(cursor.required_token(&RFC2045_TOKEN, "charset")?)
    }

    fn build(&mut self, charset: CharsetName, parameters: Parameters) -> Result<CharsetValue> {
        Ok(CharsetValue {
            charset,
            parameters,
        })
    }
}

/// `Accept-Charset`, ordered by descending q weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptCharset(Vec<CharsetValue>);

impl AcceptCharset {
    /// Keeps the given order; [`charset`](Self::charset) does not rely on it.
    pub fn new(values: Vec<CharsetValue>) -> Self {
        Self(values)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut values = parse_list(
            text,
            AcceptCharsetGrammar {
                registry: &ACCEPT_CHARSET_PARAMETERS,
            },
        )?;
        sort_by_q_weight(&mut values, |v| v.q_weight());
        Ok(Self(values))
    }

    pub fn values(&self) -> &[CharsetValue] {
        &self.0
    }

    /// The most preferred charset this crate supports. A wildcard stands for
    /// UTF-8; charsets weighted `q=0` are never chosen.
    pub fn charset(&self) -> Option<CharsetName> {
        let mut ordered: Vec<&CharsetValue> = self.0.iter().collect();
        sort_by_q_weight(&mut ordered, |v| v.q_weight());
        ordered
            .into_iter()
            .filter(|v| !v.q_weight().is_zero())
            .find_map(|v| match &v.charset {
                CharsetName::Wildcard => Some(CharsetName::UTF_8),
                named if named.is_supported() => Some(named.clone()),
                _ => None,
            })
    }

    pub fn require_charset(&self) -> Result<CharsetName> {
        self.charset().ok_or_else(|| {
            HeaderValueError::not_acceptable(format!(
                "No supported charset in {:?}",
                self.to_header_text()
            ))
        })
    }
}

impl HeaderValue for AcceptCharset {
    fn to_header_text(&self) -> String {
        crate::parameters::join_values(&self.0)
    }
}

header_text!(AcceptCharset, AcceptCharset::parse);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_compare_ignoring_case() {
        assert_eq!(CharsetName::parse("utf-8").unwrap(), CharsetName::UTF_8);
        assert_eq!(CharsetName::parse("utf-8").unwrap().as_str(), "utf-8");
        assert!(CharsetName::parse("utf-8").unwrap().is_supported());
        assert!(!CharsetName::parse("Shift_JIS").unwrap().is_supported());
    }

    #[test]
    fn wildcard_matches_everything() {
        assert!(CharsetName::Wildcard.matches(&CharsetName::UTF_8));
        assert!(!CharsetName::US_ASCII.matches(&CharsetName::UTF_8));
    }

    #[test]
    fn handler_rejects_wildcard() {
        assert!(CharsetNameHandler.parse("*").is_err());
        assert!(CharsetNameHandler.check(&CharsetName::Wildcard).is_err());
    }

    #[test]
    fn encode_and_decode() {
        assert_eq!(CharsetName::ISO_8859_1.encode("é").unwrap(), vec![0xe9]);
        assert_eq!(CharsetName::ISO_8859_1.decode(&[0xe9]).unwrap(), "é");
        assert!(CharsetName::US_ASCII.encode("é").is_err());
        assert!(CharsetName::UTF_8.decode(&[0xff]).is_err());
        assert!(CharsetName::UTF_16.encode("a").is_err());
    }

    #[test]
    fn accept_charset_sorted_by_q() {
        let accept = AcceptCharset::parse("utf-8;q=0.5, iso-8859-1, *;q=0.1").unwrap();
        let names: Vec<_> = accept.values().iter().map(|v| v.charset().as_str()).collect();
        assert_eq!(names, vec!["iso-8859-1", "utf-8", "*"]);
        assert_eq!(accept.to_header_text(), "iso-8859-1, utf-8;q=0.5, *;q=0.1");
    }

    #[test]
    fn charset_sorts_even_if_caller_did_not() {
        let accept = AcceptCharset::new(vec![
            CharsetValue::with_q_weight(CharsetName::US_ASCII, QWeight::new(0.2).unwrap()).unwrap(),
            CharsetValue::new(CharsetName::UTF_8),
        ]);
        assert_eq!(accept.charset(), Some(CharsetName::UTF_8));
    }

    #[test]
    fn unsupported_only_is_not_acceptable() {
        let accept = AcceptCharset::parse("Shift_JIS, utf-8;q=0").unwrap();
        assert_eq!(accept.charset(), None);
        assert!(accept.require_charset().unwrap_err().is_not_acceptable());
    }

    #[test]
    fn wildcard_means_utf8() {
        let accept = AcceptCharset::parse("*").unwrap();
        assert_eq!(accept.charset(), Some(CharsetName::UTF_8));
    }
}
