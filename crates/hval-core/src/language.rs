// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Language tags, `Accept-Language` and `Content-Language`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use smol_str::SmolStr;

use crate::chars::{LANGUAGE_TAG, RFC2045_TOKEN};
use crate::error::{HeaderValueError, Result};
use crate::handler::{HeaderValueHandler, QWeightHandler, DEFAULT_STRING};
use crate::parameters::{
    header_text, join_values, parse_list, write_with_parameters, HeaderParameterName,
    HeaderValue, HeaderValueWithParameters, ParameterNameRegistry, Parameters, ValueGrammar,
};
use crate::qweight::{sort_by_q_weight, QWeight};
use crate::scanner::{Cursor, Event};

/// ISO 639-1 codes recognised by [`LanguageTag::is_known`].
static KNOWN_LANGUAGES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ar", "bg", "bn", "ca", "cs", "cy", "da", "de", "el", "en", "es", "et", "eu", "fa", "fi",
        "fr", "ga", "gl", "he", "hi", "hr", "hu", "hy", "id", "is", "it", "ja", "ka", "kk", "ko",
        "lt", "lv", "mk", "ms", "mt", "nb", "nl", "nn", "no", "pl", "pt", "ro", "ru", "sk", "sl",
        "sq", "sr", "sv", "sw", "ta", "th", "tr", "uk", "ur", "vi", "zh",
    ]
    .into_iter()
    .collect()
});

/// A BCP 47 language tag, or `*` in `Accept-Language`.
///
/// Tags are kept in canonical case: language lowercase, four letter script
/// titlecase, two letter region uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    Wildcard,
    Tag(SmolStr),
}

impl LanguageTag {
    pub const ENGLISH: LanguageTag = LanguageTag::Tag(SmolStr::new_inline("en"));
    pub const FRENCH: LanguageTag = LanguageTag::Tag(SmolStr::new_inline("fr"));
    pub const GERMAN: LanguageTag = LanguageTag::Tag(SmolStr::new_inline("de"));

    pub fn parse(text: &str) -> Result<Self> {
        if text == "*" {
            return Ok(LanguageTag::Wildcard);
        }
        Self::tag(text)
    }

    /// A non-wildcard tag.
    pub fn tag(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(HeaderValueError::missing("language tag", text));
        }
        if let Some((position, _)) = LANGUAGE_TAG.first_invalid(text) {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        let mut canonical = String::with_capacity(text.len());
        for (i, subtag) in text.split('-').enumerate() {
            if subtag.is_empty() || subtag.len() > 8 {
                return Err(HeaderValueError::invalid(format!(
                    "Invalid language tag {:?}",
                    text
                )));
            }
            if i == 0 {
                if !subtag.bytes().all(|b| b.is_ascii_alphabetic()) {
                    return Err(HeaderValueError::invalid(format!(
                        "Invalid primary language in {:?}",
                        text
                    )));
                }
                canonical.push_str(&subtag.to_ascii_lowercase());
                continue;
            }
            canonical.push('-');
            match subtag.len() {
                2 if subtag.bytes().all(|b| b.is_ascii_alphabetic()) => {
                    canonical.push_str(&subtag.to_ascii_uppercase())
                }
                4 if subtag.bytes().all(|b| b.is_ascii_alphabetic()) => {
                    canonical.push_str(&subtag[..1].to_ascii_uppercase());
                    canonical.push_str(&subtag[1..].to_ascii_lowercase());
                }
                _ => canonical.push_str(&subtag.to_ascii_lowercase()),
            }
        }
        Ok(LanguageTag::Tag(SmolStr::new(canonical)))
    }

    pub fn as_str(&self) -> &str {
        match self {
            LanguageTag::Wildcard => "*",
            LanguageTag::Tag(tag) => tag,
        }
    }

    /// The primary language subtag, `None` for the wildcard.
    pub fn primary_language(&self) -> Option<&str> {
        match self {
            LanguageTag::Wildcard => None,
            LanguageTag::Tag(tag) => tag.split('-').next(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.primary_language()
            .map_or(false, |primary| KNOWN_LANGUAGES.contains(primary))
    }

    /// RFC 4647 basic filtering with `self` as the range: equal, or a prefix
    /// of `tag` ending at a subtag boundary.
    pub fn matches(&self, tag: &LanguageTag) -> bool {
        match (self, tag) {
            (LanguageTag::Wildcard, _) => true,
            (_, LanguageTag::Wildcard) => false,
            (LanguageTag::Tag(range), LanguageTag::Tag(tag)) => {
                tag.len() >= range.len()
                    && tag[..range.len()].eq_ignore_ascii_case(range)
                    && (tag.len() == range.len() || tag.as_bytes()[range.len()] == b'-')
            }
        }
    }
}

impl HeaderValue for LanguageTag {
    fn to_header_text(&self) -> String {
        self.as_str().to_owned()
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, LanguageTag::Wildcard)
    }
}

header_text!(LanguageTag, LanguageTag::parse);

/// Parameter values holding a single non-wildcard tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageTagHandler;

impl HeaderValueHandler for LanguageTagHandler {
    type Value = LanguageTag;

    fn parse(&self, text: &str) -> Result<LanguageTag> {
        LanguageTag::tag(text)
    }

    fn check(&self, value: &LanguageTag) -> Result<()> {
        match value {
            LanguageTag::Wildcard => Err(HeaderValueError::invalid(
                "Wildcard language not allowed here",
            )),
            LanguageTag::Tag(tag) => LanguageTag::tag(tag).map(|_| ()),
        }
    }

    fn format(&self, value: &LanguageTag) -> String {
        value.as_str().to_owned()
    }
}

pub static Q: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("q", &QWeightHandler));

pub static ACCEPT_LANGUAGE_PARAMETERS: Lazy<ParameterNameRegistry> = Lazy::new(|| {
    ParameterNameRegistry::new("Accept-Language", [Q.clone()], &DEFAULT_STRING)
});

/// One element of `Accept-Language`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageValue {
    tag: LanguageTag,
    parameters: Parameters,
}

impl LanguageValue {
    pub fn new(tag: LanguageTag) -> Self {
        Self {
            tag,
            parameters: Parameters::new(),
        }
    }

    pub fn tag(&self) -> &LanguageTag {
        &self.tag
    }
}

impl HeaderValue for LanguageValue {
    fn to_header_text(&self) -> String {
        write_with_parameters(self.tag.as_str(), &self.parameters, ";")
    }

    fn is_wildcard(&self) -> bool {
        self.tag.is_wildcard()
    }
}

impl HeaderValueWithParameters for LanguageValue {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Result<Self> {
        Ok(Self {
            tag: self.tag.clone(),
            parameters,
        })
    }
}

struct LanguageGrammar<'r> {
    registry: &'r ParameterNameRegistry,
    wildcard: bool,
    parameters: bool,
}

impl ValueGrammar for LanguageGrammar<'_> {
    type Head = LanguageTag;
    type Value = LanguageValue;

    fn registry(&self) -> &ParameterNameRegistry {
        self.registry
    }

    fn allow_multiple_values(&self) -> bool {
        true
    }

    fn allow_parameters(&self) -> bool {
        self.parameters
    }

    fn head(&mut self, _event: Event, cursor: &mut Cursor<'_>) -> Result<LanguageTag> {
        let start = cursor.position();
        let text = cursor.required_token(&RFC2045_TOKEN, "language tag")?;
        if text == "*" && !self.wildcard {
            return Err(HeaderValueError::invalid_character(cursor.text(), start));
        }
        LanguageTag::parse(text)
    }

    fn build(&mut self, tag: LanguageTag, parameters: Parameters) -> Result<LanguageValue> {
        Ok(LanguageValue { tag, parameters })
    }
}

/// `Accept-Language`, ordered by descending q weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptLanguage(Vec<LanguageValue>);

impl AcceptLanguage {
    pub fn parse(text: &str) -> Result<Self> {
        let mut values = parse_list(
            text,
            LanguageGrammar {
                registry: &ACCEPT_LANGUAGE_PARAMETERS,
                wildcard: true,
                parameters: true,
            },
        )?;
        sort_by_q_weight(&mut values, |v| v.q_weight());
        Ok(Self(values))
    }

    pub fn values(&self) -> &[LanguageValue] {
        &self.0
    }

    /// The first of `available` matched by the most preferred range.
    pub fn best_match<'a>(&self, available: &'a [LanguageTag]) -> Option<&'a LanguageTag> {
        self.0
            .iter()
            .filter(|v| !v.q_weight().is_zero())
            .find_map(|v| available.iter().find(|tag| v.tag.matches(tag)))
    }

    pub fn q_weight_of(&self, tag: &LanguageTag) -> QWeight {
        self.0
            .iter()
            .find(|v| v.tag.matches(tag))
            .map_or(QWeight::MIN, |v| v.q_weight())
    }
}

impl HeaderValue for AcceptLanguage {
    fn to_header_text(&self) -> String {
        join_values(&self.0)
    }
}

header_text!(AcceptLanguage, AcceptLanguage::parse);

/// `Content-Language`: one or more tags, no wildcard or parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLanguage(Vec<LanguageTag>);

impl ContentLanguage {
    pub fn new(tags: Vec<LanguageTag>) -> Result<Self> {
        if tags.is_empty() {
            return Err(HeaderValueError::empty_list("Content-Language"));
        }
        if tags.iter().any(HeaderValue::is_wildcard) {
            return Err(HeaderValueError::invalid("Wildcard not allowed in Content-Language"));
        }
        Ok(Self(tags))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let values = parse_list(
            text,
            LanguageGrammar {
                registry: &ACCEPT_LANGUAGE_PARAMETERS,
                wildcard: false,
                parameters: false,
            },
        )?;
        Self::new(values.into_iter().map(|v| v.tag).collect())
    }

    pub fn tags(&self) -> &[LanguageTag] {
        &self.0
    }
}

impl HeaderValue for ContentLanguage {
    fn to_header_text(&self) -> String {
        join_values(&self.0)
    }
}

header_text!(ContentLanguage, ContentLanguage::parse);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_case() {
        assert_eq!(LanguageTag::parse("EN-us").unwrap().as_str(), "en-US");
        assert_eq!(LanguageTag::parse("zh-hant-tw").unwrap().as_str(), "zh-Hant-TW");
        assert_eq!(LanguageTag::parse("en-US").unwrap(), LanguageTag::parse("en-us").unwrap());
    }

    #[test]
    fn rejects_malformed_tags() {
        assert!(LanguageTag::parse("").is_err());
        assert!(LanguageTag::parse("en--us").is_err());
        assert!(LanguageTag::parse("e1").is_err());
        assert!(LanguageTag::parse("en_US").is_err());
        assert!(LanguageTag::parse("abcdefghi").is_err());
    }

    #[test]
    fn basic_filtering() {
        let en = LanguageTag::ENGLISH;
        assert!(en.matches(&LanguageTag::parse("en-GB").unwrap()));
        assert!(!en.matches(&LanguageTag::parse("eng").unwrap()));
        assert!(LanguageTag::Wildcard.matches(&LanguageTag::FRENCH));
        assert!(!LanguageTag::FRENCH.matches(&LanguageTag::Wildcard));
    }

    #[test]
    fn known_languages() {
        assert!(LanguageTag::parse("de-AT").unwrap().is_known());
        assert!(!LanguageTag::parse("tlh").unwrap().is_known());
    }

    #[test]
    fn accept_language_orders_and_matches() {
        let accept = AcceptLanguage::parse("da, en-GB;q=0.8, en;q=0.7").unwrap();
        assert_eq!(accept.to_header_text(), "da, en-GB;q=0.8, en;q=0.7");
        let available = [LanguageTag::FRENCH, LanguageTag::parse("en-US").unwrap()];
        assert_eq!(accept.best_match(&available).unwrap().as_str(), "en-US");
        assert_eq!(
            accept.q_weight_of(&LanguageTag::parse("en-GB").unwrap()).value(),
            0.8
        );
    }

    #[test]
    fn content_language_forbids_wildcard_and_empty() {
        assert_eq!(
            ContentLanguage::parse("mi, en").unwrap().to_header_text(),
            "mi, en"
        );
        assert!(ContentLanguage::parse("*").is_err());
        assert!(ContentLanguage::parse("en;q=0.5").is_err());
        assert!(matches!(
            ContentLanguage::parse(""),
            Err(HeaderValueError::EmptyList { .. })
        ));
    }
}
