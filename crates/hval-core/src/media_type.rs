// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Media types (`Content-Type`, `Accept`).
//!
//! ```text
//! media-type = type "/" subtype *( OWS ";" OWS parameter )
//! Accept     = #( media-range [ weight ] )
//! ```

use once_cell::sync::Lazy;
use smol_str::SmolStr;

use crate::chars::{self, RFC2045_TOKEN};
use crate::charset::{CharsetName, CharsetNameHandler};
use crate::encoded_text::ENCODED_TEXT;
use crate::error::{HeaderValueError, Result};
use crate::handler::{HeaderValueHandler, QWeightHandler, QuotedHandler, StringHandler, DEFAULT_STRING};
use crate::parameters::{
    header_text, join_values, parse_list, parse_single, write_with_parameters,
    HeaderParameterName, HeaderValue, HeaderValueWithParameters, ParameterNameRegistry,
    Parameters, ValueGrammar,
};
use crate::qweight::sort_by_q_weight;
use crate::scanner::{classify, Cursor, Event};

static CHARSET_HANDLER: QuotedHandler<CharsetNameHandler> =
    QuotedHandler::new(CharsetNameHandler, false);

/// Boundaries may be written as a token or quoted; inside quotes the RFC 2046
/// `bchars` apply.
pub const BOUNDARY_HANDLER: StringHandler =
    StringHandler::quoted_or_unquoted(chars::BOUNDARY, false, RFC2045_TOKEN);

pub static CHARSET: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("charset", &CHARSET_HANDLER));
pub static BOUNDARY: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("boundary", &BOUNDARY_HANDLER));
pub static Q: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("q", &QWeightHandler));
pub static TITLE_STAR: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("title*", &ENCODED_TEXT));

pub static MEDIA_TYPE_PARAMETERS: Lazy<ParameterNameRegistry> = Lazy::new(|| {
    ParameterNameRegistry::new(
        "media type",
        [CHARSET.clone(), BOUNDARY.clone(), Q.clone(), TITLE_STAR.clone()],
        &DEFAULT_STRING,
    )
});

pub static TEXT_PLAIN: Lazy<MediaType> = Lazy::new(|| MediaType::known("text", "plain"));
pub static TEXT_HTML: Lazy<MediaType> = Lazy::new(|| MediaType::known("text", "html"));
pub static APPLICATION_JSON: Lazy<MediaType> =
    Lazy::new(|| MediaType::known("application", "json"));
pub static APPLICATION_OCTET_STREAM: Lazy<MediaType> =
    Lazy::new(|| MediaType::known("application", "octet-stream"));
pub static MULTIPART_FORM_DATA: Lazy<MediaType> =
    Lazy::new(|| MediaType::known("multipart", "form-data"));
pub static ALL: Lazy<MediaType> = Lazy::new(|| MediaType::known("*", "*"));

/// A media type or media range with parameters.
///
/// Type and subtype are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    type_: SmolStr,
    sub_type: SmolStr,
    parameters: Parameters,
}

impl MediaType {
    pub fn new(type_: &str, sub_type: &str) -> Result<Self> {
        let type_ = Self::segment(type_, "type")?;
        let sub_type = Self::segment(sub_type, "sub type")?;
        Ok(Self {
            type_,
            sub_type,
            parameters: Parameters::new(),
        })
    }

    fn known(type_: &'static str, sub_type: &'static str) -> Self {
        Self {
            type_: SmolStr::new_inline(type_),
            sub_type: SmolStr::new_inline(sub_type),
            parameters: Parameters::new(),
        }
    }

    fn segment(text: &str, what: &'static str) -> Result<SmolStr> {
        if text.is_empty() {
            return Err(HeaderValueError::EmptyToken {
                what,
                position: 0,
                text: text.to_owned(),
            });
        }
        if let Some((position, _)) = RFC2045_TOKEN.first_invalid(text) {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        Ok(SmolStr::new(text.to_ascii_lowercase()))
    }

    /// A single media type, as in `Content-Type`.
    pub fn parse(text: &str) -> Result<Self> {
        parse_single(text, MediaTypeGrammar::new(false))
    }

    /// A list of media ranges sorted by descending q weight.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        let mut values = parse_list(text, MediaTypeGrammar::new(true))?;
        sort_by_q_weight(&mut values, |v| v.q_weight());
        Ok(values)
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.sub_type)
    }

    pub fn charset(&self) -> Option<&CharsetName> {
        self.parameters.value(&CHARSET)
    }

    pub fn boundary(&self) -> Option<&str> {
        self.parameters.value::<SmolStr>(&BOUNDARY).map(SmolStr::as_str)
    }

    pub fn with_charset(&self, charset: CharsetName) -> Result<Self> {
        self.with_parameter(&CHARSET, charset)
    }

    /// A copy with `name` set to `value`, replacing any existing value.
    pub fn with_parameter<T: crate::parameters::ParameterKind>(
        &self,
        name: &HeaderParameterName,
        value: T,
    ) -> Result<Self> {
        let mut parameters = self.parameters.clone();
        parameters.remove(name);
        parameters.insert(name.clone(), value.into_parameter())?;
        self.with_parameters(parameters)
    }

    /// Media range test: `*` in `self` matches any type or subtype.
    /// Parameters are ignored.
    pub fn test(&self, other: &MediaType) -> bool {
        (self.type_ == "*" || self.type_ == other.type_)
            && (self.sub_type == "*" || self.sub_type == other.sub_type)
    }

    pub fn has_wildcard(&self) -> bool {
        self.type_ == "*" || self.sub_type == "*"
    }
}

impl HeaderValue for MediaType {
    fn to_header_text(&self) -> String {
        write_with_parameters(&self.essence(), &self.parameters, "; ")
    }

    fn is_wildcard(&self) -> bool {
        self.type_ == "*" && self.sub_type == "*"
    }
}

impl HeaderValueWithParameters for MediaType {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Result<Self> {
        Ok(Self {
            type_: self.type_.clone(),
            sub_type: self.sub_type.clone(),
            parameters,
        })
    }
}

header_text!(MediaType, MediaType::parse);

struct MediaTypeGrammar<'r> {
    registry: &'r ParameterNameRegistry,
    multiple: bool,
}

impl MediaTypeGrammar<'static> {
    fn new(multiple: bool) -> Self {
        Self {
            registry: &MEDIA_TYPE_PARAMETERS,
            multiple,
        }
    }
}

impl ValueGrammar for MediaTypeGrammar<'_> {
    type Head = (SmolStr, SmolStr);
    type Value = MediaType;

    fn registry(&self) -> &ParameterNameRegistry {
        self.registry
    }

    fn allow_multiple_values(&self) -> bool {
        self.multiple
    }

    fn head(&mut self, _event: Event, cursor: &mut Cursor<'_>) -> Result<(SmolStr, SmolStr)> {
        let type_ = cursor.required_token(&RFC2045_TOKEN, "type")?;
        if !cursor.consume_if('/') {
            return Err(match cursor.peek().map(classify) {
                Some(Event::Other) => cursor.invalid_character(),
                _ => cursor.missing("sub type"),
            });
        }
        let sub_type = cursor.required_token(&RFC2045_TOKEN, "sub type")?;
        if type_ == "*" && sub_type != "*" {
            return Err(HeaderValueError::invalid(format!(
                "Wildcard type requires wildcard sub type in {:?}",
                cursor.text()
            )));
        }
        Ok((
            SmolStr::new(type_.to_ascii_lowercase()),
            SmolStr::new(sub_type.to_ascii_lowercase()),
        ))
    }

    fn build(&mut self, (type_, sub_type): (SmolStr, SmolStr), parameters: Parameters) -> Result<MediaType> {
        Ok(MediaType {
            type_,
            sub_type,
            parameters,
        })
    }
}

/// Parameter values holding a media type, such as the link `type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaTypeHandler;

impl HeaderValueHandler for MediaTypeHandler {
    type Value = MediaType;

    fn parse(&self, text: &str) -> Result<MediaType> {
        MediaType::parse(text)
    }

    fn format(&self, value: &MediaType) -> String {
        value.to_header_text()
    }
}

/// `Accept`, ordered by descending q weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accept(Vec<MediaType>);

impl Accept {
    pub fn parse(text: &str) -> Result<Self> {
        MediaType::parse_list(text).map(Self)
    }

    pub fn media_types(&self) -> &[MediaType] {
        &self.0
    }

    /// The first of `available` matched by the most preferred range.
    /// Anything matched by a range weighted `q=0` is never chosen.
    pub fn best_match<'a>(&self, available: &'a [MediaType]) -> Option<&'a MediaType> {
        let excluded = |media_type: &MediaType| {
            self.0
                .iter()
                .any(|range| range.q_weight().is_zero() && range.test(media_type))
        };
        self.0
            .iter()
            .filter(|range| !range.q_weight().is_zero())
            .find_map(|range| {
                available
                    .iter()
                    .find(|media_type| range.test(media_type) && !excluded(media_type))
            })
    }
}

impl HeaderValue for Accept {
    fn to_header_text(&self) -> String {
        join_values(&self.0)
    }
}

header_text!(Accept, Accept::parse);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParameterValue;

    #[test]
    fn text_plain_with_charset_round_trips() {
        let media_type = MediaType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(media_type.type_(), "text");
        assert_eq!(media_type.sub_type(), "plain");
        assert_eq!(media_type.charset(), Some(&CharsetName::UTF_8));
        assert_eq!(media_type.to_header_text(), "text/plain; charset=utf-8");
    }

    #[test]
    fn quoted_charset_is_accepted() {
        let media_type = MediaType::parse("text/html;charset=\"ISO-8859-1\"").unwrap();
        assert_eq!(media_type.charset(), Some(&CharsetName::ISO_8859_1));
        assert_eq!(media_type.to_header_text(), "text/html; charset=ISO-8859-1");
    }

    #[test]
    fn missing_sub_type() {
        let err = MediaType::parse("text").unwrap_err();
        assert_eq!(err.to_string(), "Missing sub type in \"text\"");
        assert!(matches!(
            MediaType::parse("text;charset=utf-8"),
            Err(HeaderValueError::MissingValue { what: "sub type", .. })
        ));
        assert!(matches!(
            MediaType::parse("text/"),
            Err(HeaderValueError::MissingValue { what: "sub type", .. })
        ));
    }

    #[test]
    fn empty_segments() {
        assert!(matches!(
            MediaType::parse("/plain"),
            Err(HeaderValueError::EmptyToken { what: "type", .. })
        ));
        assert!(matches!(
            MediaType::parse("text/;q=1"),
            Err(HeaderValueError::EmptyToken { what: "sub type", .. })
        ));
    }

    #[test]
    fn boundary_quoted_or_not() {
        let a = MediaType::parse("multipart/mixed; boundary=abc").unwrap();
        let b = MediaType::parse("multipart/mixed; boundary=\"abc\"").unwrap();
        assert_eq!(a.boundary(), Some("abc"));
        assert_eq!(a, b);
        let spaced = MediaType::parse("multipart/mixed; boundary=\"a b\"").unwrap();
        assert_eq!(spaced.to_header_text(), "multipart/mixed; boundary=\"a b\"");
    }

    #[test]
    fn single_form_rejects_second_value() {
        assert!(MediaType::parse("text/plain, text/html").is_err());
        assert!(MediaType::parse("text/plain;").is_err());
    }

    #[test]
    fn title_star_is_encoded_text() {
        let media_type = MediaType::parse("text/plain; title*=UTF-8''%e2%82%ac").unwrap();
        match media_type.parameters().get(&TITLE_STAR) {
            Some(ParameterValue::EncodedText(text)) => assert_eq!(text.value(), "€"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unregistered_extended_parameter_is_encoded_text() {
        let media_type = MediaType::parse("text/plain; label*=UTF-8''x").unwrap();
        assert!(matches!(
            media_type.parameters().get_by_str("label*"),
            Some(ParameterValue::EncodedText(_))
        ));
    }

    #[test]
    fn accept_sorted_by_q() {
        let accept = Accept::parse("text/*;q=0.3, text/html;q=0.7, text/html;level=1, */*;q=0.5").unwrap();
        assert_eq!(
            accept.to_header_text(),
            "text/html; level=1, text/html; q=0.7, */*; q=0.5, text/*; q=0.3"
        );
    }

    #[test]
    fn media_range_test_ignores_parameters() {
        let range = MediaType::parse("text/*").unwrap();
        assert!(range.test(&TEXT_PLAIN));
        assert!(!range.test(&APPLICATION_JSON));
        assert!(ALL.test(&APPLICATION_JSON));
        assert!(ALL.is_wildcard());
        assert!(MediaType::parse("*/json").is_err());
    }

    #[test]
    fn best_match_skips_zero_weight() {
        let accept = Accept::parse("application/json;q=0, */*;q=0.1").unwrap();
        let available = [APPLICATION_JSON.clone(), TEXT_PLAIN.clone()];
        assert_eq!(accept.best_match(&available), Some(&available[1]));
        let none = Accept::parse("application/xml").unwrap();
        assert_eq!(none.best_match(&available), None);
    }

    #[test]
    fn set_same_parameters_returns_same_instance() {
        let media_type = MediaType::parse("text/plain; charset=utf-8; format=flowed").unwrap();
        let same = media_type
            .set_parameters(media_type.parameters().clone())
            .unwrap();
        assert!(std::ptr::eq(&*same, &media_type));
        let changed = media_type.with_charset(CharsetName::US_ASCII).unwrap();
        assert_eq!(changed.to_header_text(), "text/plain; format=flowed; charset=US-ASCII");
    }
}
