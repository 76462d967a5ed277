// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Header parameters and the parameter-list grammar.
//!
//! ```text
//! header-value = value *( ";" OWS param ) *( "," OWS value ... )
//! param        = param-name "=" param-value
//! param-value  = token / quoted-string      ; encoded-text when the name ends in "*"
//! ```
//!
//! Every grammar with parameters runs through [`ParametersGrammar`]; the
//! per-header part (how the leading value is read, which parameter names are
//! registered, whether lists and comments are allowed) is a [`ValueGrammar`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::chars::{self, RFC2045_TOKEN};
use crate::charset::CharsetName;
use crate::address::UrlReference;
use crate::encoded_text::{EncodedText, ENCODED_TEXT};
use crate::error::{HeaderValueError, Result};
use crate::handler::{format_http_date, HeaderValueHandler};
use crate::language::LanguageTag;
use crate::link::LinkRelation;
use crate::media_type::MediaType;
use crate::qweight::QWeight;
use crate::scanner::{self, Cursor, Event, Grammar};

/// A validated parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    Text(SmolStr),
    Long(u64),
    QWeight(QWeight),
    Charset(CharsetName),
    EncodedText(EncodedText),
    DateTime(NaiveDateTime),
    MediaType(Box<MediaType>),
    Language(LanguageTag),
    Relations(Vec<LinkRelation>),
    Url(UrlReference),
}

impl ParameterValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Text(_) => SmolStr::KIND,
            ParameterValue::Long(_) => u64::KIND,
            ParameterValue::QWeight(_) => QWeight::KIND,
            ParameterValue::Charset(_) => CharsetName::KIND,
            ParameterValue::EncodedText(_) => EncodedText::KIND,
            ParameterValue::DateTime(_) => NaiveDateTime::KIND,
            ParameterValue::MediaType(_) => MediaType::KIND,
            ParameterValue::Language(_) => LanguageTag::KIND,
            ParameterValue::Relations(_) => <Vec<LinkRelation>>::KIND,
            ParameterValue::Url(_) => UrlReference::KIND,
        }
    }

    pub fn get<T: ParameterKind>(&self) -> Option<&T> {
        T::from_parameter(self)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<u64> {
        match self {
            ParameterValue::Long(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Text(text) => f.write_str(text),
            ParameterValue::Long(n) => write!(f, "{}", n),
            ParameterValue::QWeight(q) => write!(f, "{}", q),
            ParameterValue::Charset(charset) => write!(f, "{}", charset),
            ParameterValue::EncodedText(text) => write!(f, "{}", text),
            ParameterValue::DateTime(date) => f.write_str(&format_http_date(date)),
            ParameterValue::MediaType(media_type) => write!(f, "{}", media_type),
            ParameterValue::Language(tag) => write!(f, "{}", tag),
            ParameterValue::Relations(relations) => {
                for (i, relation) in relations.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", relation)?;
                }
                Ok(())
            }
            ParameterValue::Url(url) => write!(f, "{}", url),
        }
    }
}

/// A type that can be stored in a [`ParameterValue`].
pub trait ParameterKind: fmt::Debug + Sized {
    const KIND: &'static str;

    fn into_parameter(self) -> ParameterValue;

    fn from_parameter(value: &ParameterValue) -> Option<&Self>;
}

macro_rules! parameter_kind {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl ParameterKind for $ty {
            const KIND: &'static str = $kind;

            fn into_parameter(self) -> ParameterValue {
                ParameterValue::$variant(self)
            }

            fn from_parameter(value: &ParameterValue) -> Option<&Self> {
                match value {
                    ParameterValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

parameter_kind!(SmolStr, Text, "string");
parameter_kind!(u64, Long, "long");
parameter_kind!(QWeight, QWeight, "q weight");
parameter_kind!(CharsetName, Charset, "charset");
parameter_kind!(EncodedText, EncodedText, "encoded text");
parameter_kind!(NaiveDateTime, DateTime, "date time");
parameter_kind!(LanguageTag, Language, "language tag");
parameter_kind!(Vec<LinkRelation>, Relations, "link relations");
parameter_kind!(UrlReference, Url, "url");

impl ParameterKind for MediaType {
    const KIND: &'static str = "media type";

    fn into_parameter(self) -> ParameterValue {
        ParameterValue::MediaType(Box::new(self))
    }

    fn from_parameter(value: &ParameterValue) -> Option<&Self> {
        match value {
            ParameterValue::MediaType(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

/// Object-safe view of a [`HeaderValueHandler`] over [`ParameterValue`].
pub trait ParameterValueHandler: fmt::Debug + Send + Sync {
    fn kind(&self) -> &'static str;

    fn parse_value(&self, text: &str) -> Result<ParameterValue>;

    fn check_value(&self, value: &ParameterValue) -> Result<()>;

    fn format_value(&self, value: &ParameterValue) -> String;
}

impl<H> ParameterValueHandler for H
where
    H: HeaderValueHandler,
    H::Value: ParameterKind,
{
    fn kind(&self) -> &'static str {
        <H::Value as ParameterKind>::KIND
    }

    fn parse_value(&self, text: &str) -> Result<ParameterValue> {
        self.parse(text).map(ParameterKind::into_parameter)
    }

    fn check_value(&self, value: &ParameterValue) -> Result<()> {
        match H::Value::from_parameter(value) {
            Some(typed) => self.check(typed),
            None => Err(HeaderValueError::TypeMismatch {
                name: String::new(),
                expected: self.kind(),
                actual: value.kind(),
            }),
        }
    }

    fn format_value(&self, value: &ParameterValue) -> String {
        match H::Value::from_parameter(value) {
            Some(typed) => self.format(typed),
            None => value.to_string(),
        }
    }
}

/// Case-insensitive parameter name bound to the handler for its values.
#[derive(Debug, Clone)]
pub struct HeaderParameterName {
    name: SmolStr,
    handler: &'static dyn ParameterValueHandler,
}

impl HeaderParameterName {
    pub fn constant(name: &'static str, handler: &'static dyn ParameterValueHandler) -> Self {
        Self {
            name: SmolStr::new(name),
            handler,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &'static dyn ParameterValueHandler {
        self.handler
    }

    /// RFC 5987 extended names carry encoded-text values.
    pub fn is_extended(&self) -> bool {
        self.name.ends_with('*')
    }

    pub fn parse_value(&self, text: &str) -> Result<ParameterValue> {
        self.handler
            .parse_value(text)
            .map_err(|e| e.converting(&self.name, text))
    }

    pub fn check_value(&self, value: &ParameterValue) -> Result<()> {
        self.handler.check_value(value).map_err(|e| match e {
            HeaderValueError::TypeMismatch {
                expected, actual, ..
            } => HeaderValueError::TypeMismatch {
                name: self.name.to_string(),
                expected,
                actual,
            },
            other => other.converting(&self.name, &value.to_string()),
        })
    }

    pub fn format_value(&self, value: &ParameterValue) -> String {
        self.handler.format_value(value)
    }
}

impl PartialEq for HeaderParameterName {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for HeaderParameterName {}

impl Hash for HeaderParameterName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.name.len());
        for b in self.name.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for HeaderParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The parameter names of one header family.
///
/// Constants are registered up front; anything else is accepted when it is a
/// valid token and handled by the family default, except extended names
/// ending in `*`, which always get the encoded-text handler.
#[derive(Debug)]
pub struct ParameterNameRegistry {
    family: &'static str,
    constants: HashMap<SmolStr, HeaderParameterName>,
    default_handler: &'static dyn ParameterValueHandler,
}

impl ParameterNameRegistry {
    pub fn new(
        family: &'static str,
        constants: impl IntoIterator<Item = HeaderParameterName>,
        default_handler: &'static dyn ParameterValueHandler,
    ) -> Self {
        let constants = constants
            .into_iter()
            .map(|name| (SmolStr::new(name.as_str().to_ascii_lowercase()), name))
            .collect();
        Self {
            family,
            constants,
            default_handler,
        }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    /// The registered constant for `name`, ignoring case.
    pub fn constant(&self, name: &str) -> Option<&HeaderParameterName> {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.constants.get(name.to_ascii_lowercase().as_str())
        } else {
            self.constants.get(name)
        }
    }

    pub fn constants(&self) -> impl Iterator<Item = &HeaderParameterName> {
        self.constants.values()
    }

    pub fn lookup(&self, name: &str) -> Result<HeaderParameterName> {
        if let Some(constant) = self.constant(name) {
            return Ok(constant.clone());
        }
        if name.is_empty() {
            return Err(HeaderValueError::missing("parameter name", name));
        }
        if let Some((position, _)) = RFC2045_TOKEN.first_invalid(name) {
            return Err(HeaderValueError::invalid_character(name, position));
        }
        let handler = if name.ends_with('*') {
            &ENCODED_TEXT as &'static dyn ParameterValueHandler
        } else {
            self.default_handler
        };
        Ok(HeaderParameterName {
            name: SmolStr::new(name),
            handler,
        })
    }
}

/// Insertion-ordered parameters with unique, case-insensitive names.
///
/// Every stored value has passed its name's handler check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(IndexMap<HeaderParameterName, ParameterValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: HeaderParameterName, value: ParameterValue) -> Result<()> {
        name.check_value(&value)?;
        if self.0.contains_key(&name) {
            return Err(HeaderValueError::invalid(format!(
                "Duplicate parameter {:?}",
                name.as_str()
            )));
        }
        self.0.insert(name, value);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert) for typed values.
    pub fn with<T: ParameterKind>(mut self, name: &HeaderParameterName, value: T) -> Result<Self> {
        self.insert(name.clone(), value.into_parameter())?;
        Ok(self)
    }

    pub fn get(&self, name: &HeaderParameterName) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    /// Typed lookup; `None` when absent or stored as another kind.
    pub fn value<T: ParameterKind>(&self, name: &HeaderParameterName) -> Option<&T> {
        self.get(name).and_then(T::from_parameter)
    }

    pub fn get_by_str(&self, name: &str) -> Option<&ParameterValue> {
        self.0
            .iter()
            .find(|(key, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, name: &HeaderParameterName) -> Option<ParameterValue> {
        self.0.shift_remove(name)
    }

    pub fn contains(&self, name: &HeaderParameterName) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderParameterName, &ParameterValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `q` parameter, or [`QWeight::DEFAULT`] when absent.
    pub fn q_weight(&self) -> QWeight {
        match self.get_by_str("q") {
            Some(ParameterValue::QWeight(q)) => *q,
            _ => QWeight::DEFAULT,
        }
    }

    /// True when both hold the same entries in the same order.
    pub fn same_as(&self, other: &Parameters) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }

    pub fn write_to(&self, out: &mut String, separator: &str) {
        for (name, value) in &self.0 {
            out.push_str(separator);
            out.push_str(name.as_str());
            out.push('=');
            out.push_str(&name.format_value(value));
        }
    }
}

/// Any typed header value.
pub trait HeaderValue {
    fn to_header_text(&self) -> String;

    fn is_wildcard(&self) -> bool {
        false
    }
}

/// A header value carrying [`Parameters`].
pub trait HeaderValueWithParameters: HeaderValue + Clone {
    fn parameters(&self) -> &Parameters;

    /// A copy of `self` holding `parameters` instead.
    fn with_parameters(&self, parameters: Parameters) -> Result<Self>;

    /// Returns `self` unchanged when `parameters` already matches, entry for
    /// entry and in order; a new value otherwise.
    fn set_parameters(&self, parameters: Parameters) -> Result<Cow<'_, Self>> {
        if self.parameters().same_as(&parameters) {
            Ok(Cow::Borrowed(self))
        } else {
            self.with_parameters(parameters).map(Cow::Owned)
        }
    }

    fn q_weight(&self) -> QWeight {
        self.parameters().q_weight()
    }
}

/// Implements `Display` via `to_header_text` and `FromStr` via `$parse`.
macro_rules! header_text {
    ($ty:ty, $parse:path) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&$crate::parameters::HeaderValue::to_header_text(self))
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::error::HeaderValueError;

            fn from_str(s: &str) -> $crate::error::Result<Self> {
                $parse(s)
            }
        }
    };
}

pub(crate) use header_text;

/// The header-specific half of the parameter-list grammar.
pub trait ValueGrammar {
    /// What [`head`](Self::head) reads before any parameters.
    type Head;
    type Value;

    fn registry(&self) -> &ParameterNameRegistry;

    fn allow_multiple_values(&self) -> bool;

    fn allow_comments(&self) -> bool {
        true
    }

    fn allow_parameters(&self) -> bool {
        true
    }

    /// Reads the leading value. Called with the cursor on the first
    /// character that is neither whitespace nor a comment.
    fn head(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<Self::Head>;

    fn build(&mut self, head: Self::Head, parameters: Parameters) -> Result<Self::Value>;
}

#[derive(Debug)]
enum State {
    Value,
    AfterValue,
    ParameterName,
    ParameterEquals(HeaderParameterName),
    ParameterValue(HeaderParameterName),
}

/// Drives a [`ValueGrammar`] through `value *( ";" param ) *( "," ... )`.
pub struct ParametersGrammar<G: ValueGrammar> {
    grammar: G,
    state: State,
    head: Option<G::Head>,
    parameters: Parameters,
    values: Vec<G::Value>,
    separated: bool,
}

impl<G: ValueGrammar> ParametersGrammar<G> {
    pub fn new(grammar: G) -> Self {
        Self {
            grammar,
            state: State::Value,
            head: None,
            parameters: Parameters::new(),
            values: Vec::new(),
            separated: false,
        }
    }

    fn comment(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        if self.grammar.allow_comments() {
            cursor.skip_comment()
        } else {
            Err(cursor.comment_present())
        }
    }

    fn finish_value(&mut self, cursor: &Cursor<'_>) -> Result<()> {
        let head = self.head.take().ok_or_else(|| cursor.missing("value"))?;
        let parameters = std::mem::take(&mut self.parameters);
        let value = self.grammar.build(head, parameters)?;
        self.values.push(value);
        Ok(())
    }

    fn parameter_value(name: &HeaderParameterName, event: Event, cursor: &mut Cursor<'_>) -> Result<ParameterValue> {
        let raw = if name.is_extended() {
            cursor.take_while(|c| !matches!(c, ';' | ',') && !chars::is_whitespace(c))
        } else {
            match event {
                Event::QuotedText => cursor.quoted_span(&chars::QUOTED_TEXT, true)?,
                Event::Token | Event::Wildcard => cursor.token(&RFC2045_TOKEN),
                _ => return Err(cursor.invalid_character()),
            }
        };
        if raw.is_empty() {
            return Err(cursor.invalid_character());
        }
        name.parse_value(raw)
    }
}

impl<G: ValueGrammar> Grammar for ParametersGrammar<G> {
    type Output = Vec<G::Value>;

    fn on_event(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Value) {
            State::Value => match event {
                Event::Whitespace => {
                    cursor.bump();
                }
                Event::CommentOpen => self.comment(cursor)?,
                Event::MultiValueSeparator | Event::ParameterSeparator => {
                    return Err(cursor.invalid_character())
                }
                _ => {
                    self.head = Some(self.grammar.head(event, cursor)?);
                    self.state = State::AfterValue;
                }
            },
            State::AfterValue => {
                self.state = State::AfterValue;
                match event {
                    Event::Whitespace => {
                        cursor.bump();
                    }
                    Event::CommentOpen => self.comment(cursor)?,
                    Event::ParameterSeparator if self.grammar.allow_parameters() => {
                        cursor.bump();
                        self.state = State::ParameterName;
                    }
                    Event::MultiValueSeparator if self.grammar.allow_multiple_values() => {
                        self.finish_value(cursor)?;
                        cursor.bump();
                        self.separated = true;
                        self.state = State::Value;
                    }
                    _ => return Err(cursor.invalid_character()),
                }
            }
            State::ParameterName => match event {
                Event::Whitespace => {
                    cursor.bump();
                    self.state = State::ParameterName;
                }
                Event::Token | Event::Wildcard => {
                    let token = cursor.token(&RFC2045_TOKEN);
                    let name = self.grammar.registry().lookup(token)?;
                    self.state = State::ParameterEquals(name);
                }
                _ => return Err(cursor.invalid_character()),
            },
            State::ParameterEquals(name) => match event {
                Event::KeyValueSeparator => {
                    cursor.bump();
                    self.state = State::ParameterValue(name);
                }
                _ => return Err(cursor.invalid_character()),
            },
            State::ParameterValue(name) => {
                let value = Self::parameter_value(&name, event, cursor)?;
                self.parameters.insert(name, value)?;
                self.state = State::AfterValue;
            }
        }
        Ok(())
    }

    fn end_of_text(mut self, cursor: &Cursor<'_>) -> Result<Vec<G::Value>> {
        match self.state {
            State::Value if self.separated => Err(cursor.missing("value")),
            State::Value => Ok(self.values),
            State::AfterValue => {
                self.finish_value(cursor)?;
                Ok(self.values)
            }
            State::ParameterName => Err(cursor.missing("parameter name")),
            State::ParameterEquals(_) | State::ParameterValue(_) => {
                Err(cursor.missing("parameter value"))
            }
        }
    }
}

/// Parses a comma separated list; empty text yields an empty list.
pub fn parse_list<G: ValueGrammar>(text: &str, grammar: G) -> Result<Vec<G::Value>> {
    scanner::parse_with(text, ParametersGrammar::new(grammar))
}

/// Parses exactly one value.
pub fn parse_single<G: ValueGrammar>(text: &str, grammar: G) -> Result<G::Value> {
    parse_list(text, grammar)?
        .pop()
        .ok_or_else(|| HeaderValueError::missing("value", text))
}

/// Writes `value` followed by its parameters.
pub fn write_with_parameters(head: &str, parameters: &Parameters, separator: &str) -> String {
    let mut out = String::with_capacity(head.len() + 16 * parameters.len());
    out.push_str(head);
    parameters.write_to(&mut out, separator);
    out
}

/// Joins list elements the way list headers are written.
pub fn join_values<T: HeaderValue>(values: &[T]) -> String {
    values
        .iter()
        .map(HeaderValue::to_header_text)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{LongHandler, QWeightHandler, DEFAULT_STRING};
    use once_cell::sync::Lazy;
    use std::collections::hash_map::DefaultHasher;

    static Q: Lazy<HeaderParameterName> =
        Lazy::new(|| HeaderParameterName::constant("q", &QWeightHandler));
    static LEVEL: Lazy<HeaderParameterName> =
        Lazy::new(|| HeaderParameterName::constant("level", &LongHandler));
    static REGISTRY: Lazy<ParameterNameRegistry> = Lazy::new(|| {
        ParameterNameRegistry::new("test", [Q.clone(), LEVEL.clone()], &DEFAULT_STRING)
    });

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        token: String,
        parameters: Parameters,
    }

    struct ItemGrammar {
        multiple: bool,
        comments: bool,
    }

    impl ValueGrammar for ItemGrammar {
        type Head = String;
        type Value = Item;

        fn registry(&self) -> &ParameterNameRegistry {
            &REGISTRY
        }

        fn allow_multiple_values(&self) -> bool {
            self.multiple
        }

        fn allow_comments(&self) -> bool {
            self.comments
        }

        fn head(&mut self, _event: Event, cursor: &mut Cursor<'_>) -> Result<String> {
            Ok(cursor.required_token(&RFC2045_TOKEN, "token")?.to_owned())
        }

        fn build(&mut self, token: String, parameters: Parameters) -> Result<Item> {
            Ok(Item { token, parameters })
        }
    }

    fn list(text: &str) -> Result<Vec<Item>> {
        parse_list(
            text,
            ItemGrammar {
                multiple: true,
                comments: true,
            },
        )
    }

    fn single(text: &str) -> Result<Item> {
        parse_single(
            text,
            ItemGrammar {
                multiple: false,
                comments: false,
            },
        )
    }

    fn hash(name: &HeaderParameterName) -> u64 {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn names_compare_case_insensitively() {
        let upper = REGISTRY.lookup("Q").unwrap();
        assert_eq!(upper, *Q);
        assert_eq!(hash(&upper), hash(&Q));
        assert_eq!(upper.as_str(), "q");
    }

    #[test]
    fn unknown_names_get_default_or_encoded_handler() {
        let name = REGISTRY.lookup("foo").unwrap();
        assert_eq!(name.handler().kind(), "string");
        let extended = REGISTRY.lookup("foo*").unwrap();
        assert_eq!(extended.handler().kind(), "encoded text");
        assert!(REGISTRY.lookup("fo@o").is_err());
    }

    #[test]
    fn parses_parameters_in_order() {
        let item = single("a; level=1;q=0.5;x=\"y z\"").unwrap();
        assert_eq!(item.token, "a");
        let names: Vec<_> = item.parameters.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["level", "q", "x"]);
        assert_eq!(item.parameters.value::<u64>(&LEVEL), Some(&1));
        assert_eq!(item.parameters.q_weight().value(), 0.5);
        assert_eq!(
            item.parameters.get_by_str("X"),
            Some(&ParameterValue::Text("y z".into()))
        );
    }

    #[test]
    fn parameter_value_errors_name_the_parameter() {
        let err = single("a;level=x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to convert \"level\" value \"x\", message: Invalid character 'x' at 0 in \"x\""
        );
    }

    #[test]
    fn duplicate_parameter_rejected() {
        assert!(single("a;q=0.5;Q=0.1").is_err());
    }

    #[test]
    fn trailing_separators_are_missing_values() {
        assert!(matches!(
            single("a;"),
            Err(HeaderValueError::MissingValue {
                what: "parameter name",
                ..
            })
        ));
        assert!(matches!(
            single("a;q="),
            Err(HeaderValueError::MissingValue {
                what: "parameter value",
                ..
            })
        ));
        assert!(matches!(
            list("a, b,"),
            Err(HeaderValueError::MissingValue { what: "value", .. })
        ));
    }

    #[test]
    fn single_form_rejects_second_value() {
        assert!(matches!(
            single("a, b"),
            Err(HeaderValueError::InvalidCharacter {
                position: 1,
                character: ',',
                ..
            })
        ));
    }

    #[test]
    fn comments_skipped_or_rejected() {
        let items = list("a (first), b").unwrap();
        assert_eq!(items.len(), 2);
        let err = single("a (first)").unwrap_err();
        assert!(err.is_comment_present());
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(list("").unwrap().is_empty());
        assert!(list("  ").unwrap().is_empty());
        assert!(single("").is_err());
    }

    #[test]
    fn insert_checks_kind() {
        let mut parameters = Parameters::new();
        let err = parameters
            .insert(LEVEL.clone(), ParameterValue::Text("x".into()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter \"level\" value not a long (got string)"
        );
    }

    #[test]
    fn write_to_formats_through_handlers() {
        let parameters = Parameters::new()
            .with(&LEVEL, 2u64)
            .unwrap()
            .with(&REGISTRY.lookup("title").unwrap(), SmolStr::new("a b"))
            .unwrap();
        assert_eq!(
            write_with_parameters("x", &parameters, ";"),
            "x;level=2;title=\"a b\""
        );
    }

    #[test]
    fn same_as_is_order_sensitive() {
        let a = Parameters::new().with(&LEVEL, 1u64).unwrap().with(&Q, QWeight::MIN).unwrap();
        let b = Parameters::new().with(&Q, QWeight::MIN).unwrap().with(&LEVEL, 1u64).unwrap();
        assert_eq!(a, b);
        assert!(!a.same_as(&b));
        assert!(a.same_as(&a.clone()));
    }
}
