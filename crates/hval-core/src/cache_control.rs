// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Cache-Control` directives (RFC 9111 section 5.2).
//!
//! ```text
//! Cache-Control   = #cache-directive
//! cache-directive = token [ "=" ( token / quoted-string ) ]
//! ```
//!
//! Every registered directive declares whether its argument is required,
//! optional or absent; extension directives accept an optional argument that
//! is read as seconds when it is all digits and as text otherwise.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use smol_str::SmolStr;

use crate::chars::{self, RFC2045_TOKEN};
use crate::error::{HeaderValueError, Result};
use crate::handler::{first_of, HeaderValueHandler, LongHandler, QuotedHandler, DEFAULT_STRING};
use crate::parameters::{header_text, HeaderValue};
use crate::scanner::{self, parse_with, Cursor, Event, Grammar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveParameter {
    Required,
    Optional,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Delta seconds.
    Seconds,
    /// A quoted, comma separated list of field names.
    FieldNames,
    /// Unregistered directive: seconds when numeric, otherwise text.
    Extension,
}

/// Case-insensitive directive name with its argument rules.
#[derive(Debug, Clone)]
pub struct DirectiveName {
    name: SmolStr,
    parameter: DirectiveParameter,
    kind: DirectiveKind,
}

impl DirectiveName {
    const fn known(name: &'static str, parameter: DirectiveParameter, kind: DirectiveKind) -> Self {
        Self {
            name: SmolStr::new_inline(name),
            parameter,
            kind,
        }
    }

    pub const MAX_AGE: DirectiveName =
        Self::known("max-age", DirectiveParameter::Required, DirectiveKind::Seconds);
    pub const MAX_STALE: DirectiveName =
        Self::known("max-stale", DirectiveParameter::Optional, DirectiveKind::Seconds);
    pub const MIN_FRESH: DirectiveName =
        Self::known("min-fresh", DirectiveParameter::Required, DirectiveKind::Seconds);
    pub const S_MAXAGE: DirectiveName =
        Self::known("s-maxage", DirectiveParameter::Required, DirectiveKind::Seconds);
    pub const STALE_WHILE_REVALIDATE: DirectiveName = Self::known(
        "stale-while-revalidate",
        DirectiveParameter::Required,
        DirectiveKind::Seconds,
    );
    pub const STALE_IF_ERROR: DirectiveName =
        Self::known("stale-if-error", DirectiveParameter::Required, DirectiveKind::Seconds);
    pub const NO_CACHE: DirectiveName =
        Self::known("no-cache", DirectiveParameter::Optional, DirectiveKind::FieldNames);
    pub const PRIVATE: DirectiveName =
        Self::known("private", DirectiveParameter::Optional, DirectiveKind::FieldNames);
    pub const NO_STORE: DirectiveName =
        Self::known("no-store", DirectiveParameter::Absent, DirectiveKind::Extension);
    pub const NO_TRANSFORM: DirectiveName =
        Self::known("no-transform", DirectiveParameter::Absent, DirectiveKind::Extension);
    pub const ONLY_IF_CACHED: DirectiveName =
        Self::known("only-if-cached", DirectiveParameter::Absent, DirectiveKind::Extension);
    pub const MUST_REVALIDATE: DirectiveName =
        Self::known("must-revalidate", DirectiveParameter::Absent, DirectiveKind::Extension);
    pub const MUST_UNDERSTAND: DirectiveName =
        Self::known("must-understand", DirectiveParameter::Absent, DirectiveKind::Extension);
    pub const PROXY_REVALIDATE: DirectiveName =
        Self::known("proxy-revalidate", DirectiveParameter::Absent, DirectiveKind::Extension);
    pub const PUBLIC: DirectiveName =
        Self::known("public", DirectiveParameter::Absent, DirectiveKind::Extension);
    pub const IMMUTABLE: DirectiveName =
        Self::known("immutable", DirectiveParameter::Absent, DirectiveKind::Extension);

    /// The registered directive, or an extension directive after token
    /// validation.
    pub fn lookup(name: &str) -> Result<DirectiveName> {
        if let Some(known) = DIRECTIVES.get(name.to_ascii_lowercase().as_str()) {
            return Ok(known.clone());
        }
        if name.is_empty() {
            return Err(HeaderValueError::missing("directive", name));
        }
        if let Some((position, _)) = RFC2045_TOKEN.first_invalid(name) {
            return Err(HeaderValueError::invalid_character(name, position));
        }
        Ok(Self {
            name: SmolStr::new(name),
            parameter: DirectiveParameter::Optional,
            kind: DirectiveKind::Extension,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn parameter(&self) -> DirectiveParameter {
        self.parameter
    }

    pub fn kind(&self) -> DirectiveKind {
        self.kind
    }

    pub fn is_registered(&self) -> bool {
        DIRECTIVES.contains_key(self.name.to_ascii_lowercase().as_str())
    }
}

impl PartialEq for DirectiveName {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for DirectiveName {}

impl fmt::Display for DirectiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

static DIRECTIVES: Lazy<HashMap<SmolStr, DirectiveName>> = Lazy::new(|| {
    [
        DirectiveName::MAX_AGE,
        DirectiveName::MAX_STALE,
        DirectiveName::MIN_FRESH,
        DirectiveName::S_MAXAGE,
        DirectiveName::STALE_WHILE_REVALIDATE,
        DirectiveName::STALE_IF_ERROR,
        DirectiveName::NO_CACHE,
        DirectiveName::PRIVATE,
        DirectiveName::NO_STORE,
        DirectiveName::NO_TRANSFORM,
        DirectiveName::ONLY_IF_CACHED,
        DirectiveName::MUST_REVALIDATE,
        DirectiveName::MUST_UNDERSTAND,
        DirectiveName::PROXY_REVALIDATE,
        DirectiveName::PUBLIC,
        DirectiveName::IMMUTABLE,
    ]
    .into_iter()
    .map(|name| (name.name.clone(), name))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    Seconds(u64),
    Text(SmolStr),
}

impl DirectiveValue {
    pub fn kind(&self) -> &'static str {
        match self {
            DirectiveValue::Seconds(_) => "long",
            DirectiveValue::Text(_) => "string",
        }
    }
}

static SECONDS: QuotedHandler<LongHandler> = QuotedHandler::new(LongHandler, false);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheControlDirective {
    name: DirectiveName,
    value: Option<DirectiveValue>,
}

impl CacheControlDirective {
    /// Validates `value` against the directive's rules.
    pub fn new(name: DirectiveName, value: Option<DirectiveValue>) -> Result<Self> {
        let directive = Self { name, value };
        directive.check()?;
        Ok(directive)
    }

    /// A directive without an argument, such as `no-store`.
    pub fn flag(name: DirectiveName) -> Result<Self> {
        Self::new(name, None)
    }

    pub fn seconds(name: DirectiveName, seconds: u64) -> Result<Self> {
        Self::new(name, Some(DirectiveValue::Seconds(seconds)))
    }

    fn from_text(name: DirectiveName, raw: Option<&str>) -> Result<Self> {
        let value = match raw {
            None => None,
            Some(raw) => Some(Self::parse_value(&name, raw).map_err(|e| e.converting(name.as_str(), raw))?),
        };
        Self::new(name, value)
    }

    fn parse_value(name: &DirectiveName, raw: &str) -> Result<DirectiveValue> {
        match name.kind {
            DirectiveKind::Seconds => SECONDS.parse(raw).map(DirectiveValue::Seconds),
            DirectiveKind::FieldNames => {
                let text = DEFAULT_STRING.parse(raw)?;
                check_field_names(&text)?;
                Ok(DirectiveValue::Text(text))
            }
            DirectiveKind::Extension => first_of(
                raw,
                &[
                    &|text: &str| LongHandler.parse(text).map(DirectiveValue::Seconds),
                    &|text: &str| DEFAULT_STRING.parse(text).map(DirectiveValue::Text),
                ],
            ),
        }
    }

    fn check(&self) -> Result<()> {
        match (self.name.parameter, &self.value) {
            (DirectiveParameter::Required, None) => {
                return Err(HeaderValueError::invalid(format!(
                    "Cache-Control directive {:?} requires parameter",
                    self.name.as_str()
                )))
            }
            (DirectiveParameter::Absent, Some(_)) => {
                return Err(HeaderValueError::invalid(format!(
                    "Cache-Control directive {:?} didnt accept parameter",
                    self.name.as_str()
                )))
            }
            _ => {}
        }
        let expected = match (self.name.kind, &self.value) {
            (_, None)
            | (DirectiveKind::Seconds, Some(DirectiveValue::Seconds(_)))
            | (DirectiveKind::Extension, Some(_)) => return Ok(()),
            (DirectiveKind::FieldNames, Some(DirectiveValue::Text(text))) => {
                return check_field_names(text)
            }
            (DirectiveKind::Seconds, Some(_)) => "long",
            (DirectiveKind::FieldNames, Some(_)) => "string",
        };
        Err(HeaderValueError::TypeMismatch {
            name: self.name.to_string(),
            expected,
            actual: self.value.as_ref().map_or("none", DirectiveValue::kind),
        })
    }

    pub fn name(&self) -> &DirectiveName {
        &self.name
    }

    pub fn value(&self) -> Option<&DirectiveValue> {
        self.value.as_ref()
    }

    pub fn seconds_value(&self) -> Option<u64> {
        match self.value {
            Some(DirectiveValue::Seconds(seconds)) => Some(seconds),
            _ => None,
        }
    }

    /// Field names listed by `no-cache` or `private`.
    pub fn field_names(&self) -> Vec<&str> {
        match &self.value {
            Some(DirectiveValue::Text(text)) if self.name.kind == DirectiveKind::FieldNames => text
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn check_field_names(text: &str) -> Result<()> {
    for name in text.split(',').map(str::trim) {
        if name.is_empty() {
            return Err(HeaderValueError::missing("field name", text));
        }
        if !RFC2045_TOKEN.all(name) {
            return Err(HeaderValueError::invalid(format!("Invalid field name {:?}", name)));
        }
    }
    Ok(())
}

impl HeaderValue for CacheControlDirective {
    fn to_header_text(&self) -> String {
        match &self.value {
            None => self.name.to_string(),
            Some(DirectiveValue::Seconds(seconds)) => format!("{}={}", self.name, seconds),
            Some(DirectiveValue::Text(text)) if self.name.kind == DirectiveKind::FieldNames => {
                format!("{}={}", self.name, scanner::quote(text))
            }
            // Unquoted digits would read back as seconds.
            Some(DirectiveValue::Text(text)) if LongHandler.parse(text).is_ok() => {
                format!("{}={}", self.name, scanner::quote(text))
            }
            Some(DirectiveValue::Text(text)) => {
                format!("{}={}", self.name, DEFAULT_STRING.format(text))
            }
        }
    }
}

#[derive(Debug)]
enum State {
    Directive,
    AfterName(DirectiveName),
    Argument(DirectiveName),
    AfterDirective,
}

struct CacheControlGrammar {
    state: State,
    directives: Vec<CacheControlDirective>,
    separated: bool,
}

impl Grammar for CacheControlGrammar {
    type Output = Vec<CacheControlDirective>;

    fn on_event(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Directive) {
            State::Directive => match event {
                Event::Whitespace => {
                    cursor.bump();
                }
                Event::Token | Event::Wildcard => {
                    let name = DirectiveName::lookup(cursor.token(&RFC2045_TOKEN))?;
                    self.state = State::AfterName(name);
                }
                Event::CommentOpen => return Err(cursor.comment_present()),
                _ => return Err(cursor.invalid_character()),
            },
            State::AfterName(name) => match event {
                Event::KeyValueSeparator => {
                    cursor.bump();
                    self.state = State::Argument(name);
                }
                _ => {
                    self.directives.push(CacheControlDirective::from_text(name, None)?);
                    self.state = State::AfterDirective;
                    return self.on_event(event, cursor);
                }
            },
            State::Argument(name) => {
                let raw = match event {
                    Event::QuotedText => cursor.quoted_span(&chars::QUOTED_TEXT, true)?,
                    Event::Token | Event::Wildcard => cursor.token(&RFC2045_TOKEN),
                    _ => return Err(cursor.invalid_character()),
                };
                self.directives.push(CacheControlDirective::from_text(name, Some(raw))?);
                self.state = State::AfterDirective;
            }
            State::AfterDirective => {
                self.state = State::AfterDirective;
                match event {
                    Event::Whitespace => {
                        cursor.bump();
                    }
                    Event::MultiValueSeparator => {
                        cursor.bump();
                        self.separated = true;
                        self.state = State::Directive;
                    }
                    Event::CommentOpen => return Err(cursor.comment_present()),
                    _ => return Err(cursor.invalid_character()),
                }
            }
        }
        Ok(())
    }

    fn end_of_text(mut self, cursor: &Cursor<'_>) -> Result<Vec<CacheControlDirective>> {
        match self.state {
            State::Directive if self.separated => Err(cursor.missing("directive")),
            State::Directive => Ok(self.directives),
            State::AfterName(name) => {
                self.directives.push(CacheControlDirective::from_text(name, None)?);
                Ok(self.directives)
            }
            State::Argument(name) => Err(HeaderValueError::missing("parameter value", cursor.text())
                .converting(name.as_str(), cursor.text())),
            State::AfterDirective => Ok(self.directives),
        }
    }
}

/// `Cache-Control` directives in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheControl(Vec<CacheControlDirective>);

impl CacheControl {
    pub fn new(directives: Vec<CacheControlDirective>) -> Result<Self> {
        if directives.is_empty() {
            return Err(HeaderValueError::empty_list("Cache-Control"));
        }
        Ok(Self(directives))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let directives = parse_with(
            text,
            CacheControlGrammar {
                state: State::Directive,
                directives: Vec::new(),
                separated: false,
            },
        )?;
        Self::new(directives)
    }

    pub fn directives(&self) -> &[CacheControlDirective] {
        &self.0
    }

    pub fn get(&self, name: &DirectiveName) -> Option<&CacheControlDirective> {
        self.0.iter().find(|directive| directive.name == *name)
    }

    pub fn contains(&self, name: &DirectiveName) -> bool {
        self.get(name).is_some()
    }

    pub fn max_age(&self) -> Option<u64> {
        self.get(&DirectiveName::MAX_AGE)
            .and_then(CacheControlDirective::seconds_value)
    }

    pub fn s_maxage(&self) -> Option<u64> {
        self.get(&DirectiveName::S_MAXAGE)
            .and_then(CacheControlDirective::seconds_value)
    }

    pub fn no_cache(&self) -> bool {
        self.contains(&DirectiveName::NO_CACHE)
    }

    pub fn no_store(&self) -> bool {
        self.contains(&DirectiveName::NO_STORE)
    }

    pub fn is_public(&self) -> bool {
        self.contains(&DirectiveName::PUBLIC)
    }

    pub fn is_private(&self) -> bool {
        self.contains(&DirectiveName::PRIVATE)
    }
}

impl HeaderValue for CacheControl {
    fn to_header_text(&self) -> String {
        crate::parameters::join_values(&self.0)
    }
}

header_text!(CacheControl, CacheControl::parse);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_age_and_no_cache() {
        let cache_control = CacheControl::parse("max-age=3600, no-cache").unwrap();
        let directives = cache_control.directives();
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].name(), &DirectiveName::MAX_AGE);
        assert_eq!(directives[0].value(), Some(&DirectiveValue::Seconds(3600)));
        assert_eq!(directives[1].name(), &DirectiveName::NO_CACHE);
        assert_eq!(directives[1].value(), None);
        assert_eq!(cache_control.to_header_text(), "max-age=3600, no-cache");
        assert_eq!(cache_control.max_age(), Some(3600));
        assert!(cache_control.no_cache());
    }

    #[test]
    fn names_ignore_case() {
        let cache_control = CacheControl::parse("Max-Age=10,NO-STORE").unwrap();
        assert_eq!(cache_control.max_age(), Some(10));
        assert!(cache_control.no_store());
    }

    #[test]
    fn required_parameter_missing() {
        let err = CacheControl::parse("max-age").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cache-Control directive \"max-age\" requires parameter"
        );
    }

    #[test]
    fn absent_parameter_present() {
        let err = CacheControl::parse("no-store=1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cache-Control directive \"no-store\" didnt accept parameter"
        );
    }

    #[test]
    fn seconds_must_be_numeric() {
        let err = CacheControl::parse("max-age=abc").unwrap_err();
        assert!(err.to_string().starts_with("Failed to convert \"max-age\" value \"abc\""));
        assert_eq!(
            CacheControl::parse("max-age=\"60\"").unwrap().max_age(),
            Some(60)
        );
    }

    #[test]
    fn extension_tries_number_then_text() {
        let cache_control = CacheControl::parse("community=\"UCI\", x-ttl=30, x-flag").unwrap();
        let directives = cache_control.directives();
        assert_eq!(
            directives[0].value(),
            Some(&DirectiveValue::Text("UCI".into()))
        );
        assert_eq!(directives[1].value(), Some(&DirectiveValue::Seconds(30)));
        assert_eq!(directives[2].value(), None);
        assert_eq!(cache_control.to_header_text(), "community=UCI, x-ttl=30, x-flag");
    }

    #[test]
    fn numeric_text_stays_quoted() {
        let cache_control = CacheControl::parse("x-id=\"123\"").unwrap();
        assert_eq!(
            cache_control.directives()[0].value(),
            Some(&DirectiveValue::Text("123".into()))
        );
        assert_eq!(cache_control.to_header_text(), "x-id=\"123\"");
        assert_eq!(CacheControl::parse(&cache_control.to_header_text()).unwrap(), cache_control);
    }

    #[test]
    fn field_names_stay_quoted() {
        let cache_control = CacheControl::parse("private=\"Set-Cookie, X-Id\", no-cache").unwrap();
        assert_eq!(
            cache_control.directives()[0].field_names(),
            vec!["Set-Cookie", "X-Id"]
        );
        assert_eq!(
            cache_control.to_header_text(),
            "private=\"Set-Cookie, X-Id\", no-cache"
        );
    }

    #[test]
    fn structural_errors() {
        assert!(CacheControl::parse("").is_err());
        assert!(CacheControl::parse("max-age=1,").is_err());
        assert!(CacheControl::parse("max-age=").is_err());
        assert!(CacheControl::parse("public (x)").unwrap_err().is_comment_present());
        assert!(CacheControl::parse("max-age=1 2").is_err());
    }

    #[test]
    fn programmatic_values_are_checked() {
        let err = CacheControlDirective::new(
            DirectiveName::MAX_AGE,
            Some(DirectiveValue::Text("soon".into())),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter \"max-age\" value not a long (got string)"
        );
        assert!(CacheControlDirective::seconds(DirectiveName::S_MAXAGE, 5).is_ok());
        assert!(CacheControlDirective::flag(DirectiveName::MIN_FRESH).is_err());
    }
}
