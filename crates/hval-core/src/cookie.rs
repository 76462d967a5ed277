// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Cookie` and `Set-Cookie` (RFC 6265 section 4).
//!
//! ```text
//! cookie-header = cookie-pair *( ";" SP cookie-pair )
//! set-cookie    = cookie-pair *( ";" SP cookie-av )
//! cookie-pair   = cookie-name "=" cookie-value
//! cookie-value  = *cookie-octet / ( DQUOTE *cookie-octet DQUOTE )
//! ```
//!
//! Cookie names are case-sensitive; `Set-Cookie` attribute names are not.

use std::fmt;

use chrono::NaiveDateTime;
use smol_str::SmolStr;

use crate::chars::{ASCII_PRINTABLE, COOKIE_OCTET, RFC2045_TOKEN};
use crate::error::{HeaderValueError, Result};
use crate::handler::{format_http_date, DateTimeHandler, HeaderValueHandler, LongHandler};
use crate::parameters::{header_text, HeaderValue};
use crate::scanner::{parse_with, Cursor, Event, Grammar};

/// One `name=value` pair. A quoted value keeps its quotes on output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookiePair {
    name: SmolStr,
    value: SmolStr,
    quoted: bool,
}

impl CookiePair {
    pub fn new(name: &str, value: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(HeaderValueError::missing("cookie name", name));
        }
        if let Some((position, _)) = RFC2045_TOKEN.first_invalid(name) {
            return Err(HeaderValueError::invalid_character(name, position));
        }
        if let Some((position, _)) = COOKIE_OCTET.first_invalid(value) {
            return Err(HeaderValueError::invalid_character(value, position));
        }
        Ok(Self {
            name: SmolStr::new(name),
            value: SmolStr::new(value),
            quoted: false,
        })
    }

    /// The same pair written as `name="value"`.
    pub fn quoted(mut self) -> Self {
        self.quoted = true;
        self
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut cursor = Cursor::new(text);
        let pair = read_pair(&mut cursor)?;
        cursor.expect_end()?;
        Ok(pair)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value without surrounding quotes.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }
}

impl HeaderValue for CookiePair {
    fn to_header_text(&self) -> String {
        if self.quoted {
            format!("{}=\"{}\"", self.name, self.value)
        } else {
            format!("{}={}", self.name, self.value)
        }
    }
}

header_text!(CookiePair, CookiePair::parse);

fn read_pair(cursor: &mut Cursor<'_>) -> Result<CookiePair> {
    let name = cursor.required_token(&RFC2045_TOKEN, "cookie name")?;
    cursor.expect('=', "cookie value")?;
    let quoted = cursor.peek() == Some('"');
    let value = if quoted {
        let span = cursor.quoted_span(&COOKIE_OCTET, false)?;
        &span[1..span.len() - 1]
    } else {
        cursor.token(&COOKIE_OCTET)
    };
    Ok(CookiePair {
        name: SmolStr::new(name),
        value: SmolStr::new(value),
        quoted,
    })
}

#[derive(Debug)]
enum State {
    Start,
    AfterPair,
    Separated,
}

struct CookieGrammar {
    state: State,
    pairs: Vec<CookiePair>,
}

impl Grammar for CookieGrammar {
    type Output = Cookie;

    fn on_event(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<()> {
        match (&self.state, event) {
            (_, Event::Whitespace) => {
                cursor.bump();
            }
            (State::Start | State::Separated, Event::Token | Event::Wildcard) => {
                self.pairs.push(read_pair(cursor)?);
                self.state = State::AfterPair;
            }
            (State::AfterPair, Event::ParameterSeparator) => {
                cursor.bump();
                self.state = State::Separated;
            }
            _ => return Err(cursor.invalid_character()),
        }
        Ok(())
    }

    fn end_of_text(self, cursor: &Cursor<'_>) -> Result<Cookie> {
        match self.state {
            State::AfterPair => Ok(Cookie { pairs: self.pairs }),
            State::Start => Err(HeaderValueError::empty_list("Cookie")),
            State::Separated => Err(cursor.missing("cookie pair")),
        }
    }
}

/// `Cookie`: the pairs a client sends, in order. Names may repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pairs: Vec<CookiePair>,
}

impl Cookie {
    pub fn new(pairs: Vec<CookiePair>) -> Result<Self> {
        if pairs.is_empty() {
            return Err(HeaderValueError::empty_list("Cookie"));
        }
        Ok(Self { pairs })
    }

    pub fn parse(text: &str) -> Result<Self> {
        parse_with(
            text,
            CookieGrammar {
                state: State::Start,
                pairs: Vec::new(),
            },
        )
    }

    pub fn pairs(&self) -> &[CookiePair] {
        &self.pairs
    }

    /// Value of the first pair called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|pair| pair.name == name)
            .map(CookiePair::value)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |pair| pair.name == name)
            .map(CookiePair::value)
    }
}

impl HeaderValue for Cookie {
    fn to_header_text(&self) -> String {
        let pairs: Vec<String> = self.pairs.iter().map(CookiePair::to_header_text).collect();
        pairs.join("; ")
    }
}

header_text!(Cookie, Cookie::parse);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        [SameSite::Strict, SameSite::Lax, SameSite::None]
            .into_iter()
            .find(|same_site| same_site.as_str().eq_ignore_ascii_case(text))
            .ok_or_else(|| HeaderValueError::invalid(format!("Invalid SameSite value {:?}", text)))
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `Set-Cookie` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAttribute {
    Expires(NaiveDateTime),
    /// Seconds; zero or negative expires the cookie at once.
    MaxAge(i64),
    /// Lowercase, without a leading dot.
    Domain(SmolStr),
    Path(SmolStr),
    Secure,
    HttpOnly,
    SameSite(SameSite),
    /// Unregistered `name[=value]`, kept as written.
    Extension(SmolStr, Option<SmolStr>),
}

fn required<'a>(value: Option<&'a str>, what: &'static str, name: &str) -> Result<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(HeaderValueError::missing(what, name)),
    }
}

fn no_value(value: Option<&str>, name: &str) -> Result<()> {
    match value {
        None => Ok(()),
        Some(_) => Err(HeaderValueError::invalid(format!(
            "Set-Cookie attribute {:?} takes no value",
            name
        ))),
    }
}

fn check_domain(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(HeaderValueError::missing("domain", domain));
    }
    match domain.find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '.')) {
        Some(position) => Err(HeaderValueError::invalid_character(domain, position)),
        None => Ok(()),
    }
}

fn check_av_octets(text: &str) -> Result<()> {
    match text.find(|c: char| c == ';' || !ASCII_PRINTABLE.test(c)) {
        Some(position) => Err(HeaderValueError::invalid_character(text, position)),
        None => Ok(()),
    }
}

impl CookieAttribute {
    /// Reads one attribute from its name and the text after `=`, if any.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "" => Err(HeaderValueError::missing("attribute name", name)),
            "expires" => {
                let value = required(value, "Expires date", name)?;
                DateTimeHandler::UNQUOTED
                    .parse_named(value, "Expires")
                    .map(CookieAttribute::Expires)
            }
            "max-age" => {
                let value = required(value, "Max-Age seconds", name)?;
                let (negative, digits) = match value.strip_prefix('-') {
                    Some(digits) => (true, digits),
                    None => (false, value),
                };
                let seconds = LongHandler.parse_named(digits, "Max-Age")?;
                let seconds = i64::try_from(seconds).map_err(|_| {
                    HeaderValueError::invalid(format!("Max-Age {:?} too large", value))
                })?;
                Ok(CookieAttribute::MaxAge(if negative { -seconds } else { seconds }))
            }
            "domain" => {
                let value = required(value, "domain", name)?;
                let domain = value.strip_prefix('.').unwrap_or(value).to_ascii_lowercase();
                check_domain(&domain)?;
                Ok(CookieAttribute::Domain(SmolStr::new(domain)))
            }
            "path" => {
                let value = required(value, "path", name)?;
                check_av_octets(value)?;
                Ok(CookieAttribute::Path(SmolStr::new(value)))
            }
            "secure" => no_value(value, name).map(|_| CookieAttribute::Secure),
            "httponly" => no_value(value, name).map(|_| CookieAttribute::HttpOnly),
            "samesite" => {
                let value = required(value, "SameSite value", name)?;
                SameSite::parse(value).map(CookieAttribute::SameSite)
            }
            _ => {
                if let Some((position, _)) = RFC2045_TOKEN.first_invalid(name) {
                    return Err(HeaderValueError::invalid_character(name, position));
                }
                if let Some(value) = value {
                    check_av_octets(value)?;
                }
                Ok(CookieAttribute::Extension(
                    SmolStr::new(name),
                    value.map(SmolStr::new),
                ))
            }
        }
    }

    fn check(&self) -> Result<()> {
        match self {
            CookieAttribute::Expires(date) => DateTimeHandler::UNQUOTED.check_named(date, "Expires"),
            CookieAttribute::Domain(domain) => check_domain(domain),
            CookieAttribute::Path(path) if path.is_empty() => {
                Err(HeaderValueError::missing("path", path))
            }
            CookieAttribute::Path(path) => check_av_octets(path),
            CookieAttribute::Extension(name, value) => {
                if name.is_empty() {
                    return Err(HeaderValueError::missing("attribute name", name));
                }
                if let Some((position, _)) = RFC2045_TOKEN.first_invalid(name) {
                    return Err(HeaderValueError::invalid_character(name, position));
                }
                value.as_deref().map_or(Ok(()), check_av_octets)
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for CookieAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieAttribute::Expires(date) => write!(f, "Expires={}", format_http_date(date)),
            CookieAttribute::MaxAge(seconds) => write!(f, "Max-Age={}", seconds),
            CookieAttribute::Domain(domain) => write!(f, "Domain={}", domain),
            CookieAttribute::Path(path) => write!(f, "Path={}", path),
            CookieAttribute::Secure => f.write_str("Secure"),
            CookieAttribute::HttpOnly => f.write_str("HttpOnly"),
            CookieAttribute::SameSite(same_site) => write!(f, "SameSite={}", same_site),
            CookieAttribute::Extension(name, None) => f.write_str(name),
            CookieAttribute::Extension(name, Some(value)) => write!(f, "{}={}", name, value),
        }
    }
}

/// `Set-Cookie`: one pair and its attributes in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pair: CookiePair,
    attributes: Vec<CookieAttribute>,
}

impl SetCookie {
    pub fn new(pair: CookiePair) -> Self {
        Self {
            pair,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: CookieAttribute) -> Result<Self> {
        attribute.check()?;
        self.attributes.push(attribute);
        Ok(self)
    }

    /// Attribute values run to the next `;`, so `Expires` may hold the
    /// comma and spaces of an HTTP date.
    pub fn parse(text: &str) -> Result<Self> {
        let mut cursor = Cursor::new(text);
        let pair = read_pair(&mut cursor)?;
        let mut attributes = Vec::new();
        loop {
            cursor.skip_whitespace();
            if cursor.is_empty() {
                break;
            }
            cursor.expect(';', "cookie attribute")?;
            cursor.skip_whitespace();
            let name = cursor.take_while(|c| c != ';' && c != '=').trim_end();
            let value = if cursor.consume_if('=') {
                Some(cursor.take_while(|c| c != ';').trim())
            } else {
                None
            };
            attributes.push(CookieAttribute::parse(name, value)?);
        }
        Ok(Self { pair, attributes })
    }

    pub fn pair(&self) -> &CookiePair {
        &self.pair
    }

    pub fn name(&self) -> &str {
        self.pair.name()
    }

    pub fn value(&self) -> &str {
        self.pair.value()
    }

    pub fn attributes(&self) -> &[CookieAttribute] {
        &self.attributes
    }

    pub fn expires(&self) -> Option<&NaiveDateTime> {
        self.attributes.iter().rev().find_map(|attribute| match attribute {
            CookieAttribute::Expires(date) => Some(date),
            _ => None,
        })
    }

    pub fn max_age(&self) -> Option<i64> {
        self.attributes.iter().rev().find_map(|attribute| match attribute {
            CookieAttribute::MaxAge(seconds) => Some(*seconds),
            _ => None,
        })
    }

    pub fn domain(&self) -> Option<&str> {
        self.attributes.iter().rev().find_map(|attribute| match attribute {
            CookieAttribute::Domain(domain) => Some(domain.as_str()),
            _ => None,
        })
    }

    pub fn path(&self) -> Option<&str> {
        self.attributes.iter().rev().find_map(|attribute| match attribute {
            CookieAttribute::Path(path) => Some(path.as_str()),
            _ => None,
        })
    }

    pub fn is_secure(&self) -> bool {
        self.attributes.contains(&CookieAttribute::Secure)
    }

    pub fn is_http_only(&self) -> bool {
        self.attributes.contains(&CookieAttribute::HttpOnly)
    }

    pub fn same_site(&self) -> Option<SameSite> {
        self.attributes.iter().rev().find_map(|attribute| match attribute {
            CookieAttribute::SameSite(same_site) => Some(*same_site),
            _ => None,
        })
    }
}

impl HeaderValue for SetCookie {
    fn to_header_text(&self) -> String {
        let mut text = self.pair.to_header_text();
        for attribute in &self.attributes {
            text.push_str("; ");
            text.push_str(&attribute.to_string());
        }
        text
    }
}

header_text!(SetCookie, SetCookie::parse);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_cookie_pairs() {
        let cookie = Cookie::parse("SID=31d4d96e407aad42; lang=en-US; lang=fr").unwrap();
        assert_eq!(cookie.pairs().len(), 3);
        assert_eq!(cookie.get("SID"), Some("31d4d96e407aad42"));
        assert_eq!(cookie.get("sid"), None);
        assert_eq!(cookie.get_all("lang").collect::<Vec<_>>(), ["en-US", "fr"]);
        assert_eq!(
            cookie.to_header_text(),
            "SID=31d4d96e407aad42; lang=en-US; lang=fr"
        );
    }

    #[test]
    fn quoted_and_empty_values() {
        let cookie = Cookie::parse("a=\"x=y\";b=;c=dGVzdA==").unwrap();
        assert_eq!(cookie.get("a"), Some("x=y"));
        assert!(cookie.pairs()[0].is_quoted());
        assert_eq!(cookie.get("b"), Some(""));
        assert_eq!(cookie.get("c"), Some("dGVzdA=="));
        assert_eq!(cookie.to_header_text(), "a=\"x=y\"; b=; c=dGVzdA==");
    }

    #[test]
    fn malformed_cookies_rejected() {
        assert!(matches!(
            Cookie::parse(""),
            Err(HeaderValueError::EmptyList { .. })
        ));
        assert!(matches!(
            Cookie::parse("a=b;"),
            Err(HeaderValueError::MissingValue { what: "cookie pair", .. })
        ));
        assert!(matches!(
            Cookie::parse("a=b c=d"),
            Err(HeaderValueError::InvalidCharacter { position: 4, .. })
        ));
        assert!(Cookie::parse("a=b, c=d").is_err());
        assert!(Cookie::parse("=b").is_err());
        assert!(Cookie::parse("a").is_err());
        assert!(Cookie::parse("a=\"b").is_err());
    }

    #[test]
    fn pair_constructor_validates() {
        assert_eq!(
            CookiePair::new("id", "42").unwrap().quoted().to_string(),
            "id=\"42\""
        );
        assert!(CookiePair::new("", "x").is_err());
        assert!(CookiePair::new("a b", "x").is_err());
        assert!(CookiePair::new("id", "a;b").is_err());
    }

    #[test]
    fn parses_set_cookie_attributes() {
        let set_cookie = SetCookie::parse(
            "SID=31d4d96e407aad42; Path=/; Domain=.Example.com; Expires=Wed, 09 Jun 2021 10:18:14 GMT; \
             Max-Age=3600; Secure; HttpOnly; SameSite=lax; Priority=High",
        )
        .unwrap();
        assert_eq!(set_cookie.name(), "SID");
        assert_eq!(set_cookie.path(), Some("/"));
        assert_eq!(set_cookie.domain(), Some("example.com"));
        assert_eq!(
            set_cookie.expires(),
            Some(
                &NaiveDate::from_ymd_opt(2021, 6, 9)
                    .unwrap()
                    .and_hms_opt(10, 18, 14)
                    .unwrap()
            )
        );
        assert_eq!(set_cookie.max_age(), Some(3600));
        assert!(set_cookie.is_secure());
        assert!(set_cookie.is_http_only());
        assert_eq!(set_cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(
            set_cookie.attributes().last(),
            Some(&CookieAttribute::Extension("Priority".into(), Some("High".into())))
        );
        assert_eq!(
            set_cookie.to_header_text(),
            "SID=31d4d96e407aad42; Path=/; Domain=example.com; Expires=Wed, 09 Jun 2021 10:18:14 GMT; \
             Max-Age=3600; Secure; HttpOnly; SameSite=Lax; Priority=High"
        );
    }

    #[test]
    fn negative_max_age() {
        let set_cookie = SetCookie::parse("a=b; max-age=-1").unwrap();
        assert_eq!(set_cookie.max_age(), Some(-1));
        assert_eq!(set_cookie.to_header_text(), "a=b; Max-Age=-1");
    }

    #[test]
    fn bad_attributes_rejected() {
        let err = SetCookie::parse("a=b; Max-Age=soon").unwrap_err();
        assert!(err.to_string().starts_with("Failed to convert \"Max-Age\""));
        assert!(SetCookie::parse("a=b; Secure=yes").is_err());
        assert!(SetCookie::parse("a=b; SameSite=Sometimes").is_err());
        assert!(SetCookie::parse("a=b; Expires=tomorrow").is_err());
        assert!(SetCookie::parse("a=b; Domain=exa mple.com").is_err());
        assert!(SetCookie::parse("a=b;").is_err());
        assert!(SetCookie::parse("a=b; Path").is_err());
    }

    #[test]
    fn builder_checks_attributes() {
        let set_cookie = SetCookie::new(CookiePair::new("id", "7").unwrap())
            .with_attribute(CookieAttribute::Path("/app".into()))
            .unwrap()
            .with_attribute(CookieAttribute::SameSite(SameSite::Strict))
            .unwrap();
        assert_eq!(set_cookie.to_string(), "id=7; Path=/app; SameSite=Strict");
        assert!(SetCookie::new(CookiePair::new("id", "7").unwrap())
            .with_attribute(CookieAttribute::Domain("bad domain".into()))
            .is_err());
    }
}
