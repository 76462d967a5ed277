// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bidirectional converters between header text and typed values.
//!
//! A handler knows how to `parse` text into its value, `check` an already
//! typed value (for values built in code rather than parsed), and `format` the
//! value back into text. The `*_named` variants are the converter boundary:
//! any failure underneath is wrapped in [`HeaderValueError::Conversion`]
//! naming the header or parameter and quoting the offending text.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use smol_str::SmolStr;

use crate::chars::{self, CharPredicate};
use crate::error::{HeaderValueError, Result};
use crate::qweight::QWeight;
use crate::scanner::{self, Cursor};

pub trait HeaderValueHandler: fmt::Debug + Send + Sync {
    type Value: fmt::Debug;

    fn parse(&self, text: &str) -> Result<Self::Value>;

    fn check(&self, value: &Self::Value) -> Result<()> {
        let _ = value;
        Ok(())
    }

    /// Renders a value that has already passed [`check`](Self::check).
    fn format(&self, value: &Self::Value) -> String;

    fn parse_named(&self, text: &str, name: &str) -> Result<Self::Value> {
        self.parse(text).map_err(|e| e.converting(name, text))
    }

    fn check_named(&self, value: &Self::Value, name: &str) -> Result<()> {
        self.check(value)
            .map_err(|e| e.converting(name, &format!("{:?}", value)))
    }

    fn format_named(&self, value: &Self::Value, name: &str) -> Result<String> {
        self.check_named(value, name)?;
        Ok(self.format(value))
    }
}

/// Tries each alternative in order and returns the first success.
///
/// Failures of earlier alternatives are dropped; if all fail, only the last
/// failure is returned.
pub fn first_of<T>(text: &str, alternatives: &[&dyn Fn(&str) -> Result<T>]) -> Result<T> {
    let mut last = HeaderValueError::missing("alternative", text);
    for alternative in alternatives {
        match alternative(text) {
            Ok(value) => return Ok(value),
            Err(e) => last = e,
        }
    }
    Err(last)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    Unquoted,
    Quoted,
    /// Quoted when the text starts with `"`, unquoted otherwise.
    QuotedOrUnquoted,
}

/// Plain text, optionally quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringHandler {
    quoting: Quoting,
    quoted: CharPredicate,
    escapes: bool,
    unquoted: CharPredicate,
}

impl StringHandler {
    pub const fn unquoted(unquoted: CharPredicate) -> Self {
        Self {
            quoting: Quoting::Unquoted,
            quoted: unquoted,
            escapes: false,
            unquoted,
        }
    }

    pub const fn quoted(quoted: CharPredicate, escapes: bool) -> Self {
        Self {
            quoting: Quoting::Quoted,
            quoted,
            escapes,
            unquoted: quoted,
        }
    }

    pub const fn quoted_or_unquoted(
        quoted: CharPredicate,
        escapes: bool,
        unquoted: CharPredicate,
    ) -> Self {
        Self {
            quoting: Quoting::QuotedOrUnquoted,
            quoted,
            escapes,
            unquoted,
        }
    }

    pub fn quoting(&self) -> Quoting {
        self.quoting
    }

    fn parse_quoted(&self, text: &str) -> Result<SmolStr> {
        let mut cursor = Cursor::new(text);
        let value = cursor.quoted_text(&self.quoted, self.escapes)?;
        cursor.expect_end()?;
        Ok(SmolStr::new(value))
    }

    fn parse_unquoted(&self, text: &str) -> Result<SmolStr> {
        if text.is_empty() {
            return Err(HeaderValueError::missing("value", text));
        }
        if let Some((position, _)) = self.unquoted.first_invalid(text) {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        Ok(SmolStr::new(text))
    }

    fn quotable(&self, value: &str) -> bool {
        value
            .chars()
            .all(|c| self.quoted.test(c) || (self.escapes && (c == '"' || c == '\\')))
    }

    fn unquotable(&self, value: &str) -> bool {
        !value.is_empty() && self.unquoted.all(value)
    }
}

impl HeaderValueHandler for StringHandler {
    type Value = SmolStr;

    fn parse(&self, text: &str) -> Result<SmolStr> {
        match self.quoting {
            Quoting::Unquoted => self.parse_unquoted(text),
            Quoting::Quoted => self.parse_quoted(text),
            Quoting::QuotedOrUnquoted if text.starts_with('"') => self.parse_quoted(text),
            Quoting::QuotedOrUnquoted => self.parse_unquoted(text),
        }
    }

    fn check(&self, value: &SmolStr) -> Result<()> {
        let ok = match self.quoting {
            Quoting::Unquoted => self.unquotable(value),
            Quoting::Quoted => self.quotable(value),
            Quoting::QuotedOrUnquoted => self.unquotable(value) || self.quotable(value),
        };
        if ok {
            Ok(())
        } else {
            Err(HeaderValueError::invalid(format!(
                "Invalid characters in {:?}, expected {}",
                value.as_str(),
                match self.quoting {
                    Quoting::Unquoted => self.unquoted.name(),
                    _ => self.quoted.name(),
                }
            )))
        }
    }

    fn format(&self, value: &SmolStr) -> String {
        match self.quoting {
            Quoting::Unquoted => value.to_string(),
            Quoting::QuotedOrUnquoted if self.unquotable(value) => value.to_string(),
            _ if self.escapes => scanner::quote(value),
            _ => format!("\"{}\"", value),
        }
    }
}

/// Parameter values that are not registered constants.
pub const DEFAULT_STRING: StringHandler =
    StringHandler::quoted_or_unquoted(chars::QUOTED_TEXT, true, chars::RFC2045_TOKEN);

/// Free text such as `Server` and `User-Agent`, comments included.
pub const FIELD_TEXT: StringHandler = StringHandler::unquoted(chars::FIELD_TEXT);

/// Non-negative decimal integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LongHandler;

impl HeaderValueHandler for LongHandler {
    type Value = u64;

    fn parse(&self, text: &str) -> Result<u64> {
        if text.is_empty() {
            return Err(HeaderValueError::missing("number", text));
        }
        if let Some((position, _)) = text.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        text.parse()
            .map_err(|_| HeaderValueError::invalid(format!("Number {:?} too large", text)))
    }

    fn format(&self, value: &u64) -> String {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QWeightHandler;

impl HeaderValueHandler for QWeightHandler {
    type Value = QWeight;

    fn parse(&self, text: &str) -> Result<QWeight> {
        QWeight::parse(text)
    }

    fn check(&self, value: &QWeight) -> Result<()> {
        QWeight::new(value.value()).map(|_| ())
    }

    fn format(&self, value: &QWeight) -> String {
        value.to_string()
    }
}

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// RFC 7231 `IMF-fixdate`, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
///
/// Only GMT is accepted. With `quoted` set the date must be wrapped in double
/// quotes, as in `Content-Disposition` date parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeHandler {
    quoted: bool,
}

impl DateTimeHandler {
    pub const UNQUOTED: DateTimeHandler = DateTimeHandler { quoted: false };
    pub const QUOTED: DateTimeHandler = DateTimeHandler { quoted: true };

    fn parse_fixdate(text: &str) -> Result<NaiveDateTime> {
        let invalid = || HeaderValueError::invalid(format!("Invalid date {:?}", text));
        let bytes = text.as_bytes();
        if bytes.len() != 29 || !text.is_ascii() {
            return Err(invalid());
        }
        if &text[3..5] != ", " || bytes[7] != b' ' || bytes[11] != b' ' || bytes[16] != b' ' {
            return Err(invalid());
        }
        if bytes[19] != b':' || bytes[22] != b':' || &text[25..] != " GMT" {
            return Err(invalid());
        }
        let weekday = DAY_NAMES
            .iter()
            .position(|d| *d == &text[0..3])
            .ok_or_else(invalid)?;
        let month = MONTH_NAMES
            .iter()
            .position(|m| *m == &text[8..11])
            .ok_or_else(invalid)?;
        let number = |range: std::ops::Range<usize>| -> Result<u32> {
            let digits = &text[range];
            if !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            digits.parse().map_err(|_| invalid())
        };
        let day = number(5..7)?;
        let year = number(12..16)? as i32;
        let hour = number(17..19)?;
        let minute = number(20..22)?;
        let second = number(23..25)?;

        let date = NaiveDate::from_ymd_opt(year, month as u32 + 1, day).ok_or_else(invalid)?;
        if date.weekday().num_days_from_monday() as usize != weekday {
            return Err(HeaderValueError::invalid(format!(
                "Invalid day name in {:?}, expected {}",
                text,
                DAY_NAMES[date.weekday().num_days_from_monday() as usize]
            )));
        }
        let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?;
        Ok(NaiveDateTime::new(date, time))
    }
}

impl HeaderValueHandler for DateTimeHandler {
    type Value = NaiveDateTime;

    fn parse(&self, text: &str) -> Result<NaiveDateTime> {
        if !self.quoted {
            return Self::parse_fixdate(text);
        }
        let mut cursor = Cursor::new(text);
        let inner = cursor.quoted_text(&chars::QUOTED_TEXT, false)?;
        cursor.expect_end()?;
        Self::parse_fixdate(&inner)
    }

    fn check(&self, value: &NaiveDateTime) -> Result<()> {
        if (0..=9999).contains(&value.year()) {
            Ok(())
        } else {
            Err(HeaderValueError::invalid(format!(
                "Year {} cannot be written as an HTTP date",
                value.year()
            )))
        }
    }

    fn format(&self, value: &NaiveDateTime) -> String {
        let text = format_http_date(value);
        if self.quoted {
            format!("\"{}\"", text)
        } else {
            text
        }
    }
}

pub fn format_http_date(value: &NaiveDateTime) -> String {
    let weekday: Weekday = value.weekday();
    format!(
        "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
        DAY_NAMES[weekday.num_days_from_monday() as usize],
        value.day(),
        MONTH_NAMES[value.month0() as usize],
        value.year(),
        value.hour(),
        value.minute(),
        value.second()
    )
}

/// Wraps another handler whose text may appear quoted, as parameter values
/// often do. `always` forces quotes on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotedHandler<H> {
    inner: H,
    always: bool,
}

impl<H> QuotedHandler<H> {
    pub const fn new(inner: H, always: bool) -> Self {
        Self { inner, always }
    }
}

impl<H: HeaderValueHandler> HeaderValueHandler for QuotedHandler<H> {
    type Value = H::Value;

    fn parse(&self, text: &str) -> Result<H::Value> {
        if text.starts_with('"') {
            let mut cursor = Cursor::new(text);
            let inner = cursor.quoted_text(&chars::QUOTED_TEXT, true)?;
            cursor.expect_end()?;
            self.inner.parse(&inner)
        } else if self.always {
            Err(HeaderValueError::invalid_character(text, 0))
        } else {
            self.inner.parse(text)
        }
    }

    fn check(&self, value: &H::Value) -> Result<()> {
        self.inner.check(value)
    }

    fn format(&self, value: &H::Value) -> String {
        let text = self.inner.format(value);
        if self.always || text.is_empty() || !chars::RFC2045_TOKEN.all(&text) {
            scanner::quote(&text)
        } else {
            text
        }
    }
}

/// Comma separated list delegating each element to `element`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHandler<H> {
    element: H,
    allow_empty: bool,
}

impl<H> ListHandler<H> {
    pub const fn new(element: H, allow_empty: bool) -> Self {
        Self {
            element,
            allow_empty,
        }
    }
}

impl<H: HeaderValueHandler> HeaderValueHandler for ListHandler<H> {
    type Value = Vec<H::Value>;

    fn parse(&self, text: &str) -> Result<Self::Value> {
        let values = split_list(text)?
            .into_iter()
            .map(|element| self.element.parse(element))
            .collect::<Result<Vec<_>>>()?;
        if values.is_empty() && !self.allow_empty {
            return Err(HeaderValueError::empty_list("value"));
        }
        Ok(values)
    }

    fn check(&self, value: &Self::Value) -> Result<()> {
        if value.is_empty() && !self.allow_empty {
            return Err(HeaderValueError::empty_list("value"));
        }
        value.iter().try_for_each(|element| self.element.check(element))
    }

    fn format(&self, value: &Self::Value) -> String {
        value
            .iter()
            .map(|element| self.element.format(element))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Splits on commas outside quoted strings and trims optional whitespace.
///
/// Whitespace-only input yields no elements; an empty element between two
/// commas is a missing value.
pub fn split_list(text: &str) -> Result<Vec<&str>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut elements = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                elements.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return Err(HeaderValueError::Unterminated {
            what: "quoted string",
            position: start,
            text: text.to_owned(),
        });
    }
    elements.push(text[start..].trim());
    if elements.iter().any(|element| element.is_empty()) {
        return Err(HeaderValueError::missing("value", text));
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn quoted_or_unquoted_detects_leading_quote() {
        let handler = DEFAULT_STRING;
        assert_eq!(handler.parse("abc").unwrap(), "abc");
        assert_eq!(handler.parse("\"abc\"").unwrap(), "abc");
    }

    #[test]
    fn semicolon_rejected_unquoted_but_accepted_quoted() {
        let handler = DEFAULT_STRING;
        assert!(matches!(
            handler.parse("a;b"),
            Err(HeaderValueError::InvalidCharacter {
                position: 1,
                character: ';',
                ..
            })
        ));
        assert_eq!(handler.parse("\"a;b\"").unwrap(), "a;b");
    }

    #[test]
    fn trailing_text_after_quote_is_rejected() {
        assert!(DEFAULT_STRING.parse("\"abc\"d").is_err());
    }

    #[test]
    fn format_prefers_unquoted() {
        assert_eq!(DEFAULT_STRING.format(&SmolStr::new("abc")), "abc");
        assert_eq!(DEFAULT_STRING.format(&SmolStr::new("a b")), "\"a b\"");
        assert_eq!(DEFAULT_STRING.format(&SmolStr::new("a\"b")), "\"a\\\"b\"");
        assert_eq!(DEFAULT_STRING.format(&SmolStr::new("")), "\"\"");
    }

    #[test]
    fn quoted_only_requires_quotes() {
        let handler = StringHandler::quoted(chars::QUOTED_TEXT, true);
        assert!(handler.parse("abc").is_err());
        assert_eq!(handler.parse("\"\"").unwrap(), "");
        assert_eq!(handler.format(&SmolStr::new("abc")), "\"abc\"");
    }

    #[test]
    fn check_rejects_control_characters() {
        let err = DEFAULT_STRING
            .check_named(&SmolStr::new("a\r\nb"), "title")
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to convert \"title\""));
    }

    #[test]
    fn parse_named_wraps_failure() {
        let err = LongHandler.parse_named("12a", "Content-Length").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to convert \"Content-Length\" value \"12a\", message: Invalid character 'a' at 2 in \"12a\""
        );
    }

    #[test]
    fn long_rejects_sign_and_overflow() {
        assert_eq!(LongHandler.parse("123").unwrap(), 123);
        assert!(LongHandler.parse("+1").is_err());
        assert!(LongHandler.parse("").is_err());
        assert!(LongHandler.parse("99999999999999999999999").is_err());
    }

    #[test]
    fn date_round_trips() {
        let text = "Sun, 06 Nov 1994 08:49:37 GMT";
        let value = DateTimeHandler::UNQUOTED.parse(text).unwrap();
        assert_eq!(
            value,
            NaiveDate::from_ymd_opt(1994, 11, 6)
                .unwrap()
                .and_hms_opt(8, 49, 37)
                .unwrap()
        );
        assert_eq!(DateTimeHandler::UNQUOTED.format(&value), text);
    }

    #[test]
    fn date_rejects_wrong_weekday_and_zone() {
        assert!(DateTimeHandler::UNQUOTED
            .parse("Mon, 06 Nov 1994 08:49:37 GMT")
            .is_err());
        assert!(DateTimeHandler::UNQUOTED
            .parse("Sun, 06 Nov 1994 08:49:37 UTC")
            .is_err());
        assert!(DateTimeHandler::UNQUOTED
            .parse("Sunday, 06-Nov-94 08:49:37 GMT")
            .is_err());
    }

    #[test]
    fn quoted_date() {
        let text = "\"Wed, 12 Feb 1997 16:29:51 GMT\"";
        let value = DateTimeHandler::QUOTED.parse(text).unwrap();
        assert_eq!(DateTimeHandler::QUOTED.format(&value), text);
        assert!(DateTimeHandler::QUOTED
            .parse("Wed, 12 Feb 1997 16:29:51 GMT")
            .is_err());
    }

    #[test]
    fn first_of_reports_last_failure_only() {
        let long = |text: &str| LongHandler.parse(text).map(|n| n.to_string());
        let string = |text: &str| DEFAULT_STRING.parse(text).map(|s| s.to_string());
        assert_eq!(first_of("123", &[&long, &string]).unwrap(), "123");
        assert_eq!(first_of("abc", &[&long, &string]).unwrap(), "abc");
        let err = first_of("a b", &[&long, &string]).unwrap_err();
        assert!(matches!(
            err,
            HeaderValueError::InvalidCharacter {
                position: 1,
                character: ' ',
                ..
            }
        ));
    }

    #[test]
    fn list_delegates_and_rejects_empty() {
        let handler = ListHandler::new(LongHandler, false);
        assert_eq!(handler.parse("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            handler.parse(""),
            Err(HeaderValueError::EmptyList { .. })
        ));
        assert!(handler.parse("1,,2").is_err());
        assert_eq!(handler.format(&vec![1, 2]), "1, 2");
        assert!(ListHandler::new(LongHandler, true).parse(" ").unwrap().is_empty());
    }

    #[test]
    fn split_list_respects_quotes() {
        assert_eq!(
            split_list(r#"a, "b,c", "d\"," "#).unwrap(),
            vec!["a", "\"b,c\"", "\"d\\\",\""]
        );
        assert!(split_list("\"abc").is_err());
    }

    #[test]
    fn quoted_wrapper_accepts_both_forms() {
        let handler = QuotedHandler::new(LongHandler, false);
        assert_eq!(handler.parse("\"12\"").unwrap(), 12);
        assert_eq!(handler.parse("12").unwrap(), 12);
        assert_eq!(handler.format(&12), "12");
        let always = QuotedHandler::new(LongHandler, true);
        assert!(always.parse("12").is_err());
        assert_eq!(always.format(&12), "\"12\"");
    }
}
