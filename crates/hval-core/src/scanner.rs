// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Character-cursor scanner shared by every header grammar.
//!
//! A grammar never loops over the input itself. [`parse_with`] classifies the
//! character under the cursor into an [`Event`] and hands it to the grammar,
//! which consumes whatever it recognises and leaves the cursor after it. At
//! the end of input the grammar is asked to produce its output, which is where
//! "nothing was parsed" and "value cut short" failures are raised.
//!
//! ```text
//! header-value   = value *( "," OWS value )
//! quoted-string  = DQUOTE *( qdtext / "\" any-char ) DQUOTE
//! comment        = "(" *( ctext / quoted-pair / comment ) ")"
//! ```

use crate::chars::{self, CharPredicate};
use crate::error::{HeaderValueError, Result};

const DOUBLE_QUOTE: char = '"';
const BACKSLASH: char = '\\';
const COMMENT_OPEN: char = '(';
const COMMENT_CLOSE: char = ')';

/// Character class at the cursor, as seen by a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Whitespace,
    Token,
    QuotedText,
    CommentOpen,
    Wildcard,
    Slash,
    KeyValueSeparator,
    ParameterSeparator,
    MultiValueSeparator,
    Other,
}

/// Maps a character to its [`Event`].
///
/// `*` is also an RFC 2045 token character; it is reported as a wildcard so a
/// grammar can tell a lone `*` apart, and token scanning still accepts it
/// inside a token such as `title*`.
pub fn classify(c: char) -> Event {
    match c {
        ' ' | '\t' | '\r' | '\n' => Event::Whitespace,
        DOUBLE_QUOTE => Event::QuotedText,
        COMMENT_OPEN => Event::CommentOpen,
        '*' => Event::Wildcard,
        '/' => Event::Slash,
        '=' => Event::KeyValueSeparator,
        ';' => Event::ParameterSeparator,
        ',' => Event::MultiValueSeparator,
        c if chars::is_rfc2045_token(c) => Event::Token,
        _ => Event::Other,
    }
}

/// Forward-only position over an immutable header value.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.text.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.text[self.position..].chars().next()
    }

    pub fn remaining(&self) -> &'a str {
        &self.text[self.position..]
    }

    /// Advances past one character and returns it.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Advances past `expected`, or fails on whatever is there instead.
    pub fn expect(&mut self, expected: char, what: &'static str) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(_) => Err(self.invalid_character()),
            None => Err(self.missing(what)),
        }
    }

    /// Consumes `expected` when it is next; returns whether it did.
    pub fn consume_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn skip_whitespace(&mut self) {
        self.take_while(chars::is_whitespace);
    }

    pub fn take_while(&mut self, test: impl Fn(char) -> bool) -> &'a str {
        let start = self.position;
        while let Some(c) = self.peek() {
            if !test(c) {
                break;
            }
            self.position += c.len_utf8();
        }
        &self.text[start..self.position]
    }

    /// Consumes the longest run of characters passing `predicate`. May be empty.
    pub fn token(&mut self, predicate: &CharPredicate) -> &'a str {
        self.take_while(|c| predicate.test(c))
    }

    /// Like [`token`](Self::token) but an empty run is an error naming `what`.
    pub fn required_token(&mut self, predicate: &CharPredicate, what: &'static str) -> Result<&'a str> {
        let start = self.position;
        let token = self.token(predicate);
        if !token.is_empty() {
            return Ok(token);
        }
        match self.peek().map(classify) {
            None => Err(self.missing(what)),
            Some(Event::Other) => Err(self.invalid_character()),
            Some(_) => Err(HeaderValueError::EmptyToken {
                what,
                position: start,
                text: self.text.to_owned(),
            }),
        }
    }

    /// Scans a quoted string starting at the opening quote and returns the raw
    /// text including both quotes. Characters inside are validated against
    /// `predicate`; a backslash escapes the next character when `escapes` is set.
    pub fn quoted_span(&mut self, predicate: &CharPredicate, escapes: bool) -> Result<&'a str> {
        let start = self.position;
        self.expect(DOUBLE_QUOTE, "opening quote")?;
        loop {
            let at = self.position;
            match self.bump() {
                None => {
                    return Err(HeaderValueError::Unterminated {
                        what: "quoted string",
                        position: start,
                        text: self.text.to_owned(),
                    })
                }
                Some(DOUBLE_QUOTE) => return Ok(&self.text[start..self.position]),
                Some(BACKSLASH) if escapes => {
                    if self.bump().is_none() {
                        return Err(HeaderValueError::Unterminated {
                            what: "quoted string",
                            position: start,
                            text: self.text.to_owned(),
                        });
                    }
                }
                Some(c) if predicate.test(c) => {}
                Some(_) => return Err(HeaderValueError::invalid_character(self.text, at)),
            }
        }
    }

    /// Scans a quoted string and returns its unescaped content.
    pub fn quoted_text(&mut self, predicate: &CharPredicate, escapes: bool) -> Result<String> {
        let span = self.quoted_span(predicate, escapes)?;
        Ok(unescape(&span[1..span.len() - 1], escapes))
    }

    /// Skips a possibly nested comment starting at `(`.
    pub fn skip_comment(&mut self) -> Result<()> {
        let start = self.position;
        self.expect(COMMENT_OPEN, "comment")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.bump() {
                None => {
                    return Err(HeaderValueError::Unterminated {
                        what: "comment",
                        position: start,
                        text: self.text.to_owned(),
                    })
                }
                Some(COMMENT_OPEN) => depth += 1,
                Some(COMMENT_CLOSE) => depth -= 1,
                Some(BACKSLASH) => {
                    if self.bump().is_none() {
                        return Err(HeaderValueError::Unterminated {
                            what: "comment",
                            position: start,
                            text: self.text.to_owned(),
                        });
                    }
                }
                Some(c) if c.is_control() && c != '\t' => {
                    return Err(HeaderValueError::invalid_character(
                        self.text,
                        self.position - c.len_utf8(),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn invalid_character(&self) -> HeaderValueError {
        HeaderValueError::invalid_character(self.text, self.position)
    }

    pub fn missing(&self, what: &'static str) -> HeaderValueError {
        HeaderValueError::missing(what, self.text)
    }

    pub fn comment_present(&self) -> HeaderValueError {
        HeaderValueError::CommentPresent {
            position: self.position,
            text: self.text.to_owned(),
        }
    }

    /// Fails unless the whole input has been consumed.
    pub fn expect_end(&self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.invalid_character())
        }
    }
}

fn unescape(inner: &str, escapes: bool) -> String {
    if !escapes || !inner.contains(BACKSLASH) {
        return inner.to_owned();
    }
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == BACKSLASH {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Quotes `value`, escaping `"` and `\`.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(DOUBLE_QUOTE);
    for c in value.chars() {
        if c == DOUBLE_QUOTE || c == BACKSLASH {
            out.push(BACKSLASH);
        }
        out.push(c);
    }
    out.push(DOUBLE_QUOTE);
    out
}

/// Per-grammar behavior driven by [`parse_with`].
pub trait Grammar {
    type Output;

    /// Handles the character class under the cursor. Implementations must
    /// consume at least one character or fail.
    fn on_event(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<()>;

    /// Called once the whole input is consumed.
    fn end_of_text(self, cursor: &Cursor<'_>) -> Result<Self::Output>;
}

/// Runs `grammar` over `text` from the first to the last character.
pub fn parse_with<G: Grammar>(text: &str, mut grammar: G) -> Result<G::Output> {
    let mut cursor = Cursor::new(text);
    while let Some(c) = cursor.peek() {
        let before = cursor.position();
        grammar.on_event(classify(c), &mut cursor)?;
        if cursor.position() == before {
            return Err(cursor.invalid_character());
        }
    }
    grammar.end_of_text(&cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::{QUOTED_TEXT, RFC2045_TOKEN};

    #[test]
    fn classify_separators() {
        assert_eq!(classify(';'), Event::ParameterSeparator);
        assert_eq!(classify(','), Event::MultiValueSeparator);
        assert_eq!(classify('='), Event::KeyValueSeparator);
        assert_eq!(classify('*'), Event::Wildcard);
        assert_eq!(classify('/'), Event::Slash);
        assert_eq!(classify('"'), Event::QuotedText);
        assert_eq!(classify('('), Event::CommentOpen);
        assert_eq!(classify('a'), Event::Token);
        assert_eq!(classify('@'), Event::Other);
        assert_eq!(classify('\t'), Event::Whitespace);
    }

    #[test]
    fn token_stops_at_separator() {
        let mut cursor = Cursor::new("text/plain");
        assert_eq!(cursor.token(&RFC2045_TOKEN), "text");
        assert_eq!(cursor.peek(), Some('/'));
    }

    #[test]
    fn token_keeps_embedded_star() {
        let mut cursor = Cursor::new("title*=x");
        assert_eq!(cursor.token(&RFC2045_TOKEN), "title*");
    }

    #[test]
    fn quoted_text_unescapes() {
        let mut cursor = Cursor::new(r#""a \"b\" \\c";"#);
        assert_eq!(cursor.quoted_text(&QUOTED_TEXT, true).unwrap(), r#"a "b" \c"#);
        assert_eq!(cursor.peek(), Some(';'));
    }

    #[test]
    fn quoted_span_keeps_quotes() {
        let mut cursor = Cursor::new(r#""abc" rest"#);
        assert_eq!(cursor.quoted_span(&QUOTED_TEXT, true).unwrap(), "\"abc\"");
    }

    #[test]
    fn unterminated_quote_fails() {
        let mut cursor = Cursor::new("\"abc");
        let err = cursor.quoted_text(&QUOTED_TEXT, true).unwrap_err();
        assert!(matches!(
            err,
            HeaderValueError::Unterminated {
                what: "quoted string",
                position: 0,
                ..
            }
        ));
    }

    #[test]
    fn quoted_text_rejects_disallowed_char() {
        let mut cursor = Cursor::new("\"a\u{1}b\"");
        let err = cursor.quoted_text(&QUOTED_TEXT, true).unwrap_err();
        assert!(matches!(
            err,
            HeaderValueError::InvalidCharacter { position: 2, .. }
        ));
    }

    #[test]
    fn nested_comment_is_skipped() {
        let mut cursor = Cursor::new("(a (b) \\) c)x");
        cursor.skip_comment().unwrap();
        assert_eq!(cursor.remaining(), "x");
    }

    #[test]
    fn unterminated_comment_fails() {
        let mut cursor = Cursor::new("(a (b)");
        assert!(matches!(
            cursor.skip_comment(),
            Err(HeaderValueError::Unterminated { what: "comment", .. })
        ));
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    struct Tokens(Vec<String>);

    impl Grammar for Tokens {
        type Output = Vec<String>;

        fn on_event(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<()> {
            match event {
                Event::Whitespace | Event::MultiValueSeparator => {
                    cursor.bump();
                    Ok(())
                }
                Event::Token => {
                    self.0.push(cursor.token(&RFC2045_TOKEN).to_owned());
                    Ok(())
                }
                _ => Err(cursor.invalid_character()),
            }
        }

        fn end_of_text(self, cursor: &Cursor<'_>) -> Result<Self::Output> {
            if self.0.is_empty() {
                return Err(cursor.missing("token"));
            }
            Ok(self.0)
        }
    }

    #[test]
    fn driver_dispatches_until_end() {
        let tokens = parse_with("a, b ,c", Tokens(Vec::new())).unwrap();
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn driver_reports_invalid_character_position() {
        let err = parse_with("a, b;c", Tokens(Vec::new())).unwrap_err();
        assert!(matches!(
            err,
            HeaderValueError::InvalidCharacter {
                position: 4,
                character: ';',
                ..
            }
        ));
    }

    #[test]
    fn driver_calls_end_of_text_on_empty_input() {
        let err = parse_with("", Tokens(Vec::new())).unwrap_err();
        assert!(matches!(err, HeaderValueError::MissingValue { what: "token", .. }));
    }

    struct Stalls;

    impl Grammar for Stalls {
        type Output = ();

        fn on_event(&mut self, _event: Event, _cursor: &mut Cursor<'_>) -> Result<()> {
            Ok(())
        }

        fn end_of_text(self, _cursor: &Cursor<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn driver_rejects_callback_that_does_not_advance() {
        assert!(matches!(
            parse_with("x", Stalls),
            Err(HeaderValueError::InvalidCharacter { position: 0, .. })
        ));
    }
}
