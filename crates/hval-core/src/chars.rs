// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Character classes shared by every header grammar.
//!
//! The ASCII range is looked up in a table built at compile time; anything
//! above `0x7f` is only accepted by the classes that allow `obs-text`.

const C_TOKEN: u8 = 1;
const C_QDTEXT: u8 = 2;
const C_WHITESPACE: u8 = 4;
const C_ETAGC: u8 = 8;
const C_BCHARS: u8 = 16;
const C_ATTR: u8 = 32;
const C_PRINTABLE: u8 = 64;

static TABLE: [u8; 128] = build_table();

fn classes(c: char) -> u8 {
    if c.is_ascii() {
        TABLE[c as usize]
    } else {
        0
    }
}

const fn build_table() -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < 128 {
        let b = i as u8;
        let mut classes = 0;
        if is_token_byte(b) {
            classes |= C_TOKEN;
        }
        if is_qdtext_byte(b) {
            classes |= C_QDTEXT;
        }
        if matches!(b, b' ' | b'\t' | b'\r' | b'\n') {
            classes |= C_WHITESPACE;
        }
        if b == 0x21 || (b >= 0x23 && b <= 0x7e) {
            classes |= C_ETAGC;
        }
        if is_bchar_byte(b) {
            classes |= C_BCHARS;
        }
        if is_attr_byte(b) {
            classes |= C_ATTR;
        }
        if b >= 0x20 && b <= 0x7e {
            classes |= C_PRINTABLE;
        }
        table[i] = classes;
        i += 1;
    }
    table
}

/// RFC 2045 `token`: any printable ASCII except SPACE and `tspecials`.
const fn is_token_byte(b: u8) -> bool {
    b > 0x20 && b < 0x7f && !is_tspecial_byte(b)
}

const fn is_tspecial_byte(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"' | b'/' | b'['
            | b']' | b'?' | b'='
    )
}

// qdtext = HTAB / SP / %x21 / %x23-5B / %x5D-7E
const fn is_qdtext_byte(b: u8) -> bool {
    b == b'\t' || b == b' ' || b == 0x21 || (b >= 0x23 && b <= 0x5b) || (b >= 0x5d && b <= 0x7e)
}

// RFC 2046 bchars
const fn is_bchar_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?'
                | b' '
        )
}

// RFC 5987 attr-char
const fn is_attr_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}

/// A named test over a single character.
///
/// Predicates are plain function pointers so they can live in `const` items and
/// be embedded into handler constants.
#[derive(Clone, Copy)]
pub struct CharPredicate {
    name: &'static str,
    test: fn(char) -> bool,
}

impl CharPredicate {
    pub const fn new(name: &'static str, test: fn(char) -> bool) -> Self {
        Self { name, test }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn test(&self, c: char) -> bool {
        (self.test)(c)
    }

    /// Returns true if every character of `text` passes. Empty text passes.
    pub fn all(&self, text: &str) -> bool {
        text.chars().all(|c| self.test(c))
    }

    /// Byte offset and character of the first failing character.
    pub fn first_invalid(&self, text: &str) -> Option<(usize, char)> {
        text.char_indices().find(|(_, c)| !self.test(*c))
    }
}

impl std::fmt::Debug for CharPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for CharPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CharPredicate {}

pub fn is_rfc2045_token(c: char) -> bool {
    classes(c) & C_TOKEN != 0
}

pub fn is_rfc2045_tspecial(c: char) -> bool {
    c.is_ascii() && is_tspecial_byte(c as u8)
}

pub fn is_whitespace(c: char) -> bool {
    classes(c) & C_WHITESPACE != 0
}

pub fn is_ascii_printable(c: char) -> bool {
    classes(c) & C_PRINTABLE != 0
}

/// `qdtext` plus `obs-text`, which covers any non-ASCII, non-control character.
pub fn is_quoted_text(c: char) -> bool {
    classes(c) & C_QDTEXT != 0 || (!c.is_ascii() && !c.is_control())
}

pub fn is_etag_char(c: char) -> bool {
    classes(c) & C_ETAGC != 0 || (!c.is_ascii() && !c.is_control())
}

pub fn is_boundary_char(c: char) -> bool {
    classes(c) & C_BCHARS != 0
}

pub fn is_attr_char(c: char) -> bool {
    classes(c) & C_ATTR != 0
}

pub fn is_language_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// Field content of free-text headers such as `Server` or `User-Agent`.
pub fn is_field_text(c: char) -> bool {
    classes(c) & C_PRINTABLE != 0 || c == '\t' || (!c.is_ascii() && !c.is_control())
}

/// RFC 6265 `cookie-octet`: printable ASCII except space, `"`, `,`, `;` and `\`.
pub fn is_cookie_octet(c: char) -> bool {
    matches!(c, '!' | '#'..='+' | '-'..=':' | '<'..='[' | ']'..='~')
}

pub const RFC2045_TOKEN: CharPredicate = CharPredicate::new("RFC2045 token", is_rfc2045_token);
pub const RFC2045_TSPECIAL: CharPredicate =
    CharPredicate::new("RFC2045 tspecial", is_rfc2045_tspecial);
pub const WHITESPACE: CharPredicate = CharPredicate::new("whitespace", is_whitespace);
pub const ASCII_PRINTABLE: CharPredicate =
    CharPredicate::new("ASCII printable", is_ascii_printable);
pub const QUOTED_TEXT: CharPredicate = CharPredicate::new("quoted text", is_quoted_text);
pub const ETAG_CHARS: CharPredicate = CharPredicate::new("etagc", is_etag_char);
pub const BOUNDARY: CharPredicate = CharPredicate::new("boundary", is_boundary_char);
pub const ATTR_CHAR: CharPredicate = CharPredicate::new("RFC5987 attr-char", is_attr_char);
pub const LANGUAGE_TAG: CharPredicate = CharPredicate::new("language tag", is_language_tag_char);
pub const FIELD_TEXT: CharPredicate = CharPredicate::new("field text", is_field_text);
pub const COOKIE_OCTET: CharPredicate = CharPredicate::new("cookie-octet", is_cookie_octet);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_excludes_tspecials_and_space() {
        for c in "()<>@,;:\\\"/[]?= \t".chars() {
            assert!(!is_rfc2045_token(c), "{c:?} should not be a token char");
        }
        for c in "abcXYZ019!#$%&'*+-.^_`|~".chars() {
            assert!(is_rfc2045_token(c), "{c:?} should be a token char");
        }
    }

    #[test]
    fn token_rejects_control_and_non_ascii() {
        assert!(!is_rfc2045_token('\r'));
        assert!(!is_rfc2045_token('\u{7f}'));
        assert!(!is_rfc2045_token('é'));
    }

    #[test]
    fn cookie_octets() {
        for c in " \",;\\\t".chars() {
            assert!(!is_cookie_octet(c), "{c:?} should not be a cookie octet");
        }
        assert!(COOKIE_OCTET.all("a1=/+[]:<>"));
        assert!(!is_cookie_octet('é'));
    }

    #[test]
    fn quoted_text_excludes_quote_and_backslash() {
        assert!(!is_quoted_text('"'));
        assert!(!is_quoted_text('\\'));
        assert!(is_quoted_text(' '));
        assert!(is_quoted_text(';'));
        assert!(is_quoted_text('é'));
        assert!(!is_quoted_text('\n'));
    }

    #[test]
    fn boundary_allows_space_but_not_semicolon() {
        assert!(BOUNDARY.all("gc0p4Jq0M2Yt08jU534c0p"));
        assert!(BOUNDARY.all("simple boundary"));
        assert!(!BOUNDARY.test(';'));
    }

    #[test]
    fn first_invalid_reports_offset() {
        assert_eq!(RFC2045_TOKEN.first_invalid("abc;d"), Some((3, ';')));
        assert_eq!(RFC2045_TOKEN.first_invalid("abcd"), None);
    }

    #[test]
    fn attr_char_excludes_percent_and_quote() {
        assert!(!is_attr_char('%'));
        assert!(!is_attr_char('\''));
        assert!(!is_attr_char('*'));
        assert!(is_attr_char('~'));
    }
}
