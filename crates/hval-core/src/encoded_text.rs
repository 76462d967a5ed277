// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RFC 5987 extended parameter values.
//!
//! ```text
//! ext-value  = charset "'" [ language ] "'" value-chars
//! value-chars = *( pct-encoded / attr-char )
//! ```

use std::fmt;

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::chars;
use crate::charset::CharsetName;
use crate::error::{HeaderValueError, Result};
use crate::handler::HeaderValueHandler;
use crate::language::LanguageTag;
use crate::scanner::Cursor;

/// Everything outside `attr-char` is percent-encoded.
const ATTR_CHAR_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    charset: CharsetName,
    language: Option<LanguageTag>,
    value: String,
}

impl EncodedText {
    pub fn new(charset: CharsetName, language: Option<LanguageTag>, value: impl Into<String>) -> Result<Self> {
        let text = Self {
            charset,
            language,
            value: value.into(),
        };
        text.check()?;
        Ok(text)
    }

    /// UTF-8 with no language, which can carry any value.
    pub fn utf8(value: impl Into<String>) -> Result<Self> {
        Self::new(CharsetName::UTF_8, None, value)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut cursor = Cursor::new(text);
        let charset = cursor.take_while(|c| c != '\'' && chars::is_rfc2045_token(c));
        if charset.is_empty() {
            return Err(match cursor.peek() {
                None => cursor.missing("charset"),
                Some(_) => HeaderValueError::EmptyToken {
                    what: "charset",
                    position: 0,
                    text: text.to_owned(),
                },
            });
        }
        cursor.expect('\'', "language")?;
        let language = cursor.take_while(chars::is_language_tag_char);
        cursor.expect('\'', "encoded value")?;
        let encoded = cursor.remaining();
        if encoded.is_empty() {
            return Err(cursor.missing("encoded value"));
        }
        let base = cursor.position();
        let bytes = encoded.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = bytes.get(i + 1..i + 3).filter(|h| h.iter().all(u8::is_ascii_hexdigit));
                if hex.is_none() {
                    return Err(HeaderValueError::invalid_character(text, base + i));
                }
                i += 3;
            } else if chars::is_attr_char(bytes[i] as char) && bytes[i].is_ascii() {
                i += 1;
            } else {
                return Err(HeaderValueError::invalid_character(text, base + i));
            }
        }

        let charset = CharsetName::named(charset)?;
        let language = if language.is_empty() {
            None
        } else {
            Some(LanguageTag::tag(language)?)
        };
        let decoded: Vec<u8> = percent_decode_str(encoded).collect();
        let value = charset.decode(&decoded)?;
        Ok(Self {
            charset,
            language,
            value,
        })
    }

    pub fn charset(&self) -> &CharsetName {
        &self.charset
    }

    pub fn language(&self) -> Option<&LanguageTag> {
        self.language.as_ref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn check(&self) -> Result<()> {
        if self.value.is_empty() {
            return Err(HeaderValueError::missing("encoded value", ""));
        }
        if let Some(LanguageTag::Wildcard) = self.language {
            return Err(HeaderValueError::invalid("Wildcard language not allowed in encoded text"));
        }
        self.charset.encode(&self.value).map(|_| ())
    }

    /// The `charset'language'value` form. The value must already be
    /// encodable, which [`check`](Self::check) verifies.
    pub fn to_encoded_string(&self) -> String {
        let bytes = self
            .charset
            .encode(&self.value)
            .unwrap_or_else(|_| self.value.as_bytes().to_vec());
        format!(
            "{}'{}'{}",
            self.charset.as_str(),
            self.language.as_ref().map_or("", LanguageTag::as_str),
            percent_encode(&bytes, ATTR_CHAR_ENCODE)
        )
    }
}

impl fmt::Display for EncodedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_encoded_string())
    }
}

/// Handler for every parameter whose name ends in `*`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodedTextHandler;

impl HeaderValueHandler for EncodedTextHandler {
    type Value = EncodedText;

    fn parse(&self, text: &str) -> Result<EncodedText> {
        EncodedText::parse(text)
    }

    fn check(&self, value: &EncodedText) -> Result<()> {
        value.check()
    }

    fn format(&self, value: &EncodedText) -> String {
        value.to_encoded_string()
    }
}

pub static ENCODED_TEXT: EncodedTextHandler = EncodedTextHandler;
