// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Content-Disposition` (RFC 6266) and its file names.
//!
//! ```text
//! content-disposition = disposition-type *( ";" disposition-parm )
//! filename-parm       = "filename" "=" value / "filename*" "=" ext-value
//! ```

use chrono::NaiveDateTime;
use once_cell::sync::{Lazy, OnceCell};
use smol_str::SmolStr;

use crate::chars::{ASCII_PRINTABLE, RFC2045_TOKEN};
use crate::encoded_text::{EncodedText, ENCODED_TEXT};
use crate::error::{HeaderValueError, Result};
use crate::handler::{
    first_of, DateTimeHandler, HeaderValueHandler, LongHandler, QuotedHandler, StringHandler,
    DEFAULT_STRING,
};
use crate::parameters::{
    header_text, parse_single, write_with_parameters, HeaderParameterName, HeaderValue,
    HeaderValueWithParameters, ParameterNameRegistry, ParameterValue, Parameters, ValueGrammar,
};
use crate::scanner::{Cursor, Event};

/// Plain `filename`: printable ASCII, written as a token when possible.
pub const FILENAME_HANDLER: StringHandler =
    StringHandler::quoted_or_unquoted(ASCII_PRINTABLE, true, RFC2045_TOKEN);

static SIZE_HANDLER: QuotedHandler<LongHandler> = QuotedHandler::new(LongHandler, false);

pub static FILENAME: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("filename", &FILENAME_HANDLER));
pub static FILENAME_STAR: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("filename*", &ENCODED_TEXT));
pub static NAME: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("name", &DEFAULT_STRING));
pub static CREATION_DATE: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("creation-date", &DateTimeHandler::QUOTED));
pub static MODIFICATION_DATE: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("modification-date", &DateTimeHandler::QUOTED));
pub static READ_DATE: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("read-date", &DateTimeHandler::QUOTED));
pub static SIZE: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("size", &SIZE_HANDLER));

pub static CONTENT_DISPOSITION_PARAMETERS: Lazy<ParameterNameRegistry> = Lazy::new(|| {
    ParameterNameRegistry::new(
        "Content-Disposition",
        [
            FILENAME.clone(),
            FILENAME_STAR.clone(),
            NAME.clone(),
            CREATION_DATE.clone(),
            MODIFICATION_DATE.clone(),
            READ_DATE.clone(),
            SIZE.clone(),
        ],
        &DEFAULT_STRING,
    )
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNameKind {
    NotEncoded(SmolStr),
    Encoded(EncodedText),
}

/// A file name from either `filename` or `filename*`.
#[derive(Debug, Clone)]
pub struct ContentDispositionFileName {
    kind: FileNameKind,
    without_path: OnceCell<Option<Box<ContentDispositionFileName>>>,
}

impl ContentDispositionFileName {
    pub fn new(kind: FileNameKind) -> Result<Self> {
        match &kind {
            FileNameKind::NotEncoded(name) => FILENAME_HANDLER.check(name)?,
            FileNameKind::Encoded(text) => text.check()?,
        }
        Ok(Self::unchecked(kind))
    }

    fn unchecked(kind: FileNameKind) -> Self {
        Self {
            kind,
            without_path: OnceCell::new(),
        }
    }

    pub fn not_encoded(name: &str) -> Result<Self> {
        Self::new(FileNameKind::NotEncoded(SmolStr::new(name)))
    }

    pub fn kind(&self) -> &FileNameKind {
        &self.kind
    }

    pub fn is_encoded(&self) -> bool {
        matches!(self.kind, FileNameKind::Encoded(_))
    }

    /// The decoded file name.
    pub fn value(&self) -> &str {
        match &self.kind {
            FileNameKind::NotEncoded(name) => name,
            FileNameKind::Encoded(text) => text.value(),
        }
    }

    /// The name after the last `/` or `\`; `self` when there is no path.
    /// Trailing separators are ignored, so `dir/` gives `dir`. A name made
    /// only of separators is returned unchanged.
    ///
    /// Computed on first use and cached. Concurrent first calls compute the
    /// same value and only one is kept.
    pub fn without_path(&self) -> &ContentDispositionFileName {
        self.without_path
            .get_or_init(|| self.strip_path().map(Box::new))
            .as_deref()
            .unwrap_or(self)
    }

    fn strip_path(&self) -> Option<ContentDispositionFileName> {
        let is_separator = |c: char| c == '/' || c == '\\';
        let value = self.value();
        let trimmed = value.trim_end_matches(is_separator);
        let start = trimmed.rfind(is_separator).map_or(0, |i| i + 1);
        let name = &trimmed[start..];
        if name.is_empty() || name.len() == value.len() {
            return None;
        }
        let kind = match &self.kind {
            FileNameKind::NotEncoded(_) => FileNameKind::NotEncoded(SmolStr::new(name)),
            FileNameKind::Encoded(text) => FileNameKind::Encoded(
                EncodedText::new(text.charset().clone(), text.language().cloned(), name).ok()?,
            ),
        };
        Some(Self::unchecked(kind))
    }
}

impl PartialEq for ContentDispositionFileName {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for ContentDispositionFileName {}

/// Parses either form: encoded text first, then a plain name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentDispositionFileNameHandler;

impl HeaderValueHandler for ContentDispositionFileNameHandler {
    type Value = ContentDispositionFileName;

    fn parse(&self, text: &str) -> Result<ContentDispositionFileName> {
        first_of(
            text,
            &[
                &|text: &str| {
                    EncodedText::parse(text)
                        .map(|t| ContentDispositionFileName::unchecked(FileNameKind::Encoded(t)))
                },
                &|text: &str| {
                    FILENAME_HANDLER.parse(text).map(|name| {
                        ContentDispositionFileName::unchecked(FileNameKind::NotEncoded(name))
                    })
                },
            ],
        )
    }

    fn check(&self, value: &ContentDispositionFileName) -> Result<()> {
        match &value.kind {
            FileNameKind::NotEncoded(name) => FILENAME_HANDLER.check(name),
            FileNameKind::Encoded(text) => text.check(),
        }
    }

    fn format(&self, value: &ContentDispositionFileName) -> String {
        match &value.kind {
            FileNameKind::NotEncoded(name) => FILENAME_HANDLER.format(name),
            FileNameKind::Encoded(text) => text.to_encoded_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    kind: SmolStr,
    parameters: Parameters,
}

impl ContentDisposition {
    pub const ATTACHMENT: &'static str = "attachment";
    pub const INLINE: &'static str = "inline";
    pub const FORM_DATA: &'static str = "form-data";

    pub fn new(kind: &str) -> Result<Self> {
        if kind.is_empty() {
            return Err(HeaderValueError::missing("disposition type", kind));
        }
        if let Some((position, _)) = RFC2045_TOKEN.first_invalid(kind) {
            return Err(HeaderValueError::invalid_character(kind, position));
        }
        Ok(Self {
            kind: SmolStr::new(kind.to_ascii_lowercase()),
            parameters: Parameters::new(),
        })
    }

    /// `attachment` naming `file_name`: `filename` when it is printable ASCII,
    /// `filename*` in UTF-8 otherwise.
    pub fn attachment(file_name: &str) -> Result<Self> {
        let disposition = Self::new(Self::ATTACHMENT)?;
        let parameters = if ASCII_PRINTABLE.all(file_name) && !file_name.is_empty() {
            Parameters::new().with(&FILENAME, SmolStr::new(file_name))?
        } else {
            Parameters::new().with(&FILENAME_STAR, EncodedText::utf8(file_name)?)?
        };
        disposition.with_parameters(parameters)
    }

    pub fn parse(text: &str) -> Result<Self> {
        parse_single(
            text,
            ContentDispositionGrammar {
                registry: &CONTENT_DISPOSITION_PARAMETERS,
            },
        )
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_attachment(&self) -> bool {
        self.kind == Self::ATTACHMENT
    }

    pub fn is_inline(&self) -> bool {
        self.kind == Self::INLINE
    }

    /// `filename*` when present, else `filename`.
    pub fn filename(&self) -> Option<ContentDispositionFileName> {
        if let Some(text) = self.parameters.value::<EncodedText>(&FILENAME_STAR) {
            return Some(ContentDispositionFileName::unchecked(FileNameKind::Encoded(
                text.clone(),
            )));
        }
        self.parameters
            .value::<SmolStr>(&FILENAME)
            .map(|name| ContentDispositionFileName::unchecked(FileNameKind::NotEncoded(name.clone())))
    }

    pub fn name(&self) -> Option<&str> {
        self.parameters.get(&NAME).and_then(ParameterValue::as_str)
    }

    pub fn creation_date(&self) -> Option<&NaiveDateTime> {
        self.parameters.value(&CREATION_DATE)
    }

    pub fn modification_date(&self) -> Option<&NaiveDateTime> {
        self.parameters.value(&MODIFICATION_DATE)
    }

    pub fn read_date(&self) -> Option<&NaiveDateTime> {
        self.parameters.value(&READ_DATE)
    }

    pub fn size(&self) -> Option<u64> {
        self.parameters.get(&SIZE).and_then(ParameterValue::as_long)
    }
}

impl HeaderValue for ContentDisposition {
    fn to_header_text(&self) -> String {
        write_with_parameters(&self.kind, &self.parameters, "; ")
    }
}

impl HeaderValueWithParameters for ContentDisposition {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Result<Self> {
        Ok(Self {
            kind: self.kind.clone(),
            parameters,
        })
    }
}

header_text!(ContentDisposition, ContentDisposition::parse);

struct ContentDispositionGrammar<'r> {
    registry: &'r ParameterNameRegistry,
}

impl ValueGrammar for ContentDispositionGrammar<'_> {
    type Head = SmolStr;
    type Value = ContentDisposition;

    fn registry(&self) -> &ParameterNameRegistry {
        self.registry
    }

    fn allow_multiple_values(&self) -> bool {
        false
    }

    fn allow_comments(&self) -> bool {
        false
    }

    fn head(&mut self, event: Event, cursor: &mut Cursor<'_>) -> Result<SmolStr> {
        if event == Event::Wildcard {
            return Err(cursor.invalid_character());
        }
        let kind = cursor.required_token(&RFC2045_TOKEN, "disposition type")?;
        Ok(SmolStr::new(kind.to_ascii_lowercase()))
    }

    fn build(&mut self, kind: SmolStr, parameters: Parameters) -> Result<ContentDisposition> {
        Ok(ContentDisposition { kind, parameters })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_with_filename() {
        let disposition =
            ContentDisposition::parse("attachment; filename=\"genome.jpeg\"; size=1024").unwrap();
        assert!(disposition.is_attachment());
        assert_eq!(disposition.filename().unwrap().value(), "genome.jpeg");
        assert_eq!(disposition.size(), Some(1024));
        assert_eq!(
            disposition.to_header_text(),
            "attachment; filename=genome.jpeg; size=1024"
        );
    }

    #[test]
    fn filename_star_preferred() {
        let disposition = ContentDisposition::parse(
            "attachment; filename=\"EURO rates\"; filename*=utf-8''%e2%82%ac%20rates",
        )
        .unwrap();
        let filename = disposition.filename().unwrap();
        assert!(filename.is_encoded());
        assert_eq!(filename.value(), "€ rates");
    }

    #[test]
    fn dates_are_quoted() {
        let text = "inline; modification-date=\"Wed, 12 Feb 1997 16:29:51 GMT\"";
        let disposition = ContentDisposition::parse(text).unwrap();
        assert!(disposition.modification_date().is_some());
        assert_eq!(disposition.to_header_text(), text);
        assert!(ContentDisposition::parse("inline; read-date=Wed").is_err());
    }

    #[test]
    fn filename_must_be_printable_ascii() {
        assert!(ContentDisposition::parse("attachment; filename=\"caf\u{e9}\"").is_err());
    }

    #[test]
    fn form_data_name() {
        let disposition = ContentDisposition::parse("form-data; name=\"field1\"").unwrap();
        assert_eq!(disposition.kind(), ContentDisposition::FORM_DATA);
        assert_eq!(disposition.name(), Some("field1"));
    }

    #[test]
    fn without_path_strips_directories() {
        let name = ContentDispositionFileName::not_encoded("C:\\docs\\report.pdf").unwrap();
        let stripped = name.without_path();
        assert_eq!(stripped.value(), "report.pdf");
        assert!(std::ptr::eq(name.without_path(), stripped));

        let plain = ContentDispositionFileName::not_encoded("report.pdf").unwrap();
        assert!(std::ptr::eq(plain.without_path(), &plain));
    }

    #[test]
    fn without_path_keeps_encoding() {
        let handler = ContentDispositionFileNameHandler;
        let name = handler.parse("UTF-8''a%2Fb%2F%e2%82%ac").unwrap();
        let stripped = name.without_path();
        assert_eq!(stripped.value(), "€");
        assert_eq!(handler.format(stripped), "UTF-8''%E2%82%AC");
    }

    #[test]
    fn trailing_separator_is_ignored() {
        let handler = ContentDispositionFileNameHandler;
        let plain = handler.parse("\"tmp/dir/\"").unwrap();
        let encoded = handler.parse("UTF-8''tmp%2Fdir%2F").unwrap();
        assert_eq!(plain.without_path().value(), "dir");
        assert_eq!(encoded.without_path().value(), "dir");
        assert!(encoded.without_path().is_encoded());

        let root = handler.parse("\"/\"").unwrap();
        assert!(std::ptr::eq(root.without_path(), &root));
    }

    #[test]
    fn handler_falls_back_to_plain_name() {
        let handler = ContentDispositionFileNameHandler;
        assert!(!handler.parse("\"a b.txt\"").unwrap().is_encoded());
        assert!(!handler.parse("it's").unwrap().is_encoded());
    }

    #[test]
    fn attachment_factory_picks_form() {
        assert_eq!(
            ContentDisposition::attachment("a b.txt").unwrap().to_header_text(),
            "attachment; filename=\"a b.txt\""
        );
        assert_eq!(
            ContentDisposition::attachment("résumé.pdf").unwrap().to_header_text(),
            "attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
    }
}
