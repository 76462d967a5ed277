// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch from a header name to the typed value it carries.

use chrono::NaiveDateTime;
use hval_core::handler::{DateTimeHandler, LongHandler, FIELD_TEXT};
use hval_core::{
    chars, etag, Accept, AcceptCharset, AcceptEncoding, AcceptLanguage, CacheControl,
    ContentDisposition, ContentEncoding, ContentLanguage, ContentRange, Cookie, ETag,
    EmailAddress, EmailAddressHandler, HeaderValue, HeaderValueError, HeaderValueHandler,
    IfRange, Link, MediaType, Range, Result, SetCookie, UrlHandler, UrlReference,
};
use smol_str::SmolStr;

use crate::name::{HeaderKind, HeaderName};

/// A parsed header value, one variant per registered header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedHeader {
    Accept(Accept),
    AcceptCharset(AcceptCharset),
    AcceptEncoding(AcceptEncoding),
    AcceptLanguage(AcceptLanguage),
    Age(u64),
    CacheControl(CacheControl),
    ContentDisposition(ContentDisposition),
    ContentEncoding(ContentEncoding),
    ContentLanguage(ContentLanguage),
    ContentLength(u64),
    ContentLocation(UrlReference),
    ContentRange(ContentRange),
    ContentType(MediaType),
    Cookie(Cookie),
    Date(NaiveDateTime),
    ETag(ETag),
    Expires(NaiveDateTime),
    From(EmailAddress),
    IfMatch(Vec<ETag>),
    IfModifiedSince(NaiveDateTime),
    IfNoneMatch(Vec<ETag>),
    IfRange(IfRange),
    IfUnmodifiedSince(NaiveDateTime),
    LastModified(NaiveDateTime),
    Link(Vec<Link>),
    Location(UrlReference),
    Range(Range),
    Referer(UrlReference),
    Server(SmolStr),
    SetCookie(SetCookie),
    UserAgent(SmolStr),
    /// Value of an unregistered header, validated as field text only.
    Unknown(SmolStr),
}

impl TypedHeader {
    /// The header value in canonical form.
    pub fn to_header_text(&self) -> String {
        let date = |value: &NaiveDateTime| DateTimeHandler::UNQUOTED.format(value);
        match self {
            TypedHeader::Accept(value) => value.to_header_text(),
            TypedHeader::AcceptCharset(value) => value.to_header_text(),
            TypedHeader::AcceptEncoding(value) => value.to_header_text(),
            TypedHeader::AcceptLanguage(value) => value.to_header_text(),
            TypedHeader::Age(seconds) | TypedHeader::ContentLength(seconds) => seconds.to_string(),
            TypedHeader::CacheControl(value) => value.to_header_text(),
            TypedHeader::ContentDisposition(value) => value.to_header_text(),
            TypedHeader::ContentEncoding(value) => value.to_header_text(),
            TypedHeader::ContentLanguage(value) => value.to_header_text(),
            TypedHeader::ContentLocation(url)
            | TypedHeader::Location(url)
            | TypedHeader::Referer(url) => url.to_string(),
            TypedHeader::ContentRange(value) => value.to_header_text(),
            TypedHeader::ContentType(value) => value.to_header_text(),
            TypedHeader::Cookie(value) => value.to_header_text(),
            TypedHeader::Date(value)
            | TypedHeader::Expires(value)
            | TypedHeader::IfModifiedSince(value)
            | TypedHeader::IfUnmodifiedSince(value)
            | TypedHeader::LastModified(value) => date(value),
            TypedHeader::ETag(value) => value.to_header_text(),
            TypedHeader::From(address) => address.to_string(),
            TypedHeader::IfMatch(tags) | TypedHeader::IfNoneMatch(tags) => etag::format_list(tags),
            TypedHeader::IfRange(value) => value.to_header_text(),
            TypedHeader::Link(links) => Link::format_list(links),
            TypedHeader::Range(value) => value.to_header_text(),
            TypedHeader::SetCookie(value) => value.to_header_text(),
            TypedHeader::Server(text) | TypedHeader::UserAgent(text) | TypedHeader::Unknown(text) => {
                text.to_string()
            }
        }
    }

    pub fn kind(&self) -> HeaderKind {
        match self {
            TypedHeader::Accept(_) => HeaderKind::Accept,
            TypedHeader::AcceptCharset(_) => HeaderKind::AcceptCharset,
            TypedHeader::AcceptEncoding(_) => HeaderKind::AcceptEncoding,
            TypedHeader::AcceptLanguage(_) => HeaderKind::AcceptLanguage,
            TypedHeader::Age(_) => HeaderKind::Age,
            TypedHeader::CacheControl(_) => HeaderKind::CacheControl,
            TypedHeader::ContentDisposition(_) => HeaderKind::ContentDisposition,
            TypedHeader::ContentEncoding(_) => HeaderKind::ContentEncoding,
            TypedHeader::ContentLanguage(_) => HeaderKind::ContentLanguage,
            TypedHeader::ContentLength(_) => HeaderKind::ContentLength,
            TypedHeader::ContentLocation(_) => HeaderKind::ContentLocation,
            TypedHeader::ContentRange(_) => HeaderKind::ContentRange,
            TypedHeader::ContentType(_) => HeaderKind::ContentType,
            TypedHeader::Cookie(_) => HeaderKind::Cookie,
            TypedHeader::Date(_) => HeaderKind::Date,
            TypedHeader::ETag(_) => HeaderKind::ETag,
            TypedHeader::Expires(_) => HeaderKind::Expires,
            TypedHeader::From(_) => HeaderKind::From,
            TypedHeader::IfMatch(_) => HeaderKind::IfMatch,
            TypedHeader::IfModifiedSince(_) => HeaderKind::IfModifiedSince,
            TypedHeader::IfNoneMatch(_) => HeaderKind::IfNoneMatch,
            TypedHeader::IfRange(_) => HeaderKind::IfRange,
            TypedHeader::IfUnmodifiedSince(_) => HeaderKind::IfUnmodifiedSince,
            TypedHeader::LastModified(_) => HeaderKind::LastModified,
            TypedHeader::Link(_) => HeaderKind::Link,
            TypedHeader::Location(_) => HeaderKind::Location,
            TypedHeader::Range(_) => HeaderKind::Range,
            TypedHeader::Referer(_) => HeaderKind::Referer,
            TypedHeader::Server(_) => HeaderKind::Server,
            TypedHeader::SetCookie(_) => HeaderKind::SetCookie,
            TypedHeader::UserAgent(_) => HeaderKind::UserAgent,
            TypedHeader::Unknown(_) => HeaderKind::Unknown,
        }
    }
}

impl std::fmt::Display for TypedHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_header_text())
    }
}

/// `If-Match` and `If-None-Match` allow `*` only on its own.
fn exclusive_wildcard(tags: Vec<ETag>, name: &HeaderName) -> Result<Vec<ETag>> {
    if tags.len() > 1 && tags.iter().any(HeaderValue::is_wildcard) {
        return Err(HeaderValueError::invalid(format!(
            "Wildcard etag must be the only {} element",
            name
        )));
    }
    Ok(tags)
}

fn unknown_value(text: &str) -> Result<SmolStr> {
    if let Some((position, _)) = chars::FIELD_TEXT.first_invalid(text) {
        return Err(HeaderValueError::invalid_character(text, position));
    }
    Ok(SmolStr::new(text))
}

fn dispatch(name: &HeaderName, text: &str) -> Result<TypedHeader> {
    let date = || DateTimeHandler::UNQUOTED.parse(text);
    let value = match name.kind() {
        HeaderKind::Accept => TypedHeader::Accept(Accept::parse(text)?),
        HeaderKind::AcceptCharset => TypedHeader::AcceptCharset(AcceptCharset::parse(text)?),
        HeaderKind::AcceptEncoding => TypedHeader::AcceptEncoding(AcceptEncoding::parse(text)?),
        HeaderKind::AcceptLanguage => TypedHeader::AcceptLanguage(AcceptLanguage::parse(text)?),
        HeaderKind::Age => TypedHeader::Age(LongHandler.parse(text)?),
        HeaderKind::CacheControl => TypedHeader::CacheControl(CacheControl::parse(text)?),
        HeaderKind::ContentDisposition => {
            TypedHeader::ContentDisposition(ContentDisposition::parse(text)?)
        }
        HeaderKind::ContentEncoding => TypedHeader::ContentEncoding(ContentEncoding::parse(text)?),
        HeaderKind::ContentLanguage => TypedHeader::ContentLanguage(ContentLanguage::parse(text)?),
        HeaderKind::ContentLength => TypedHeader::ContentLength(LongHandler.parse(text)?),
        HeaderKind::ContentLocation => TypedHeader::ContentLocation(UrlHandler::ANY.parse(text)?),
        HeaderKind::ContentRange => TypedHeader::ContentRange(ContentRange::parse(text)?),
        HeaderKind::ContentType => TypedHeader::ContentType(MediaType::parse(text)?),
        HeaderKind::Cookie => TypedHeader::Cookie(Cookie::parse(text)?),
        HeaderKind::Date => TypedHeader::Date(date()?),
        HeaderKind::ETag => TypedHeader::ETag(ETag::parse(text)?),
        HeaderKind::Expires => TypedHeader::Expires(date()?),
        HeaderKind::From => TypedHeader::From(EmailAddressHandler.parse(text)?),
        HeaderKind::IfMatch => {
            TypedHeader::IfMatch(exclusive_wildcard(ETag::parse_list(text)?, name)?)
        }
        HeaderKind::IfModifiedSince => TypedHeader::IfModifiedSince(date()?),
        HeaderKind::IfNoneMatch => {
            TypedHeader::IfNoneMatch(exclusive_wildcard(ETag::parse_list(text)?, name)?)
        }
        HeaderKind::IfRange => TypedHeader::IfRange(IfRange::parse(text)?),
        HeaderKind::IfUnmodifiedSince => TypedHeader::IfUnmodifiedSince(date()?),
        HeaderKind::LastModified => TypedHeader::LastModified(date()?),
        HeaderKind::Link => {
            let links = Link::parse_list(text)?;
            if links.is_empty() {
                return Err(HeaderValueError::missing("link", text));
            }
            TypedHeader::Link(links)
        }
        HeaderKind::Location => TypedHeader::Location(UrlHandler::ANY.parse(text)?),
        HeaderKind::Range => TypedHeader::Range(Range::parse(text)?),
        HeaderKind::Referer => TypedHeader::Referer(UrlHandler::ANY.parse(text)?),
        HeaderKind::Server => TypedHeader::Server(FIELD_TEXT.parse(text)?),
        HeaderKind::SetCookie => TypedHeader::SetCookie(SetCookie::parse(text)?),
        HeaderKind::UserAgent => TypedHeader::UserAgent(FIELD_TEXT.parse(text)?),
        HeaderKind::Unknown => TypedHeader::Unknown(unknown_value(text)?),
    };
    Ok(value)
}

/// Parses `text` as the value of header `name`.
///
/// Failures are wrapped with the header name and the offending text.
pub fn parse_header_value(name: &HeaderName, text: &str) -> Result<TypedHeader> {
    dispatch(name, text).map_err(|e| e.converting(name.as_str(), text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hval_core::{CharsetName, ContentCoding};

    fn parse(name: &HeaderName, text: &str) -> TypedHeader {
        parse_header_value(name, text).unwrap()
    }

    #[test]
    fn dispatches_by_kind() {
        match parse(&HeaderName::CONTENT_TYPE, "text/plain; charset=utf-8") {
            TypedHeader::ContentType(media_type) => {
                assert_eq!(media_type.charset(), Some(&CharsetName::UTF_8))
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse(&HeaderName::CONTENT_ENCODING, "gzip, br") {
            TypedHeader::ContentEncoding(encoding) => {
                assert_eq!(encoding.codings(), &[ContentCoding::GZIP, ContentCoding::BR])
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(parse(&HeaderName::AGE, "60"), TypedHeader::Age(60));
    }

    #[test]
    fn round_trips_canonical_text() {
        for (name, text) in [
            (HeaderName::ACCEPT, "text/html, application/json; q=0.5"),
            (HeaderName::CACHE_CONTROL, "max-age=3600, no-cache"),
            (HeaderName::DATE, "Sun, 06 Nov 1994 08:49:37 GMT"),
            (HeaderName::IF_NONE_MATCH, "\"a\", W/\"b\""),
            (HeaderName::CONTENT_RANGE, "bytes 0-499/1234"),
            (HeaderName::LOCATION, "/elsewhere"),
            (HeaderName::USER_AGENT, "curl/8.0 (x86_64-pc-linux-gnu)"),
            (HeaderName::LINK, "</p/2>; rel=next"),
            (HeaderName::COOKIE, "SID=31d4d96e407aad42; lang=en-US"),
            (HeaderName::SET_COOKIE, "id=a3fWa; Max-Age=2592000; Secure; HttpOnly"),
        ] {
            assert_eq!(parse(&name, text).to_header_text(), text);
        }
    }

    #[test]
    fn wildcard_must_stand_alone() {
        assert_eq!(
            parse(&HeaderName::IF_MATCH, "*"),
            TypedHeader::IfMatch(vec![ETag::Wildcard])
        );
        let err = parse_header_value(&HeaderName::IF_NONE_MATCH, "*, \"a\"").unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            "Wildcard etag must be the only If-None-Match element"
        );
        assert!(parse_header_value(&HeaderName::IF_RANGE, "*").is_err());
    }

    #[test]
    fn errors_name_the_header() {
        let err = parse_header_value(&HeaderName::CONTENT_LENGTH, "12a").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to convert \"Content-Length\" value \"12a\""));
    }

    #[test]
    fn unknown_headers_keep_text() {
        let name = HeaderName::parse("X-Trace").unwrap();
        assert_eq!(
            parse(&name, "abc; def"),
            TypedHeader::Unknown(SmolStr::new("abc; def"))
        );
        assert!(parse_header_value(&name, "a\u{7}b").is_err());
    }
}
