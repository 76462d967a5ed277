// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Header field names and the registry of names with a typed value.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use hval_core::{HeaderValueError, Result};
use once_cell::sync::Lazy;
use smol_str::SmolStr;

/// Which typed value a header carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Accept,
    AcceptCharset,
    AcceptEncoding,
    AcceptLanguage,
    Age,
    CacheControl,
    ContentDisposition,
    ContentEncoding,
    ContentLanguage,
    ContentLength,
    ContentLocation,
    ContentRange,
    ContentType,
    Cookie,
    Date,
    ETag,
    Expires,
    From,
    IfMatch,
    IfModifiedSince,
    IfNoneMatch,
    IfRange,
    IfUnmodifiedSince,
    LastModified,
    Link,
    Location,
    Range,
    Referer,
    Server,
    SetCookie,
    UserAgent,
    /// Not registered; the value is kept as text.
    Unknown,
}

/// A header field name. Names compare and hash ignoring ASCII case.
#[derive(Debug, Clone)]
pub struct HeaderName {
    name: SmolStr,
    kind: HeaderKind,
}

impl HeaderName {
    const fn known(name: &'static str, kind: HeaderKind) -> Self {
        Self {
            name: SmolStr::new_inline(name),
            kind,
        }
    }

    pub const ACCEPT: HeaderName = Self::known("Accept", HeaderKind::Accept);
    pub const ACCEPT_CHARSET: HeaderName = Self::known("Accept-Charset", HeaderKind::AcceptCharset);
    pub const ACCEPT_ENCODING: HeaderName =
        Self::known("Accept-Encoding", HeaderKind::AcceptEncoding);
    pub const ACCEPT_LANGUAGE: HeaderName =
        Self::known("Accept-Language", HeaderKind::AcceptLanguage);
    pub const AGE: HeaderName = Self::known("Age", HeaderKind::Age);
    pub const CACHE_CONTROL: HeaderName = Self::known("Cache-Control", HeaderKind::CacheControl);
    pub const CONTENT_DISPOSITION: HeaderName =
        Self::known("Content-Disposition", HeaderKind::ContentDisposition);
    pub const CONTENT_ENCODING: HeaderName =
        Self::known("Content-Encoding", HeaderKind::ContentEncoding);
    pub const CONTENT_LANGUAGE: HeaderName =
        Self::known("Content-Language", HeaderKind::ContentLanguage);
    pub const CONTENT_LENGTH: HeaderName = Self::known("Content-Length", HeaderKind::ContentLength);
    pub const CONTENT_LOCATION: HeaderName =
        Self::known("Content-Location", HeaderKind::ContentLocation);
    pub const CONTENT_RANGE: HeaderName = Self::known("Content-Range", HeaderKind::ContentRange);
    pub const CONTENT_TYPE: HeaderName = Self::known("Content-Type", HeaderKind::ContentType);
    pub const COOKIE: HeaderName = Self::known("Cookie", HeaderKind::Cookie);
    pub const DATE: HeaderName = Self::known("Date", HeaderKind::Date);
    pub const ETAG: HeaderName = Self::known("ETag", HeaderKind::ETag);
    pub const EXPIRES: HeaderName = Self::known("Expires", HeaderKind::Expires);
    pub const FROM: HeaderName = Self::known("From", HeaderKind::From);
    pub const IF_MATCH: HeaderName = Self::known("If-Match", HeaderKind::IfMatch);
    pub const IF_MODIFIED_SINCE: HeaderName =
        Self::known("If-Modified-Since", HeaderKind::IfModifiedSince);
    pub const IF_NONE_MATCH: HeaderName = Self::known("If-None-Match", HeaderKind::IfNoneMatch);
    pub const IF_RANGE: HeaderName = Self::known("If-Range", HeaderKind::IfRange);
    pub const IF_UNMODIFIED_SINCE: HeaderName =
        Self::known("If-Unmodified-Since", HeaderKind::IfUnmodifiedSince);
    pub const LAST_MODIFIED: HeaderName = Self::known("Last-Modified", HeaderKind::LastModified);
    pub const LINK: HeaderName = Self::known("Link", HeaderKind::Link);
    pub const LOCATION: HeaderName = Self::known("Location", HeaderKind::Location);
    pub const RANGE: HeaderName = Self::known("Range", HeaderKind::Range);
    pub const REFERER: HeaderName = Self::known("Referer", HeaderKind::Referer);
    pub const SERVER: HeaderName = Self::known("Server", HeaderKind::Server);
    pub const SET_COOKIE: HeaderName = Self::known("Set-Cookie", HeaderKind::SetCookie);
    pub const USER_AGENT: HeaderName = Self::known("User-Agent", HeaderKind::UserAgent);

    /// The registered name in its canonical casing, or an unknown name kept
    /// as written after token validation.
    pub fn parse(text: &str) -> Result<Self> {
        if let Some(known) = lookup(text) {
            return Ok(known.clone());
        }
        if text.is_empty() {
            return Err(HeaderValueError::missing("header name", text));
        }
        if let Some(position) = text.find(|c: char| !is_tchar(c)) {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        Ok(Self {
            name: SmolStr::new(text),
            kind: HeaderKind::Unknown,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> HeaderKind {
        self.kind
    }

    pub fn is_known(&self) -> bool {
        self.kind != HeaderKind::Unknown
    }

    /// Lowercase form used for metrics and allow lists.
    pub fn to_lowercase(&self) -> SmolStr {
        SmolStr::new(self.name.to_ascii_lowercase())
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for HeaderName {}

impl Hash for HeaderName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.name.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl std::str::FromStr for HeaderName {
    type Err = HeaderValueError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

static KNOWN_HEADERS: Lazy<HashMap<SmolStr, HeaderName>> = Lazy::new(|| {
    [
        HeaderName::ACCEPT,
        HeaderName::ACCEPT_CHARSET,
        HeaderName::ACCEPT_ENCODING,
        HeaderName::ACCEPT_LANGUAGE,
        HeaderName::AGE,
        HeaderName::CACHE_CONTROL,
        HeaderName::CONTENT_DISPOSITION,
        HeaderName::CONTENT_ENCODING,
        HeaderName::CONTENT_LANGUAGE,
        HeaderName::CONTENT_LENGTH,
        HeaderName::CONTENT_LOCATION,
        HeaderName::CONTENT_RANGE,
        HeaderName::CONTENT_TYPE,
        HeaderName::COOKIE,
        HeaderName::DATE,
        HeaderName::ETAG,
        HeaderName::EXPIRES,
        HeaderName::FROM,
        HeaderName::IF_MATCH,
        HeaderName::IF_MODIFIED_SINCE,
        HeaderName::IF_NONE_MATCH,
        HeaderName::IF_RANGE,
        HeaderName::IF_UNMODIFIED_SINCE,
        HeaderName::LAST_MODIFIED,
        HeaderName::LINK,
        HeaderName::LOCATION,
        HeaderName::RANGE,
        HeaderName::REFERER,
        HeaderName::SERVER,
        HeaderName::SET_COOKIE,
        HeaderName::USER_AGENT,
    ]
    .into_iter()
    .map(|name| (name.to_lowercase(), name))
    .collect()
});

/// The registered header called `name`, ignoring case.
pub fn lookup(name: &str) -> Option<&'static HeaderName> {
    KNOWN_HEADERS.get(name.to_ascii_lowercase().as_str())
}

/// Every registered header.
pub fn known_headers() -> impl Iterator<Item = &'static HeaderName> {
    KNOWN_HEADERS.values()
}

// RFC 7230 tchar.
pub(crate) fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(name: &HeaderName) -> u64 {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn registered_names_resolve_to_constants() {
        let name = HeaderName::parse("content-TYPE").unwrap();
        assert_eq!(name, HeaderName::CONTENT_TYPE);
        assert_eq!(name.as_str(), "Content-Type");
        assert_eq!(name.kind(), HeaderKind::ContentType);
        assert_eq!(hash_of(&name), hash_of(&HeaderName::CONTENT_TYPE));
    }

    #[test]
    fn all_registered_names_are_present() {
        assert_eq!(known_headers().count(), 31);
        assert!(known_headers().all(HeaderName::is_known));
    }

    #[test]
    fn unknown_names_keep_their_text() {
        let name = HeaderName::parse("X-Request-Id").unwrap();
        assert_eq!(name.kind(), HeaderKind::Unknown);
        assert_eq!(name.to_string(), "X-Request-Id");
        assert_eq!(name, HeaderName::parse("x-request-id").unwrap());
    }

    #[test]
    fn invalid_names_rejected() {
        assert!(matches!(
            HeaderName::parse("Bad Name"),
            Err(HeaderValueError::InvalidCharacter { position: 3, .. })
        ));
        assert!(HeaderName::parse("").is_err());
        assert!(HeaderName::parse("a:b").is_err());
    }
}
