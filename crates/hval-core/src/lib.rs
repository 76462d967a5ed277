// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed HTTP header values.
//!
//! This crate parses header field values into typed Rust values and writes
//! them back in canonical form:
//! - **Engine**: [`scanner`] classifies characters into events for a per-header
//!   [`Grammar`]; [`parameters`] drives `value *( ";" param )` lists
//! - **Handlers**: [`HeaderValueHandler`] converts text to values and back, with
//!   string, number, q weight, date, quoted and list handlers in [`handler`]
//! - **Values**: media types, charsets, languages, content codings,
//!   Cache-Control, entity tags, If-Range, Content-Disposition, cookies, ranges
//!   and links
//!
//! Every failure is a [`HeaderValueError`] naming the header or parameter and
//! quoting the offending text.
//!
//! # Examples
//!
//! ```
//! # use hval_core::*;
//! let accept = Accept::parse("text/html;q=0.5, application/json").unwrap();
//! assert_eq!(accept.media_types()[0].essence(), "application/json");
//!
//! let media_type = MediaType::parse("text/plain; charset=utf-8").unwrap();
//! assert_eq!(media_type.charset(), Some(&CharsetName::UTF_8));
//! ```

pub mod address;
pub mod cache_control;
pub mod chars;
pub mod charset;
pub mod content_disposition;
pub mod cookie;
pub mod encoded_text;
pub mod encoding;
pub mod error;
pub mod etag;
pub mod handler;
pub mod if_range;
pub mod language;
pub mod link;
pub mod media_type;
pub mod parameters;
pub mod qweight;
pub mod range;
pub mod scanner;

pub use address::{EmailAddress, EmailAddressHandler, UrlHandler, UrlReference};
pub use cache_control::{
    CacheControl, CacheControlDirective, DirectiveKind, DirectiveName, DirectiveParameter,
    DirectiveValue,
};
pub use chars::CharPredicate;
pub use charset::{AcceptCharset, CharsetName, CharsetNameHandler, CharsetValue};
pub use content_disposition::{
    ContentDisposition, ContentDispositionFileName, ContentDispositionFileNameHandler,
    FileNameKind,
};
pub use cookie::{Cookie, CookieAttribute, CookiePair, SameSite, SetCookie};
pub use encoded_text::{EncodedText, EncodedTextHandler};
pub use encoding::{AcceptEncoding, AcceptEncodingValue, ContentCoding, ContentEncoding};
pub use error::{HeaderValueError, Result};
pub use etag::{ETag, ETagHandler, ETagValidator};
pub use handler::{
    first_of, format_http_date, DateTimeHandler, HeaderValueHandler, ListHandler, LongHandler,
    QWeightHandler, QuotedHandler, Quoting, StringHandler,
};
pub use if_range::{IfRange, IfRangeHandler};
pub use language::{AcceptLanguage, ContentLanguage, LanguageTag, LanguageTagHandler, LanguageValue};
pub use link::{Link, LinkRelation, LinkRelationsHandler};
pub use media_type::{Accept, MediaType, MediaTypeHandler};
pub use parameters::{
    HeaderParameterName, HeaderValue, HeaderValueWithParameters, ParameterKind,
    ParameterNameRegistry, ParameterValue, ParameterValueHandler, Parameters,
};
pub use qweight::QWeight;
pub use range::{ContentRange, Range, RangeSpec};
pub use scanner::{Cursor, Event, Grammar};
