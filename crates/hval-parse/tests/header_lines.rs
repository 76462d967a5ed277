// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bytes::Bytes;
use hval_core::{ContentDisposition, LinkRelation};
use hval_parse::{parse_header_block, parse_header_line, HeaderKind, HeaderName, TypedHeader};
use proptest::prelude::*;

#[test]
fn response_header_section() {
    let block = Bytes::from_static(
        b"Date: Sun, 06 Nov 1994 08:49:37 GMT\r\n\
          Content-Type: application/json\r\n\
          Content-Length: 348\r\n\
          Content-Disposition: attachment; filename=\"/tmp/report.json\"\r\n\
          Link: </page/3>; rel=next, </page/1>; rel=prev\r\n\
          Cache-Control: private, max-age=0\r\n\
          Server: hval/0.1\r\n\r\n",
    );
    let headers = parse_header_block(&block).unwrap();
    let kinds: Vec<HeaderKind> = headers.iter().map(|h| h.name.kind()).collect();
    assert_eq!(
        kinds,
        [
            HeaderKind::Date,
            HeaderKind::ContentType,
            HeaderKind::ContentLength,
            HeaderKind::ContentDisposition,
            HeaderKind::Link,
            HeaderKind::CacheControl,
            HeaderKind::Server,
        ]
    );

    match &headers[3].value {
        TypedHeader::ContentDisposition(disposition) => {
            let file_name = disposition.filename().unwrap();
            assert_eq!(file_name.without_path().value(), "report.json");
        }
        other => panic!("unexpected {:?}", other),
    }
    match &headers[4].value {
        TypedHeader::Link(links) => assert!(links[1].has_relation(&LinkRelation::PREV)),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn request_header_section() {
    let block = Bytes::from_static(
        b"Accept: text/*;q=0.3, text/html;q=0.7, */*;q=0.1\r\n\
          Accept-Language: da, en-GB;q=0.8, en;q=0.7\r\n\
          If-None-Match: W/\"67ab43\", \"54ed21\"\r\n\
          Range: bytes=0-1023\r\n\
          From: webmaster@example.org\r\n\r\n",
    );
    let headers = parse_header_block(&block).unwrap();
    assert_eq!(headers.len(), 5);
    assert_eq!(
        headers[0].to_header_line(),
        "Accept: text/html; q=0.7, text/*; q=0.3, */*; q=0.1"
    );
    assert_eq!(
        headers[2].to_header_line(),
        "If-None-Match: W/\"67ab43\", \"54ed21\""
    );
}

#[test]
fn cookie_headers() {
    let block = Bytes::from_static(
        b"Set-Cookie: SID=31d4d96e407aad42; Path=/; Secure; HttpOnly\r\n\
          set-cookie: lang=en-US; Expires=Wed, 09 Jun 2021 10:18:14 GMT\r\n\
          Cookie: SID=31d4d96e407aad42; lang=en-US\r\n\r\n",
    );
    let headers = parse_header_block(&block).unwrap();
    match (&headers[0].value, &headers[1].value, &headers[2].value) {
        (TypedHeader::SetCookie(sid), TypedHeader::SetCookie(lang), TypedHeader::Cookie(cookie)) => {
            assert!(sid.is_secure() && sid.is_http_only());
            assert!(lang.expires().is_some());
            assert_eq!(cookie.get("lang"), Some("en-US"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        headers[1].to_header_line(),
        "Set-Cookie: lang=en-US; Expires=Wed, 09 Jun 2021 10:18:14 GMT"
    );
}

#[test]
fn one_bad_line_fails_the_block() {
    let block = Bytes::from_static(b"Age: 10\r\nAge: ten\r\n\r\n");
    let err = parse_header_block(&block).unwrap_err();
    assert!(err.to_string().contains("\"Age\""));
}

#[test]
fn content_disposition_matches_core_parse() {
    let header = parse_header_line("Content-Disposition: inline").unwrap();
    assert_eq!(
        header.value,
        TypedHeader::ContentDisposition(ContentDisposition::parse("inline").unwrap())
    );
}

proptest! {
    /// Registered names resolve regardless of case and print canonically.
    #[test]
    fn header_names_ignore_case(upper in prop::collection::vec(any::<bool>(), 13)) {
        let name: String = "cache-control"
            .chars()
            .zip(upper.iter())
            .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
            .collect();
        let header = parse_header_line(&format!("{}: no-store", name)).expect("parse");
        prop_assert_eq!(&header.name, &HeaderName::CACHE_CONTROL);
        prop_assert_eq!(header.to_header_line(), "Cache-Control: no-store");
    }

    /// Unknown headers carry their text through unchanged.
    #[test]
    fn unknown_headers_roundtrip(
        name in "X-[A-Za-z0-9]{1,12}",
        value in "[!-~]([ !-~]{0,30}[!-~])?",
    ) {
        let line = format!("{}: {}", name, value);
        let header = parse_header_line(&line).expect("parse");
        prop_assert_eq!(header.name.kind(), HeaderKind::Unknown);
        prop_assert_eq!(header.to_header_line(), line);
    }

    #[test]
    fn content_length_roundtrip(length in any::<u64>()) {
        let line = format!("Content-Length: {}", length);
        let header = parse_header_line(&line).expect("parse");
        prop_assert_eq!(&header.value, &TypedHeader::ContentLength(length));
        prop_assert_eq!(header.to_header_line(), line);
    }
}
