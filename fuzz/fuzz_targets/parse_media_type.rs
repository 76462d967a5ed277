// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_main]
use hval_core::{Accept, ContentDisposition, Cookie, Link, MediaType, SetCookie};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let _ = MediaType::parse(text);
    let _ = Accept::parse(text);
    let _ = ContentDisposition::parse(text);
    let _ = Link::parse_list(text);
    let _ = Cookie::parse(text);
    let _ = SetCookie::parse(text);
});
