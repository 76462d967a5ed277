// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_main]
use bytes::Bytes;
use hval_parse::{parse_header_block_with_limit, parse_header_line};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);
    let _ = parse_header_block_with_limit(&bytes, 1024);
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_header_line(text);
    }
});
