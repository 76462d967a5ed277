// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_main]
use hval_parse::parse_header_line;
use libfuzzer_sys::fuzz_target;

// Anything accepted must print to a line that parses to the same value.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(header) = parse_header_line(text) {
        let line = header.to_header_line();
        let reparsed = parse_header_line(&line)
            .unwrap_or_else(|e| panic!("{:?} printed as unparsable {:?}: {}", text, line, e));
        assert_eq!(header, reparsed, "{:?} printed as {:?}", text, line);
    }
});
