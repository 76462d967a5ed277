// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use chrono::NaiveDateTime;

use crate::error::{HeaderValueError, Result};
use crate::etag::ETag;
use crate::handler::{first_of, DateTimeHandler, HeaderValueHandler};
use crate::parameters::{header_text, HeaderValue};

/// `If-Range`: an entity tag or an HTTP date, never `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfRange {
    ETag(ETag),
    LastModified(NaiveDateTime),
}

impl IfRange {
    pub fn parse(text: &str) -> Result<Self> {
        let value = first_of(
            text,
            &[
                &|text: &str| ETag::parse(text).map(IfRange::ETag),
                &|text: &str| DateTimeHandler::UNQUOTED.parse(text).map(IfRange::LastModified),
            ],
        )?;
        value.check()?;
        Ok(value)
    }

    fn check(&self) -> Result<()> {
        match self {
            IfRange::ETag(ETag::Wildcard) => {
                Err(HeaderValueError::invalid("Wildcard etag not allowed in If-Range"))
            }
            _ => Ok(()),
        }
    }

    pub fn etag(&self) -> Option<&ETag> {
        match self {
            IfRange::ETag(etag) => Some(etag),
            IfRange::LastModified(_) => None,
        }
    }

    pub fn last_modified(&self) -> Option<&NaiveDateTime> {
        match self {
            IfRange::LastModified(date) => Some(date),
            IfRange::ETag(_) => None,
        }
    }

    /// Whether a representation with `current` tag and `modified` date still
    /// matches, in which case the range applies. Weak tags never match.
    pub fn matches(&self, current: Option<&ETag>, modified: Option<&NaiveDateTime>) -> bool {
        match self {
            IfRange::ETag(etag) => current.map_or(false, |current| etag.strong_eq(current)),
            IfRange::LastModified(date) => modified == Some(date),
        }
    }
}

impl HeaderValue for IfRange {
    fn to_header_text(&self) -> String {
        match self {
            IfRange::ETag(etag) => etag.to_header_text(),
            IfRange::LastModified(date) => DateTimeHandler::UNQUOTED.format(date),
        }
    }
}

header_text!(IfRange, IfRange::parse);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IfRangeHandler;

impl HeaderValueHandler for IfRangeHandler {
    type Value = IfRange;

    fn parse(&self, text: &str) -> Result<IfRange> {
        IfRange::parse(text)
    }

    fn check(&self, value: &IfRange) -> Result<()> {
        value.check()
    }

    fn format(&self, value: &IfRange) -> String {
        value.to_header_text()
    }
}
