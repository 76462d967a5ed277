// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cmp::Ordering;
use std::fmt;

use crate::error::{HeaderValueError, Result};

/// Relative preference of a list element, the `q` parameter.
///
/// Always within `[0.0, 1.0]`; elements without a `q` weigh [`QWeight::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QWeight(f32);

impl QWeight {
    pub const MIN: QWeight = QWeight(0.0);
    pub const MAX: QWeight = QWeight(1.0);
    pub const DEFAULT: QWeight = QWeight::MAX;

    pub fn new(value: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(HeaderValueError::invalid(format!(
                "Invalid q weight {} not between 0.0 and 1.0",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Parses `qvalue`; only digits and a single `.` are accepted.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(HeaderValueError::missing("q weight", text));
        }
        if let Some((position, _)) = text
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        let value: f32 = text
            .parse()
            .map_err(|_| HeaderValueError::invalid(format!("Invalid q weight {:?}", text)))?;
        Self::new(value)
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl Default for QWeight {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Eq for QWeight {}

impl PartialOrd for QWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QWeight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for QWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Sorts by descending weight. The sort is stable so equal weights keep
/// their input order.
pub fn sort_by_q_weight<T>(values: &mut [T], q_weight: impl Fn(&T) -> QWeight) {
    values.sort_by(|a, b| q_weight(b).cmp(&q_weight(a)));
}
