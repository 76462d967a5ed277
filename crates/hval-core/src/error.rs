// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;

/// The single error type raised by every parser and handler.
///
/// Structural failures carry the offending position and a copy of the input;
/// handler boundaries wrap whatever failed underneath in [`Conversion`] so the
/// message names the header or parameter being converted.
///
/// [`Conversion`]: HeaderValueError::Conversion
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValueError {
    /// A character no grammar rule accepts at this position.
    InvalidCharacter {
        position: usize,
        character: char,
        text: String,
    },
    /// End of text reached while a value was still expected.
    MissingValue { what: &'static str, text: String },
    /// A mandatory token was present but empty.
    EmptyToken {
        what: &'static str,
        position: usize,
        text: String,
    },
    /// A quoted string or comment was never closed.
    Unterminated {
        what: &'static str,
        position: usize,
        text: String,
    },
    /// A comment appeared where the grammar forbids one.
    CommentPresent { position: usize, text: String },
    /// A list that must hold at least one element was empty.
    EmptyList { what: String },
    /// Structurally valid text failing a domain constraint.
    Invalid(String),
    /// A value that cannot be satisfied, such as no acceptable charset.
    NotAcceptable(String),
    /// A parameter value holding the wrong kind of value.
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// Failure converting `text` for the header or parameter `name`.
    Conversion {
        name: String,
        text: String,
        source: Box<HeaderValueError>,
    },
}

impl HeaderValueError {
    pub fn invalid(message: impl Into<String>) -> Self {
        HeaderValueError::Invalid(message.into())
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        HeaderValueError::NotAcceptable(message.into())
    }

    pub fn empty_list(what: impl Into<String>) -> Self {
        HeaderValueError::EmptyList { what: what.into() }
    }

    pub fn invalid_character(text: &str, position: usize) -> Self {
        let character = text[position..].chars().next().unwrap_or('\0');
        HeaderValueError::InvalidCharacter {
            position,
            character,
            text: text.to_owned(),
        }
    }

    pub fn missing(what: &'static str, text: &str) -> Self {
        HeaderValueError::MissingValue {
            what,
            text: text.to_owned(),
        }
    }

    /// Wraps `self` as the cause of a failed conversion of `text` for `name`.
    pub fn converting(self, name: &str, text: &str) -> Self {
        HeaderValueError::Conversion {
            name: name.to_owned(),
            text: text.to_owned(),
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any conversion wrappers.
    pub fn root_cause(&self) -> &HeaderValueError {
        match self {
            HeaderValueError::Conversion { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_comment_present(&self) -> bool {
        matches!(self.root_cause(), HeaderValueError::CommentPresent { .. })
    }

    pub fn is_not_acceptable(&self) -> bool {
        matches!(self.root_cause(), HeaderValueError::NotAcceptable(_))
    }
}

impl fmt::Display for HeaderValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValueError::InvalidCharacter {
                position,
                character,
                text,
            } => write!(
                f,
                "Invalid character {:?} at {} in {:?}",
                character, position, text
            ),
            HeaderValueError::MissingValue { what, text } => {
                write!(f, "Missing {} in {:?}", what, text)
            }
            HeaderValueError::EmptyToken {
                what,
                position,
                text,
            } => write!(f, "Empty {} at {} in {:?}", what, position, text),
            HeaderValueError::Unterminated {
                what,
                position,
                text,
            } => write!(f, "Unterminated {} at {} in {:?}", what, position, text),
            HeaderValueError::CommentPresent { position, text } => {
                write!(f, "Comment present at {} in {:?}", position, text)
            }
            HeaderValueError::EmptyList { what } => write!(f, "{} list empty", what),
            HeaderValueError::Invalid(message) => f.write_str(message),
            HeaderValueError::NotAcceptable(message) => f.write_str(message),
            HeaderValueError::TypeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "Parameter {:?} value not a {} (got {})",
                name, expected, actual
            ),
            HeaderValueError::Conversion { name, text, source } => write!(
                f,
                "Failed to convert {:?} value {:?}, message: {}",
                name, text, source
            ),
        }
    }
}

impl std::error::Error for HeaderValueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeaderValueError::Conversion { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HeaderValueError>;
