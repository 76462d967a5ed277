// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! URL references and mailbox addresses.

use std::fmt;

use smol_str::SmolStr;
use url::Url;

use crate::error::{HeaderValueError, Result};
use crate::handler::HeaderValueHandler;

/// An absolute URL, or a relative reference kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UrlReference {
    Absolute(Url),
    Relative(SmolStr),
}

impl UrlReference {
    pub fn parse(text: &str) -> Result<Self> {
        match Url::parse(text) {
            Ok(url) => Ok(UrlReference::Absolute(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                if let Some(position) = text.find(|c: char| !is_uri_char(c)) {
                    return Err(HeaderValueError::invalid_character(text, position));
                }
                Ok(UrlReference::Relative(SmolStr::new(text)))
            }
            Err(e) => Err(HeaderValueError::invalid(format!(
                "Invalid URL {:?}: {}",
                text, e
            ))),
        }
    }

    pub fn absolute(&self) -> Option<&Url> {
        match self {
            UrlReference::Absolute(url) => Some(url),
            UrlReference::Relative(_) => None,
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, UrlReference::Absolute(_))
    }

    /// Resolves against `base`; absolute references are returned as is.
    pub fn resolve(&self, base: &Url) -> Result<Url> {
        match self {
            UrlReference::Absolute(url) => Ok(url.clone()),
            UrlReference::Relative(text) => base.join(text).map_err(|e| {
                HeaderValueError::invalid(format!("Invalid URL {:?}: {}", text.as_str(), e))
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UrlReference::Absolute(url) => url.as_str(),
            UrlReference::Relative(text) => text,
        }
    }
}

impl fmt::Display for UrlReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// RFC 3986 unreserved, reserved and '%'.
fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '.' | '_' | '~' | ':' | '/' | '?' | '#' | '[' | ']' | '@' | '!' | '$' | '&'
                | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=' | '%'
        )
}

/// `Location`, `Content-Location`, `Referer` and the `anchor` link parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlHandler {
    absolute: bool,
}

impl UrlHandler {
    pub const ANY: UrlHandler = UrlHandler { absolute: false };
    pub const ABSOLUTE: UrlHandler = UrlHandler { absolute: true };
}

impl HeaderValueHandler for UrlHandler {
    type Value = UrlReference;

    fn parse(&self, text: &str) -> Result<UrlReference> {
        if text.is_empty() {
            return Err(HeaderValueError::missing("url", text));
        }
        let url = UrlReference::parse(text)?;
        self.check(&url)?;
        Ok(url)
    }

    fn check(&self, value: &UrlReference) -> Result<()> {
        if self.absolute && !value.is_absolute() {
            return Err(HeaderValueError::invalid(format!(
                "URL {:?} is not absolute",
                value.as_str()
            )));
        }
        Ok(())
    }

    fn format(&self, value: &UrlReference) -> String {
        value.as_str().to_owned()
    }
}

/// A bare `local@domain` mailbox as carried by `From`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(SmolStr);

impl EmailAddress {
    pub fn parse(text: &str) -> Result<Self> {
        let (local, domain) = text
            .rsplit_once('@')
            .ok_or_else(|| HeaderValueError::missing("@", text))?;
        if local.is_empty() {
            return Err(HeaderValueError::EmptyToken {
                what: "local part",
                position: 0,
                text: text.to_owned(),
            });
        }
        if let Some(position) = local.find(|c: char| !is_atext(c) && c != '.') {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
            return Err(HeaderValueError::invalid(format!(
                "Invalid local part in {:?}",
                text
            )));
        }
        let offset = local.len() + 1;
        if domain.is_empty() {
            return Err(HeaderValueError::missing("domain", text));
        }
        if let Some(position) = domain.find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '.')) {
            return Err(HeaderValueError::invalid_character(text, offset + position));
        }
        if domain.split('.').any(|label| label.is_empty() || label.starts_with('-') || label.ends_with('-')) {
            return Err(HeaderValueError::invalid(format!(
                "Invalid domain in {:?}",
                text
            )));
        }
        Ok(Self(SmolStr::new(text)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn local_part(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(local, _)| local)
    }

    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// RFC 5322 atext
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '/' | '=' | '?' | '^' | '_'
                | '`' | '{' | '|' | '}' | '~'
        )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmailAddressHandler;

impl HeaderValueHandler for EmailAddressHandler {
    type Value = EmailAddress;

    fn parse(&self, text: &str) -> Result<EmailAddress> {
        EmailAddress::parse(text)
    }

    fn check(&self, value: &EmailAddress) -> Result<()> {
        EmailAddress::parse(value.as_str()).map(|_| ())
    }

    fn format(&self, value: &EmailAddress) -> String {
        value.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_and_relative() {
        let absolute = UrlHandler::ANY.parse("https://example.com/a?b=c").unwrap();
        assert!(absolute.is_absolute());
        let relative = UrlHandler::ANY.parse("/index.html").unwrap();
        assert_eq!(relative, UrlReference::Relative("/index.html".into()));
        let base = Url::parse("https://example.com/dir/").unwrap();
        assert_eq!(
            relative.resolve(&base).unwrap().as_str(),
            "https://example.com/index.html"
        );
    }

    #[test]
    fn absolute_handler_rejects_relative() {
        let err = UrlHandler::ABSOLUTE.parse_named("/x", "anchor").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to convert \"anchor\" value \"/x\", message: URL \"/x\" is not absolute"
        );
    }

    #[test]
    fn relative_reference_rejects_spaces() {
        assert!(matches!(
            UrlReference::parse("/a b"),
            Err(HeaderValueError::InvalidCharacter { position: 2, .. })
        ));
    }

    #[test]
    fn email_addresses() {
        let address = EmailAddressHandler.parse("webmaster@example.org").unwrap();
        assert_eq!(address.local_part(), "webmaster");
        assert_eq!(address.domain(), "example.org");
        assert!(EmailAddress::parse("example.org").is_err());
        assert!(EmailAddress::parse("a..b@example.org").is_err());
        assert!(EmailAddress::parse("a@-example.org").is_err());
        assert!(matches!(
            EmailAddress::parse("a@exa mple.org"),
            Err(HeaderValueError::InvalidCharacter { position: 5, .. })
        ));
    }
}
