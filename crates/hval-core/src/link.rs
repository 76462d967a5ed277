// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web linking (RFC 8288).
//!
//! ```text
//! Link       = #link-value
//! link-value = "<" URI-Reference ">" *( OWS ";" OWS link-param )
//! relation-types = relation-type / DQUOTE relation-type *( 1*SP relation-type ) DQUOTE
//! ```

use once_cell::sync::Lazy;
use smol_str::SmolStr;
use url::Url;

use crate::address::{UrlHandler, UrlReference};
use crate::chars::{self, RFC2045_TOKEN};
use crate::encoded_text::{EncodedText, ENCODED_TEXT};
use crate::error::{HeaderValueError, Result};
use crate::handler::{HeaderValueHandler, QuotedHandler, DEFAULT_STRING};
use crate::language::LanguageTagHandler;
use crate::media_type::MediaTypeHandler;
use crate::parameters::{
    header_text, join_values, parse_list, parse_single, write_with_parameters,
    HeaderParameterName, HeaderValue, HeaderValueWithParameters, ParameterNameRegistry,
    Parameters, ValueGrammar,
};
use crate::scanner::{self, Cursor, Event};

/// A relation type: a registered token or an extension URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkRelation {
    Regular(SmolStr),
    Url(Url),
}

impl LinkRelation {
    pub const NEXT: LinkRelation = LinkRelation::Regular(SmolStr::new_inline("next"));
    pub const PREV: LinkRelation = LinkRelation::Regular(SmolStr::new_inline("prev"));
    pub const CANONICAL: LinkRelation = LinkRelation::Regular(SmolStr::new_inline("canonical"));
    pub const ALTERNATE: LinkRelation = LinkRelation::Regular(SmolStr::new_inline("alternate"));
    pub const STYLESHEET: LinkRelation = LinkRelation::Regular(SmolStr::new_inline("stylesheet"));

    /// Registered relation names compare case-insensitively and are stored
    /// lowercase; anything with a scheme is an extension relation.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(HeaderValueError::missing("relation type", text));
        }
        if text.contains(':') {
            return Url::parse(text).map(LinkRelation::Url).map_err(|err| {
                HeaderValueError::invalid(format!("Invalid relation type {:?}: {}", text, err))
            });
        }
        let first = text.chars().next().unwrap_or_default();
        if !first.is_ascii_alphabetic() {
            return Err(HeaderValueError::invalid_character(text, 0));
        }
        if let Some((position, _)) = text
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-')))
        {
            return Err(HeaderValueError::invalid_character(text, position));
        }
        Ok(LinkRelation::Regular(SmolStr::new(text.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        match self {
            LinkRelation::Regular(name) => name,
            LinkRelation::Url(url) => url.as_str(),
        }
    }
}

impl std::fmt::Display for LinkRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `rel` and `rev`: one token, or several relations quoted and space separated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkRelationsHandler;

impl HeaderValueHandler for LinkRelationsHandler {
    type Value = Vec<LinkRelation>;

    fn parse(&self, text: &str) -> Result<Vec<LinkRelation>> {
        let relations = if text.starts_with('"') {
            let mut cursor = Cursor::new(text);
            let inner = cursor.quoted_text(&chars::QUOTED_TEXT, true)?;
            cursor.expect_end()?;
            inner
                .split(|c: char| chars::is_whitespace(c))
                .filter(|part| !part.is_empty())
                .map(LinkRelation::parse)
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![LinkRelation::parse(text)?]
        };
        self.check(&relations)?;
        Ok(relations)
    }

    fn check(&self, value: &Vec<LinkRelation>) -> Result<()> {
        if value.is_empty() {
            return Err(HeaderValueError::empty_list("relation type"));
        }
        Ok(())
    }

    fn format(&self, value: &Vec<LinkRelation>) -> String {
        match value.as_slice() {
            [LinkRelation::Regular(name)] if RFC2045_TOKEN.all(name) => name.to_string(),
            relations => {
                let joined: Vec<&str> = relations.iter().map(LinkRelation::as_str).collect();
                scanner::quote(&joined.join(" "))
            }
        }
    }
}

static TYPE_HANDLER: QuotedHandler<MediaTypeHandler> = QuotedHandler::new(MediaTypeHandler, false);
static HREFLANG_HANDLER: QuotedHandler<LanguageTagHandler> =
    QuotedHandler::new(LanguageTagHandler, false);
static ANCHOR_HANDLER: QuotedHandler<UrlHandler> = QuotedHandler::new(UrlHandler::ANY, true);

pub static REL: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("rel", &LinkRelationsHandler));
pub static REV: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("rev", &LinkRelationsHandler));
pub static TYPE: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("type", &TYPE_HANDLER));
pub static HREFLANG: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("hreflang", &HREFLANG_HANDLER));
pub static TITLE: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("title", &DEFAULT_STRING));
pub static TITLE_STAR: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("title*", &ENCODED_TEXT));
pub static ANCHOR: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("anchor", &ANCHOR_HANDLER));
pub static MEDIA: Lazy<HeaderParameterName> =
    Lazy::new(|| HeaderParameterName::constant("media", &DEFAULT_STRING));

pub static LINK_PARAMETERS: Lazy<ParameterNameRegistry> = Lazy::new(|| {
    ParameterNameRegistry::new(
        "link",
        [
            REL.clone(),
            REV.clone(),
            TYPE.clone(),
            HREFLANG.clone(),
            TITLE.clone(),
            TITLE_STAR.clone(),
            ANCHOR.clone(),
            MEDIA.clone(),
        ],
        &DEFAULT_STRING,
    )
});

/// One `Link` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    target: UrlReference,
    parameters: Parameters,
}

impl Link {
    pub fn new(target: UrlReference) -> Self {
        Self {
            target,
            parameters: Parameters::new(),
        }
    }

    pub fn with_relation(target: UrlReference, relation: LinkRelation) -> Result<Self> {
        let parameters = Parameters::new().with(&REL, vec![relation])?;
        Ok(Self { target, parameters })
    }

    pub fn parse(text: &str) -> Result<Self> {
        parse_single(text, LinkGrammar::new(false))
    }

    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        parse_list(text, LinkGrammar::new(true))
    }

    pub fn format_list(links: &[Link]) -> String {
        join_values(links)
    }

    pub fn target(&self) -> &UrlReference {
        &self.target
    }

    /// Relations from `rel`; empty when the parameter is absent.
    pub fn relations(&self) -> &[LinkRelation] {
        self.parameters
            .value::<Vec<LinkRelation>>(&REL)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_relation(&self, relation: &LinkRelation) -> bool {
        self.relations().contains(relation)
    }

    /// `title*` when present, else `title`.
    pub fn title(&self) -> Option<String> {
        if let Some(encoded) = self.parameters.value::<EncodedText>(&TITLE_STAR) {
            return Some(encoded.value().to_owned());
        }
        self.parameters
            .value::<SmolStr>(&TITLE)
            .map(|title| title.to_string())
    }

    pub fn anchor(&self) -> Option<&UrlReference> {
        self.parameters.value(&ANCHOR)
    }
}

impl HeaderValue for Link {
    fn to_header_text(&self) -> String {
        let head = format!("<{}>", self.target);
        write_with_parameters(&head, &self.parameters, "; ")
    }
}

impl HeaderValueWithParameters for Link {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Result<Self> {
        Ok(Self {
            target: self.target.clone(),
            parameters,
        })
    }
}

header_text!(Link, Link::parse);

struct LinkGrammar {
    multiple: bool,
}

impl LinkGrammar {
    fn new(multiple: bool) -> Self {
        Self { multiple }
    }
}

impl ValueGrammar for LinkGrammar {
    type Head = UrlReference;
    type Value = Link;

    fn registry(&self) -> &ParameterNameRegistry {
        &LINK_PARAMETERS
    }

    fn allow_multiple_values(&self) -> bool {
        self.multiple
    }

    fn allow_comments(&self) -> bool {
        false
    }

    fn head(&mut self, _event: Event, cursor: &mut Cursor<'_>) -> Result<UrlReference> {
        if cursor.peek() != Some('<') {
            return Err(cursor.invalid_character());
        }
        cursor.bump();
        let start = cursor.position();
        let target = cursor.take_while(|c| c != '>' && !chars::is_whitespace(c));
        if !cursor.consume_if('>') {
            return Err(match cursor.peek() {
                None => HeaderValueError::Unterminated {
                    what: "link target",
                    position: start - 1,
                    text: cursor.text().to_owned(),
                },
                Some(_) => cursor.invalid_character(),
            });
        }
        UrlReference::parse(target).map_err(|err| match err {
            HeaderValueError::InvalidCharacter { position, .. } => {
                HeaderValueError::invalid_character(cursor.text(), start + position)
            }
            other => other,
        })
    }

    fn build(&mut self, target: UrlReference, parameters: Parameters) -> Result<Link> {
        Ok(Link { target, parameters })
    }
}
