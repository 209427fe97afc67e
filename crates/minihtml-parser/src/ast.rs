//! Abstract Syntax Tree for MiniHTML.
//!
//! Every node carries the source `span` it covers and the `TokenId` of the
//! token it was built from. Node sets are closed enums, so consumers match
//! exhaustively.

use minihtml_lexer::{Span, Token, TokenId};

/// A parsed template: the ordered top-level nodes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    pub nodes: Vec<Node>,
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Node {
    /// Text between tags.
    PlainText(PlainText),

    /// Unquoted attribute value.
    Literal(Literal),

    /// `<!-- ... -->`
    Comment(Comment),

    /// Quoted string without `{{ }}` blocks.
    String(QuotedString),

    /// `{{ expr }}`
    Executable(Executable),

    /// Quoted string with one or more `{{ }}` blocks.
    Interpolation(Interpolation),

    Tag(Tag),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::PlainText(n) => n.span,
            Node::Literal(n) => n.span,
            Node::Comment(n) => n.span,
            Node::String(n) => n.span,
            Node::Executable(n) => n.span,
            Node::Interpolation(n) => n.span,
            Node::Tag(n) => n.span,
        }
    }

    /// The token this node was created from.
    pub fn token(&self) -> TokenId {
        match self {
            Node::PlainText(n) => n.token,
            Node::Literal(n) => n.token,
            Node::Comment(n) => n.token,
            Node::String(n) => n.token,
            Node::Executable(n) => n.token,
            Node::Interpolation(n) => n.token,
            Node::Tag(n) => n.token,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlainText {
    pub literal: String,
    pub span: Span,
    pub token: TokenId,
}

impl PlainText {
    pub fn from_token(token: &Token, id: TokenId) -> Self {
        Self {
            literal: token.literal.clone(),
            span: token.span,
            token: id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Literal {
    pub value: String,
    pub span: Span,
    pub token: TokenId,
}

impl Literal {
    pub fn from_token(token: &Token, id: TokenId) -> Self {
        Self {
            value: token.literal.clone(),
            span: token.span,
            token: id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comment {
    pub literal: String,
    pub span: Span,
    pub token: TokenId,
}

/// A quoted string segment. `literal` has `\<quote>` escapes resolved.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct QuotedString {
    pub literal: String,
    pub quote: char,
    pub span: Span,
    pub token: TokenId,
}

impl QuotedString {
    pub fn from_token(token: &Token, id: TokenId) -> Self {
        let quote = token.quote.unwrap_or('"');
        Self {
            literal: unescape_quote(&token.literal, quote),
            quote,
            span: token.span,
            token: id,
        }
    }
}

fn unescape_quote(raw: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(2);
    escaped.push('\\');
    escaped.push(quote);
    raw.replace(&escaped, &quote.to_string())
}

/// Opaque expression text from a `{{ }}` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Executable {
    pub source: String,
    pub span: Span,
    pub token: TokenId,
}

impl Executable {
    pub fn from_token(token: &Token, id: TokenId) -> Self {
        Self {
            source: token.literal.clone(),
            span: token.span,
            token: id,
        }
    }
}

/// Alternating text and expression segments of an interpolated string.
///
/// Starts and ends with a `String` segment (possibly empty); segments of the
/// same variant are never adjacent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Interpolation {
    pub values: Vec<Segment>,
    pub span: Span,
    pub token: TokenId,
}

impl Interpolation {
    /// Seed an interpolation with its leading text segment.
    pub fn from_token(token: &Token, id: TokenId) -> Self {
        Self {
            values: vec![Segment::String(QuotedString::from_token(token, id))],
            span: token.span,
            token: id,
        }
    }

    pub fn executables(&self) -> impl Iterator<Item = &Executable> {
        self.values.iter().filter_map(|segment| match segment {
            Segment::Executable(exec) => Some(exec),
            Segment::String(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Segment {
    String(QuotedString),
    Executable(Executable),
}

/// An attribute on a tag. `value` is present only when `=` followed the key.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attr {
    pub name: String,
    pub value: Option<AttrValue>,
    pub span: Span,
    pub token: TokenId,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum AttrValue {
    Literal(Literal),
    String(QuotedString),
    Executable(Executable),
    Interpolation(Interpolation),
}

impl AttrValue {
    pub fn span(&self) -> Span {
        match self {
            AttrValue::Literal(v) => v.span,
            AttrValue::String(v) => v.span,
            AttrValue::Executable(v) => v.span,
            AttrValue::Interpolation(v) => v.span,
        }
    }
}

/// A tag and everything up to its matching close.
///
/// `bad_tag` marks a node synthesized from a closing tag that no enclosing
/// tag claimed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tag {
    pub name: String,
    pub self_closing: bool,
    pub bad_tag: bool,
    pub attributes: Vec<Attr>,
    pub children: Vec<Node>,
    pub span: Span,
    pub token: TokenId,
}

impl Tag {
    /// Build a tag from its `<name` or `</name` token.
    pub fn from_token(token: &Token, id: TokenId) -> Self {
        let (name, bad_tag) = match token.literal.strip_prefix("</") {
            Some(name) => (name, true),
            None => (token.literal.strip_prefix('<').unwrap_or(&token.literal), false),
        };
        Self {
            name: name.to_string(),
            self_closing: false,
            bad_tag,
            attributes: Vec::new(),
            children: Vec::new(),
            span: token.span,
            token: id,
        }
    }

    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    pub fn is_bad_tag(&self) -> bool {
        self.bad_tag
    }

    pub fn attribute(&self, name: &str) -> Option<&Attr> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
