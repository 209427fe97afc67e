use std::fmt;

/// A location in source text.
///
/// `line` and `column` are 1-based, `column` counting characters.
/// `offset` is the 0-based byte offset into the source, so
/// `&source[start.offset..end.offset]` always slices on a char boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}, offset {}",
            self.line, self.column, self.offset
        )
    }
}

/// A half-open `[start, end)` range of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Token classification for MiniHTML source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TokenKind {
    // Text
    Literal,

    // Tags
    TagBegin,        // <name, <!--
    TagEnd,          // />
    TagClosingStart, // </name
    TagClosingEnd,   // > after a closing tag
    TagCommentEnd,   // comment body up to -->
    RightAngled,     // > after an opening tag

    // Attributes
    AttrKey,
    Equal,
    AttrValueUnquoted,

    // Strings and executables
    String,
    StringInterpolation,
    InterpolatedExecutable,
    Executable,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Literal => "literal",
            TokenKind::TagBegin => "tag_begin",
            TokenKind::TagEnd => "tag_end",
            TokenKind::TagClosingStart => "tag_closing_start",
            TokenKind::TagClosingEnd => "tag_closing_end",
            TokenKind::TagCommentEnd => "tag_comment_end",
            TokenKind::RightAngled => "right_angled",
            TokenKind::AttrKey => "attr_key",
            TokenKind::Equal => "equal",
            TokenKind::AttrValueUnquoted => "attr_value_unquoted",
            TokenKind::String => "string",
            TokenKind::StringInterpolation => "string_interpolation",
            TokenKind::InterpolatedExecutable => "interpolated_executable",
            TokenKind::Executable => "executable",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token produced by the MiniHTML scanner.
///
/// `literal` is the exact source text covered by `span`. Quoted tokens
/// (`String`, `StringInterpolation`) exclude their quotes and record the
/// quote character in `quote`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub span: Span,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub quote: Option<char>,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            literal: literal.into(),
            span,
            quote: None,
        }
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Whether this is the `<!--` opener of a comment.
    pub fn is_comment_open(&self) -> bool {
        self.kind == TokenKind::TagBegin && self.literal == "<!--"
    }
}

/// Index of a token in the scanner's output.
///
/// AST nodes keep one of these instead of a reference, so the token vector
/// can be dropped once parsing is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TokenId(pub usize);

impl TokenId {
    pub fn index(self) -> usize {
        self.0
    }
}
