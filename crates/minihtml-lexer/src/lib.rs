//! MiniHTML Lexer
//!
//! Tokenizes MiniHTML templates: HTML-style tags mixed with `{{ expr }}`
//! executable blocks, including blocks spliced into quoted attribute values.
//! Lexical problems never abort scanning; they are collected as
//! [`Diagnostic`]s next to the best-effort token list.
//!
//! # Example
//!
//! ```
//! use minihtml_lexer::{Scanner, TokenKind};
//!
//! let result = Scanner::tokenize("<b>{{ name }}</b>");
//! assert!(result.diagnostics.is_empty());
//! assert_eq!(result.tokens[2].kind, TokenKind::Executable);
//! assert_eq!(result.tokens[2].literal, " name ");
//! ```

pub mod scanner;
pub mod stream;
pub mod token;

pub use scanner::{ScanResult, Scanner};
pub use stream::TokenStream;
pub use token::{Position, Span, Token, TokenId, TokenKind};

/// A recoverable lexical problem.
///
/// `position` is where the scanner detected the problem: for an unterminated
/// string, comment or `{{` block that is the end of input, for a stray
/// character in a tag it is the character itself.
///
/// Messages start with a stable phrase (`Unterminated string value`,
/// `Unmatched {{ block`, `Unterminated comment tag`, `Unexpected character`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("{message} at {position}")]
pub struct Diagnostic {
    pub message: String,
    pub position: Position,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Tokenize `source`. Shorthand for [`Scanner::tokenize`].
pub fn tokenize(source: &str) -> ScanResult {
    Scanner::tokenize(source)
}
