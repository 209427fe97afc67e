//! MiniHTML Parser
//!
//! Builds a tree of typed nodes from the token stream produced by
//! `minihtml-lexer`. Any lexical diagnostic fails the whole parse with a
//! single [`ParseError::Lexical`] listing all of them; otherwise the parser
//! tolerates malformed nesting (dangling or mismatched closing tags) and
//! always returns a complete tree.
//!
//! # Example
//!
//! ```
//! use minihtml_parser::ast::Node;
//!
//! let doc = minihtml_parser::parse("<p class=intro>Hi {{ user }}</p>").unwrap();
//! let Node::Tag(p) = &doc.nodes[0] else { panic!("expected a tag") };
//! assert_eq!(p.name, "p");
//! assert_eq!(p.children.len(), 2);
//! ```

pub mod ast;
pub mod parser;

pub use ast::{Document, Node};
pub use minihtml_lexer::Diagnostic;
pub use parser::Parser;

/// Parse failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The scanner reported problems; no tree was built.
    #[error("{}", describe_diagnostics(.0))]
    Lexical(Vec<Diagnostic>),

    /// The token sequence broke the grammar contract. Scanner output never
    /// triggers this.
    #[error("Internal parser error at line {line}, column {column}: {message}")]
    Internal {
        message: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    /// The lexical diagnostics behind this error, if any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ParseError::Lexical(diagnostics) => diagnostics,
            ParseError::Internal { .. } => &[],
        }
    }
}

fn describe_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let list: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
    format!(
        "Parsing failed with {} error{}: {}",
        diagnostics.len(),
        if diagnostics.len() == 1 { "" } else { "s" },
        list.join(", ")
    )
}

/// Scan and parse `source` in one go.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    Parser::new(source)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use minihtml_lexer::Position;

    #[test]
    fn test_lexical_message_singular() {
        let err = ParseError::Lexical(vec![Diagnostic::new(
            "Unmatched {{ block",
            Position::new(1, 6, 5),
        )]);
        assert_eq!(
            err.to_string(),
            "Parsing failed with 1 error: Unmatched {{ block at line 1, column 6, offset 5"
        );
        assert_eq!(err.diagnostics().len(), 1);
    }

    #[test]
    fn test_lexical_message_plural() {
        let err = parse("<a title=\"x {{ y").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Parsing failed with 2 errors: Unmatched {{ block"));
        assert!(message.contains(", Unterminated string value"));
    }

    #[test]
    fn test_internal_has_no_diagnostics() {
        let err = ParseError::Internal {
            message: "unexpected equal token in content".into(),
            line: 1,
            column: 1,
        };
        assert!(err.diagnostics().is_empty());
    }
}
