use crate::token::{Token, TokenId, TokenKind};

/// Forward-only cursor over scanner output.
///
/// One token of lookahead, no backtracking. The stream owns the tokens for
/// the duration of parsing; `into_tokens` hands them back afterwards.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The current token, if any remain.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    /// Return the current token and advance past it. `None` once empty.
    pub fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Handle of the current token (one past the end once empty).
    pub fn position(&self) -> TokenId {
        TokenId(self.pos)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}
