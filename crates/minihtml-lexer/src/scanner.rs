use crate::token::{Position, Span, Token, TokenKind};
use crate::Diagnostic;

/// Scanner mode determines what the next character means.
///
/// Expression bodies (`{{ ... }}`) are not a mode of their own: they are
/// scanned by a flat sub-loop with a depth counter from whichever mode
/// encountered the opening `{{`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerMode {
    /// Between tags: text runs and `{{ expr }}`.
    Text,
    /// Inside `<name ...` or `</name ...`, before the terminator.
    Tag { closing: bool },
    /// Right after `=` in a tag.
    AttrValue { closing: bool },
    /// Inside a quoted attribute value.
    String { quote: char, closing: bool },
}

/// Output of a scan: every token that could be recovered, plus the
/// problems found along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanResult {
    /// True when no diagnostics were recorded.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn kinds(&self) -> Vec<TokenKind> {
        self.tokens.iter().map(|t| t.kind).collect()
    }
}

/// MiniHTML source scanner.
///
/// A single mode-driven loop over a `Vec<char>` with one-character
/// lookahead (four for `<!--`). Nesting inside `{{ }}` is tracked with a
/// counter, so stack usage does not grow with the input.
///
/// Never fails: problems are pushed to the diagnostic list and scanning
/// carries on to the end of input.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
    token_start: Position,
    mode: ScannerMode,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            column: 1,
            token_start: Position::default(),
            mode: ScannerMode::Text,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the entire source.
    pub fn tokenize(source: &str) -> ScanResult {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens();
        scanner.finish()
    }

    /// Run the scanner to the end of input.
    pub fn scan_tokens(&mut self) {
        loop {
            match self.mode {
                ScannerMode::Text | ScannerMode::Tag { .. } if self.is_at_end() => break,
                ScannerMode::Text => self.scan_text(),
                ScannerMode::Tag { closing } => self.scan_tag(closing),
                ScannerMode::AttrValue { closing } => self.scan_attr_value(closing),
                ScannerMode::String { quote, closing } => self.scan_string(quote, closing),
            }
        }
    }

    pub fn finish(self) -> ScanResult {
        ScanResult {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    // --- Text ---

    /// Scan a text run up to the next tag opener or `{{`, then the opener itself.
    fn scan_text(&mut self) {
        self.start_token();
        while !self.is_at_end() && !self.at_tag_open() && !self.at_executable_open() {
            self.advance();
        }
        self.push_if_nonempty(TokenKind::Literal);

        if self.at_executable_open() {
            self.scan_executable(TokenKind::Executable);
        } else if self.at_tag_open() {
            self.scan_tag_open();
        }
    }

    /// Scan `<name`, `</name` or `<!--`.
    fn scan_tag_open(&mut self) {
        self.start_token();

        if self.lookahead_is("<!--") {
            self.advance_by(4);
            self.push(TokenKind::TagBegin);
            self.scan_comment_body();
            return;
        }

        let closing = self.peek_next() == '/';
        self.advance_by(if closing { 2 } else { 1 });
        while is_name_char(self.peek()) {
            self.advance();
        }

        if closing {
            self.push(TokenKind::TagClosingStart);
        } else {
            self.push(TokenKind::TagBegin);
        }
        self.mode = ScannerMode::Tag { closing };
    }

    /// Everything up to `-->` becomes one `TagCommentEnd` token.
    /// Nested `<!--` is not recognised.
    fn scan_comment_body(&mut self) {
        self.start_token();

        while !self.is_at_end() {
            if self.lookahead_is("-->") {
                self.push(TokenKind::TagCommentEnd);
                self.advance_by(3);
                return;
            }
            self.advance();
        }

        let position = self.position();
        self.diagnose("Unterminated comment tag", position);
        self.push(TokenKind::TagCommentEnd);
    }

    // --- Tags ---

    fn scan_tag(&mut self, closing: bool) {
        self.skip_whitespace();
        if self.is_at_end() {
            return;
        }

        match self.peek() {
            '>' => {
                self.start_token();
                self.advance();
                if closing {
                    self.push(TokenKind::TagClosingEnd);
                } else {
                    self.push(TokenKind::RightAngled);
                }
                self.mode = ScannerMode::Text;
            }
            '/' if self.peek_next() == '>' => {
                self.start_token();
                self.advance_by(2);
                self.push(TokenKind::TagEnd);
                self.mode = ScannerMode::Text;
            }
            c if is_attr_start(c) => self.scan_attr(closing),
            c => {
                let position = self.position();
                self.diagnose(format!("Unexpected character '{c}' in tag"), position);
                self.advance();
            }
        }
    }

    /// Scan an attribute key and, if present, the `=` after it.
    fn scan_attr(&mut self, closing: bool) {
        self.start_token();
        while is_name_char(self.peek()) {
            self.advance();
        }
        self.push(TokenKind::AttrKey);

        self.skip_whitespace();
        if self.peek() == '=' {
            self.start_token();
            self.advance();
            self.push(TokenKind::Equal);
            self.mode = ScannerMode::AttrValue { closing };
        }
    }

    /// Scan the value after `=`. Always produces a value token unless a
    /// `{{` block runs to end of input.
    ///
    /// An unquoted value ends at whitespace, `>` or `/`; a `/` not followed
    /// by `>` is then reported by the tag loop.
    fn scan_attr_value(&mut self, closing: bool) {
        self.skip_whitespace();
        self.mode = ScannerMode::Tag { closing };

        match self.peek() {
            quote @ ('"' | '\'') => {
                self.advance();
                self.mode = ScannerMode::String { quote, closing };
            }
            '{' if self.peek_next() == '{' => self.scan_executable(TokenKind::Executable),
            _ => {
                self.start_token();
                while !self.is_at_end() && !ends_unquoted_value(self.peek()) {
                    self.advance();
                }
                self.push(TokenKind::AttrValueUnquoted);
            }
        }
    }

    // --- Strings and executables ---

    /// Scan a quoted value, splitting it around any `{{ }}` blocks.
    ///
    /// Emits `(StringInterpolation, InterpolatedExecutable)` per block and
    /// always ends with one terminal `String`. `\` before the quote character
    /// escapes it; the escape stays in the token literal.
    fn scan_string(&mut self, quote: char, closing: bool) {
        self.mode = ScannerMode::Tag { closing };
        self.start_token();

        loop {
            if self.is_at_end() {
                let position = self.position();
                self.diagnose("Unterminated string value", position);
                self.push_quoted(TokenKind::String, quote);
                return;
            }

            let c = self.peek();
            if c == '\\' && self.peek_next() == quote {
                self.advance_by(2);
            } else if c == quote {
                self.push_quoted(TokenKind::String, quote);
                self.advance();
                return;
            } else if self.at_executable_open() {
                self.push_quoted(TokenKind::StringInterpolation, quote);
                self.scan_executable(TokenKind::InterpolatedExecutable);
                self.start_token();
            } else {
                self.advance();
            }
        }
    }

    /// Scan `{{ ... }}` starting at the opening braces.
    ///
    /// Single braces inside the block move a signed depth counter; only `}}`
    /// at depth zero closes it, so a stray `}` leaves the block unmatched.
    /// The token covers the text between the outer delimiters.
    fn scan_executable(&mut self, kind: TokenKind) {
        self.advance_by(2);
        self.start_token();

        let mut depth: isize = 0;
        while !self.is_at_end() {
            match self.peek() {
                '}' if depth == 0 && self.peek_next() == '}' => {
                    self.push(kind);
                    self.advance_by(2);
                    return;
                }
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            self.advance();
        }

        let position = self.position();
        self.diagnose("Unmatched {{ block", position);
    }

    // --- Helpers ---

    fn at_tag_open(&self) -> bool {
        self.peek() == '<'
            && !self.is_at_end()
            && (self.peek_next().is_ascii_alphabetic()
                || self.peek_next() == '/'
                || self.lookahead_is("<!--"))
    }

    fn at_executable_open(&self) -> bool {
        self.peek() == '{' && self.peek_next() == '{'
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn start_token(&mut self) {
        self.token_start = self.position();
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        let span = Span::new(self.token_start, self.position());
        Token::new(kind, &self.source[span.start.offset..span.end.offset], span)
    }

    fn push(&mut self, kind: TokenKind) {
        let token = self.make_token(kind);
        self.tokens.push(token);
    }

    fn push_quoted(&mut self, kind: TokenKind, quote: char) {
        let token = self.make_token(kind).with_quote(quote);
        self.tokens.push(token);
    }

    fn push_if_nonempty(&mut self, kind: TokenKind) {
        if self.offset > self.token_start.offset {
            self.push(kind);
        }
    }

    fn diagnose(&mut self, message: impl Into<String>, position: Position) {
        self.diagnostics.push(Diagnostic::new(message, position));
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && is_space(self.peek()) {
            self.advance();
        }
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.chars.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn lookahead_is(&self, expected: &str) -> bool {
        expected
            .chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
    }

    fn advance(&mut self) {
        if let Some(&c) = self.chars.get(self.pos) {
            self.pos += 1;
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

/// Tag and attribute name characters. `:` and `.` allow names like
/// `Foo::Bar::Banner` or `x.y`.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

fn ends_unquoted_value(c: char) -> bool {
    is_space(c) || c == '>' || c == '/'
}

fn is_attr_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}
