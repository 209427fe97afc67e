//! Document parser for MiniHTML.
//!
//! Recursive descent over a [`TokenStream`] with one token of lookahead.
//!
//! A tag body ends at the first closing tag. If it names the tag, the tag
//! consumes it; otherwise the tag returns and leaves it to the enclosing
//! frames. A closing tag that no frame claims reaches the top level, which
//! consumes it as a `bad_tag` node. Every step therefore either consumes a
//! token or returns from a tag frame, so malformed nesting cannot stall the
//! parser.
//!
//! Tag nesting maps onto the call stack, so extremely deep nesting (tens of
//! thousands of unclosed tags) can exhaust the thread's stack.

use crate::ast::{
    Attr, AttrValue, Comment, Document, Executable, Interpolation, Literal, Node, PlainText,
    QuotedString, Segment, Tag,
};
use crate::ParseError;
use minihtml_lexer::{Position, ScanResult, Scanner, Span, Token, TokenId, TokenKind, TokenStream};

/// MiniHTML document parser.
pub struct Parser {
    stream: TokenStream,
    last_end: Position,
}

impl Parser {
    /// Scan `source` and prepare to parse it.
    ///
    /// Fails with [`ParseError::Lexical`] if the scanner reported anything.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let ScanResult {
            tokens,
            diagnostics,
        } = Scanner::tokenize(source);
        if !diagnostics.is_empty() {
            return Err(ParseError::Lexical(diagnostics));
        }
        Ok(Self::from_tokens(tokens))
    }

    /// Parse an already scanned token sequence.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            stream: TokenStream::new(tokens),
            last_end: Position::default(),
        }
    }

    /// Parse the remaining tokens into a document.
    pub fn parse(&mut self) -> Result<Document, ParseError> {
        let mut nodes = Vec::new();
        while !self.stream.is_empty() {
            if let Some(node) = self.parse_one()? {
                nodes.push(node);
            }
        }
        Ok(Document { nodes })
    }

    /// Tokens being parsed; `TokenId`s in the tree index into this.
    pub fn tokens(&self) -> &[Token] {
        self.stream.tokens()
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.stream.into_tokens()
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Parse one node starting at the current token.
    ///
    /// Returns `None` only for a comment opener with nothing after it.
    pub fn parse_one(&mut self) -> Result<Option<Node>, ParseError> {
        let Some(token) = self.stream.peek() else {
            return Ok(None);
        };
        let (kind, is_comment) = (token.kind, token.is_comment_open());

        let node = match kind {
            TokenKind::Literal => {
                let (id, token) = self.next_token()?;
                Node::PlainText(PlainText::from_token(&token, id))
            }
            TokenKind::TagBegin if is_comment => {
                return Ok(self.parse_comment()?.map(Node::Comment));
            }
            TokenKind::TagBegin => Node::Tag(self.parse_tag()?),
            TokenKind::AttrValueUnquoted => {
                let (id, token) = self.next_token()?;
                Node::Literal(Literal::from_token(&token, id))
            }
            TokenKind::String => {
                let (id, token) = self.next_token()?;
                Node::String(QuotedString::from_token(&token, id))
            }
            TokenKind::Executable => {
                let (id, token) = self.next_token()?;
                Node::Executable(Executable::from_token(&token, id))
            }
            TokenKind::StringInterpolation => {
                Node::Interpolation(self.parse_string_interpolation()?)
            }
            TokenKind::TagClosingStart => Node::Tag(self.parse_bad_tag()?),
            TokenKind::TagEnd
            | TokenKind::TagClosingEnd
            | TokenKind::TagCommentEnd
            | TokenKind::RightAngled
            | TokenKind::AttrKey
            | TokenKind::Equal
            | TokenKind::InterpolatedExecutable => {
                return Err(self.unexpected(kind, "content"));
            }
        };

        Ok(Some(node))
    }

    /// `<!--` followed by its body token.
    fn parse_comment(&mut self) -> Result<Option<Comment>, ParseError> {
        let (_, opener) = self.next_token()?;
        if self.stream.is_empty() {
            return Ok(None);
        }

        let (id, body) = self.expect(TokenKind::TagCommentEnd, "comment")?;
        Ok(Some(Comment {
            literal: body.literal,
            span: Span::new(opener.span.start, body.span.end),
            token: id,
        }))
    }

    /// `"text {{ expr }} text"`: alternate string and executable segments
    /// until the terminal `String` token.
    fn parse_string_interpolation(&mut self) -> Result<Interpolation, ParseError> {
        let (id, token) = self.next_token()?;
        let mut interpolation = Interpolation::from_token(&token, id);

        while let Some(kind) = self.stream.peek_kind() {
            match kind {
                TokenKind::Executable | TokenKind::InterpolatedExecutable => {
                    let (id, token) = self.next_token()?;
                    interpolation
                        .values
                        .push(Segment::Executable(Executable::from_token(&token, id)));
                }
                TokenKind::StringInterpolation => {
                    let (id, token) = self.next_token()?;
                    interpolation
                        .values
                        .push(Segment::String(QuotedString::from_token(&token, id)));
                }
                TokenKind::String => {
                    let (id, token) = self.next_token()?;
                    interpolation
                        .values
                        .push(Segment::String(QuotedString::from_token(&token, id)));
                    interpolation.span.end = self.last_end;
                    return Ok(interpolation);
                }
                kind => return Err(self.unexpected(kind, "string interpolation")),
            }
        }

        Err(self.internal("string interpolation without a closing string"))
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Parse `<name attrs... >children</name>` or `<name attrs... />`.
    fn parse_tag(&mut self) -> Result<Tag, ParseError> {
        let (id, opener) = self.next_token()?;
        let mut tag = Tag::from_token(&opener, id);
        self.parse_tag_rest(&mut tag)?;
        tag.span.end = self.last_end;
        Ok(tag)
    }

    fn parse_tag_rest(&mut self, tag: &mut Tag) -> Result<(), ParseError> {
        while let Some(token) = self.stream.peek() {
            let kind = token.kind;
            let closes_this = closing_name(token) == Some(tag.name.as_str());

            match kind {
                TokenKind::RightAngled => {
                    self.next_token()?;
                    self.parse_children(tag)?;
                }
                TokenKind::TagClosingStart => {
                    // Another name is left for the enclosing frames.
                    if closes_this {
                        self.discard_until_tag_end()?;
                    }
                    return Ok(());
                }
                TokenKind::TagEnd => {
                    self.next_token()?;
                    tag.self_closing = true;
                    return Ok(());
                }
                TokenKind::AttrKey => {
                    let attr = self.parse_attr()?;
                    tag.attributes.push(attr);
                }
                kind => return Err(self.unexpected(kind, "tag")),
            }
        }
        Ok(())
    }

    /// Parse a tag body up to the next closing tag, or end of input.
    fn parse_children(&mut self, tag: &mut Tag) -> Result<(), ParseError> {
        while let Some(kind) = self.stream.peek_kind() {
            if kind == TokenKind::TagClosingStart {
                break;
            }
            if let Some(child) = self.parse_one()? {
                tag.children.push(child);
            }
        }
        Ok(())
    }

    /// A closing tag that no enclosing tag claimed.
    fn parse_bad_tag(&mut self) -> Result<Tag, ParseError> {
        let (id, token) = self.next_token()?;
        let mut tag = Tag::from_token(&token, id);
        self.discard_until_tag_end()?;
        tag.span.end = self.last_end;
        Ok(tag)
    }

    fn parse_attr(&mut self) -> Result<Attr, ParseError> {
        let (id, key) = self.next_token()?;
        let mut attr = Attr {
            name: key.literal,
            value: None,
            span: key.span,
            token: id,
        };

        if self.stream.peek_kind() != Some(TokenKind::Equal) {
            return Ok(attr);
        }
        self.next_token()?;

        let value = match self.parse_one()? {
            Some(Node::Literal(v)) => AttrValue::Literal(v),
            Some(Node::String(v)) => AttrValue::String(v),
            Some(Node::Executable(v)) => AttrValue::Executable(v),
            Some(Node::Interpolation(v)) => AttrValue::Interpolation(v),
            Some(_) | None => {
                return Err(self.internal(format!("attribute `{}` has no value", attr.name)));
            }
        };
        attr.span.end = value.span().end;
        attr.value = Some(value);
        Ok(attr)
    }

    /// Skip through the next `/>` or closing `>`, or to end of input.
    fn discard_until_tag_end(&mut self) -> Result<(), ParseError> {
        while let Some(kind) = self.stream.peek_kind() {
            self.next_token()?;
            if matches!(kind, TokenKind::TagEnd | TokenKind::TagClosingEnd) {
                break;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    fn next_token(&mut self) -> Result<(TokenId, Token), ParseError> {
        let id = self.stream.position();
        match self.stream.consume() {
            Some(token) => {
                self.last_end = token.span.end;
                Ok((id, token))
            }
            None => Err(self.internal("unexpected end of input")),
        }
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<(TokenId, Token), ParseError> {
        match self.stream.peek_kind() {
            Some(found) if found == kind => self.next_token(),
            Some(found) => Err(self.unexpected(found, context)),
            None => Err(self.internal(format!("unexpected end of input in {context}"))),
        }
    }

    fn unexpected(&self, kind: TokenKind, context: &str) -> ParseError {
        self.internal(format!("unexpected {kind} token in {context}"))
    }

    fn internal(&self, message: impl Into<String>) -> ParseError {
        let position = self.stream.peek().map_or(self.last_end, |t| t.span.start);
        ParseError::Internal {
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }
}

/// Name in a `</name` token.
fn closing_name(token: &Token) -> Option<&str> {
    match token.kind {
        TokenKind::TagClosingStart => token.literal.strip_prefix("</"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Document {
        crate::parse(source).unwrap()
    }

    fn first_tag(doc: &Document) -> &Tag {
        match &doc.nodes[0] {
            Node::Tag(tag) => tag,
            other => panic!("Expected Tag, got {other:?}"),
        }
    }

    fn child_tag(tag: &Tag, index: usize) -> &Tag {
        match &tag.children[index] {
            Node::Tag(child) => child,
            other => panic!("Expected Tag, got {other:?}"),
        }
    }

    fn outline(nodes: &[Node]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| match node {
                Node::PlainText(t) => format!("text({})", t.literal),
                Node::Literal(l) => format!("literal({})", l.value),
                Node::Comment(c) => format!("comment({})", c.literal),
                Node::String(s) => format!("string({})", s.literal),
                Node::Executable(e) => format!("exec({})", e.source),
                Node::Interpolation(_) => "interpolation".to_string(),
                Node::Tag(t) => {
                    let mut out = t.name.clone();
                    if t.bad_tag {
                        out.push('!');
                    }
                    if !t.children.is_empty() {
                        out = format!("{out}[{}]", outline(&t.children).join(" "));
                    }
                    out
                }
            })
            .collect()
    }

    // =========================================================================
    // Empty / simple
    // =========================================================================

    #[test]
    fn test_empty_document() {
        assert!(parse("").nodes.is_empty());
    }

    #[test]
    fn test_plain_text() {
        let doc = parse("just text");
        assert_eq!(outline(&doc.nodes), vec!["text(just text)"]);
    }

    #[test]
    fn test_top_level_executable() {
        let doc = parse("Hello {{name}}!");
        assert_eq!(
            outline(&doc.nodes),
            vec!["text(Hello )", "exec(name)", "text(!)"]
        );
    }

    #[test]
    fn test_open_close_pair() {
        let doc = parse("<a></a>");
        let tag = first_tag(&doc);
        assert_eq!(tag.name, "a");
        assert!(!tag.self_closing);
        assert!(!tag.bad_tag);
        assert!(tag.children.is_empty());
    }

    #[test]
    fn test_self_closing_forms() {
        for source in ["<br/>", "<br />"] {
            let doc = parse(source);
            assert_eq!(doc.nodes.len(), 1);
            let tag = first_tag(&doc);
            assert_eq!(tag.name, "br");
            assert!(tag.is_self_closing());
            assert!(tag.children.is_empty());
        }
    }

    #[test]
    fn test_namespaced_component() {
        let doc = parse("<Foo::Bar::Banner />");
        assert_eq!(doc.nodes.len(), 1);
        let tag = first_tag(&doc);
        assert_eq!(tag.name, "Foo::Bar::Banner");
        assert!(tag.attributes.is_empty());
        assert!(tag.children.is_empty());
        assert!(tag.self_closing);
    }

    #[test]
    fn test_nested_components() {
        let source = "<header id=\"foobar\" cx-ref=\"bla\">\n  <Banner />\n  <UserSelector name={{name}} open={{false}} />\n</header>";
        let doc = parse(source);
        assert_eq!(doc.nodes.len(), 1);

        let header = first_tag(&doc);
        assert_eq!(header.name, "header");
        assert!(!header.self_closing);
        assert_eq!(header.attributes.len(), 2);
        assert_eq!(header.attributes[0].name, "id");
        assert!(matches!(
            &header.attributes[0].value,
            Some(AttrValue::String(s)) if s.literal == "foobar"
        ));
        assert_eq!(header.attributes[1].name, "cx-ref");
        assert!(matches!(
            &header.attributes[1].value,
            Some(AttrValue::String(s)) if s.literal == "bla"
        ));
        assert_eq!(header.children.len(), 5);

        let banner = child_tag(header, 1);
        assert_eq!(banner.name, "Banner");
        assert!(banner.self_closing);

        let selector = child_tag(header, 3);
        assert_eq!(selector.name, "UserSelector");
        assert!(selector.self_closing);
        assert_eq!(selector.attributes.len(), 2);
        assert_eq!(selector.attributes[0].name, "name");
        assert!(matches!(
            &selector.attributes[0].value,
            Some(AttrValue::Executable(e)) if e.source == "name"
        ));
        assert_eq!(selector.attributes[1].name, "open");
        assert!(matches!(
            &selector.attributes[1].value,
            Some(AttrValue::Executable(e)) if e.source == "false"
        ));

        assert_eq!(header.span.start.offset, 0);
        assert_eq!(header.span.end.offset, source.len());
        assert_eq!(header.token, TokenId(0));
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_attribute_value_kinds() {
        let doc = parse("<input disabled type=text value='x' model={{ m }}>");
        let input = first_tag(&doc);
        assert_eq!(input.attributes.len(), 4);
        assert!(input.attribute("disabled").is_some_and(|a| a.value.is_none()));
        assert!(matches!(
            &input.attribute("type").and_then(|a| a.value.as_ref()),
            Some(AttrValue::Literal(l)) if l.value == "text"
        ));
        assert!(matches!(
            &input.attribute("value").and_then(|a| a.value.as_ref()),
            Some(AttrValue::String(s)) if s.literal == "x" && s.quote == '\''
        ));
        assert!(matches!(
            &input.attribute("model").and_then(|a| a.value.as_ref()),
            Some(AttrValue::Executable(e)) if e.source == " m "
        ));
    }

    #[test]
    fn test_attribute_span_covers_value() {
        let doc = parse("<i a=\"bc\">");
        let attr = &first_tag(&doc).attributes[0];
        assert_eq!(attr.span.start.offset, 3);
        assert_eq!(attr.span.end.offset, 8);
    }

    #[test]
    fn test_escaped_quote_is_unescaped() {
        let doc = parse("<div title=\"a \\\"b\\\" c\">");
        assert!(matches!(
            &first_tag(&doc).attributes[0].value,
            Some(AttrValue::String(s)) if s.literal == "a \"b\" c"
        ));
    }

    #[test]
    fn test_interpolated_attribute() {
        let doc = parse("<p title=\"Hi {{a}}, {{ b }}\"></p>");
        let Some(AttrValue::Interpolation(interp)) = &first_tag(&doc).attributes[0].value else {
            panic!("expected interpolation");
        };

        let segments: Vec<String> = interp
            .values
            .iter()
            .map(|segment| match segment {
                Segment::String(s) => format!("s:{}", s.literal),
                Segment::Executable(e) => format!("e:{}", e.source),
            })
            .collect();
        assert_eq!(segments, vec!["s:Hi ", "e:a", "s:, ", "e: b ", "s:"]);

        for pair in interp.values.windows(2) {
            assert_ne!(
                matches!(pair[0], Segment::String(_)),
                matches!(pair[1], Segment::String(_))
            );
        }
        assert_eq!(interp.executables().count(), 2);
        assert_eq!(interp.span.start.offset, 10);
        assert_eq!(interp.span.end.offset, 27);
    }

    // =========================================================================
    // Comments
    // =========================================================================

    #[test]
    fn test_comment() {
        let doc = parse("<!-- note --><b></b>");
        assert_eq!(outline(&doc.nodes), vec!["comment( note )", "b"]);
        let Node::Comment(comment) = &doc.nodes[0] else {
            panic!("expected comment");
        };
        assert_eq!(comment.span.start.offset, 0);
        assert_eq!(comment.token, TokenId(1));
    }

    #[test]
    fn test_empty_comment() {
        assert_eq!(outline(&parse("<!---->").nodes), vec!["comment()"]);
    }

    #[test]
    fn test_comment_opener_alone_yields_nothing() {
        let tokens = Scanner::tokenize("<!-- x -->").tokens;
        let mut parser = Parser::from_tokens(tokens[..1].to_vec());
        assert!(parser.parse().unwrap().nodes.is_empty());
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    #[test]
    fn test_orphan_closing_tag() {
        let doc = parse("</div class=bad>after");
        assert_eq!(outline(&doc.nodes), vec!["div!", "text(after)"]);
        let tag = first_tag(&doc);
        assert!(tag.attributes.is_empty());
        assert_eq!(tag.span.end.offset, 16);
    }

    #[test]
    fn test_closing_tag_attributes_are_swallowed() {
        let doc = parse("<div></div class=x>after");
        assert_eq!(outline(&doc.nodes), vec!["div", "text(after)"]);
    }

    #[test]
    fn test_unterminated_body_runs_to_end() {
        let doc = parse("<div><p>hi");
        assert_eq!(outline(&doc.nodes), vec!["div[p[text(hi)]]"]);
    }

    #[test]
    fn test_mismatched_close_resolves_at_ancestor() {
        let doc = parse("<a><b>x</a>y");
        assert_eq!(outline(&doc.nodes), vec!["a[b[text(x)]]", "text(y)"]);
    }

    #[test]
    fn test_unknown_close_ends_body() {
        let doc = parse("<a>1</x>2</a>");
        assert_eq!(
            outline(&doc.nodes),
            vec!["a[text(1)]", "x!", "text(2)", "a!"]
        );
    }

    #[test]
    fn test_close_of_outer_tag_skips_inner_frames() {
        let doc = parse("<a><b><c>x</a>");
        assert_eq!(outline(&doc.nodes), vec!["a[b[c[text(x)]]]"]);
    }

    #[test]
    fn test_close_matches_innermost_same_name() {
        let doc = parse("<a><a>x</a></a>");
        assert_eq!(outline(&doc.nodes), vec!["a[a[text(x)]]"]);
    }

    #[test]
    fn test_adversarial_nesting_terminates() {
        let inputs = [
            "</a></b></c>",
            "<a><b><c></a></b></c>",
            "<a></b></a></a>",
            "<a><b></a><b></b></a>",
            "<x><y><z></y></x></z>",
            "</>",
            "<a></></a>",
            "<a><a><a></a>",
            "<a b=c></a d=e/><f/>",
            "<a>{{ x }}</b>{{ y }}</a>",
            "<!-- a --></a><!---->",
            "<div a=>",
            "<div a=",
            "<p x=\"{{a}}{{b}}\">",
        ];
        for source in inputs {
            match crate::parse(source) {
                Ok(_) => {}
                Err(err) => panic!("{source:?} failed: {err}"),
            }
        }
    }

    #[test]
    fn test_deep_nesting_within_stack() {
        let depth = 200;
        let source = format!("{}x{}", "<d>".repeat(depth), "</d>".repeat(depth));
        let doc = parse(&source);

        let mut tag = first_tag(&doc);
        for _ in 1..depth {
            tag = child_tag(tag, 0);
        }
        assert_eq!(outline(&tag.children), vec!["text(x)"]);
        assert_eq!(doc.nodes.len(), 1);
    }

    #[test]
    fn test_reparse_is_deterministic() {
        let source = "<a x=1><b>{{ y }}</a></c>";
        assert_eq!(parse(source), parse(source));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_lexical_errors_abort() {
        let err = crate::parse("<div title=\"oops>").unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);
        assert!(err.diagnostics()[0]
            .to_string()
            .starts_with("Unterminated string value"));
        assert!(matches!(err, ParseError::Lexical(_)));
    }

    #[test]
    fn test_unmatched_block_aborts() {
        let err = Parser::new("<div>{{ foo </div>").err().unwrap();
        assert!(err.to_string().contains("Unmatched {{ block"));
    }

    #[test]
    fn test_grammar_breach_is_internal_error() {
        let tokens = Scanner::tokenize("<a>").tokens;
        let mut parser = Parser::from_tokens(tokens[1..].to_vec());
        let err = parser.parse().unwrap_err();
        assert!(matches!(err, ParseError::Internal { .. }));
        assert!(err.to_string().contains("unexpected right_angled token"));
    }

    #[test]
    fn test_tokens_outlive_tree() {
        let mut parser = Parser::new("<b>{{ x }}</b>").unwrap();
        let doc = parser.parse().unwrap();
        let tokens = parser.into_tokens();
        let exec = &first_tag(&doc).children[0];
        assert_eq!(tokens[exec.token().index()].kind, TokenKind::Executable);
    }

    #[test]
    fn test_public_types_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Parser>();
        assert_send_sync::<Document>();
        assert_send_sync::<ParseError>();
        assert_send_sync::<TokenStream>();
        assert_send_sync::<Scanner<'static>>();
    }

    #[test]
    fn test_all_spans_are_ordered() {
        fn check(nodes: &[Node]) {
            for node in nodes {
                let span = node.span();
                assert!(span.end.offset >= span.start.offset, "{node:?}");
                if let Node::Tag(tag) = node {
                    check(&tag.children);
                }
            }
        }
        check(&parse("<a x=\"1{{2}}3\">t<b/><!--c-->{{d}}</a></e>").nodes);
    }
}
