use clap::{Parser, Subcommand};
use minihtml_parser::ast::{AttrValue, Node, Segment, Tag};
use std::fmt::Write as _;
use std::path::Path;

#[derive(Parser)]
#[command(name = "minihtml")]
#[command(about = "MiniHTML template scanner and parser")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream of a template, then any diagnostics
    Tokens {
        /// Input template file
        path: String,
    },

    /// Check a template for errors without printing the tree
    Check {
        /// Input template file
        path: String,
    },

    /// Print the parsed node tree of a template
    Tree {
        /// Input template file
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Tokens { path } => cmd_tokens(&path),
        Command::Check { path } => cmd_check(&path),
        Command::Tree { path } => cmd_tree(&path),
    }
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_tokens(path: &str) {
    let source = read_source(path);
    let result = minihtml_lexer::tokenize(&source);

    for token in &result.tokens {
        let start = token.span.start;
        println!(
            "{}:{} {} {:?}",
            start.line, start.column, token.kind, token.literal
        );
    }

    for diagnostic in &result.diagnostics {
        eprintln!("Error: {diagnostic}");
    }
    if !result.is_clean() {
        std::process::exit(1);
    }
}

fn cmd_check(path: &str) {
    let source = read_source(path);

    if let Err(e) = minihtml_parser::parse(&source) {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    }

    eprintln!("OK: {path}");
}

fn cmd_tree(path: &str) {
    let source = read_source(path);

    match minihtml_parser::parse(&source) {
        Ok(doc) => print!("{}", render_tree(&doc.nodes)),
        Err(e) => {
            eprintln!("Parse error: {e}");
            std::process::exit(1);
        }
    }
}

// =============================================================================
// Tree outline
// =============================================================================

fn render_tree(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(&mut out, node, 0);
    }
    out
}

fn render_node(out: &mut String, node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        Node::PlainText(text) => {
            let _ = writeln!(out, "{indent}text {:?}", text.literal);
        }
        Node::Literal(lit) => {
            let _ = writeln!(out, "{indent}literal {:?}", lit.value);
        }
        Node::Comment(comment) => {
            let _ = writeln!(out, "{indent}comment {:?}", comment.literal);
        }
        Node::String(s) => {
            let _ = writeln!(out, "{indent}string {:?}", s.literal);
        }
        Node::Executable(exec) => {
            let _ = writeln!(out, "{indent}{{{{{}}}}}", exec.source);
        }
        Node::Interpolation(_) => {
            let _ = writeln!(out, "{indent}interpolation");
        }
        Node::Tag(tag) => render_tag(out, tag, depth),
    }
}

fn render_tag(out: &mut String, tag: &Tag, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}<{}", tag.name);

    for attr in &tag.attributes {
        let _ = write!(out, " {}", attr.name);
        if let Some(value) = &attr.value {
            let _ = write!(out, "={}", render_attr_value(value));
        }
    }

    let marker = match (tag.bad_tag, tag.self_closing) {
        (true, _) => " (unmatched close)",
        (false, true) => " /",
        (false, false) => "",
    };
    let _ = writeln!(out, ">{marker}");

    for child in &tag.children {
        render_node(out, child, depth + 1);
    }
}

fn render_attr_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Literal(lit) => lit.value.clone(),
        AttrValue::String(s) => format!("{0}{1}{0}", s.quote, s.literal),
        AttrValue::Executable(exec) => format!("{{{{{}}}}}", exec.source),
        AttrValue::Interpolation(interp) => {
            let quote = interp
                .values
                .iter()
                .find_map(|segment| match segment {
                    Segment::String(s) => Some(s.quote),
                    Segment::Executable(_) => None,
                })
                .unwrap_or('"');
            let body: String = interp
                .values
                .iter()
                .map(|segment| match segment {
                    Segment::String(s) => s.literal.clone(),
                    Segment::Executable(exec) => format!("{{{{{}}}}}", exec.source),
                })
                .collect();
            format!("{quote}{body}{quote}")
        }
    }
}
