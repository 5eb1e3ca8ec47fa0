use std::ops::Range;

use log::{debug, warn};
use tree_sitter::{Node, Parser};

use super::CommandParser;
use super::tokenize::static_word;
use super::types::{Invocation, ParsedCommandLine, Shape};

/// Node kinds that make a command name dynamic.
const EXPANSION_KINDS: &[&str] = &[
    "simple_expansion",
    "expansion",
    "command_substitution",
    "process_substitution",
    "arithmetic_expansion",
];

/// Command-line parser backed by tree-sitter-bash.
///
/// A fresh `tree_sitter::Parser` is built per call; the grammar itself is
/// static, so this type carries no state and is freely shareable.
#[derive(Debug, Default, Clone, Copy)]
pub struct BashParser;

impl BashParser {
    pub fn new() -> Self {
        Self
    }
}

impl CommandParser for BashParser {
    fn parse(&self, text: &str) -> ParsedCommandLine {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&tree_sitter_bash::LANGUAGE.into()) {
            warn!("bash grammar unavailable: {e}");
            return ParsedCommandLine::empty();
        }
        let Some(tree) = parser.parse(text, None) else {
            debug!("parser returned no tree for {} bytes of input", text.len());
            return ParsedCommandLine::empty();
        };

        let root = tree.root_node();
        let mut invocations = Vec::new();
        collect_invocations(root, text, &mut invocations);
        if root.has_error() {
            debug!(
                "syntax errors in input, {} invocation(s) recovered",
                invocations.len()
            );
            return ParsedCommandLine {
                invocations,
                shape: Shape::Malformed,
                trailer: None,
            };
        }

        let (statements, background) = top_level(root);
        let (shape, trailer) = match statements.as_slice() {
            [] => (Shape::Empty, None),
            [only] if is_linear(*only) => {
                let mut trailer = Vec::new();
                if let Some(redirects) = pipeline_redirects(*only, text, &mut invocations) {
                    trailer.push(redirects);
                }
                if background {
                    trailer.push("&".to_string());
                }
                let trailer = (!trailer.is_empty()).then(|| trailer.join(" "));
                (Shape::Pipeline, trailer)
            }
            _ => (Shape::Compound, None),
        };

        ParsedCommandLine {
            invocations,
            shape,
            trailer,
        }
    }
}

/// Pre-order walk collecting every `command` node, nested ones included.
fn collect_invocations(node: Node, text: &str, out: &mut Vec<Invocation>) {
    if node.kind() == "command"
        && let Some(invocation) = invocation(node, text)
    {
        out.push(invocation);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_invocations(child, text, out);
    }
}

fn invocation(node: Node, text: &str) -> Option<Invocation> {
    let span = invocation_span(node);
    let source_text = text.get(span.clone())?.to_string();
    let command_name = node
        .child_by_field_name("name")
        .and_then(|name| command_name(name, text));
    Some(Invocation {
        source_text,
        command_name,
        span,
    })
}

/// A command's own span, widened to its `redirected_statement` wrapper so
/// `ls 2>/dev/null | grep x` keeps the redirect on its stage. Top-level
/// wrappers are left to [`pipeline_redirects`].
fn invocation_span(node: Node) -> Range<usize> {
    match node.parent() {
        Some(parent)
            if parent.kind() == "redirected_statement"
                && parent.child_by_field_name("body") == Some(node)
                && parent.parent().is_some_and(|p| p.kind() != "program") =>
        {
            parent.byte_range()
        }
        _ => node.byte_range(),
    }
}

fn command_name(name: Node, text: &str) -> Option<String> {
    if contains_expansion(name) {
        return None;
    }
    static_word(text.get(name.byte_range())?)
}

fn contains_expansion(node: Node) -> bool {
    if EXPANSION_KINDS.contains(&node.kind()) {
        return true;
    }
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).any(contains_expansion);
    found
}

/// Statements directly under the root, and whether one was sent to the background.
fn top_level(root: Node) -> (Vec<Node>, bool) {
    let mut cursor = root.walk();
    let mut statements = Vec::new();
    let mut background = false;
    for child in root.children(&mut cursor) {
        if !child.is_named() {
            background |= child.kind() == "&";
        } else if child.kind() != "comment" {
            statements.push(child);
        }
    }
    (statements, background)
}

/// Redirections on a top-level `redirected_statement`.
///
/// Bash applies them to the last stage. When they only send stdout to a file
/// they are returned, to be placed after the rewritten pipeline so the adapter
/// output lands there. Anything else (input, stderr, duplication, heredocs) is
/// folded into the last stage's invocation so it stays where it was.
fn pipeline_redirects(statement: Node, text: &str, invocations: &mut [Invocation]) -> Option<String> {
    if statement.kind() != "redirected_statement" {
        return None;
    }
    let body = statement.child_by_field_name("body")?;
    let redirects = text.get(body.end_byte()..statement.end_byte())?.trim();
    if redirects.is_empty() {
        return None;
    }

    let mut cursor = statement.walk();
    let stdout_only = statement
        .named_children(&mut cursor)
        .filter(|n| *n != body)
        .all(|n| is_stdout_redirect(n, text));
    if stdout_only {
        return Some(redirects.to_string());
    }

    let stage = last_stage(body);
    let span = stage.start_byte()..statement.end_byte();
    if let Some(source_text) = text.get(span.clone())
        && let Some(last) = invocations.iter_mut().find(|i| i.span.start == span.start)
    {
        last.source_text = source_text.to_string();
        last.span = span;
    }
    None
}

fn is_stdout_redirect(node: Node, text: &str) -> bool {
    if node.kind() != "file_redirect" {
        return false;
    }
    let fd_is_stdout = node
        .child_by_field_name("descriptor")
        .is_none_or(|fd| text.get(fd.byte_range()) == Some("1"));
    let mut cursor = node.walk();
    let operator = node.children(&mut cursor).find(|n| !n.is_named()).map(|n| n.kind());
    fd_is_stdout && matches!(operator, Some(">" | ">>" | ">|"))
}

fn last_stage(body: Node) -> Node {
    if body.kind() != "pipeline" {
        return body;
    }
    let mut cursor = body.walk();
    let last = body.named_children(&mut cursor).last();
    last.unwrap_or(body)
}

/// A simple command, or a pipeline whose every stage is one.
fn is_linear(node: Node) -> bool {
    match node.kind() {
        "command" => true,
        "redirected_statement" => node.child_by_field_name("body").is_some_and(is_linear),
        "pipeline" => {
            let mut cursor = node.walk();
            let linear = node
                .named_children(&mut cursor)
                .all(|n| matches!(n.kind(), "command" | "redirected_statement") && is_linear(n));
            linear
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedCommandLine {
        BashParser::new().parse(text)
    }

    fn texts(text: &str) -> Vec<String> {
        parse(text)
            .invocations
            .into_iter()
            .map(|i| i.source_text)
            .collect()
    }

    fn names(text: &str) -> Vec<Option<String>> {
        parse(text)
            .invocations
            .into_iter()
            .map(|i| i.command_name)
            .collect()
    }

    #[test]
    fn single_command() {
        let parsed = parse("ls -la");
        assert_eq!(parsed.shape, Shape::Pipeline);
        assert_eq!(parsed.invocations.len(), 1);
        assert_eq!(parsed.invocations[0].source_text, "ls -la");
        assert_eq!(parsed.invocations[0].command_name.as_deref(), Some("ls"));
        assert_eq!(parsed.invocations[0].span, 0..6);
    }

    #[test]
    fn pipeline_in_order() {
        assert_eq!(texts("ls | grep x"), vec!["ls", "grep x"]);
        assert_eq!(parse("ls | grep x").shape, Shape::Pipeline);
    }

    #[test]
    fn empty_input() {
        let parsed = parse("");
        assert!(parsed.invocations.is_empty());
        assert_eq!(parsed.shape, Shape::Empty);
    }

    #[test]
    fn whitespace_and_comment_only() {
        let parsed = parse("   # nothing here");
        assert!(parsed.invocations.is_empty());
        assert_eq!(parsed.shape, Shape::Empty);
    }

    #[test]
    fn surrounding_whitespace_excluded() {
        assert_eq!(texts("   ls -la   "), vec!["ls -la"]);
    }

    #[test]
    fn stdout_redirect_becomes_trailer() {
        let parsed = parse("ls -la > out.txt");
        assert_eq!(parsed.shape, Shape::Pipeline);
        assert_eq!(texts("ls -la > out.txt"), vec!["ls -la"]);
        assert_eq!(parsed.trailer.as_deref(), Some("> out.txt"));
    }

    #[test]
    fn pipeline_redirect_becomes_trailer() {
        let parsed = parse("ls | grep x >> out.txt");
        assert_eq!(parsed.shape, Shape::Pipeline);
        assert_eq!(texts("ls | grep x >> out.txt"), vec!["ls", "grep x"]);
        assert_eq!(parsed.trailer.as_deref(), Some(">> out.txt"));
    }

    #[test]
    fn input_redirect_stays_on_last_stage() {
        let parsed = parse("sort < data.txt");
        assert_eq!(texts("sort < data.txt"), vec!["sort < data.txt"]);
        assert_eq!(parsed.trailer, None);

        let parsed = parse("ls | grep x 2> err.log");
        assert_eq!(texts("ls | grep x 2> err.log"), vec!["ls", "grep x 2> err.log"]);
        assert_eq!(parsed.trailer, None);
    }

    #[test]
    fn stage_redirect_stays_on_its_stage() {
        let parsed = parse("ls 2>/dev/null | grep x");
        assert_eq!(texts("ls 2>/dev/null | grep x"), vec!["ls 2>/dev/null", "grep x"]);
        assert_eq!(parsed.trailer, None);
    }

    #[test]
    fn background_marker_becomes_trailer() {
        let parsed = parse("ls -la &");
        assert_eq!(parsed.shape, Shape::Pipeline);
        assert_eq!(texts("ls -la &"), vec!["ls -la"]);
        assert_eq!(parsed.trailer.as_deref(), Some("&"));

        let parsed = parse("ls > out.txt &");
        assert_eq!(parsed.trailer.as_deref(), Some("> out.txt &"));
    }

    #[test]
    fn plain_pipeline_has_no_trailer() {
        assert_eq!(parse("ls | grep x").trailer, None);
        assert_eq!(parse("ls;").trailer, None);
    }

    #[test]
    fn quoted_name_unquoted() {
        assert_eq!(names("'ls' -la"), vec![Some("ls".to_string())]);
        assert_eq!(names("\"ls\""), vec![Some("ls".to_string())]);
    }

    #[test]
    fn dynamic_name_absent() {
        assert_eq!(names("$CMD arg"), vec![None]);
    }

    #[test]
    fn env_prefix_included_in_text() {
        let parsed = parse("LC_ALL=C ls");
        assert_eq!(parsed.invocations[0].source_text, "LC_ALL=C ls");
        assert_eq!(parsed.invocations[0].command_name.as_deref(), Some("ls"));
    }

    #[test]
    fn nested_substitution_follows_outer() {
        assert_eq!(texts("echo $(ls)"), vec!["echo $(ls)", "ls"]);
    }

    #[test]
    fn process_substitutions_in_order() {
        assert_eq!(
            names("diff <(sort a) <(sort b)"),
            vec![
                Some("diff".to_string()),
                Some("sort".to_string()),
                Some("sort".to_string())
            ]
        );
    }

    #[test]
    fn and_list_is_compound() {
        let parsed = parse("ls && pwd");
        assert_eq!(parsed.shape, Shape::Compound);
        assert_eq!(parsed.invocations.len(), 2);
    }

    #[test]
    fn sequence_is_compound() {
        assert_eq!(parse("ls; pwd").shape, Shape::Compound);
    }

    #[test]
    fn control_flow_is_compound() {
        assert_eq!(parse("if true; then ls; fi").shape, Shape::Compound);
        assert_eq!(parse("for f in a b; do ls $f; done").shape, Shape::Compound);
    }

    #[test]
    fn trailing_semicolon_still_pipeline() {
        assert_eq!(parse("ls;").shape, Shape::Pipeline);
    }

    #[test]
    fn syntax_errors_are_malformed() {
        for text in ["ls; ps; (", "if ls; then ps", "ls |", "echo $(ls"] {
            assert_eq!(parse(text).shape, Shape::Malformed, "input: {text}");
        }
    }

    #[test]
    fn malformed_input_does_not_panic() {
        for text in ["ls |", "echo \"unterminated", "$(", "| | |", ")))"] {
            let _ = parse(text);
        }
    }
}
