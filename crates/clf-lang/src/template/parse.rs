//! Template source → node tree.
//!
//! Text outside `{{ … }}` is copied verbatim. Inside an action the grammar is
//!
//! ```text
//! action   := "if" pipeline | "else" ["if" pipeline] | "end"
//!           | "range" pipeline | "with" pipeline | pipeline
//! pipeline := command ("|" command)*
//! command  := operand operand*
//! operand  := "(" pipeline ")" | string | int | "true" | "false"
//!           | "." path | "$" path | ident
//! ```
//!
//! `{{-` trims whitespace before the action, `-}}` after it, and
//! `{{/* … */}}` is a comment.

use winnow::ascii::{multispace0, multispace1};
use winnow::combinator::{cut_err, opt};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{literal, take_while};

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action(Pipeline),
    If {
        cond: Pipeline,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Range {
        over: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    With {
        value: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub cmds: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Command {
    pub head: Operand,
    pub args: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    /// `.a.b` relative to the current context; `.` alone is the context.
    Dot(Vec<String>),
    /// `$.a.b` relative to the data the template was invoked with.
    Root(Vec<String>),
    Str(String),
    Int(i64),
    Bool(bool),
    Func(String),
    Group(Pipeline),
}

impl Node {
    /// Visit every pipeline in this subtree, depth first.
    pub(crate) fn walk_pipelines<'a>(&'a self, f: &mut impl FnMut(&'a Pipeline)) {
        match self {
            Node::Text(_) => {}
            Node::Action(p) => walk_pipeline(p, f),
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                walk_pipeline(cond, f);
                then.iter().chain(otherwise).for_each(|n| n.walk_pipelines(f));
            }
            Node::Range {
                over: p,
                body,
                otherwise,
            }
            | Node::With {
                value: p,
                body,
                otherwise,
            } => {
                walk_pipeline(p, f);
                body.iter().chain(otherwise).for_each(|n| n.walk_pipelines(f));
            }
        }
    }
}

fn walk_pipeline<'a>(p: &'a Pipeline, f: &mut impl FnMut(&'a Pipeline)) {
    f(p);
    for cmd in &p.cmds {
        for op in std::iter::once(&cmd.head).chain(&cmd.args) {
            if let Operand::Group(inner) = op {
                walk_pipeline(inner, f);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub(crate) fn parse_template(src: &str) -> anyhow::Result<Vec<Node>> {
    let tokens = tokenize(src)?;
    let mut pos = 0;
    let (nodes, stop) = build_list(&tokens, &mut pos)?;
    match stop {
        Stop::Eof => Ok(nodes),
        Stop::End => anyhow::bail!("unexpected {{{{end}}}}"),
        Stop::Else | Stop::ElseIf(_) => anyhow::bail!("unexpected {{{{else}}}}"),
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Tag(Tag),
}

#[derive(Debug, Clone, PartialEq)]
enum Tag {
    Expr(Pipeline),
    If(Pipeline),
    ElseIf(Pipeline),
    Else,
    End,
    Range(Pipeline),
    With(Pipeline),
}

fn tokenize(src: &str) -> anyhow::Result<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut rest = src;
    let mut trim_next = false;

    while let Some(open) = rest.find("{{") {
        let mut text = &rest[..open];
        if trim_next {
            text = text.trim_start();
        }
        let after_open = &rest[open + 2..];
        let trim_before = after_open.starts_with('-')
            && after_open[1..].starts_with(|c: char| c.is_ascii_whitespace());
        if trim_before {
            text = text.trim_end();
        }
        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }

        let body_start = if trim_before { 1 } else { 0 };
        let close = find_close(&after_open[body_start..]).ok_or_else(|| {
            anyhow::anyhow!("unclosed action at byte {}", src.len() - rest.len() + open)
        })?;
        let mut inner = &after_open[body_start..body_start + close];
        trim_next = inner.ends_with('-')
            && inner[..inner.len() - 1].ends_with(|c: char| c.is_ascii_whitespace());
        if trim_next {
            inner = &inner[..inner.len() - 1];
        }

        let trimmed = inner.trim();
        if !(trimmed.starts_with("/*") && trimmed.ends_with("*/")) {
            let tag = parse_tag(trimmed).map_err(|e| anyhow::anyhow!("bad action {{{{{trimmed}}}}}: {e}"))?;
            tokens.push(Token::Tag(tag));
        }
        rest = &after_open[body_start + close + 2..];
    }

    let tail = if trim_next { rest.trim_start() } else { rest };
    if !tail.is_empty() {
        tokens.push(Token::Text(tail.to_string()));
    }
    Ok(tokens)
}

/// Offset of the `}}` closing this action, skipping string literals.
fn find_close(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut in_str = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_str => i += 1,
            b'"' => in_str = !in_str,
            b'}' if !in_str && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Tree building
// ---------------------------------------------------------------------------

enum Stop {
    Eof,
    End,
    Else,
    ElseIf(Pipeline),
}

fn build_list(tokens: &[Token], pos: &mut usize) -> anyhow::Result<(Vec<Node>, Stop)> {
    let mut nodes = Vec::new();
    while let Some(tok) = tokens.get(*pos) {
        *pos += 1;
        match tok {
            Token::Text(t) => nodes.push(Node::Text(t.clone())),
            Token::Tag(Tag::Expr(p)) => nodes.push(Node::Action(p.clone())),
            Token::Tag(Tag::End) => return Ok((nodes, Stop::End)),
            Token::Tag(Tag::Else) => return Ok((nodes, Stop::Else)),
            Token::Tag(Tag::ElseIf(p)) => return Ok((nodes, Stop::ElseIf(p.clone()))),
            Token::Tag(Tag::If(p)) => nodes.push(build_if(p.clone(), tokens, pos)?),
            Token::Tag(Tag::Range(p)) => {
                let (body, otherwise) = build_block("range", tokens, pos)?;
                nodes.push(Node::Range {
                    over: p.clone(),
                    body,
                    otherwise,
                });
            }
            Token::Tag(Tag::With(p)) => {
                let (body, otherwise) = build_block("with", tokens, pos)?;
                nodes.push(Node::With {
                    value: p.clone(),
                    body,
                    otherwise,
                });
            }
        }
    }
    Ok((nodes, Stop::Eof))
}

fn build_if(cond: Pipeline, tokens: &[Token], pos: &mut usize) -> anyhow::Result<Node> {
    let (then, stop) = build_list(tokens, pos)?;
    let otherwise = match stop {
        Stop::End => Vec::new(),
        Stop::Else => expect_end("if", tokens, pos)?,
        Stop::ElseIf(p) => vec![build_if(p, tokens, pos)?],
        Stop::Eof => anyhow::bail!("unclosed {{{{if}}}}"),
    };
    Ok(Node::If {
        cond,
        then,
        otherwise,
    })
}

fn build_block(
    what: &str,
    tokens: &[Token],
    pos: &mut usize,
) -> anyhow::Result<(Vec<Node>, Vec<Node>)> {
    let (body, stop) = build_list(tokens, pos)?;
    match stop {
        Stop::End => Ok((body, Vec::new())),
        Stop::Else => Ok((body, expect_end(what, tokens, pos)?)),
        Stop::ElseIf(_) => anyhow::bail!("{{{{else if}}}} is only valid inside {{{{if}}}}"),
        Stop::Eof => anyhow::bail!("unclosed {{{{{what}}}}}"),
    }
}

fn expect_end(what: &str, tokens: &[Token], pos: &mut usize) -> anyhow::Result<Vec<Node>> {
    let (nodes, stop) = build_list(tokens, pos)?;
    match stop {
        Stop::End => Ok(nodes),
        Stop::Eof => anyhow::bail!("unclosed {{{{{what}}}}}"),
        Stop::Else | Stop::ElseIf(_) => anyhow::bail!("duplicate {{{{else}}}} in {{{{{what}}}}}"),
    }
}

// ---------------------------------------------------------------------------
// Action grammar
// ---------------------------------------------------------------------------

fn parse_tag(src: &str) -> anyhow::Result<Tag> {
    tag.parse(src).map_err(|e| anyhow::anyhow!("{e}"))
}

fn tag(input: &mut &str) -> ModalResult<Tag> {
    multispace0.parse_next(input)?;
    let tag = if opt(kw("if")).parse_next(input)?.is_some() {
        Tag::If(clause_pipeline(input)?)
    } else if opt(kw("else")).parse_next(input)?.is_some() {
        multispace0.parse_next(input)?;
        if opt(kw("if")).parse_next(input)?.is_some() {
            Tag::ElseIf(clause_pipeline(input)?)
        } else {
            Tag::Else
        }
    } else if opt(kw("end")).parse_next(input)?.is_some() {
        Tag::End
    } else if opt(kw("range")).parse_next(input)?.is_some() {
        Tag::Range(clause_pipeline(input)?)
    } else if opt(kw("with")).parse_next(input)?.is_some() {
        Tag::With(clause_pipeline(input)?)
    } else {
        Tag::Expr(pipeline(input)?)
    };
    multispace0.parse_next(input)?;
    Ok(tag)
}

fn clause_pipeline(input: &mut &str) -> ModalResult<Pipeline> {
    cut_err(multispace1)
        .context(StrContext::Expected(StrContextValue::Description(
            "whitespace before pipeline",
        )))
        .parse_next(input)?;
    pipeline(input)
}

fn pipeline(input: &mut &str) -> ModalResult<Pipeline> {
    let mut cmds = vec![command(input)?];
    loop {
        multispace0.parse_next(input)?;
        if opt(literal("|")).parse_next(input)?.is_none() {
            break;
        }
        multispace0.parse_next(input)?;
        cmds.push(
            cut_err(command)
                .context(StrContext::Expected(StrContextValue::Description(
                    "command after `|`",
                )))
                .parse_next(input)?,
        );
    }
    Ok(Pipeline { cmds })
}

fn command(input: &mut &str) -> ModalResult<Command> {
    let head = operand(input)?;
    let mut args = Vec::new();
    loop {
        let saved = *input;
        multispace0.parse_next(input)?;
        if input.is_empty() || input.starts_with('|') || input.starts_with(')') {
            *input = saved;
            break;
        }
        args.push(cut_err(operand).parse_next(input)?);
    }
    if !args.is_empty() && !matches!(head, Operand::Func(_)) {
        // only functions take arguments
        return Err(ErrMode::Cut(ContextError::new()));
    }
    Ok(Command { head, args })
}

fn operand(input: &mut &str) -> ModalResult<Operand> {
    if opt(literal("(")).parse_next(input)?.is_some() {
        multispace0.parse_next(input)?;
        let inner = pipeline(input)?;
        multispace0.parse_next(input)?;
        cut_err(literal(")"))
            .context(StrContext::Expected(StrContextValue::Description(
                "closing parenthesis",
            )))
            .parse_next(input)?;
        return Ok(Operand::Group(inner));
    }
    if input.starts_with('"') {
        return string_lit.map(Operand::Str).parse_next(input);
    }
    if input.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        return int_lit.map(Operand::Int).parse_next(input);
    }
    if input.starts_with('.') {
        return path.map(Operand::Dot).parse_next(input);
    }
    if opt(literal("$")).parse_next(input)?.is_some() {
        let segs = if input.starts_with('.') {
            path(input)?
        } else {
            Vec::new()
        };
        return Ok(Operand::Root(segs));
    }
    if opt(kw("true")).parse_next(input)?.is_some() {
        return Ok(Operand::Bool(true));
    }
    if opt(kw("false")).parse_next(input)?.is_some() {
        return Ok(Operand::Bool(false));
    }
    ident.map(|s: &str| Operand::Func(s.to_string())).parse_next(input)
}

/// `.` or `.a.b.c`.
fn path(input: &mut &str) -> ModalResult<Vec<String>> {
    literal(".").parse_next(input)?;
    let mut segs = Vec::new();
    if let Some(first) = opt(ident).parse_next(input)? {
        segs.push(first.to_string());
        while input.starts_with('.') {
            literal(".").parse_next(input)?;
            let seg = cut_err(ident)
                .context(StrContext::Expected(StrContextValue::Description(
                    "field name",
                )))
                .parse_next(input)?;
            segs.push(seg.to_string());
        }
    }
    Ok(segs)
}

fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    if !input.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

fn kw<'a>(keyword: &'static str) -> impl FnMut(&mut &'a str) -> ModalResult<()> {
    move |input: &mut &'a str| {
        let saved = *input;
        literal(keyword).parse_next(input)?;
        if input.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
            *input = saved;
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        Ok(())
    }
}

fn int_lit(input: &mut &str) -> ModalResult<i64> {
    let saved = *input;
    let neg = opt(literal("-")).parse_next(input)?.is_some();
    let digits = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let value: i64 = digits.parse().map_err(|_| {
        *input = saved;
        ErrMode::Backtrack(ContextError::new())
    })?;
    Ok(if neg { -value } else { value })
}

/// Double-quoted string with `\"`, `\\`, `\n` and `\t` escapes.
fn string_lit(input: &mut &str) -> ModalResult<String> {
    literal("\"").parse_next(input)?;
    let src = *input;
    let mut out = String::new();
    let mut chars = src.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                *input = &src[i + 1..];
                return Ok(out);
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, other)) => out.push(other),
                None => break,
            },
            other => out.push(other),
        }
    }
    // unterminated string
    Err(ErrMode::Cut(ContextError::new()))
}
