#![allow(dead_code)]

use std::collections::BTreeSet;

use clf_config::{Dialect, ForwarderSpec, Options, Secret, Secrets};
use clf_lang::{CompileResult, compile_forwarder};

pub fn spec(toml: &str) -> ForwarderSpec {
    toml.parse().expect("forwarder spec should parse")
}

pub fn secret(name: &str, pairs: &[(&str, &str)]) -> Secrets {
    let s = pairs
        .iter()
        .fold(Secret::new(), |s, (k, v)| s.with(*k, v.as_bytes()));
    Secrets::new().with(name, s)
}

pub fn compile(toml: &str, dialect: Dialect) -> CompileResult<String> {
    compile_with(toml, &Secrets::new(), &Options::default(), dialect)
}

pub fn compile_with(
    toml: &str,
    secrets: &Secrets,
    options: &Options,
    dialect: Dialect,
) -> CompileResult<String> {
    compile_forwarder(&spec(toml), secrets, options, dialect)
}

pub fn vector(toml: &str) -> String {
    compile(toml, Dialect::Vector).expect("vector compile")
}

pub fn fluentd(toml: &str) -> String {
    compile(toml, Dialect::Fluentd).expect("fluentd compile")
}

/// One output of the given body, routed from `application` by pipeline `p`.
pub fn single_output(body: &str) -> String {
    format!(
        r#"
[[outputs]]
name = "out"
{body}

[[pipelines]]
name = "p"
inputRefs = ["application"]
outputRefs = ["out"]
"#
    )
}

/// Text of a TOML table from its header up to the next header.
pub fn block<'a>(text: &'a str, header: &str) -> &'a str {
    let start = text
        .find(&format!("{header}\n"))
        .unwrap_or_else(|| panic!("no {header} in:\n{text}"));
    let rest = &text[start + header.len() + 1..];
    let end = rest.find("\n[").unwrap_or(rest.len());
    &text[start..start + header.len() + 1 + end]
}

/// The `<label id>` stanza of a fluentd config.
pub fn label<'a>(text: &'a str, id: &str) -> &'a str {
    let open = format!("<label {id}>\n");
    let start = text
        .find(&open)
        .unwrap_or_else(|| panic!("no label {id} in:\n{text}"));
    let rest = &text[start..];
    let end = rest.find("\n</label>").expect("unterminated label");
    &rest[..end + "\n</label>".len()]
}

/// A vector component: `[sources.x]`, `[transforms.x]` or `[sinks.x]`.
pub struct Component {
    pub id: String,
    pub inputs: Vec<String>,
}

/// Components in document order. Nested tables (`[sinks.x.tls]`) are skipped.
pub fn vector_components(text: &str) -> Vec<Component> {
    let mut out: Vec<Component> = Vec::new();
    for line in text.lines() {
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let parts: Vec<&str> = header.split('.').collect();
            if parts.len() == 2 && matches!(parts[0], "sources" | "transforms" | "sinks") {
                out.push(Component {
                    id: parts[1].to_string(),
                    inputs: Vec::new(),
                });
            }
            continue;
        }
        if let (Some(last), Some(list)) = (out.last_mut(), line.strip_prefix("inputs = ")) {
            last.inputs = list
                .split('"')
                .skip(1)
                .step_by(2)
                .map(str::to_string)
                .collect();
        }
    }
    out
}

/// Inputs that name no earlier component (route branches `x.y` resolve to `x`).
pub fn vector_dangling(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut dangling = Vec::new();
    for c in vector_components(text) {
        for input in &c.inputs {
            let base = input.split('.').next().unwrap_or(input);
            if !seen.contains(base) {
                dangling.push(format!("{} <- {input}", c.id));
            }
        }
        seen.insert(c.id);
    }
    dangling
}

/// `@label` targets with no `<label>` stanza.
pub fn fluentd_dangling(text: &str) -> Vec<String> {
    let defined: BTreeSet<&str> = text
        .lines()
        .filter_map(|l| l.strip_prefix("<label ").and_then(|l| l.strip_suffix('>')))
        .collect();
    text.lines()
        .filter_map(|l| l.trim_start().strip_prefix("@label "))
        .filter(|target| !defined.contains(target))
        .map(str::to_string)
        .collect()
}
