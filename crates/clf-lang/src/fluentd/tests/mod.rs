use clf_config::{ForwarderSpec, Options, Secret, Secrets};

use super::*;
use crate::ir::ElementArena;
use crate::normalize::normalize;
use crate::routes::plan_routes;

mod sections;
mod stores;

pub(super) fn spec(toml: &str) -> ForwarderSpec {
    normalize(&toml.parse().unwrap())
}

pub(super) fn arena(spec: &ForwarderSpec, secrets: &Secrets, options: &Options) -> ElementArena {
    build(spec, &plan_routes(spec), secrets, options).unwrap()
}

pub(super) fn render_with(toml: &str, secrets: &Secrets, options: &Options) -> String {
    let spec = spec(toml);
    generate(&spec, &plan_routes(&spec), secrets, options).unwrap()
}

pub(super) fn render(toml: &str) -> String {
    render_with(toml, &Secrets::new(), &Options::default())
}

pub(super) fn secret(name: &str, pairs: &[(&str, &str)]) -> Secrets {
    let s = pairs
        .iter()
        .fold(Secret::new(), |s, (k, v)| s.with(*k, v.as_bytes()));
    Secrets::new().with(name, s)
}

/// The `<label id>` stanza, from its opening line to `</label>`.
pub(super) fn label<'a>(text: &'a str, id: &str) -> &'a str {
    let open = format!("<label {id}>\n");
    let start = text
        .find(&open)
        .unwrap_or_else(|| panic!("no label {id} in:\n{text}"));
    let rest = &text[start..];
    let end = rest.find("\n</label>").expect("unterminated label");
    &rest[..end + "\n</label>".len()]
}

/// One output of the given body, routed from `application` by pipeline `p`.
pub(super) fn single_output(body: &str) -> String {
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

#[test]
fn store_ids_are_lower_snake() {
    assert_eq!(store_id("ES-Prod.1"), "es_prod_1");
    assert_eq!(store_id("default"), "default");
}

#[test]
fn templates_compile() {
    let engine = engine().unwrap();
    for (name, _) in templates::TEMPLATES {
        assert!(engine.contains(name), "{name}");
    }
}
