use clf_config::{ForwarderSpec, Options, Secret, Secrets};

use super::*;
use crate::ir::ElementArena;
use crate::normalize::normalize;
use crate::routes::plan_routes;


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

/// The blank-line delimited block starting with `header`.
pub(super) fn block<'a>(text: &'a str, header: &str) -> &'a str {
    let start = text
        .find(&format!("{header}\n"))
        .unwrap_or_else(|| panic!("no block {header} in:\n{text}"));
    let rest = &text[start..];
    rest.find("\n\n").map_or(rest, |end| &rest[..end])
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

/// Every reserved kind, a selector input and a source subset input.
pub(super) const ALL_INPUTS: &str = r#"
[[inputs]]
name = "web"
application = { namespaces = ["web", "shop"], selector = { matchLabels = { tier = "front" } } }

[[inputs]]
name = "nodes"
infrastructure = { sources = ["node"] }

[[inputs]]
name = "kube.audit"
audit = { sources = ["kubeAPI", "openshiftAPI"] }

[[outputs]]
name = "loki-receiver"
type = "loki"
url = "https://logs.example.com"

[[outputs]]
name = "es"
type = "elasticsearch"
url = "http://es.svc:9200"

[[pipelines]]
name = "apps"
inputRefs = ["web", "application"]
outputRefs = ["loki-receiver"]
labels = { team = "a", env = "prod" }
parse = "json"

[[pipelines]]
name = "ops"
inputRefs = ["nodes", "kube.audit", "infrastructure", "audit"]
outputRefs = ["es", "loki-receiver"]
"#;
