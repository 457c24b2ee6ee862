use clf_config::{Dialect, ForwarderSpec, Options, Secret, Secrets};

use super::*;


pub(super) fn spec(toml: &str) -> ForwarderSpec {
    toml.parse().unwrap()
}

pub(super) fn check(spec: &ForwarderSpec, secrets: &Secrets) -> Vec<CheckError> {
    check_forwarder(spec, secrets, &Options::default())
}

pub(super) fn kinds(errors: &[CheckError]) -> Vec<CheckKind> {
    errors.iter().map(|e| e.kind).collect()
}

pub(super) fn secret(name: &str, pairs: &[(&str, &str)]) -> Secrets {
    let s = pairs
        .iter()
        .fold(Secret::new(), |s, (k, v)| s.with(*k, v.as_bytes()));
    Secrets::new().with(name, s)
}

/// One output of the given body, routed from `application`.
pub(super) fn single_output(body: &str) -> ForwarderSpec {
    spec(&format!(
        r#"
[[outputs]]
name = "out"
{body}

[[pipelines]]
name = "p"
inputRefs = ["application"]
outputRefs = ["out"]
"#
    ))
}

pub(super) fn dialect_errors(spec: &ForwarderSpec, dialect: Dialect) -> Vec<CheckError> {
    check_dialect(spec, dialect)
}
