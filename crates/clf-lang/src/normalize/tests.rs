use clf_config::{ForwarderSpec, InputKind, OutputType};

use super::*;

fn spec(toml: &str) -> ForwarderSpec {
    toml.parse().unwrap()
}

fn output_names(s: &ForwarderSpec) -> Vec<&str> {
    s.outputs.iter().map(|o| o.name.as_str()).collect()
}

const LOKISTACK: &str = r#"
[[outputs]]
name = "es"
type = "elasticsearch"
url = "http://es:9200"

[[outputs]]
name = "ls"
type = "lokistack"
secret = { name = "ls-secret" }
tls = { insecureSkipVerify = true }
authentication = { token = { from = "serviceAccount" } }
tuning = { delivery = "atLeastOnce" }
[outputs.lokistack.target]
name = "logging-loki"
namespace = "openshift-logging"

[[pipelines]]
name = "p"
inputRefs = ["application", "audit"]
outputRefs = ["ls", "es"]
"#;

// =========================================================================
// 1. Defaults and dedup
// =========================================================================

#[test]
fn unnamed_pipelines_get_index_names() {
    let s = normalize(&spec(
        r#"
[[pipelines]]
inputRefs = ["application"]
outputRefs = ["x"]
[[pipelines]]
name = "keep"
inputRefs = ["audit"]
outputRefs = ["x"]
[[pipelines]]
name = ""
inputRefs = ["audit"]
outputRefs = ["x"]
"#,
    ));
    let names: Vec<&str> = s.pipelines.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["pipeline_0", "keep", "pipeline_2"]);
}

#[test]
fn refs_are_deduplicated_first_wins() {
    let s = normalize(&spec(
        r#"
[[pipelines]]
inputRefs = ["audit", "application", "audit"]
outputRefs = ["b", "a", "b", "a"]
"#,
    ));
    assert_eq!(s.pipelines[0].input_refs, vec!["audit", "application"]);
    assert_eq!(s.pipelines[0].output_refs, vec!["b", "a"]);
}

// =========================================================================
// 2. User input projection
// =========================================================================

#[test]
fn unfiltered_user_inputs_become_reserved_refs() {
    let s = normalize(&spec(
        r#"
[[inputs]]
name = "all-apps"
application = {}
[[inputs]]
name = "some-apps"
application = { namespaces = ["ns1"] }
[[inputs]]
name = "all-infra"
infrastructure = { sources = ["node", "container"] }
[[inputs]]
name = "nodes"
infrastructure = { sources = ["node"] }
[[inputs]]
name = "all-audit"
audit = {}

[[pipelines]]
inputRefs = ["all-apps", "some-apps", "all-infra", "nodes", "all-audit", "application"]
outputRefs = ["x"]
"#,
    ));
    assert_eq!(
        s.pipelines[0].input_refs,
        vec!["application", "some-apps", "infrastructure", "nodes", "audit"]
    );
}

#[test]
fn ref_kind_resolves_reserved_and_user_names() {
    let s = spec(
        r#"
[[inputs]]
name = "mine"
audit = { sources = ["ovn"] }
"#,
    );
    assert_eq!(ref_kind(&s, "infrastructure"), Some(InputKind::Infrastructure));
    assert_eq!(ref_kind(&s, "mine"), Some(InputKind::Audit));
    assert_eq!(ref_kind(&s, "nope"), None);
}

// =========================================================================
// 3. Lokistack expansion
// =========================================================================

#[test]
fn lokistack_viaq_expands_per_routed_kind() {
    let s = normalize(&spec(LOKISTACK));
    assert_eq!(output_names(&s), vec!["es", "ls-application", "ls-audit"]);

    let app = s.output("ls-application").unwrap();
    assert_eq!(app.output_type, OutputType::Loki);
    assert_eq!(
        app.url(),
        "https://logging-loki-gateway-http.openshift-logging.svc:8080/api/logs/v1/application"
    );
    assert_eq!(
        s.output("ls-audit").unwrap().url(),
        "https://logging-loki-gateway-http.openshift-logging.svc:8080/api/logs/v1/audit"
    );
}

#[test]
fn lokistack_carries_auth_tls_and_tuning() {
    let orig = spec(LOKISTACK);
    let s = normalize(&orig);
    let ls = orig.output("ls").unwrap();
    let app = s.output("ls-application").unwrap();
    assert_eq!(app.secret, ls.secret);
    assert_eq!(app.tls, ls.tls);
    assert_eq!(app.authentication, ls.authentication);
    assert_eq!(app.tuning, ls.tuning);
    assert!(app.lokistack.is_none());
}

#[test]
fn lokistack_pipelines_split_by_kind() {
    let s = normalize(&spec(LOKISTACK));
    assert_eq!(s.pipelines.len(), 2);
    assert_eq!(s.pipelines[0].name(), "p");
    assert_eq!(s.pipelines[0].input_refs, vec!["application"]);
    assert_eq!(s.pipelines[0].output_refs, vec!["ls-application", "es"]);
    assert_eq!(s.pipelines[1].name(), "p-audit");
    assert_eq!(s.pipelines[1].input_refs, vec!["audit"]);
    assert_eq!(s.pipelines[1].output_refs, vec!["ls-audit", "es"]);
}

#[test]
fn lokistack_otel_targets_otlp_endpoint() {
    let s = normalize(&spec(
        r#"
[[outputs]]
name = "ls"
type = "lokistack"
[outputs.lokistack]
dataModel = "OpenTelemetry"
target = { name = "lk", namespace = "ns" }

[[pipelines]]
inputRefs = ["application"]
outputRefs = ["ls"]
"#,
    ));
    let out = s.output("ls-application").unwrap();
    assert_eq!(out.output_type, OutputType::Otlp);
    assert!(out.url().ends_with("/api/logs/v1/application/otlp/v1/logs"));
}

#[test]
fn user_inputs_route_to_their_tenant() {
    let s = normalize(&spec(
        r#"
[[inputs]]
name = "web"
application = { namespaces = ["web"] }

[[outputs]]
name = "ls"
type = "lokistack"
lokistack = { target = { name = "lk", namespace = "ns" } }

[[pipelines]]
name = "p"
inputRefs = ["web", "infrastructure"]
outputRefs = ["ls"]
"#,
    ));
    assert_eq!(output_names(&s), vec!["ls-application", "ls-infrastructure"]);
    assert_eq!(s.pipelines[0].input_refs, vec!["web"]);
    assert_eq!(s.pipelines[1].name(), "p-infrastructure");
}

#[test]
fn malformed_lokistack_is_left_for_the_checker() {
    let s = normalize(&spec(
        r#"
[[outputs]]
name = "ls"
type = "lokistack"

[[pipelines]]
inputRefs = ["application"]
outputRefs = ["ls"]
"#,
    ));
    assert_eq!(output_names(&s), vec!["ls"]);
    assert_eq!(s.pipelines[0].output_refs, vec!["ls"]);
}

#[test]
fn tenant_label_keys_merge_rules() {
    let s = spec(
        r#"
[[outputs]]
name = "ls"
type = "lokistack"
[outputs.lokistack]
target = { name = "lk", namespace = "ns" }
[outputs.lokistack.labelKeys]
application = { labelKeys = ["kubernetes.labels.app"] }
audit = { ignoreGlobal = true, labelKeys = ["b", "a", "b"] }
"#,
    );
    let stack = s.outputs[0].lokistack.as_ref().unwrap();
    assert_eq!(
        tenant_label_keys(stack, InputKind::Application),
        vec![
            "kubernetes.container_name",
            "kubernetes.labels.app",
            "kubernetes.namespace_name",
            "kubernetes.pod_name",
            "log_type",
        ]
    );
    assert_eq!(tenant_label_keys(stack, InputKind::Audit), vec!["a", "b"]);
    assert!(tenant_label_keys(stack, InputKind::Infrastructure).is_empty());
}

#[test]
fn global_label_keys_apply_to_every_tenant() {
    let s = spec(
        r#"
[[outputs]]
name = "ls"
type = "lokistack"
[outputs.lokistack]
target = { name = "lk", namespace = "ns" }
labelKeys = { global = ["log_type"], infrastructure = { labelKeys = ["kubernetes.host"] } }
"#,
    );
    let stack = s.outputs[0].lokistack.as_ref().unwrap();
    assert_eq!(tenant_label_keys(stack, InputKind::Audit), vec!["log_type"]);
    assert_eq!(
        tenant_label_keys(stack, InputKind::Infrastructure),
        vec!["kubernetes.host", "log_type"]
    );
}

// =========================================================================
// 4. Idempotence
// =========================================================================

#[test]
fn normalize_is_idempotent() {
    let inputs = [
        LOKISTACK,
        r#"
[[inputs]]
name = "a"
application = {}
[[pipelines]]
inputRefs = ["a", "a", "audit"]
outputRefs = ["o", "o"]
"#,
    ];
    for src in inputs {
        let once = normalize(&spec(src));
        assert_eq!(normalize(&once), once);
    }
}
