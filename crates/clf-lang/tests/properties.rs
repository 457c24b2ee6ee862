//! Whole-compile properties that hold for every forwarder spec, checked on
//! both dialects through the public entry points.

mod common;

use clf_config::{Dialect, Options, Secrets};
use clf_lang::{CompileReason, check_spec, normalize};
use common::*;

/// Selector input, every reserved kind, a lokistack and four plain outputs.
const MIXED: &str = r#"
[[inputs]]
name = "web"
application = { namespaces = ["web"], selector = { matchLabels = { tier = "front" } } }

[[outputs]]
name = "loki-out"
type = "loki"
url = "https://loki.example.com"

[[outputs]]
name = "es"
type = "elasticsearch"
url = "http://es.svc:9200"

[[outputs]]
name = "kafka"
type = "kafka"
url = "tcp://broker:9092/logs"

[[outputs]]
name = "hook"
type = "http"
url = "https://hook.example.com/in"

[[outputs]]
name = "ls"
type = "lokistack"
lokistack = { target = { name = "logging-loki", namespace = "openshift-logging" } }

[[pipelines]]
name = "frontend"
inputRefs = ["web"]
outputRefs = ["loki-out", "hook"]
parse = "json"

[[pipelines]]
inputRefs = ["application", "infrastructure"]
outputRefs = ["es", "kafka", "ls"]

[[pipelines]]
name = "audit-trail"
inputRefs = ["audit"]
outputRefs = ["es", "ls"]
labels = { team = "sec" }
"#;

const DIALECTS: [Dialect; 2] = [Dialect::Fluentd, Dialect::Vector];

// =========================================================================
// Determinism and normalization
// =========================================================================

#[test]
fn equal_inputs_give_identical_output() {
    for dialect in DIALECTS {
        let first = compile(MIXED, dialect).unwrap();
        let second = compile(MIXED, dialect).unwrap();
        assert_eq!(first, second, "{dialect}");
    }
}

#[test]
fn normalize_is_idempotent() {
    let once = normalize(&spec(MIXED));
    assert_eq!(normalize(&once), once);
    assert!(once.output("ls").is_none());
    assert!(once.output("ls-application").is_some());
}

#[test]
fn compiling_a_normalized_spec_changes_nothing() {
    let raw = spec(MIXED);
    let once = normalize(&raw);
    for dialect in DIALECTS {
        let a = clf_lang::compile_forwarder(&raw, &Secrets::new(), &Options::default(), dialect);
        let b = clf_lang::compile_forwarder(&once, &Secrets::new(), &Options::default(), dialect);
        assert_eq!(a.unwrap(), b.unwrap(), "{dialect}");
    }
}

// =========================================================================
// Reference closure and unique ids
// =========================================================================

#[test]
fn vector_inputs_resolve_to_earlier_components() {
    let text = vector(MIXED);
    assert!(vector_dangling(&text).is_empty(), "{:?}", vector_dangling(&text));

    let ids: Vec<String> = vector_components(&text).into_iter().map(|c| c.id).collect();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(ids.len(), unique.len(), "{ids:?}");
}

#[test]
fn fluentd_labels_are_all_defined_once() {
    let text = fluentd(MIXED);
    assert!(fluentd_dangling(&text).is_empty(), "{:?}", fluentd_dangling(&text));

    for id in ["@FRONTEND", "@PIPELINE_1", "@AUDIT_TRAIL", "@ES", "@LS_APPLICATION", "@LS_AUDIT"] {
        let open = format!("<label {id}>\n");
        assert_eq!(text.matches(&open).count(), 1, "{id}");
    }
}

// =========================================================================
// Lokistack expansion
// =========================================================================

#[test]
fn lokistack_targets_one_gateway_tenant_per_kind() {
    let s = normalize(&spec(MIXED));
    for kind in ["application", "infrastructure", "audit"] {
        let out = s.output(&format!("ls-{kind}")).unwrap();
        assert_eq!(
            out.url(),
            format!(
                "https://logging-loki-gateway-http.openshift-logging.svc:8080/api/logs/v1/{kind}"
            )
        );
    }

    let text = vector(MIXED);
    let sink = block(&text, "[sinks.ls-infrastructure]");
    assert!(sink.contains(
        "endpoint = \"https://logging-loki-gateway-http.openshift-logging.svc:8080/api/logs/v1/infrastructure\""
    ));
}

// =========================================================================
// Loki label sanitization
// =========================================================================

#[test]
fn loki_label_keys_are_sanitized() {
    let text = vector(&single_output(
        "type = \"loki\"\nurl = \"https://l\"\nloki = { labelKeys = [\"kubernetes.labels.app.kubernetes.io/name\"] }",
    ));
    let labels = block(&text, "[sinks.out.labels]");
    assert!(
        labels.contains(
            r#"kubernetes_labels_app_kubernetes_io_name = "{{kubernetes.labels.\"app_kubernetes_io_name\"}}""#
        ),
        "{labels}"
    );
    assert!(labels.contains("kubernetes_host = \"${VECTOR_SELF_NODE_NAME}\""));
}

// =========================================================================
// Kafka brokers and topic
// =========================================================================

#[test]
fn kafka_brokers_win_over_the_url() {
    let body = "type = \"kafka\"\nurl = \"tcp://ignored:9092/ignored\"\nkafka = { brokers = [\"tcp://b1:9092\", \"tcp://b2:9092\"], topic = \"t\" }";
    let text = fluentd(&single_output(body));
    assert!(label(&text, "@OUT").contains("    brokers b1:9092,b2:9092\n    default_topic t\n"));

    let text = vector(&single_output(body));
    let sink = block(&text, "[sinks.out]");
    assert!(sink.contains("bootstrap_servers = \"b1:9092,b2:9092\""));
    assert!(sink.contains("topic = \"t\""));
}

#[test]
fn kafka_url_alone_names_broker_and_topic() {
    let text = fluentd(&single_output("type = \"kafka\"\nurl = \"tls://b1:9092/events\""));
    assert!(label(&text, "@OUT").contains("    brokers b1:9092\n    default_topic events\n"));

    let text = fluentd(&single_output("type = \"kafka\"\nurl = \"tcp://b1:9092\""));
    assert!(label(&text, "@OUT").contains("    brokers b1:9092\n    default_topic topic\n"));
}

// =========================================================================
// Syslog transport
// =========================================================================

#[test]
fn syslog_transport_follows_the_scheme() {
    let udp = single_output("type = \"syslog\"\nurl = \"udp://sys:514\"");
    let tcp = single_output("type = \"syslog\"\nurl = \"tcp://sys:514\"");
    let bare = single_output("type = \"syslog\"\nurl = \"sys:514\"");

    assert!(label(&fluentd(&udp), "@OUT").contains("    protocol udp\n"));
    assert!(label(&fluentd(&tcp), "@OUT").contains("    protocol tcp\n"));
    assert!(block(&vector(&udp), "[sinks.out]").contains("mode = \"udp\""));
    assert!(block(&vector(&bare), "[sinks.out]").contains("mode = \"tcp\""));

    let old = Options {
        use_old_remote_syslog_plugin: true,
        ..Default::default()
    };
    let text = compile_with(&udp, &Secrets::new(), &old, Dialect::Fluentd).unwrap();
    assert!(label(&text, "@OUT").contains("    @type syslog\n"));
    let text = compile_with(&bare, &Secrets::new(), &old, Dialect::Fluentd).unwrap();
    assert!(label(&text, "@OUT").contains("    @type syslog_buffered\n"));
}

// =========================================================================
// Authentication from secrets
// =========================================================================

const HTTP_WITH_SECRET: &str =
    "type = \"http\"\nurl = \"https://h.example.com\"\nsecret = { name = \"creds\" }";

#[test]
fn username_and_password_give_basic_auth() {
    let secrets = secret("creds", &[("username", "u"), ("password", "p")]);
    let toml = single_output(HTTP_WITH_SECRET);

    let text = compile_with(&toml, &secrets, &Options::default(), Dialect::Vector).unwrap();
    let auth = block(&text, "[sinks.out.auth]");
    assert!(auth.contains("strategy = \"basic\"\nuser = \"u\"\npassword = \"p\""));

    let text = compile_with(&toml, &secrets, &Options::default(), Dialect::Fluentd).unwrap();
    assert!(label(&text, "@OUT").contains("    <auth>\n      method basic\n"));
}

#[test]
fn half_a_credential_pair_is_rejected() {
    let toml = single_output(HTTP_WITH_SECRET);
    for pairs in [[("username", "u")], [("password", "p")]] {
        let secrets = secret("creds", &pairs);
        for dialect in DIALECTS {
            let err = compile_with(&toml, &secrets, &Options::default(), dialect).unwrap_err();
            assert_eq!(err.reason(), &CompileReason::SpecAuthConfiguration, "{dialect}");
        }
        let errors = check_spec(&spec(&toml), &secrets, &Options::default(), Dialect::Vector);
        assert_eq!(errors.len(), 1, "{errors:?}");
    }
}

#[test]
fn no_secret_means_no_auth() {
    let text = vector(&single_output("type = \"http\"\nurl = \"https://h.example.com\""));
    assert!(!text.contains("[sinks.out.auth]"));
    let text = fluentd(&single_output("type = \"http\"\nurl = \"https://h.example.com\""));
    assert!(!text.contains("<auth>"));
}
