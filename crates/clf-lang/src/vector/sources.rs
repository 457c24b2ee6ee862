//! Raw log sources, their normalization and the per-kind input streams.

use std::collections::{BTreeMap, BTreeSet};

use clf_config::{AuditSource, ForwarderSpec, InfrastructureSource, InputKind, InputSpec};
use serde::Serialize;
use serde_json::json;

use super::component_id;
use super::templates::{
    FILTER, REMAP, ROUTE, SOURCE_FILE, SOURCE_JOURNALD, SOURCE_KUBERNETES_LOGS,
};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::normalize::whole_kind;
use crate::template::quote;

pub(super) const RAW_CONTAINER_LOGS: &str = "raw_container_logs";
pub(super) const RAW_JOURNAL_LOGS: &str = "raw_journal_logs";
pub(super) const CONTAINER_LOGS: &str = "container_logs";
pub(super) const DROP_JOURNAL_LOGS: &str = "drop_journal_logs";
pub(super) const JOURNAL_LOGS: &str = "journal_logs";
pub(super) const ROUTE_CONTAINER_LOGS: &str = "route_container_logs";
pub(super) const ROUTE_APPLICATION_LOGS: &str = "route_application_logs";

const CONTAINER_EXCLUDES: [&str; 4] = [
    "/var/log/pods/openshift-logging_collector-*/*/*.log",
    "/var/log/pods/openshift-logging_*/loki*/*.log",
    "/var/log/pods/*/*/*.gz",
    "/var/log/pods/*/*/*.tmp",
];

/// Audit file sources: (raw id, normalized id, description, paths, vrl).
const AUDIT_FILES: [(&str, &str, &str, &[&str], &str); 4] = [
    (
        "raw_host_audit_logs",
        "host_audit_logs",
        "Logs from linux audit",
        &["/var/log/audit/audit.log"],
        HOST_AUDIT_VRL,
    ),
    (
        "raw_k8s_audit_logs",
        "k8s_audit_logs",
        "Logs from kubernetes audit",
        &["/var/log/kube-apiserver/audit.log"],
        K8S_AUDIT_VRL,
    ),
    (
        "raw_openshift_audit_logs",
        "openshift_audit_logs",
        "Logs from openshift audit",
        &[
            "/var/log/oauth-apiserver/audit.log",
            "/var/log/openshift-apiserver/audit.log",
            "/var/log/oauth-server/audit.log",
        ],
        OPENSHIFT_AUDIT_VRL,
    ),
    (
        "raw_ovn_audit_logs",
        "ovn_audit_logs",
        "Logs from ovn audit",
        &["/var/log/ovn/acl-audit-log.log"],
        OVN_AUDIT_VRL,
    ),
];

const FIX_LEVEL: &str = r#"if !exists(.level) {
  .level = "default"
  if match!(.message, r'Error|ERROR|^E[0-9]+|level=error|"level":"error"') {
    .level = "error"
  } else if match!(.message, r'Warning|WARN|^W[0-9]+|level=warn|"level":"warn"') {
    .level = "warn"
  } else if match!(.message, r'Info|INFO|^I[0-9]+|level=info|"level":"info"') {
    .level = "info"
  } else if match!(.message, r'Debug|DEBUG|^D[0-9]+|level=debug|"level":"debug"') {
    .level = "debug"
  } else if match!(.message, r'Critical|CRITICAL|^C[0-9]+|level=critical') {
    .level = "critical"
  }
}"#;

const FIX_TIMESTAMP: &str = r#"ts = del(.timestamp); if !exists(."@timestamp") { ."@timestamp" = ts }"#;

const CONTAINER_VRL: &str = r#".log_source = "container"
del(.source_type)
del(.stream)
del(.kubernetes.pod_ips)"#;

const JOURNAL_VRL: &str = r#".log_source = "node"
.tag = ".journal.system"
del(.source_type)
.hostname = del(.host)
priority = to_int(.PRIORITY) ?? 6
.level = get(["emerg", "alert", "crit", "err", "warning", "notice", "info", "debug"], [priority]) ?? "unknown""#;

const HOST_AUDIT_VRL: &str = r#".log_source = "auditd"
.tag = ".linux-audit.log"
match1 = parse_regex(.message, r'type=(?P<type>[^ ]+)') ?? {}
."audit.linux" = {"type": match1.type}
.level = "default""#;

const K8S_AUDIT_VRL: &str = r#".log_source = "kubeAPI"
.tag = ".k8s-audit.log"
. = merge(., parse_json!(string!(.message))) ?? .
del(.message)
.k8s_audit_level = .level
.level = "default""#;

const OPENSHIFT_AUDIT_VRL: &str = r#".log_source = "openshiftAPI"
.tag = ".openshift-audit.log"
. = merge(., parse_json!(string!(.message))) ?? .
del(.message)
.openshift_audit_level = .level
.level = "default""#;

const OVN_AUDIT_VRL: &str = r#".log_source = "ovn"
.tag = ".ovn-audit.log""#;

const INFRA_NAMESPACES: &str = r#"starts_with!(.kubernetes.namespace_name,"kube-") || starts_with!(.kubernetes.namespace_name,"openshift-") || .kubernetes.namespace_name == "default" || .kubernetes.namespace_name == "openshift" || .kubernetes.namespace_name == "kube""#;

#[derive(Serialize)]
struct Remap<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    desc: Option<&'a str>,
    vrl: String,
}

pub(super) fn remap(
    id: impl Into<String>,
    inputs: Vec<String>,
    desc: Option<&str>,
    vrl: impl Into<String>,
) -> CompileResult<Element> {
    Element::new(
        Stage::Transform,
        id,
        inputs,
        REMAP,
        Remap { desc, vrl: vrl.into() },
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn needs_container(kinds: &BTreeSet<InputKind>) -> bool {
    kinds.contains(&InputKind::Application) || kinds.contains(&InputKind::Infrastructure)
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

pub(super) fn raw_sources(kinds: &BTreeSet<InputKind>) -> CompileResult<Vec<Element>> {
    let mut out = Vec::new();
    if needs_container(kinds) {
        out.push(Element::new(
            Stage::Source,
            RAW_CONTAINER_LOGS,
            vec![],
            SOURCE_KUBERNETES_LOGS,
            json!({ "exclude": CONTAINER_EXCLUDES }),
        )?);
    }
    if kinds.contains(&InputKind::Infrastructure) {
        out.push(Element::new(
            Stage::Source,
            RAW_JOURNAL_LOGS,
            vec![],
            SOURCE_JOURNALD,
            json!({}),
        )?);
    }
    if kinds.contains(&InputKind::Audit) {
        for (raw, _, desc, include, _) in AUDIT_FILES {
            out.push(Element::new(
                Stage::Source,
                raw,
                vec![],
                SOURCE_FILE,
                json!({ "desc": desc, "include": include }),
            )?);
        }
    }
    Ok(out)
}

pub(super) fn normalization(kinds: &BTreeSet<InputKind>) -> CompileResult<Vec<Element>> {
    let mut out = Vec::new();
    if needs_container(kinds) {
        let vrl = [CONTAINER_VRL, FIX_LEVEL, FIX_TIMESTAMP].join("\n");
        out.push(remap(CONTAINER_LOGS, strings(&[RAW_CONTAINER_LOGS]), None, vrl)?);
    }
    if kinds.contains(&InputKind::Infrastructure) {
        out.push(Element::new(
            Stage::Transform,
            DROP_JOURNAL_LOGS,
            strings(&[RAW_JOURNAL_LOGS]),
            FILTER,
            json!({ "condition": r#".PRIORITY != "7" && .PRIORITY != 7"# }),
        )?);
        let vrl = [JOURNAL_VRL, FIX_TIMESTAMP].join("\n");
        out.push(remap(JOURNAL_LOGS, strings(&[DROP_JOURNAL_LOGS]), None, vrl)?);
    }
    if kinds.contains(&InputKind::Audit) {
        for (raw, id, _, _, vrl) in AUDIT_FILES {
            out.push(remap(id, strings(&[raw]), None, vrl)?);
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Branch {
    name: String,
    condition: String,
}

fn route(id: &str, inputs: Vec<String>, branches: Vec<Branch>) -> CompileResult<Element> {
    Element::new(
        Stage::Transform,
        id,
        inputs,
        ROUTE,
        json!({ "routes": branches }),
    )
}

/// Reserved kind streams, the application selector router and the
/// source filters of infrastructure and audit user inputs.
pub(super) fn inputs(
    spec: &ForwarderSpec,
    kinds: &BTreeSet<InputKind>,
) -> CompileResult<Vec<Element>> {
    let mut out = Vec::new();
    if needs_container(kinds) {
        let mut branches = Vec::new();
        if kinds.contains(&InputKind::Application) {
            branches.push(Branch {
                name: "app".into(),
                condition: format!("!({INFRA_NAMESPACES})"),
            });
        }
        if kinds.contains(&InputKind::Infrastructure) {
            branches.push(Branch {
                name: "infra".into(),
                condition: INFRA_NAMESPACES.into(),
            });
        }
        out.push(route(ROUTE_CONTAINER_LOGS, strings(&[CONTAINER_LOGS]), branches)?);
    }

    for kind in InputKind::ALL {
        if !kinds.contains(&kind) {
            continue;
        }
        let (inputs, extra) = match kind {
            InputKind::Application => (vec![format!("{ROUTE_CONTAINER_LOGS}.app")], ""),
            InputKind::Infrastructure => (
                vec![format!("{ROUTE_CONTAINER_LOGS}.infra"), JOURNAL_LOGS.to_string()],
                "",
            ),
            InputKind::Audit => (
                AUDIT_FILES.iter().map(|f| f.1.to_string()).collect(),
                "\n.hostname = get_env_var(\"VECTOR_SELF_NODE_NAME\") ?? \"\"",
            ),
        };
        let desc = format!("Set log_type to \"{kind}\"");
        let vrl = format!(".log_type = \"{kind}\"{extra}");
        out.push(remap(kind.as_str(), inputs, Some(&desc), vrl)?);
    }

    let selectors: Vec<Branch> = selector_inputs(spec)
        .map(|input| Branch {
            name: component_id(&input.name),
            condition: app_condition(input),
        })
        .collect();
    if !selectors.is_empty() {
        out.push(route(
            ROUTE_APPLICATION_LOGS,
            strings(&[InputKind::Application.as_str()]),
            selectors,
        )?);
    }

    for input in subset_inputs(spec) {
        let (Some(kind), Some(condition)) = (input.kind(), source_condition(input)) else {
            continue;
        };
        out.push(Element::new(
            Stage::Transform,
            component_id(&input.name),
            vec![kind.as_str().to_string()],
            FILTER,
            json!({ "condition": condition }),
        )?);
    }
    Ok(out)
}

/// The stream a pipeline reads for one of its input refs.
pub(super) fn stream_for(spec: &ForwarderSpec, input_ref: &str) -> String {
    match spec.input(input_ref) {
        Some(input) if input.has_app_selector() => {
            format!("{ROUTE_APPLICATION_LOGS}.{}", component_id(&input.name))
        }
        Some(input) if InputKind::from_name(input_ref).is_none() => match whole_kind(input) {
            Some(kind) => kind.as_str().to_string(),
            None => component_id(&input.name),
        },
        _ => input_ref.to_string(),
    }
}

/// User inputs some pipeline reads, each once, in pipeline order.
fn referenced_inputs(spec: &ForwarderSpec) -> impl Iterator<Item = &InputSpec> {
    let mut seen = BTreeSet::new();
    spec.pipelines
        .iter()
        .flat_map(|p| &p.input_refs)
        .filter_map(|r| spec.input(r))
        .filter(move |i| seen.insert(i.name.clone()))
}

fn selector_inputs(spec: &ForwarderSpec) -> impl Iterator<Item = &InputSpec> {
    let mut by_name: BTreeMap<&str, &InputSpec> = BTreeMap::new();
    for input in referenced_inputs(spec).filter(|i| i.has_app_selector()) {
        by_name.insert(&input.name, input);
    }
    by_name.into_values()
}

fn subset_inputs(spec: &ForwarderSpec) -> impl Iterator<Item = &InputSpec> {
    referenced_inputs(spec).filter(|i| {
        matches!(i.kind(), Some(InputKind::Infrastructure | InputKind::Audit))
            && whole_kind(i).is_none()
    })
}

/// `(ns == a || ns == b) && (label == v)`; either side may be absent.
fn app_condition(input: &InputSpec) -> String {
    let Some(app) = &input.application else {
        return "true".into();
    };
    let namespaces: Vec<String> = app
        .namespaces
        .iter()
        .map(|ns| format!(".kubernetes.namespace_name == {}", quote(ns)))
        .collect();
    let labels: Vec<String> = app
        .selector
        .iter()
        .flat_map(|s| &s.match_labels)
        .map(|(k, v)| format!(".kubernetes.labels.{} == {}", quote(k), quote(v)))
        .collect();
    [namespaces.join(" || "), labels.join(" && ")]
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(|c| format!("({c})"))
        .collect::<Vec<_>>()
        .join(" && ")
}

fn source_condition(input: &InputSpec) -> Option<String> {
    let names: Vec<&str> = match input.kind()? {
        InputKind::Infrastructure => input
            .infrastructure
            .as_ref()?
            .sources
            .iter()
            .map(|s| match s {
                InfrastructureSource::Container => "container",
                InfrastructureSource::Node => "node",
            })
            .collect(),
        InputKind::Audit => input
            .audit
            .as_ref()?
            .sources
            .iter()
            .map(|s| match s {
                AuditSource::Auditd => "auditd",
                AuditSource::KubeApi => "kubeAPI",
                AuditSource::OpenshiftApi => "openshiftAPI",
                AuditSource::Ovn => "ovn",
            })
            .collect(),
        InputKind::Application => return None,
    };
    let clauses: Vec<String> = names
        .into_iter()
        .map(|n| format!(".log_source == {}", quote(n)))
        .collect();
    (!clauses.is_empty()).then(|| clauses.join(" || "))
}
