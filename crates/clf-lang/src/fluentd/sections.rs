//! Fixed sections: system header, collector metrics, tail and journal
//! sources, `@CONCAT` and `@INGRESS`.

use clf_config::{InputKind, Options};
use serde::Serialize;
use serde_json::json;

use super::routing::{CONCAT, INGRESS, SourceRouting, kind_label};
use super::stores::tls_version;
use super::templates::{
    HEADER, LABEL_CONCAT, LABEL_INGRESS, SOURCE_AUDIT, SOURCE_CONTAINER, SOURCE_JOURNAL,
    SOURCE_METRICS,
};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};

pub(super) const CONTAINER_INPUT: &str = "container-input";
pub(super) const SYSTEMD_INPUT: &str = "systemd-input";

/// Tags of infrastructure events, container and node alike.
pub(super) const INFRA_TAGS: &str = "kubernetes.var.log.pods.openshift_** kubernetes.var.log.pods.openshift-*_** kubernetes.var.log.pods.default_** kubernetes.var.log.pods.kube-*_** journal.** system.var.log**";
pub(super) const APPLICATION_TAGS: &str = "kubernetes.**";
pub(super) const AUDIT_TAGS: &str =
    "linux-audit.log** k8s-audit.log** openshift-audit.log** ovn-audit.log**";

const CONTAINER_EXCLUDES: [&str; 8] = [
    "/var/log/pods/openshift-logging_collector-*/*/*.log",
    "/var/log/pods/openshift-logging_elasticsearch-*/*/*.log",
    "/var/log/pods/openshift-logging_kibana-*/*/*.log",
    "/var/log/pods/openshift-logging_*/loki*/*.log",
    "/var/log/pods/openshift-logging_*/gateway/*.log",
    "/var/log/pods/openshift-logging_*/opa/*.log",
    "/var/log/pods/*/*/*.gz",
    "/var/log/pods/*/*/*.tmp",
];

#[derive(Serialize)]
struct AuditTail {
    desc: &'static str,
    path: &'static str,
    pos_file: &'static str,
    tag: &'static str,
    parse: &'static str,
}

/// Audit tails by id.
const AUDIT_TAILS: [(&str, AuditTail); 4] = [
    (
        "audit-input",
        AuditTail {
            desc: "linux audit logs",
            path: "/var/log/audit/audit.log",
            pos_file: "/var/lib/fluentd/pos/audit.log.pos",
            tag: "linux-audit.log",
            parse: "viaq_host_audit",
        },
    ),
    (
        "k8s-audit-input",
        AuditTail {
            desc: "k8s audit logs",
            path: "/var/log/kube-apiserver/audit.log",
            pos_file: "/var/lib/fluentd/pos/kube-apiserver.audit.log.pos",
            tag: "k8s-audit.log",
            parse: "json",
        },
    ),
    (
        "openshift-audit-input",
        AuditTail {
            desc: "Openshift audit logs",
            path: "/var/log/oauth-apiserver/audit.log,/var/log/openshift-apiserver/audit.log",
            pos_file: "/var/lib/fluentd/pos/oauth-apiserver.audit.log",
            tag: "openshift-audit.log",
            parse: "json",
        },
    ),
    (
        "ovn-audit-input",
        AuditTail {
            desc: "Openshift Virtual Network (OVN) audit logs",
            path: "/var/log/ovn/acl-audit-log.log",
            pos_file: "/var/lib/fluentd/pos/acl-audit-log.pos",
            tag: "ovn-audit.log",
            parse: "none",
        },
    ),
];

/// Level detection of the viaq data model filter, most severe last.
const LEVELS: [(&str, &str); 5] = [
    ("warn", r#"Warning|WARN|^W[0-9]+|level=warn|Value:warn|"level":"warn""#),
    ("info", r#"Info|INFO|^I[0-9]+|level=info|Value:info|"level":"info""#),
    ("error", r#"Error|ERROR|^E[0-9]+|level=error|Value:error|"level":"error""#),
    ("critical", r#"Critical|CRITICAL|^C[0-9]+|level=critical|Value:critical|"level":"critical""#),
    ("debug", r#"Debug|DEBUG|^D[0-9]+|level=debug|Value:debug|"level":"debug""#),
];

pub(super) fn header() -> CompileResult<Element> {
    Element::new(Stage::Section, "system", vec![], HEADER, ())
}

/// Prometheus endpoints of the collector itself.
pub(super) fn metrics(options: &Options) -> CompileResult<Element> {
    let min_version = options
        .min_tls_version
        .as_deref()
        .and_then(|v| tls_version(v, "TLS"));
    let ciphers = (!options.ciphers.is_empty()).then(|| options.ciphers.join(":"));
    Element::new(
        Stage::Source,
        "metrics",
        vec![],
        SOURCE_METRICS,
        json!({ "min_version": min_version, "ciphers": ciphers }),
    )
}

/// Tails for every routed kind. The container tail serves application and
/// infrastructure; the journal and audit tails only their own kind.
pub(super) fn sources(routing: &SourceRouting) -> CompileResult<Vec<Element>> {
    let mut out = Vec::new();
    if routing.has(InputKind::Application) || routing.has(InputKind::Infrastructure) {
        out.push(Element::new(
            Stage::Source,
            CONTAINER_INPUT,
            vec![],
            SOURCE_CONTAINER,
            json!({ "exclude": CONTAINER_EXCLUDES, "label": CONCAT }),
        )?);
    }
    if routing.has(InputKind::Infrastructure) {
        out.push(Element::new(
            Stage::Source,
            SYSTEMD_INPUT,
            vec![],
            SOURCE_JOURNAL,
            json!({ "label": INGRESS }),
        )?);
    }
    if routing.has(InputKind::Audit) {
        for (id, tail) in &AUDIT_TAILS {
            let mut el = Element::new(Stage::Source, *id, vec![], SOURCE_AUDIT, tail)?;
            el.params["label"] = INGRESS.into();
            out.push(el);
        }
    }
    Ok(out)
}

#[derive(Serialize)]
struct IngressRoute {
    title: &'static str,
    tags: &'static str,
    label: Option<String>,
}

/// `@CONCAT` when the container tail exists, then `@INGRESS`, which
/// relabels each kind to its label and drops unrouted kinds.
pub(super) fn ingress(routing: &SourceRouting) -> CompileResult<Vec<Element>> {
    let mut out = Vec::new();
    let mut inputs = Vec::new();
    if routing.has(InputKind::Application) || routing.has(InputKind::Infrastructure) {
        out.push(Element::new(
            Stage::Section,
            CONCAT,
            vec![CONTAINER_INPUT.to_string()],
            LABEL_CONCAT,
            json!({ "next": INGRESS }),
        )?);
        inputs.push(CONCAT.to_string());
    }
    if routing.has(InputKind::Infrastructure) {
        inputs.push(SYSTEMD_INPUT.to_string());
    }
    if routing.has(InputKind::Audit) {
        inputs.extend(AUDIT_TAILS.iter().map(|(id, _)| id.to_string()));
    }

    let label = |kind: InputKind| routing.has(kind).then(|| kind_label(kind));
    // Infrastructure tags are a subset of the application ones and must
    // match first.
    let routes = [
        IngressRoute {
            title: "Infrastructure",
            tags: INFRA_TAGS,
            label: label(InputKind::Infrastructure),
        },
        IngressRoute {
            title: "Application",
            tags: APPLICATION_TAGS,
            label: label(InputKind::Application),
        },
        IngressRoute {
            title: "Audit",
            tags: AUDIT_TAGS,
            label: label(InputKind::Audit),
        },
    ];
    let levels: Vec<_> = LEVELS
        .iter()
        .map(|(name, pattern)| json!({ "name": name, "pattern": pattern }))
        .collect();
    out.push(Element::new(
        Stage::Section,
        INGRESS,
        inputs,
        LABEL_INGRESS,
        json!({ "routes": routes, "levels": levels }),
    )?);
    Ok(out)
}
