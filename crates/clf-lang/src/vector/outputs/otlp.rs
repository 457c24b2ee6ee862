use clf_config::InputKind;
use serde::Serialize;
use serde_json::json;

use super::{Extras, Sink, finish};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::template::quote;
use crate::vector::common::{compression, is_secure};
use crate::vector::sources::remap;
use crate::vector::templates::{PART_OTLP_PROTOCOL, ROUTE, SINK_OTLP};

const RESOURCE_LOGS: &str = r#"r = {}
r.resource.attributes = [
  {"key": "k8s.namespace.name", "value": {"stringValue": .kubernetes.namespace_name}},
  {"key": "k8s.pod.name", "value": {"stringValue": .kubernetes.pod_name}},
  {"key": "k8s.container.name", "value": {"stringValue": .kubernetes.container_name}},
  {"key": "k8s.node.name", "value": {"stringValue": .hostname}},
  {"key": "openshift.log.type", "value": {"stringValue": .log_type}},
  {"key": "openshift.log.source", "value": {"stringValue": .log_source}}
]
r.scopeLogs = [{"logRecords": [{
  "timeUnixNano": to_string(to_unix_timestamp(timestamp(."@timestamp") ?? now(), unit: "nanoseconds")),
  "severityText": .level,
  "body": {"stringValue": .message}
}]}]
. = r"#;

#[derive(Serialize)]
struct Branch {
    name: &'static str,
    condition: String,
}

#[derive(Serialize)]
struct ProtocolParams<'a> {
    table: String,
    uri: &'a str,
    payload_prefix: &'static str,
    compression: Option<String>,
}

/// Route condition for one kind, narrowed to the configured log sources.
fn kind_condition(kind: InputKind, sources: Option<&Vec<String>>) -> String {
    let base = format!(".log_type == {}", quote(kind.as_str()));
    match sources.filter(|s| !s.is_empty()) {
        Some(sources) => {
            let list: Vec<String> = sources.iter().map(|s| quote(s)).collect();
            format!("{base} && includes([{}], .log_source)", list.join(", "))
        }
        None => base,
    }
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let branches: Vec<Branch> = sink
        .kinds
        .iter()
        .map(|&kind| Branch {
            name: kind.as_str(),
            condition: kind_condition(kind, sink.options.otlp_log_sources.get(kind.as_str())),
        })
        .collect();
    let reroute_id = sink.child("reroute");
    let streams: Vec<String> = branches
        .iter()
        .map(|b| format!("{reroute_id}.{}", b.name))
        .collect();
    let reroute = Element::new(
        Stage::Transform,
        reroute_id,
        inputs,
        ROUTE,
        json!({ "routes": branches }),
    )?;
    let resource_logs = remap(sink.child("resource_logs"), streams, None, RESOURCE_LOGS)?;

    let url = sink.output.url();
    let protocol_table = format!("{}.protocol", sink.table());
    let el = Element::new(
        Stage::Sink,
        &sink.id,
        vec![resource_logs.id.clone()],
        SINK_OTLP,
        json!({}),
    )?
    .part(
        PART_OTLP_PROTOCOL,
        ProtocolParams {
            table: sink.table(),
            uri: url,
            payload_prefix: r#"{"resourceLogs":"#,
            compression: compression(sink.output),
        },
    )?;
    let mut extras = Extras::new(sink, is_secure(url))
        .with_auth(protocol_table.clone())
        .with_request(protocol_table.clone());
    extras.tls = sink.tls(protocol_table, is_secure(url), false);
    Ok(vec![reroute, resource_logs, finish(el, sink, extras)?])
}
