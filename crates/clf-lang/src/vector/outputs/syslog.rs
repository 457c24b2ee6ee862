use serde::Serialize;
use serde_json::json;

use super::{Extras, Sink, endpoint_error, finish};
use crate::endpoint::{SyslogTransport, host_port};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::vector::sources::remap;
use crate::vector::templates::{PART_SYSLOG_ENCODING, SINK_SOCKET};

const DEFAULT_PORT: u16 = 514;

const PARSE_ENCODING: &str = r#"._internal.syslog.app_name = "-"
._internal.syslog.proc_id = "-"
if .log_source == "container" {
  ._internal.syslog.app_name = join([.kubernetes.namespace_name, .kubernetes.pod_name, .kubernetes.container_name], "_") ?? "-"
  ._internal.syslog.proc_id = to_string(.kubernetes.pod_id) ?? "-"
}
if .log_source == "node" {
  ._internal.syslog.app_name = to_string(.systemd.u.SYSLOG_IDENTIFIER) ?? "-"
  ._internal.syslog.proc_id = to_string(.systemd.t.PID) ?? "-"
}
if .log_type == "audit" {
  ._internal.syslog.app_name = .log_source
}"#;

#[derive(Serialize)]
struct EncodingParams {
    table: String,
    rfc: &'static str,
    facility: String,
    severity: String,
    app_name: Option<String>,
    msg_id: Option<String>,
    proc_id: Option<String>,
    tag: Option<String>,
    add_log_source: bool,
    payload_key: Option<String>,
}

/// `$.field` reads the record; anything else is a literal.
pub(crate) fn record_value(value: &str) -> String {
    match value.strip_prefix("$.") {
        Some(path) => format!("$$.message.{path}"),
        None => value.to_string(),
    }
}

fn value_or(value: Option<&String>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), |v| record_value(v))
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let syslog = sink.output.syslog.clone().unwrap_or_default();
    let url = sink.output.url();
    let transport = SyslogTransport::from_url(url);
    let (host, port) = host_port(url).map_err(|e| endpoint_error(sink.output, e))?;
    let address = format!("{host}:{}", port.unwrap_or(DEFAULT_PORT));

    let parse = remap(sink.child("parse_encoding"), inputs, None, PARSE_ENCODING)?;

    let encoding = EncodingParams {
        table: sink.table(),
        rfc: syslog.rfc.unwrap_or_default().as_str(),
        facility: value_or(syslog.facility.as_ref(), "user"),
        severity: value_or(syslog.severity.as_ref(), "informational"),
        app_name: Some(value_or(
            syslog.app_name.as_ref(),
            "$$.message._internal.syslog.app_name",
        )),
        msg_id: syslog.msg_id.as_deref().map(record_value),
        proc_id: Some(value_or(
            syslog.proc_id.as_ref(),
            "$$.message._internal.syslog.proc_id",
        )),
        tag: syslog.tag.as_deref().map(record_value),
        add_log_source: syslog.add_log_source,
        payload_key: syslog.payload_key.clone(),
    };
    let el = Element::new(
        Stage::Sink,
        &sink.id,
        vec![parse.id.clone()],
        SINK_SOCKET,
        json!({ "address": address, "mode": transport.protocol() }),
    )?
    .part(PART_SYSLOG_ENCODING, encoding)?;

    let secure = transport == SyslogTransport::Tls;
    let mut extras = Extras::new(sink, secure);
    extras.tls = sink.tls(sink.table(), secure, secure);
    Ok(vec![parse, finish(el, sink, extras)?])
}
