use clf_config::secrets::{CLIENT_CERT_KEY, CLIENT_PRIVATE_KEY, PASSPHRASE, TRUSTED_CA_BUNDLE_KEY};
use serde::Serialize;

use super::security::Settings;
use super::{BufferParams, Store, buffer};
use crate::endpoint::{SyslogTransport, host_port};
use crate::error::CompileResult;
use crate::fluentd::templates::LABEL_SYSLOG;
use crate::ir::Element;

const DEFAULT_PORT: u16 = 514;
const DEFAULT_FACILITY: &str = "user";
const DEFAULT_SEVERITY: &str = "debug";

#[derive(Serialize)]
struct SyslogParams {
    host: String,
    port: u16,
    add_log_source: bool,
    old_plugin: Option<&'static str>,
    rfc: &'static str,
    facility: String,
    severity: String,
    appname: Option<String>,
    msgid: Option<String>,
    procid: Option<String>,
    program: Option<String>,
    protocol: &'static str,
    payload_key: Option<String>,
    settings: Settings,
    buffer: BufferParams,
}

/// A record path such as `$.kubernetes.namespace_name`.
fn is_key_expr(value: &str) -> bool {
    value.strip_prefix('$').is_some_and(|path| {
        path.starts_with('.')
            && path
                .split('.')
                .skip(1)
                .all(|seg| seg.chars().all(|c| c.is_alphanumeric() || c == '_'))
    })
}

/// Contains a tag part placeholder such as `${tag[0]}` or `${tag[-1]}`.
fn is_tag_expr(value: &str) -> bool {
    value.match_indices("${tag[").any(|(i, m)| {
        let rest = &value[i + m.len()..];
        let rest = rest.strip_prefix('-').unwrap_or(rest);
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        digits > 0 && rest[digits..].starts_with("]}")
    })
}

fn add_key(keys: &mut Vec<String>, key: &str) {
    if !keys.iter().any(|k| k == key) {
        keys.push(key.to_string());
    }
}

/// A header value. Record paths (`$.a.b`) and the event tag become
/// placeholders, and every placeholder needs a buffer chunk key.
fn header(value: &str, keys: &mut Vec<String>) -> String {
    if is_key_expr(value) {
        add_key(keys, value);
        format!("${{{value}}}")
    } else if value == "tag" {
        add_key(keys, "tag");
        "${tag}".to_string()
    } else {
        if is_tag_expr(value) {
            add_key(keys, "tag");
        }
        value.to_string()
    }
}

fn field(value: Option<&str>, keys: &mut Vec<String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(|v| header(v, keys))
}

pub(super) fn label(store: &Store<'_>) -> CompileResult<Element> {
    let raw = store.output.url();
    let (host, port) = host_port(raw).map_err(|e| store.endpoint_error(e))?;
    let transport = SyslogTransport::from_url(raw);
    let sys = store.output.syslog.clone().unwrap_or_default();

    let mut keys = Vec::new();
    let appname = field(sys.app_name.as_deref(), &mut keys);
    let msgid = field(sys.msg_id.as_deref(), &mut keys);
    let procid = field(sys.proc_id.as_deref(), &mut keys);
    let program = field(sys.tag.as_deref(), &mut keys);
    let facility = field(sys.facility.as_deref(), &mut keys)
        .unwrap_or_else(|| DEFAULT_FACILITY.to_string());
    let severity = field(sys.severity.as_deref(), &mut keys)
        .unwrap_or_else(|| DEFAULT_SEVERITY.to_string());

    let mut settings = Settings::new();
    if transport == SyslogTransport::Tls {
        settings
            .push("tls", "true")
            .push_opt("ca_file", store.secret_file(TRUSTED_CA_BUNDLE_KEY))
            .push_opt("client_cert_path", store.secret_file(CLIENT_CERT_KEY))
            .push_opt("private_key_path", store.secret_file(CLIENT_PRIVATE_KEY))
            .push_opt("private_key_passphrase", store.secret_expr(PASSPHRASE));
        if store.output.insecure_skip_verify() {
            settings.push("verify_mode", "0");
        }
    }

    let old_plugin = store
        .options
        .use_old_remote_syslog_plugin
        .then(|| transport.old_plugin());
    tracing::trace!(
        output = %store.output.name,
        protocol = transport.protocol(),
        old_plugin = old_plugin.is_some(),
        "syslog store"
    );

    store.label(
        LABEL_SYSLOG,
        SyslogParams {
            host,
            port: port.unwrap_or(DEFAULT_PORT),
            add_log_source: sys.add_log_source,
            old_plugin,
            rfc: sys.rfc.unwrap_or_default().as_str(),
            facility,
            severity,
            appname,
            msgid,
            procid,
            program,
            protocol: transport.protocol(),
            payload_key: sys.payload_key,
            settings,
            buffer: buffer(&store.store_id, store.tuning, "1s", keys),
        },
    )
}
