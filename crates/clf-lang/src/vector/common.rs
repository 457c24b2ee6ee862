//! Parts shared by every sink chain.

use std::collections::BTreeMap;

use clf_config::secrets::{CLIENT_CERT_KEY, CLIENT_PRIVATE_KEY, PASSPHRASE, TRUSTED_CA_BUNDLE_KEY};
use clf_config::{DeliveryMode, Options, OutputSpec, OutputTuning, Secrets, secret_path};
use serde::Serialize;

use super::sources::remap;
use crate::auth::AuthState;
use crate::error::CompileResult;
use crate::ir::Element;
use crate::template::quote;

/// CA bundle trusted by outputs named `default-*`.
pub(super) const SERVICE_CA_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/service-ca.crt";

/// `buffer.max_size` of a disk buffer.
pub(super) const DISK_BUFFER_MAX_SIZE: u64 = 268_435_488;

const DEDOT: &str = r#".openshift.sequence = to_unix_timestamp(now(), unit: "nanoseconds")
if exists(.kubernetes.namespace_labels) {
  for_each(object!(.kubernetes.namespace_labels)) -> |key,value| {
    newkey = replace(key, r'[\./]', "_")
    .kubernetes.namespace_labels = set!(.kubernetes.namespace_labels,[newkey],value)
    if newkey != key {
      .kubernetes.namespace_labels = remove!(.kubernetes.namespace_labels,[key],true)
    }
  }
}
if exists(.kubernetes.labels) {
  for_each(object!(.kubernetes.labels)) -> |key,value| {
    newkey = replace(key, r'[\./]', "_")
    .kubernetes.labels = set!(.kubernetes.labels,[newkey],value)
    if newkey != key {
      .kubernetes.labels = remove!(.kubernetes.labels,[key],true)
    }
  }
}"#;

/// `N-remap` and `N-dedot`, the head of every sink chain.
pub(super) fn cleanup(id: &str, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let head = remap(format!("{id}-remap"), inputs, None, "del(.tag)")?;
    let dedot = remap(format!("{id}-dedot"), vec![head.id.clone()], None, DEDOT)?;
    Ok(vec![head, dedot])
}

pub(super) fn is_secure(url: &str) -> bool {
    let scheme = url.split_once("://").map(|(s, _)| s.to_ascii_lowercase());
    matches!(scheme.as_deref(), Some("https" | "tls" | "ssl" | "wss"))
}

// ---------------------------------------------------------------------------
// TLS
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub(super) struct TlsParams {
    pub table: String,
    pub enabled: bool,
    pub insecure: bool,
    pub min_tls_version: Option<String>,
    pub ciphersuites: Option<String>,
    pub key_file: Option<String>,
    pub crt_file: Option<String>,
    pub ca_file: Option<String>,
    pub key_pass: Option<String>,
}

impl TlsParams {
    fn is_empty(&self) -> bool {
        !self.enabled
            && !self.insecure
            && self.min_tls_version.is_none()
            && self.ciphersuites.is_none()
            && self.key_file.is_none()
            && self.crt_file.is_none()
            && self.ca_file.is_none()
            && self.key_pass.is_none()
    }
}

/// TLS settings of a secure endpoint. `default-*` outputs always trust the
/// service CA; other outputs read certificates from their secret.
pub(super) fn tls(
    output: &OutputSpec,
    secrets: &Secrets,
    options: &Options,
    table: String,
    secure: bool,
    enabled: bool,
) -> Option<TlsParams> {
    let mut params = TlsParams {
        table,
        enabled,
        ..Default::default()
    };
    if output.is_default() {
        params.ca_file = Some(SERVICE_CA_PATH.to_string());
    } else if !secure {
        return None;
    } else if let Some(name) = output.secret_name() {
        let file = |key: &str| secrets.has_key(name, key).then(|| secret_path(name, key));
        params.key_file = file(CLIENT_PRIVATE_KEY);
        params.crt_file = file(CLIENT_CERT_KEY);
        params.ca_file = file(TRUSTED_CA_BUNDLE_KEY);
        params.key_pass = secrets.value(name, PASSPHRASE).map(str::to_string);
    }
    params.insecure = output.insecure_skip_verify();
    params.min_tls_version = options.min_tls_version.clone();
    params.ciphersuites = options.ciphers_joined();
    (!params.is_empty()).then_some(params)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct AuthParams<'a> {
    table: String,
    strategy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
}

pub(super) fn auth(state: &AuthState, table: String) -> Option<AuthParams<'_>> {
    match state {
        AuthState::Basic { username, password } => Some(AuthParams {
            table,
            strategy: "basic",
            user: Some(username),
            password: Some(password),
            token: None,
        }),
        AuthState::Bearer { .. } | AuthState::BearerFromServiceAccount { .. } => Some(AuthParams {
            table,
            strategy: "bearer",
            user: None,
            password: None,
            token: state.token(),
        }),
        AuthState::NoAuth | AuthState::Error(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct BufferParams {
    table: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    buffer_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_size: Option<u64>,
    when_full: &'static str,
}

pub(super) fn buffer(tuning: Option<&OutputTuning>, table: String) -> Option<BufferParams> {
    match tuning?.delivery? {
        DeliveryMode::AtLeastOnce => Some(BufferParams {
            table,
            buffer_type: Some("disk"),
            max_size: Some(DISK_BUFFER_MAX_SIZE),
            when_full: "block",
        }),
        DeliveryMode::AtMostOnce => Some(BufferParams {
            table,
            buffer_type: None,
            max_size: None,
            when_full: "drop_newest",
        }),
    }
}

#[derive(Debug, Serialize)]
pub(super) struct BatchParams {
    table: String,
    max_bytes: u64,
}

pub(super) fn batch(tuning: Option<&OutputTuning>, table: String) -> Option<BatchParams> {
    let max = tuning?.max_write?;
    Some(BatchParams {
        table,
        max_bytes: max.as_bytes(),
    })
}

#[derive(Debug, Default, Serialize)]
pub(super) struct RequestParams {
    pub table: String,
    pub timeout_secs: Option<u64>,
    pub retry_initial_backoff_secs: Option<u64>,
    pub retry_max_duration_secs: Option<u64>,
    /// Pre-rendered inline table.
    pub headers: Option<String>,
}

pub(super) fn request(
    tuning: Option<&OutputTuning>,
    table: String,
    timeout_secs: Option<u64>,
    headers: &BTreeMap<String, String>,
) -> Option<RequestParams> {
    let params = RequestParams {
        table,
        timeout_secs,
        retry_initial_backoff_secs: tuning
            .and_then(|t| t.min_retry_duration)
            .map(|d| d.as_secs()),
        retry_max_duration_secs: tuning
            .and_then(|t| t.max_retry_duration)
            .map(|d| d.as_secs()),
        headers: (!headers.is_empty()).then(|| inline_table(headers)),
    };
    let empty = params.timeout_secs.is_none()
        && params.retry_initial_backoff_secs.is_none()
        && params.retry_max_duration_secs.is_none()
        && params.headers.is_none();
    (!empty).then_some(params)
}

pub(super) fn compression(output: &OutputSpec) -> Option<String> {
    output.tuning.as_ref().and_then(|t| t.compression.clone())
}

/// `{"k1" = "v1", "k2" = "v2"}` in key order.
pub(super) fn inline_table(map: &BTreeMap<String, String>) -> String {
    let pairs: Vec<String> = map
        .iter()
        .map(|(k, v)| format!("{} = {}", quote(k), quote(v)))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

// ---------------------------------------------------------------------------
// Templated values
// ---------------------------------------------------------------------------

/// Turn `foo-{.a.b||"none"}` into the VRL expression
/// `"foo-" + to_string!(.a.b||"none")`. Text without braces becomes a
/// string literal.
pub(super) fn vrl_template(template: &str) -> String {
    let mut parts = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open..].find('}') else {
            break;
        };
        if open > 0 {
            parts.push(quote(&rest[..open]));
        }
        let expr = rest[open + 1..open + len].trim();
        parts.push(format!("to_string!({expr})"));
        rest = &rest[open + len + 1..];
    }
    if !rest.is_empty() || parts.is_empty() {
        parts.push(quote(rest));
    }
    parts.join(" + ")
}

pub(super) fn is_template(value: &str) -> bool {
    value
        .find('{')
        .is_some_and(|open| value[open..].contains('}'))
}
