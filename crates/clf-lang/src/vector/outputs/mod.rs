//! Sink chains, one module per output type.

mod azure;
mod cloudwatch;
mod elasticsearch;
mod gcl;
mod http;
mod kafka;
mod loki;
mod otlp;
mod splunk;
mod syslog;

use std::collections::{BTreeMap, BTreeSet};

use clf_config::{InputKind, Options, OutputSpec, OutputType, Secrets};
use orion_error::StructError;

use super::common::{self, TlsParams};
use super::templates::{PART_AUTH, PART_BATCH, PART_BUFFER, PART_REQUEST, PART_TLS};
use crate::auth::AuthState;
use crate::error::{CompileError, CompileReason, CompileResult};
use crate::ir::Element;

/// Everything a sink chain is built from.
#[derive(Debug)]
pub(crate) struct Sink<'a> {
    pub output: &'a OutputSpec,
    /// Component id of the sink itself; transforms are `<id>-<suffix>`.
    pub id: String,
    /// Pipeline components feeding the output.
    pub inputs: Vec<String>,
    pub kinds: BTreeSet<InputKind>,
    pub secrets: &'a Secrets,
    pub options: &'a Options,
    pub auth: AuthState,
}

impl Sink<'_> {
    pub fn child(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.id)
    }

    pub fn table(&self) -> String {
        format!("sinks.{}", self.id)
    }

    pub fn secret_value(&self, key: &str) -> Option<&str> {
        self.secrets.value(self.output.secret_name()?, key)
    }

    pub fn tls(&self, table: String, secure: bool, enabled: bool) -> Option<TlsParams> {
        common::tls(self.output, self.secrets, self.options, table, secure, enabled)
    }

    /// A field the checker already demands, read back for rendering.
    pub fn required<'s>(&self, value: Option<&'s str>, field: &str) -> CompileResult<&'s str> {
        value.ok_or_else(|| {
            StructError::from(CompileReason::SpecRequiredField).with_detail(format!(
                "output `{}`: `{field}` is required",
                self.output.name
            ))
        })
    }
}

/// How the shared parts attach to a sink element.
pub(super) struct Extras {
    pub tls: Option<TlsParams>,
    pub auth_table: Option<String>,
    pub request_table: Option<String>,
    pub timeout_secs: Option<u64>,
    pub headers: BTreeMap<String, String>,
}

impl Extras {
    pub fn new(sink: &Sink<'_>, secure: bool) -> Self {
        Self {
            tls: sink.tls(sink.table(), secure, false),
            auth_table: None,
            request_table: None,
            timeout_secs: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_auth(mut self, table: String) -> Self {
        self.auth_table = Some(table);
        self
    }

    pub fn with_request(mut self, table: String) -> Self {
        self.request_table = Some(table);
        self
    }
}

/// Append buffer, batch, request, tls and auth parts to a sink element.
pub(super) fn finish(el: Element, sink: &Sink<'_>, extras: Extras) -> CompileResult<Element> {
    let tuning = sink.output.tuning.as_ref();
    let request = extras.request_table.and_then(|table| {
        common::request(tuning, table, extras.timeout_secs, &extras.headers)
    });
    let auth = extras
        .auth_table
        .and_then(|table| common::auth(&sink.auth, table));
    el.maybe_part(PART_BUFFER, common::buffer(tuning, sink.table()))?
        .maybe_part(PART_BATCH, common::batch(tuning, sink.table()))?
        .maybe_part(PART_REQUEST, request)?
        .maybe_part(PART_TLS, extras.tls)?
        .maybe_part(PART_AUTH, auth)
}

pub(super) fn endpoint_error(output: &OutputSpec, e: anyhow::Error) -> CompileError {
    StructError::from(CompileReason::SpecRequiredField)
        .with_detail(format!("output `{}`: {e}", output.name))
}

/// `N-remap` → `N-dedot` → type transforms → sink `N` with its parts.
pub(crate) fn sink_chain(sink: &Sink<'_>) -> CompileResult<Vec<Element>> {
    let mut chain = common::cleanup(&sink.id, sink.inputs.clone())?;
    let upstream = vec![sink.child("dedot")];
    let rest = match &sink.output.output_type {
        OutputType::Loki => loki::build(sink, upstream)?,
        OutputType::Elasticsearch => elasticsearch::build(sink, upstream)?,
        OutputType::Kafka => kafka::build(sink, upstream)?,
        OutputType::Syslog => syslog::build(sink, upstream)?,
        OutputType::Cloudwatch => cloudwatch::build(sink, upstream)?,
        OutputType::Http => http::build(sink, upstream)?,
        OutputType::Splunk => splunk::build(sink, upstream)?,
        OutputType::AzureMonitor => azure::build(sink, upstream)?,
        OutputType::GoogleCloudLogging => gcl::build(sink, upstream)?,
        OutputType::Otlp => otlp::build(sink, upstream)?,
        other => {
            return Err(StructError::from(CompileReason::SpecUnknownOutputType).with_detail(
                format!(
                    "output `{}`: type `{other}` has no vector sink",
                    sink.output.name
                ),
            ));
        }
    };
    chain.extend(rest);
    Ok(chain)
}
