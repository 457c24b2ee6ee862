//! Output labels, one module per store plugin.

mod buffer;
mod cloudwatch;
mod elasticsearch;
mod forward;
mod http;
mod kafka;
mod loki;
mod security;
mod syslog;

use clf_config::{Options, OutputSpec, OutputType, Secrets, Tuning};
use orion_error::StructError;
use serde::Serialize;

use crate::auth::AuthState;
use crate::error::{CompileError, CompileReason, CompileResult};
use crate::ir::{Element, Stage};

pub(super) use buffer::{BufferParams, buffer};
pub(super) use security::tls_version;

/// Everything an output label is built from.
#[derive(Debug)]
pub(crate) struct Store<'a> {
    pub output: &'a OutputSpec,
    /// The output label, e.g. `@ES_1`.
    pub id: String,
    /// `@id` of the store and its buffer directory.
    pub store_id: String,
    /// Pipeline labels feeding the output.
    pub inputs: Vec<String>,
    pub secrets: &'a Secrets,
    pub options: &'a Options,
    pub tuning: Option<&'a Tuning>,
    pub auth: AuthState,
}

impl Store<'_> {
    /// A field the checker already demands, read back for rendering.
    pub fn required<'s>(&self, value: Option<&'s str>, field: &str) -> CompileResult<&'s str> {
        value.ok_or_else(|| {
            StructError::from(CompileReason::SpecRequiredField).with_detail(format!(
                "output `{}`: `{field}` is required",
                self.output.name
            ))
        })
    }

    pub fn endpoint_error(&self, e: anyhow::Error) -> CompileError {
        StructError::from(CompileReason::SpecRequiredField)
            .with_detail(format!("output `{}`: {e}", self.output.name))
    }

    /// The output label with `params` as its template data.
    pub fn label(&self, template: &'static str, params: impl Serialize) -> CompileResult<Element> {
        let mut el = Element::new(Stage::Sink, self.id.clone(), self.inputs.clone(), template, params)?;
        el.params["store_id"] = self.store_id.clone().into();
        Ok(el)
    }
}

/// The `<label>` holding an output's filters and store.
pub(crate) fn output_label(store: &Store<'_>) -> CompileResult<Element> {
    match &store.output.output_type {
        OutputType::Elasticsearch => elasticsearch::label(store),
        OutputType::FluentForward => forward::label(store),
        OutputType::Syslog => syslog::label(store),
        OutputType::Kafka => kafka::label(store),
        OutputType::Loki => loki::label(store),
        OutputType::Cloudwatch => cloudwatch::label(store),
        OutputType::Http => http::label(store),
        other => Err(StructError::from(CompileReason::SpecUnknownOutputType).with_detail(
            format!(
                "output `{}`: type `{other}` has no fluentd store",
                store.output.name
            ),
        )),
    }
}
