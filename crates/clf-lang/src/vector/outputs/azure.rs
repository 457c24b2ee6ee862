use clf_config::secrets::AZURE_SHARED_KEY;
use serde::Serialize;

use super::{Extras, Sink, finish};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::vector::templates::SINK_AZURE_MONITOR;

#[derive(Serialize)]
struct AzureParams<'a> {
    customer_id: &'a str,
    log_type: &'a str,
    shared_key: &'a str,
    azure_resource_id: Option<&'a str>,
    host: Option<&'a str>,
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let azure = sink.output.azure_monitor.clone().unwrap_or_default();
    let params = AzureParams {
        customer_id: sink.required(azure.customer_id.as_deref(), "customerId")?,
        log_type: sink.required(azure.log_type.as_deref(), "logType")?,
        shared_key: sink.required(sink.secret_value(AZURE_SHARED_KEY), AZURE_SHARED_KEY)?,
        azure_resource_id: azure.azure_resource_id.as_deref(),
        host: azure.host.as_deref(),
    };
    let el = Element::new(Stage::Sink, &sink.id, inputs, SINK_AZURE_MONITOR, params)?;
    let extras = Extras::new(sink, true).with_request(sink.table());
    Ok(vec![finish(el, sink, extras)?])
}
