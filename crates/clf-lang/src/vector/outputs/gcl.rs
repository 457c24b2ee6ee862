use clf_config::secret_path;
use clf_config::secrets::GOOGLE_CREDENTIALS;
use serde::Serialize;
use serde_json::json;

use super::{Extras, Sink, finish};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::vector::templates::{PART_GCP_RESOURCE, SINK_GCP};

#[derive(Serialize)]
struct GcpParams<'a> {
    destination_key: &'static str,
    destination: &'a str,
    credentials_path: String,
    log_id: &'a str,
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let gcl = sink.output.google_cloud_logging.clone().unwrap_or_default();
    let destinations = gcl.destinations();
    let (destination_key, destination) = match destinations.first() {
        Some(&(k, v)) => (k, v),
        None => ("project_id", sink.required(None, "projectId")?),
    };
    let secret = sink.required(sink.output.secret_name(), "secret")?;
    let params = GcpParams {
        destination_key,
        destination,
        credentials_path: secret_path(secret, GOOGLE_CREDENTIALS),
        log_id: sink.required(gcl.log_id.as_deref(), "logId")?,
    };
    let el = Element::new(Stage::Sink, &sink.id, inputs, SINK_GCP, params)?.part(
        PART_GCP_RESOURCE,
        json!({ "table": sink.table(), "node_name": "{{hostname}}" }),
    )?;
    let extras = Extras::new(sink, true).with_request(sink.table());
    Ok(vec![finish(el, sink, extras)?])
}
