use clf_config::secrets::SPLUNK_HEC_TOKEN;
use serde::Serialize;
use serde_json::json;

use super::{Extras, Sink, finish};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::vector::common::{compression, is_secure};
use crate::vector::sources::remap;
use crate::vector::templates::{PART_ENCODING, SINK_SPLUNK};

const SPLUNK_METADATA: &str = r#"if !exists(.hostname) {
  .hostname = get_env_var("VECTOR_SELF_NODE_NAME") ?? ""
}
del(.file)"#;

#[derive(Serialize)]
struct SplunkParams<'a> {
    endpoint: &'a str,
    compression: String,
    default_token: &'a str,
    index: Option<String>,
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let splunk = sink.output.splunk.clone().unwrap_or_default();
    let metadata = remap(sink.child("splunk_metadata"), inputs, None, SPLUNK_METADATA)?;

    let index = match (&splunk.index_key, &splunk.index_name) {
        (Some(key), _) if !key.is_empty() => {
            Some(format!("{{{{ {} }}}}", key.trim_start_matches('.')))
        }
        (_, Some(name)) if !name.is_empty() => Some(name.clone()),
        _ => None,
    };
    let url = sink.output.url();
    let params = SplunkParams {
        endpoint: url,
        compression: compression(sink.output).unwrap_or_else(|| "none".to_string()),
        default_token: sink.required(sink.secret_value(SPLUNK_HEC_TOKEN), SPLUNK_HEC_TOKEN)?,
        index,
    };
    let el = Element::new(
        Stage::Sink,
        &sink.id,
        vec![metadata.id.clone()],
        SINK_SPLUNK,
        params,
    )?
    .part(PART_ENCODING, json!({ "table": sink.table(), "codec": "json" }))?;
    let extras = Extras::new(sink, is_secure(url)).with_request(sink.table());
    Ok(vec![metadata, finish(el, sink, extras)?])
}
