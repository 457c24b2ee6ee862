use serde::Serialize;
use serde_json::json;

use super::{Extras, Sink, finish};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::vector::common::{compression, is_secure};
use crate::vector::sources::remap;
use crate::vector::templates::{PART_ENCODING, SINK_HTTP};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

const NORMALIZE_HTTP: &str = r#"del(.file)
del(.source_type)"#;

#[derive(Serialize)]
struct HttpParams<'a> {
    uri: &'a str,
    method: String,
    compression: Option<String>,
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let http = sink.output.http.clone().unwrap_or_default();
    let normalize = remap(sink.child("normalize_http"), inputs, None, NORMALIZE_HTTP)?;

    let url = sink.output.url();
    let params = HttpParams {
        uri: url,
        method: http
            .method
            .as_deref()
            .map_or_else(|| "post".to_string(), str::to_ascii_lowercase),
        compression: compression(sink.output),
    };
    let el = Element::new(
        Stage::Sink,
        &sink.id,
        vec![normalize.id.clone()],
        SINK_HTTP,
        params,
    )?
    .part(PART_ENCODING, json!({ "table": sink.table(), "codec": "json" }))?;

    let mut extras = Extras::new(sink, is_secure(url))
        .with_auth(sink.table())
        .with_request(sink.table());
    extras.timeout_secs = Some(http.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
    extras.headers = http.headers;
    Ok(vec![normalize, finish(el, sink, extras)?])
}
