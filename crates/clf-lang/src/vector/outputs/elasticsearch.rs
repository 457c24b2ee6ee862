use clf_config::Elasticsearch;
use serde::Serialize;

use super::{Extras, Sink, finish};
use crate::auth::AuthState;
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::labels::label_path;
use crate::template::quote;
use crate::vector::common::{compression, is_secure};
use crate::vector::sources::remap;
use crate::vector::templates::SINK_ELASTICSEARCH;

/// Bulk requests wait for the cluster rather than time out.
const REQUEST_TIMEOUT_SECS: u64 = 2_147_483_648;

const ADD_ES_INDEX: &str = r#"index = "default"
if (.log_type == "application"){
  index = "app"
}
if (.log_type == "infrastructure"){
  index = "infra"
}
if (.log_type == "audit"){
  index = "audit"
}
.write_index = index + "-write"
._id = encode_base64(uuid_v4())
del(.file)
del(.source_type)"#;

#[derive(Serialize)]
struct EsParams<'a> {
    endpoints: [&'a str; 1],
    index: &'static str,
    api_version: Option<String>,
    suppress_type_name: bool,
    compression: Option<String>,
}

/// Structured application records go to `app-<key value | name>-write`.
fn structured_index(es: &Elasticsearch) -> Option<String> {
    if !es.wants_structured_index() {
        return None;
    }
    let mut lines = vec![r#"if .log_type == "application" && .structured != null {"#.to_string()];
    lines.push(r#"  val = """#.to_string());
    if let Some(key) = &es.structured_type_key {
        let path = label_path(key.trim_start_matches('.'), false);
        lines.push(format!("  val = to_string(.{path}) ?? \"\""));
    }
    if let Some(name) = &es.structured_type_name {
        lines.push(format!("  if val == \"\" {{\n    val = {}\n  }}", quote(name)));
    }
    lines.push(r#"  if val != "" {"#.to_string());
    lines.push(r#"    .write_index = "app-" + val + "-write""#.to_string());
    lines.push("  }".to_string());
    lines.push("}".to_string());
    Some(lines.join("\n"))
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let es = sink.output.elasticsearch.clone().unwrap_or_default();
    let mut vrl = ADD_ES_INDEX.to_string();
    if let Some(extra) = structured_index(&es) {
        vrl.push('\n');
        vrl.push_str(&extra);
    }
    let add_index = remap(sink.child("add_es_index"), inputs, None, vrl)?;

    let url = sink.output.url();
    let params = EsParams {
        endpoints: [url],
        index: "{{ write_index }}",
        api_version: es.version.map(|v| format!("v{v}")),
        suppress_type_name: es.suppress_type_name(),
        compression: compression(sink.output),
    };
    let el = Element::new(
        Stage::Sink,
        &sink.id,
        vec![add_index.id.clone()],
        SINK_ELASTICSEARCH,
        params,
    )?;

    let mut extras = Extras::new(sink, is_secure(url)).with_request(sink.table());
    extras.timeout_secs = Some(REQUEST_TIMEOUT_SECS);
    // Bearer tokens travel as a request header.
    match &sink.auth {
        AuthState::Basic { .. } => extras = extras.with_auth(sink.table()),
        state => {
            if let Some(token) = state.token() {
                extras
                    .headers
                    .insert("Authorization".into(), format!("Bearer {token}"));
            }
        }
    }
    Ok(vec![add_index, finish(el, sink, extras)?])
}
