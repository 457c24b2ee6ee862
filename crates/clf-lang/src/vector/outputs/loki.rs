use clf_config::Loki;
use serde::Serialize;
use serde_json::json;

use super::{Extras, Sink, finish};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::labels::{KUBERNETES_HOST, label_keys, label_name, label_path};
use crate::vector::common::{compression, is_secure};
use crate::vector::sources::remap;
use crate::vector::templates::{PART_ENCODING, PART_LABELS, SINK_LOKI};

const REMAP_LABEL: &str = r#"if !exists(.kubernetes.namespace_name) {
  .kubernetes.namespace_name = ""
}
if !exists(.kubernetes.pod_name) {
  .kubernetes.pod_name = ""
}
if !exists(.kubernetes.container_name) {
  .kubernetes.container_name = ""
}"#;

#[derive(Serialize)]
struct LokiParams<'a> {
    endpoint: &'a str,
    tenant_id: Option<String>,
    compression: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct Label {
    pub name: String,
    pub value: String,
}

/// Stream labels: sanitized names, record templates as values.
pub(crate) fn labels(loki: Option<&Loki>) -> Vec<Label> {
    label_keys(loki)
        .into_iter()
        .map(|key| {
            let value = if key == KUBERNETES_HOST {
                "${VECTOR_SELF_NODE_NAME}".to_string()
            } else {
                format!("{{{{{}}}}}", label_path(&key, true))
            };
            Label {
                name: label_name(&key),
                value,
            }
        })
        .collect()
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let loki = sink.output.loki.as_ref();
    let remap_label = remap(sink.child("remap_label"), inputs, None, REMAP_LABEL)?;

    let tenant_id = loki
        .and_then(|l| l.tenant_key.as_deref())
        .filter(|k| !k.is_empty())
        .map(|k| format!("{{{{{k}}}}}"));
    let params = LokiParams {
        endpoint: sink.output.url(),
        tenant_id,
        compression: compression(sink.output),
    };
    let el = Element::new(
        Stage::Sink,
        &sink.id,
        vec![remap_label.id.clone()],
        SINK_LOKI,
        params,
    )?
    .part(PART_ENCODING, json!({ "table": sink.table(), "codec": "json" }))?
    .part(
        PART_LABELS,
        json!({ "table": sink.table(), "labels": labels(loki) }),
    )?;
    let extras = Extras::new(sink, is_secure(sink.output.url()))
        .with_auth(sink.table())
        .with_request(sink.table());
    Ok(vec![remap_label, finish(el, sink, extras)?])
}
