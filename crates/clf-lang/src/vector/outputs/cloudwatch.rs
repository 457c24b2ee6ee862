use clf_config::secrets::{AWS_ACCESS_KEY_ID, AWS_ROLE_ARN, AWS_SECRET_ACCESS_KEY};
use clf_config::{Cloudwatch, GroupBy};
use serde::Serialize;

use super::{Extras, Sink, finish};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::template::quote;
use crate::vector::common::{compression, is_secure};
use crate::vector::sources::remap;
use crate::vector::templates::SINK_CLOUDWATCH;

#[derive(Serialize)]
struct CloudwatchParams<'a> {
    region: &'a str,
    compression: String,
    group_name: &'static str,
    stream_name: &'static str,
    access_key_id: Option<&'a str>,
    secret_access_key: Option<&'a str>,
    assume_role: Option<&'a str>,
    endpoint: Option<&'a str>,
}

/// VRL computing `.group_name` and `.stream_name` for every record.
fn group_and_streams(cw: &Cloudwatch) -> String {
    let prefix = cw
        .group_prefix
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| format!("{p}."))
        .unwrap_or_default();
    let app_group = match cw.group_by {
        GroupBy::LogType => quote(&format!("{prefix}application")),
        GroupBy::NamespaceName => {
            format!("( {} + .kubernetes.namespace_name ) ?? \"application\"", quote(&prefix))
        }
        GroupBy::NamespaceUuid => {
            format!("( {} + .kubernetes.namespace_id ) ?? \"application\"", quote(&prefix))
        }
    };
    format!(
        r#".group_name = "default"
.stream_name = "default"
if (.file != null) {{
  .file = "kubernetes" + replace!(.file, "/", ".")
  .stream_name = del(.file)
}}
if ( .log_type == "application") {{
  .group_name = {app_group}
}}
if ( .log_type == "audit") {{
  .group_name = {audit}
  .stream_name = ( "${{VECTOR_SELF_NODE_NAME}}" + .tag ) ?? .stream_name
}}
if ( .log_type == "infrastructure") {{
  .group_name = {infra}
  .stream_name = ( .hostname + "." + .stream_name ) ?? .stream_name
}}
if ( .tag == ".journal.system" ) {{
  .stream_name = ( .hostname + .tag ) ?? .stream_name
}}
del(.tag)
del(.source_type)"#,
        audit = quote(&format!("{prefix}audit")),
        infra = quote(&format!("{prefix}infrastructure")),
    )
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let cw = sink.output.cloudwatch.clone().unwrap_or_default();
    let normalize = remap(
        sink.child("normalize_group_and_streams"),
        inputs,
        None,
        group_and_streams(&cw),
    )?;

    let region = sink.required(cw.region.as_deref(), "region")?;
    let endpoint = sink.output.url.as_deref().filter(|u| !u.is_empty());
    let params = CloudwatchParams {
        region,
        compression: compression(sink.output).unwrap_or_else(|| "none".to_string()),
        group_name: "{{ group_name }}",
        stream_name: "{{ stream_name }}",
        access_key_id: sink.secret_value(AWS_ACCESS_KEY_ID),
        secret_access_key: sink.secret_value(AWS_SECRET_ACCESS_KEY),
        assume_role: sink.secret_value(AWS_ROLE_ARN),
        endpoint,
    };
    let el = Element::new(
        Stage::Sink,
        &sink.id,
        vec![normalize.id.clone()],
        SINK_CLOUDWATCH,
        params,
    )?;
    let secure = endpoint.is_none_or(is_secure);
    let extras = Extras::new(sink, secure).with_request(sink.table());
    Ok(vec![normalize, finish(el, sink, extras)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_prefix_and_namespace_grouping() {
        let cw = Cloudwatch {
            region: Some("us-east-1".into()),
            group_by: GroupBy::NamespaceName,
            group_prefix: Some("cluster-a".into()),
        };
        let vrl = group_and_streams(&cw);
        assert!(vrl.contains(r#".group_name = ( "cluster-a." + .kubernetes.namespace_name ) ?? "application""#));
        assert!(vrl.contains(r#".group_name = "cluster-a.audit""#));
        assert!(vrl.contains(r#"( "${VECTOR_SELF_NODE_NAME}" + .tag )"#));
    }
}
