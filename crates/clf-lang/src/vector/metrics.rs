//! The collector's own metrics, exported for scraping.

use clf_config::Options;
use serde_json::json;

use super::common::TlsParams;
use super::sources::remap;
use super::templates::{PART_TLS, SINK_PROMETHEUS, SOURCE_INTERNAL_METRICS};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};

pub(super) const INTERNAL_METRICS: &str = "internal_metrics";
pub(super) const ADD_NODENAME: &str = "add_nodename_to_metric";
pub(super) const PROMETHEUS_OUTPUT: &str = "prometheus_output";
const METRICS_ADDRESS: &str = "[::]:24231";
const METRICS_KEY_FILE: &str = "/etc/collector/metrics/tls.key";
const METRICS_CRT_FILE: &str = "/etc/collector/metrics/tls.crt";

pub(super) fn metrics(options: &Options) -> CompileResult<Vec<Element>> {
    let source = Element::new(
        Stage::Source,
        INTERNAL_METRICS,
        vec![],
        SOURCE_INTERNAL_METRICS,
        json!({}),
    )?;
    let nodename = remap(
        ADD_NODENAME,
        vec![INTERNAL_METRICS.to_string()],
        None,
        r#".tags.hostname = get_env_var!("VECTOR_SELF_NODE_NAME")"#,
    )?;
    let tls = TlsParams {
        table: format!("sinks.{PROMETHEUS_OUTPUT}"),
        enabled: true,
        min_tls_version: options.min_tls_version.clone(),
        ciphersuites: options.ciphers_joined(),
        key_file: Some(METRICS_KEY_FILE.to_string()),
        crt_file: Some(METRICS_CRT_FILE.to_string()),
        ..Default::default()
    };
    let sink = Element::new(
        Stage::Sink,
        PROMETHEUS_OUTPUT,
        vec![ADD_NODENAME.to_string()],
        SINK_PROMETHEUS,
        json!({ "address": METRICS_ADDRESS }),
    )?
    .part(PART_TLS, tls)?;
    Ok(vec![source, nodename, sink])
}
