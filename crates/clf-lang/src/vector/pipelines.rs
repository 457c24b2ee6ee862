//! One remap per pipeline, and the console sinks of debug mode.

use clf_config::{ForwarderSpec, ParseFormat, PipelineSpec};
use serde_json::json;

use super::component_id;
use super::sources::{remap, stream_for};
use super::templates::SINK_CONSOLE;
use crate::error::{CompileResult, internal};
use crate::ir::{Element, Stage};

const PARSE_JSON: &str = r#"if .log_type == "application" {
  parsed, err = parse_json(string!(.message))
  if err == null {
    .structured = parsed
  }
}"#;

pub(super) fn pipelines(spec: &ForwarderSpec) -> CompileResult<Vec<Element>> {
    spec.pipelines
        .iter()
        .map(|p| {
            let mut inputs: Vec<String> = Vec::new();
            for r in &p.input_refs {
                let stream = stream_for(spec, r);
                if !inputs.contains(&stream) {
                    inputs.push(stream);
                }
            }
            remap(component_id(p.name()), inputs, None, pipeline_vrl(p)?)
        })
        .collect()
}

fn pipeline_vrl(p: &PipelineSpec) -> CompileResult<String> {
    let mut lines = Vec::new();
    if !p.labels.is_empty() {
        let labels = serde_json::to_string(&p.labels)
            .map_err(|e| internal(format!("pipeline `{}` labels: {e}", p.name())))?;
        lines.push(format!(".openshift.labels = {labels}"));
    }
    if p.parse == Some(ParseFormat::Json) {
        lines.push(PARSE_JSON.to_string());
    }
    if lines.is_empty() {
        lines.push(".".to_string());
    }
    Ok(lines.join("\n"))
}

/// `<pipeline>_debug`: a json console sink reading the pipeline remap.
pub(super) fn debug_sinks(spec: &ForwarderSpec) -> CompileResult<Vec<Element>> {
    spec.pipelines
        .iter()
        .map(|p| {
            let id = component_id(p.name());
            Element::new(
                Stage::Sink,
                format!("{id}_debug"),
                vec![id],
                SINK_CONSOLE,
                json!({}),
            )
        })
        .collect()
}
