use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use clf_config::ForwarderSpec;

use crate::normalize::normalize;
use crate::routes::plan_routes;

/// Human-readable route map of a forwarder spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteExplanation {
    pub pipelines: Vec<PipelineExpl>,
    pub by_input: BTreeMap<String, BTreeSet<String>>,
    pub by_output: BTreeMap<String, BTreeSet<String>>,
    pub ordered_outputs: Vec<String>,
    /// Outputs the normalizer added, with the output they were expanded from.
    pub expanded: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineExpl {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// Normalize `spec` and describe where each input goes.
pub fn explain_routes(spec: &ForwarderSpec) -> RouteExplanation {
    let normalized = normalize(spec);
    let plan = plan_routes(&normalized);

    let pipelines = normalized
        .pipelines
        .iter()
        .map(|p| PipelineExpl {
            name: p.name().to_string(),
            inputs: p.input_refs.clone(),
            outputs: p.output_refs.clone(),
        })
        .collect();

    let declared: BTreeSet<&str> = spec.outputs.iter().map(|o| o.name.as_str()).collect();
    let expanded = normalized
        .outputs
        .iter()
        .filter(|o| !declared.contains(o.name.as_str()))
        .filter_map(|o| {
            spec.outputs
                .iter()
                .find(|orig| o.name.starts_with(&format!("{}-", orig.name)))
                .map(|orig| (o.name.clone(), orig.name.clone()))
        })
        .collect();

    RouteExplanation {
        pipelines,
        by_input: plan.by_input,
        by_output: plan.by_output,
        ordered_outputs: plan.ordered_outputs,
        expanded,
    }
}

fn join(items: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for RouteExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipelines:")?;
        for p in &self.pipelines {
            writeln!(f, "  {}: [{}] -> [{}]", p.name, join(&p.inputs), join(&p.outputs))?;
        }

        writeln!(f, "Inputs:")?;
        for (input, outputs) in &self.by_input {
            writeln!(f, "  {input} -> {}", join(outputs))?;
        }

        writeln!(f, "Outputs:")?;
        for name in &self.ordered_outputs {
            let inputs = self.by_output.get(name).map(join).unwrap_or_default();
            match self.expanded.iter().find(|(n, _)| n == name) {
                Some((_, from)) => writeln!(f, "  {name} <- {inputs}  [expanded from {from}]")?,
                None => writeln!(f, "  {name} <- {inputs}")?,
            }
        }
        Ok(())
    }
}
