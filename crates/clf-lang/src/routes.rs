//! Route planning: the input/output route map and stable iteration orders.

use std::collections::{BTreeMap, BTreeSet};

use clf_config::{ForwarderSpec, InputKind};

use crate::normalize::ref_kind;

/// The route map of a normalized spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanRoutes {
    /// Input ref to every output it reaches.
    pub by_input: BTreeMap<String, BTreeSet<String>>,
    /// Output to every input ref routed to it.
    pub by_output: BTreeMap<String, BTreeSet<String>>,
    /// Pipeline names in spec order.
    pub ordered_pipelines: Vec<String>,
    /// Declared outputs that some pipeline references, in spec order.
    pub ordered_outputs: Vec<String>,
    /// Output to the pipelines feeding it, in pipeline order.
    pub pipelines_by_output: BTreeMap<String, Vec<String>>,
}

pub fn plan_routes(spec: &ForwarderSpec) -> PlanRoutes {
    let mut plan = PlanRoutes::default();
    for p in &spec.pipelines {
        let name = p.name().to_string();
        plan.ordered_pipelines.push(name.clone());
        for input in &p.input_refs {
            for output in &p.output_refs {
                plan.by_input
                    .entry(input.clone())
                    .or_default()
                    .insert(output.clone());
                plan.by_output
                    .entry(output.clone())
                    .or_default()
                    .insert(input.clone());
            }
        }
        for output in &p.output_refs {
            let feeders = plan.pipelines_by_output.entry(output.clone()).or_default();
            if !feeders.contains(&name) {
                feeders.push(name.clone());
            }
        }
    }
    plan.ordered_outputs = spec
        .outputs
        .iter()
        .filter(|o| plan.pipelines_by_output.contains_key(&o.name))
        .map(|o| o.name.clone())
        .collect();
    tracing::trace!(
        pipelines = plan.ordered_pipelines.len(),
        outputs = plan.ordered_outputs.len(),
        "routes planned"
    );
    plan
}

impl PlanRoutes {
    pub fn outputs_for(&self, input: &str) -> impl Iterator<Item = &str> {
        self.by_input.get(input).into_iter().flatten().map(String::as_str)
    }

    pub fn inputs_for(&self, output: &str) -> impl Iterator<Item = &str> {
        self.by_output.get(output).into_iter().flatten().map(String::as_str)
    }

    pub fn pipelines_for(&self, output: &str) -> &[String] {
        self.pipelines_by_output
            .get(output)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Reserved kinds routed to `output`.
    pub fn kinds_for(&self, spec: &ForwarderSpec, output: &str) -> BTreeSet<InputKind> {
        self.inputs_for(output)
            .filter_map(|i| ref_kind(spec, i))
            .collect()
    }
}

/// Reserved kinds any pipeline reads, directly or through a user input.
pub fn routed_kinds(spec: &ForwarderSpec) -> BTreeSet<InputKind> {
    spec.pipelines
        .iter()
        .flat_map(|p| &p.input_refs)
        .filter_map(|r| ref_kind(spec, r))
        .collect()
}
