//! Spec normalization: a pure rewrite producing the canonical working copy
//! that the checker, route planner and generators consume.

mod lokistack;
#[cfg(test)]
mod tests;

use clf_config::{AuditSource, ForwarderSpec, InfrastructureSource, InputKind, InputSpec};

pub use lokistack::{lokistack_url, tenant_label_keys};

/// Normalize a forwarder spec. `normalize(&normalize(s)) == normalize(s)`.
///
/// - unnamed pipelines become `pipeline_<index>`
/// - duplicate input/output refs are dropped, first occurrence wins
/// - refs to user inputs that select a whole reserved kind become refs to
///   that kind
/// - lokistack outputs expand into one output per routed kind
pub fn normalize(spec: &ForwarderSpec) -> ForwarderSpec {
    let mut out = spec.clone();

    for (i, p) in out.pipelines.iter_mut().enumerate() {
        if p.name.as_deref().is_none_or(str::is_empty) {
            p.name = Some(format!("pipeline_{i}"));
        }
    }

    for i in 0..out.pipelines.len() {
        let refs: Vec<String> = out.pipelines[i]
            .input_refs
            .iter()
            .map(|r| match spec.input(r) {
                Some(input) if InputKind::from_name(r).is_none() => {
                    whole_kind(input).map_or_else(|| r.clone(), |k| k.as_str().to_string())
                }
                _ => r.clone(),
            })
            .collect();
        let p = &mut out.pipelines[i];
        p.input_refs = dedup(refs);
        p.output_refs = dedup(std::mem::take(&mut p.output_refs));
    }

    lokistack::expand(&mut out);
    out
}

/// The reserved kind a user input stands for when it applies no filter.
pub fn whole_kind(input: &InputSpec) -> Option<InputKind> {
    let kind = input.kind()?;
    let unfiltered = match kind {
        InputKind::Application => !input.has_app_selector(),
        InputKind::Infrastructure => input.infrastructure.as_ref().is_some_and(|i| {
            i.sources.is_empty()
                || [InfrastructureSource::Container, InfrastructureSource::Node]
                    .iter()
                    .all(|s| i.sources.contains(s))
        }),
        InputKind::Audit => input.audit.as_ref().is_some_and(|a| {
            a.sources.is_empty()
                || [
                    AuditSource::Auditd,
                    AuditSource::KubeApi,
                    AuditSource::OpenshiftApi,
                    AuditSource::Ovn,
                ]
                .iter()
                .all(|s| a.sources.contains(s))
        }),
    };
    unfiltered.then_some(kind)
}

/// The reserved kind an input ref resolves to, if it resolves at all.
pub fn ref_kind(spec: &ForwarderSpec, name: &str) -> Option<InputKind> {
    InputKind::from_name(name).or_else(|| spec.input(name).and_then(InputSpec::kind))
}

fn dedup(refs: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    refs.into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect()
}
