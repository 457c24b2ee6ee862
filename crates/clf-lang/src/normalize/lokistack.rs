use std::collections::BTreeSet;

use clf_config::{
    DataModel, ForwarderSpec, InputKind, Loki, LokiStack, OutputSpec, OutputType, PipelineSpec,
};

use super::ref_kind;
use crate::labels::DEFAULT_LABEL_KEYS;

/// `https://{name}-gateway-http.{namespace}.svc:8080/api/logs/v1/{tenant}`
pub fn lokistack_url(stack: &LokiStack, tenant: InputKind) -> String {
    format!(
        "https://{}-gateway-http.{}.svc:8080/api/logs/v1/{}",
        stack.target.name, stack.target.namespace, tenant
    )
}

/// Label keys for one tenant: global keys (or the defaults, when only
/// tenants are customized) merged with the tenant's own, unless the tenant
/// ignores the global set. Sorted and unique; empty means "use defaults".
pub fn tenant_label_keys(stack: &LokiStack, tenant: InputKind) -> Vec<String> {
    let Some(lk) = &stack.label_keys else {
        return Vec::new();
    };
    let custom = lk.tenant(tenant);
    let global: Vec<String> = if lk.global.is_empty() && custom.is_some() {
        DEFAULT_LABEL_KEYS.iter().map(|k| k.to_string()).collect()
    } else {
        lk.global.clone()
    };
    let mut keys = match custom {
        Some(t) if t.ignore_global => t.label_keys.clone(),
        Some(t) => global.into_iter().chain(t.label_keys.iter().cloned()).collect(),
        None => global,
    };
    keys.sort();
    keys.dedup();
    keys
}

fn expandable(o: &OutputSpec) -> Option<&LokiStack> {
    if o.output_type != OutputType::LokiStack {
        return None;
    }
    o.lokistack
        .as_ref()
        .filter(|s| !s.target.name.is_empty() && !s.target.namespace.is_empty())
}

/// Replace every well-formed lokistack output with per-kind outputs and
/// split the pipelines that reference it by input kind. Malformed
/// lokistacks stay in place for the checker to report.
pub(super) fn expand(spec: &mut ForwarderSpec) {
    let stacks: Vec<OutputSpec> = spec
        .outputs
        .iter()
        .filter(|o| expandable(o).is_some())
        .cloned()
        .collect();
    if stacks.is_empty() {
        return;
    }
    let stack_names: BTreeSet<&str> = stacks.iter().map(|o| o.name.as_str()).collect();

    let mut routed: Vec<BTreeSet<InputKind>> = vec![BTreeSet::new(); stacks.len()];
    let mut pipelines = Vec::with_capacity(spec.pipelines.len());

    for p in &spec.pipelines {
        if !p.output_refs.iter().any(|r| stack_names.contains(r.as_str())) {
            pipelines.push(p.clone());
            continue;
        }

        // Group inputs by kind; refs that resolve nowhere ride with the first group.
        let mut groups: Vec<(Option<InputKind>, Vec<String>)> = Vec::new();
        for kind in InputKind::ALL {
            let refs: Vec<String> = p
                .input_refs
                .iter()
                .filter(|r| ref_kind(spec, r) == Some(kind))
                .cloned()
                .collect();
            if !refs.is_empty() {
                groups.push((Some(kind), refs));
            }
        }
        let unresolved: Vec<String> = p
            .input_refs
            .iter()
            .filter(|r| ref_kind(spec, r).is_none())
            .cloned()
            .collect();
        match groups.first_mut() {
            Some((_, refs)) => refs.extend(unresolved),
            None => groups.push((None, unresolved)),
        }

        for (gi, (kind, refs)) in groups.into_iter().enumerate() {
            let mut split = PipelineSpec {
                input_refs: refs,
                ..p.clone()
            };
            if gi > 0
                && let Some(k) = kind
            {
                split.name = Some(format!("{}-{}", p.name(), k));
            }
            if let Some(k) = kind {
                for r in split.output_refs.iter_mut() {
                    if let Some(si) = stacks.iter().position(|s| &s.name == r) {
                        routed[si].insert(k);
                        *r = format!("{r}-{k}");
                    }
                }
            }
            pipelines.push(split);
        }
    }

    spec.pipelines = pipelines;
    spec.outputs.retain(|o| expandable(o).is_none());

    for (stack_out, kinds) in stacks.iter().zip(&routed) {
        let Some(stack) = expandable(stack_out) else {
            continue;
        };
        for kind in InputKind::ALL.into_iter().filter(|k| kinds.contains(k)) {
            spec.outputs.push(synthetic_output(stack_out, stack, kind));
        }
    }
}

fn synthetic_output(orig: &OutputSpec, stack: &LokiStack, kind: InputKind) -> OutputSpec {
    let url = lokistack_url(stack, kind);
    let name = format!("{}-{}", orig.name, kind);
    let mut out = match stack.data_model {
        DataModel::Viaq => {
            let mut o = OutputSpec::new(name, OutputType::Loki).with_url(url);
            o.loki = Some(Loki {
                tenant_key: None,
                label_keys: tenant_label_keys(stack, kind),
            });
            o
        }
        DataModel::Otel => {
            OutputSpec::new(name, OutputType::Otlp).with_url(format!("{url}/otlp/v1/logs"))
        }
    };
    out.secret = orig.secret.clone();
    out.tls = orig.tls.clone();
    out.authentication = orig.authentication.clone();
    out.tuning = orig.tuning.clone();
    out
}
