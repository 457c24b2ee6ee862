//! Generator for the TOML dialect.
//!
//! The file is laid out as raw sources, their normalization, the reserved
//! kind streams and user input filters, one remap per pipeline, one sink
//! chain per output, and finally the collector's own metrics.

mod common;
mod metrics;
mod outputs;
mod pipelines;
mod sources;
mod templates;
#[cfg(test)]
mod tests;

use std::sync::OnceLock;

use clf_config::{ForwarderSpec, Options, Secrets};

use crate::auth::resolve_auth;
use crate::emit::render_arena;
use crate::error::{CompileResult, internal};
use crate::ir::ElementArena;
use crate::routes::{PlanRoutes, routed_kinds};
use crate::template::Engine;

/// Component ids the generator defines itself. Pipelines, outputs and user
/// inputs must not take them.
pub const RESERVED_IDS: [&str; 21] = [
    sources::RAW_CONTAINER_LOGS,
    sources::RAW_JOURNAL_LOGS,
    "raw_host_audit_logs",
    "raw_k8s_audit_logs",
    "raw_openshift_audit_logs",
    "raw_ovn_audit_logs",
    sources::CONTAINER_LOGS,
    sources::DROP_JOURNAL_LOGS,
    sources::JOURNAL_LOGS,
    "host_audit_logs",
    "k8s_audit_logs",
    "openshift_audit_logs",
    "ovn_audit_logs",
    sources::ROUTE_CONTAINER_LOGS,
    sources::ROUTE_APPLICATION_LOGS,
    "application",
    "infrastructure",
    "audit",
    metrics::INTERNAL_METRICS,
    metrics::ADD_NODENAME,
    metrics::PROMETHEUS_OUTPUT,
];

static ENGINE: OnceLock<Result<Engine, String>> = OnceLock::new();

pub(crate) fn engine() -> CompileResult<&'static Engine> {
    ENGINE
        .get_or_init(|| Engine::new(templates::TEMPLATES).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| internal(format!("vector templates: {e}")))
}

/// A name usable as a component id: anything outside `[A-Za-z0-9_-]`
/// becomes `_`.
pub fn component_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Render a normalized, checked spec.
pub fn generate(
    spec: &ForwarderSpec,
    plan: &PlanRoutes,
    secrets: &Secrets,
    options: &Options,
) -> CompileResult<String> {
    let arena = build(spec, plan, secrets, options)?;
    render_arena(engine()?, &arena)
}

pub(crate) fn build(
    spec: &ForwarderSpec,
    plan: &PlanRoutes,
    secrets: &Secrets,
    options: &Options,
) -> CompileResult<ElementArena> {
    let kinds = routed_kinds(spec);
    let mut arena = ElementArena::new();
    arena.extend(sources::raw_sources(&kinds)?)?;
    arena.extend(sources::normalization(&kinds)?)?;
    arena.extend(sources::inputs(spec, &kinds)?)?;
    arena.extend(pipelines::pipelines(spec)?)?;

    if options.debug {
        tracing::debug!(
            skipped = plan.ordered_outputs.len(),
            "debug mode: outputs replaced by console sinks"
        );
        arena.extend(pipelines::debug_sinks(spec)?)?;
        return Ok(arena);
    }

    for name in &plan.ordered_outputs {
        let output = spec
            .output(name)
            .ok_or_else(|| internal(format!("planned output `{name}` is not declared")))?;
        let auth = resolve_auth(output, secrets, options);
        tracing::debug!(output = %name, strategy = auth.strategy(), "sink chain");
        let sink = outputs::Sink {
            output,
            id: component_id(name),
            inputs: plan.pipelines_for(name).iter().map(|p| component_id(p)).collect(),
            kinds: plan.kinds_for(spec, name),
            secrets,
            options,
            auth,
        };
        arena.extend(outputs::sink_chain(&sink)?)?;
    }

    arena.extend(metrics::metrics(options)?)?;
    tracing::debug!(elements = arena.len(), "vector elements built");
    Ok(arena)
}
