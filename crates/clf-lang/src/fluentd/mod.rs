//! Generator for the label/match dialect.
//!
//! Events enter through the tail and journal sources, are concatenated and
//! enriched in `@INGRESS`, relabelled to one label per reserved kind, fanned
//! out to one label per pipeline and finally to one label per output, which
//! holds the store.

mod routing;
mod sections;
mod stores;
mod templates;
#[cfg(test)]
mod tests;

use std::sync::OnceLock;

use clf_config::{ForwarderSpec, Options, Secrets};

use crate::auth::resolve_auth;
use crate::emit::render_arena;
use crate::error::{CompileResult, internal};
use crate::ir::ElementArena;
use crate::routes::PlanRoutes;
use crate::template::{Engine, label_name};

pub use routing::RESERVED_LABELS;

static ENGINE: OnceLock<Result<Engine, String>> = OnceLock::new();

pub(crate) fn engine() -> CompileResult<&'static Engine> {
    ENGINE
        .get_or_init(|| Engine::new(templates::TEMPLATES).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| internal(format!("fluentd templates: {e}")))
}

/// Buffer directory and `@id` of an output's store: lower case, with `-`
/// and `.` replaced by `_`.
pub fn store_id(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if matches!(c, '-' | '.') { '_' } else { c })
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
    let routing = routing::SourceRouting::plan(spec, options);
    let mut arena = ElementArena::new();
    arena.push(sections::header()?)?;
    arena.push(sections::metrics(options)?)?;
    arena.extend(sections::sources(&routing)?)?;
    arena.extend(sections::ingress(&routing)?)?;
    arena.extend(routing::kind_labels(&routing)?)?;
    arena.extend(routing::pipeline_labels(spec, &routing, options)?)?;

    if options.debug {
        tracing::debug!(
            skipped = plan.ordered_outputs.len(),
            "debug mode: outputs replaced by stdout"
        );
    } else {
        for name in &plan.ordered_outputs {
            let output = spec
                .output(name)
                .ok_or_else(|| internal(format!("planned output `{name}` is not declared")))?;
            let auth = resolve_auth(output, secrets, options);
            tracing::debug!(output = %name, strategy = auth.strategy(), "store label");
            let store = stores::Store {
                output,
                id: label_name(name),
                store_id: store_id(name),
                inputs: plan.pipelines_for(name).iter().map(|p| label_name(p)).collect(),
                secrets,
                options,
                tuning: spec.tuning.as_ref(),
                auth,
            };
            arena.push(stores::output_label(&store)?)?;
        }
    }

    arena.extend(routing::legacy_labels(&routing, options)?)?;
    tracing::debug!(elements = arena.len(), "fluentd elements built");
    Ok(arena)
}
