//! Rendering of an element arena into one configuration text.

use orion_error::StructError;
use serde_json::Value;

use crate::error::{CompileReason, CompileResult};
use crate::ir::ElementArena;
use crate::template::Engine;

/// Render every element, then its parts, as blank-line separated blocks.
/// The text ends with a single newline.
pub(crate) fn render_arena(engine: &Engine, arena: &ElementArena) -> CompileResult<String> {
    let mut blocks = Vec::with_capacity(arena.len());
    for el in arena {
        blocks.push(render_block(engine, el.template, &el.params, &el.id)?);
        for part in &el.parts {
            blocks.push(render_block(engine, part.template, &part.params, &el.id)?);
        }
    }
    let mut out = blocks
        .into_iter()
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    Ok(out)
}

pub(crate) fn render_block(
    engine: &Engine,
    template: &str,
    params: &Value,
    owner: &str,
) -> CompileResult<String> {
    engine
        .render(template, params)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            StructError::from(CompileReason::TemplateRender)
                .with_detail(format!("`{owner}` ({template}): {e}"))
        })
}
