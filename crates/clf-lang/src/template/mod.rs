//! A small text-template engine with Go-template syntax.
//!
//! Templates are registered once, validated (known functions, literal
//! `include` targets, no include cycles) and then rendered any number of
//! times against `serde_json::Value` data.

mod helpers;
mod parse;
mod render;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

pub use helpers::{label_name, quote, quote_list, source_type_label_name};
pub(crate) use helpers::indent_text;

use parse::{Node, Operand};
use render::Renderer;

struct Template {
    nodes: Vec<Node>,
    includes: BTreeSet<String>,
}

/// An immutable set of named templates.
pub struct Engine {
    templates: BTreeMap<String, Template>,
    order: Vec<String>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("order", &self.order).finish()
    }
}

impl Engine {
    /// Parse and register `(name, source)` pairs.
    ///
    /// Fails on a parse error, a duplicate name, an unknown function, an
    /// `include` of an unregistered or non-literal name, or an include cycle.
    pub fn new(sources: &[(&str, &str)]) -> anyhow::Result<Self> {
        let mut templates = BTreeMap::new();
        for (name, src) in sources {
            let nodes = parse::parse_template(src)
                .map_err(|e| anyhow::anyhow!("template `{name}`: {e}"))?;
            let includes = scan_calls(name, &nodes)?;
            if templates
                .insert(name.to_string(), Template { nodes, includes })
                .is_some()
            {
                anyhow::bail!("template `{name}` registered twice");
            }
        }

        for (name, t) in &templates {
            if let Some(missing) = t.includes.iter().find(|i| !templates.contains_key(*i)) {
                anyhow::bail!("template `{name}` includes unknown template `{missing}`");
            }
        }

        let order = topo_order(&templates)?;
        tracing::trace!(templates = order.len(), "template engine ready");
        Ok(Self { templates, order })
    }

    /// Render template `name` with `data` as both `.` and `$`.
    pub fn render(&self, name: &str, data: &Value) -> anyhow::Result<String> {
        Renderer { engine: self }.render_named(name, data)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Template names, every template after the ones it includes.
    pub fn order(&self) -> &[String] {
        &self.order
    }
}

/// Check every function call and collect literal `include` targets.
fn scan_calls(name: &str, nodes: &[Node]) -> anyhow::Result<BTreeSet<String>> {
    let mut includes = BTreeSet::new();
    let mut problem: Option<String> = None;
    for node in nodes {
        node.walk_pipelines(&mut |p| {
            for cmd in &p.cmds {
                for op in std::iter::once(&cmd.head).chain(&cmd.args) {
                    if let Operand::Func(f) = op
                        && helpers::lookup(f).is_none()
                    {
                        problem.get_or_insert_with(|| format!("unknown function `{f}`"));
                    }
                }
                if matches!(&cmd.head, Operand::Func(f) if f == "include") {
                    match cmd.args.first() {
                        Some(Operand::Str(target)) => {
                            includes.insert(target.clone());
                        }
                        _ => {
                            problem.get_or_insert_with(|| {
                                "include target must be a string literal".to_string()
                            });
                        }
                    }
                }
            }
        });
    }
    match problem {
        Some(msg) => anyhow::bail!("template `{name}`: {msg}"),
        None => Ok(includes),
    }
}

/// Kahn's algorithm over the include graph; ties broken by name.
fn topo_order(templates: &BTreeMap<String, Template>) -> anyhow::Result<Vec<String>> {
    let mut pending: BTreeMap<&str, usize> = templates
        .iter()
        .map(|(n, t)| (n.as_str(), t.includes.len()))
        .collect();
    let mut ready: BTreeSet<&str> = pending
        .iter()
        .filter(|(_, deps)| **deps == 0)
        .map(|(n, _)| *n)
        .collect();
    let mut order = Vec::with_capacity(templates.len());

    while let Some(next) = ready.pop_first() {
        pending.remove(next);
        order.push(next.to_string());
        for (user, t) in templates {
            if t.includes.contains(next)
                && let Some(deps) = pending.get_mut(user.as_str())
            {
                *deps -= 1;
                if *deps == 0 {
                    ready.insert(user.as_str());
                }
            }
        }
    }

    if !pending.is_empty() {
        let names: Vec<&str> = pending.keys().copied().collect();
        anyhow::bail!("template include cycle among: {}", names.join(", "));
    }
    Ok(order)
}
