//! Element IR: one node per emitted stanza, wired by component id.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{CompileResult, internal};

/// Which stage of the collector graph an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Source,
    Transform,
    Sink,
    /// A fixed or routing section of the legacy dialect.
    Section,
}

/// A sub-block rendered directly after its owner (TLS, auth, buffer, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub template: &'static str,
    pub params: Value,
}

/// One stanza of the generated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    pub stage: Stage,
    /// Upstream component ids. `a.b` refers to branch `b` of component `a`.
    pub inputs: Vec<String>,
    pub template: &'static str,
    pub params: Value,
    pub parts: Vec<Part>,
}

impl Element {
    /// Build an element whose template parameters are `params` serialized,
    /// with `id` and `inputs` added as top-level fields.
    pub fn new(
        stage: Stage,
        id: impl Into<String>,
        inputs: Vec<String>,
        template: &'static str,
        params: impl Serialize,
    ) -> CompileResult<Self> {
        let id = id.into();
        let mut params = to_params(template, params)?;
        if let Value::Object(m) = &mut params {
            m.insert("id".into(), Value::String(id.clone()));
            m.insert("inputs".into(), Value::from(inputs.clone()));
        }
        Ok(Self {
            id,
            stage,
            inputs,
            template,
            params,
            parts: Vec::new(),
        })
    }

    /// Append a sub-block; its parameters gain the owner's `id`.
    pub fn part(mut self, template: &'static str, params: impl Serialize) -> CompileResult<Self> {
        let mut params = to_params(template, params)?;
        if let Value::Object(m) = &mut params {
            m.insert("id".into(), Value::String(self.id.clone()));
        }
        self.parts.push(Part { template, params });
        Ok(self)
    }

    pub fn maybe_part(
        self,
        template: &'static str,
        params: Option<impl Serialize>,
    ) -> CompileResult<Self> {
        match params {
            Some(p) => self.part(template, p),
            None => Ok(self),
        }
    }

    /// The component each input names, without a branch suffix.
    pub fn upstream_components(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .map(|i| i.split_once('.').map_or(i.as_str(), |(c, _)| c))
    }
}

fn to_params(template: &str, params: impl Serialize) -> CompileResult<Value> {
    let v = serde_json::to_value(params)
        .map_err(|e| internal(format!("params for `{template}`: {e}")))?;
    match v {
        Value::Object(_) => Ok(v),
        Value::Null => Ok(Value::Object(Default::default())),
        other => Err(internal(format!(
            "params for `{template}` must be a map, got {other}"
        ))),
    }
}

/// Elements in emission order, indexed by component id.
#[derive(Debug, Default)]
pub struct ElementArena {
    elements: Vec<Element>,
    index: BTreeMap<String, usize>,
}

impl ElementArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element. A second element with the same id is an
    /// internal error.
    pub fn push(&mut self, element: Element) -> CompileResult<()> {
        if self.index.contains_key(&element.id) {
            return Err(internal(format!("duplicate component id `{}`", element.id)));
        }
        self.index.insert(element.id.clone(), self.elements.len());
        self.elements.push(element);
        Ok(())
    }

    pub fn extend(&mut self, elements: impl IntoIterator<Item = Element>) -> CompileResult<()> {
        elements.into_iter().try_for_each(|e| self.push(e))
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.index.get(id).map(|&i| &self.elements[i])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.id.as_str())
    }

    pub fn by_stage(&self, stage: Stage) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.stage == stage)
    }

    /// Input ids that are neither in `external` nor emitted before the
    /// element naming them, as `(element, input)` pairs.
    pub fn dangling_inputs<'a>(&'a self, external: &[&str]) -> Vec<(&'a str, &'a str)> {
        let mut out = Vec::new();
        for (pos, el) in self.elements.iter().enumerate() {
            for (input, component) in el.inputs.iter().zip(el.upstream_components()) {
                let earlier = self.position(component).is_some_and(|p| p < pos);
                if !earlier && !external.contains(&input.as_str()) {
                    out.push((el.id.as_str(), input.as_str()));
                }
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a ElementArena {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
