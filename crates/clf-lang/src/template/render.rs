use serde_json::Value;

use super::Engine;
use super::helpers;
use super::parse::{Command, Node, Operand, Pipeline};

/// Executes parsed templates against JSON data.
pub(crate) struct Renderer<'e> {
    pub(crate) engine: &'e Engine,
}

impl<'e> Renderer<'e> {
    pub(crate) fn render_named(&self, name: &str, data: &Value) -> anyhow::Result<String> {
        let template = self
            .engine
            .templates
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("no template named `{name}`"))?;
        let mut out = String::new();
        self.nodes(&template.nodes, data, data, &mut out)
            .map_err(|e| anyhow::anyhow!("template `{name}`: {e}"))?;
        Ok(out)
    }

    fn nodes(&self, nodes: &[Node], dot: &Value, root: &Value, out: &mut String) -> anyhow::Result<()> {
        for node in nodes {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Action(p) => {
                    let v = self.pipeline(p, dot, root)?;
                    out.push_str(&print(&v));
                }
                Node::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    let branch = if truthy(&self.pipeline(cond, dot, root)?) {
                        then
                    } else {
                        otherwise
                    };
                    self.nodes(branch, dot, root, out)?;
                }
                Node::With {
                    value,
                    body,
                    otherwise,
                } => {
                    let v = self.pipeline(value, dot, root)?;
                    if truthy(&v) {
                        self.nodes(body, &v, root, out)?;
                    } else {
                        self.nodes(otherwise, dot, root, out)?;
                    }
                }
                Node::Range {
                    over,
                    body,
                    otherwise,
                } => {
                    let v = self.pipeline(over, dot, root)?;
                    let items: Vec<&Value> = match &v {
                        Value::Array(a) => a.iter().collect(),
                        Value::Object(m) => m.values().collect(),
                        Value::Null => Vec::new(),
                        other => anyhow::bail!("range over {}", type_name(other)),
                    };
                    if items.is_empty() {
                        self.nodes(otherwise, dot, root, out)?;
                    }
                    for item in items {
                        self.nodes(body, item, root, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn pipeline(&self, p: &Pipeline, dot: &Value, root: &Value) -> anyhow::Result<Value> {
        let mut piped: Option<Value> = None;
        for cmd in &p.cmds {
            piped = Some(self.command(cmd, dot, root, piped.take())?);
        }
        Ok(piped.unwrap_or(Value::Null))
    }

    fn command(
        &self,
        cmd: &Command,
        dot: &Value,
        root: &Value,
        piped: Option<Value>,
    ) -> anyhow::Result<Value> {
        match &cmd.head {
            Operand::Func(name) => {
                let mut args = Vec::with_capacity(cmd.args.len() + 1);
                for a in &cmd.args {
                    args.push(self.operand(a, dot, root)?);
                }
                args.extend(piped);
                self.call(name, &args)
            }
            head => {
                if piped.is_some() {
                    anyhow::bail!("cannot pipe into a non-function");
                }
                self.operand(head, dot, root)
            }
        }
    }

    fn operand(&self, op: &Operand, dot: &Value, root: &Value) -> anyhow::Result<Value> {
        match op {
            Operand::Dot(path) => lookup(dot, path),
            Operand::Root(path) => lookup(root, path),
            Operand::Str(s) => Ok(Value::String(s.clone())),
            Operand::Int(n) => Ok(Value::from(*n)),
            Operand::Bool(b) => Ok(Value::Bool(*b)),
            Operand::Func(name) => self.call(name, &[]),
            Operand::Group(p) => self.pipeline(p, dot, root),
        }
    }

    fn call(&self, name: &str, args: &[Value]) -> anyhow::Result<Value> {
        let f = helpers::lookup(name).ok_or_else(|| anyhow::anyhow!("unknown function `{name}`"))?;
        f(self, args).map_err(|e| anyhow::anyhow!("{name}: {e}"))
    }
}

fn lookup(v: &Value, path: &[String]) -> anyhow::Result<Value> {
    let mut cur = v;
    for seg in path {
        cur = match cur {
            Value::Object(m) => match m.get(seg) {
                Some(next) => next,
                None => return Ok(Value::Null),
            },
            Value::Null => return Ok(Value::Null),
            other => anyhow::bail!("can't access field `{seg}` of {}", type_name(other)),
        };
    }
    Ok(cur.clone())
}

/// Text form of a value: strings verbatim, `null` as nothing, containers as JSON.
pub(crate) fn print(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
