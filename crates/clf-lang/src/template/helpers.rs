//! Functions callable from templates.

use serde_json::Value;

use clf_config::secret_path;

use super::render::{Renderer, print, truthy};

pub(crate) type Helper = fn(&Renderer<'_>, &[Value]) -> anyhow::Result<Value>;

pub(crate) fn lookup(name: &str) -> Option<Helper> {
    let f: Helper = match name {
        "labelName" => |_, a| Ok(Value::String(label_name(&print(&arg1(a)?[0])))),
        "sourceTypelabelName" => {
            |_, a| Ok(Value::String(source_type_label_name(&print(&arg1(a)?[0]))))
        }
        "routeMapValues" => route_map_values,
        "kv" => kv,
        "include" => include,
        "indent" => indent,
        "quote" => |_, a| Ok(Value::String(quote(&print(&arg1(a)?[0])))),
        "quoteList" => quote_list_helper,
        "join" => join,
        "secretPath" => |_, a| {
            let [name, key] = arg2(a)?;
            Ok(Value::String(secret_path(&print(name), &print(key))))
        },
        "eq" => |_, a| {
            let [x, y] = arg2(a)?;
            Ok(Value::Bool(x == y))
        },
        "ne" => |_, a| {
            let [x, y] = arg2(a)?;
            Ok(Value::Bool(x != y))
        },
        "not" => |_, a| Ok(Value::Bool(!truthy(&arg1(a)?[0]))),
        "and" => |_, a| Ok(Value::Bool(!a.is_empty() && a.iter().all(truthy))),
        "or" => |_, a| Ok(Value::Bool(a.iter().any(truthy))),
        "len" => |_, a| {
            let n = match &arg1(a)?[0] {
                Value::Array(v) => v.len(),
                Value::Object(m) => m.len(),
                Value::String(s) => s.len(),
                Value::Null => 0,
                _ => anyhow::bail!("len of scalar"),
            };
            Ok(Value::from(n))
        },
        _ => return None,
    };
    Some(f)
}

fn arg1(args: &[Value]) -> anyhow::Result<&[Value; 1]> {
    <&[Value; 1]>::try_from(args).map_err(|_| anyhow::anyhow!("expected 1 argument, got {}", args.len()))
}

fn arg2(args: &[Value]) -> anyhow::Result<&[Value; 2]> {
    <&[Value; 2]>::try_from(args).map_err(|_| anyhow::anyhow!("expected 2 arguments, got {}", args.len()))
}

// ---------------------------------------------------------------------------
// Label names
// ---------------------------------------------------------------------------

/// `@` + upper-cased name with space, `-` and `.` replaced by `_`.
pub fn label_name(name: &str) -> String {
    format!("@{}", canonical_label(name))
}

/// Label for a reserved source kind: `application` → `@_APPLICATION`.
pub fn source_type_label_name(name: &str) -> String {
    format!("@_{}", canonical_label(name))
}

fn canonical_label(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .map(|c| if matches!(c, ' ' | '-' | '.') { '_' } else { c })
        .collect()
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Double-quoted string with `"` and `\` escaped, valid in TOML and JSON.
pub fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// `["a", "b"]`
pub fn quote_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s.as_ref())).collect();
    format!("[{}]", quoted.join(", "))
}

fn quote_list_helper(_: &Renderer<'_>, args: &[Value]) -> anyhow::Result<Value> {
    let items = strings(&arg1(args)?[0])?;
    Ok(Value::String(quote_list(&items)))
}

fn strings(v: &Value) -> anyhow::Result<Vec<String>> {
    match v {
        Value::Array(items) => Ok(items.iter().map(print).collect()),
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.clone()]),
        _ => anyhow::bail!("expected a list"),
    }
}

/// `join sep list`
fn join(_: &Renderer<'_>, args: &[Value]) -> anyhow::Result<Value> {
    let [sep, list] = arg2(args)?;
    Ok(Value::String(strings(list)?.join(&print(sep))))
}

/// `kv key value` renders `key value`, or nothing when the value is empty.
fn kv(_: &Renderer<'_>, args: &[Value]) -> anyhow::Result<Value> {
    let [key, value] = arg2(args)?;
    if !truthy(value) {
        return Ok(Value::String(String::new()));
    }
    Ok(Value::String(format!("{} {}", print(key), print(value))))
}

/// `indent n text` prefixes every non-empty line with `n` spaces.
fn indent(_: &Renderer<'_>, args: &[Value]) -> anyhow::Result<Value> {
    let [n, text] = arg2(args)?;
    let n = n
        .as_u64()
        .ok_or_else(|| anyhow::anyhow!("indent width must be a non-negative integer"))?;
    Ok(Value::String(indent_text(&print(text), n as usize)))
}

pub(crate) fn indent_text(text: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `routeMapValues map key` → sorted values stored under `key`.
fn route_map_values(_: &Renderer<'_>, args: &[Value]) -> anyhow::Result<Value> {
    let [map, key] = arg2(args)?;
    let Value::Object(m) = map else {
        anyhow::bail!("expected a map");
    };
    let mut values = strings(m.get(&print(key)).unwrap_or(&Value::Null))?;
    values.sort();
    values.dedup();
    Ok(Value::from(values))
}

/// `include "name" data` renders another registered template.
fn include(r: &Renderer<'_>, args: &[Value]) -> anyhow::Result<Value> {
    let (name, data) = match args {
        [name] => (name, &Value::Null),
        [name, data] => (name, data),
        _ => anyhow::bail!("expected 1 or 2 arguments, got {}", args.len()),
    };
    Ok(Value::String(r.render_named(&print(name), data)?))
}
