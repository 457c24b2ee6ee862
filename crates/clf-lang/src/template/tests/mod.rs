mod helpers;

use serde_json::{Value, json};

use super::Engine;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Register `src` as the only template and render it with `data`.
fn render_one(src: &str, data: Value) -> String {
    let engine = Engine::new(&[("t", src)]).unwrap();
    engine.render("t", &data).unwrap()
}

fn render_err(src: &str, data: Value) -> String {
    let engine = Engine::new(&[("t", src)]).unwrap();
    engine.render("t", &data).unwrap_err().to_string()
}

fn register_err(sources: &[(&str, &str)]) -> String {
    Engine::new(sources).unwrap_err().to_string()
}

fn empty() -> Value {
    json!({})
}
