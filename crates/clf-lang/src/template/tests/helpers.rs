use super::*;
use crate::template::{label_name, quote, source_type_label_name};

// =========================================================================
// 1. Label names
// =========================================================================

#[test]
fn label_name_canonicalizes() {
    assert_eq!(label_name("my-app.pipe line"), "@MY_APP_PIPE_LINE");
    assert_eq!(source_type_label_name("application"), "@_APPLICATION");
}

#[test]
fn label_helpers_in_templates() {
    let out = render_one(
        "{{ .p | labelName }} {{ sourceTypelabelName .k }}",
        json!({"p": "pipe-1", "k": "audit"}),
    );
    assert_eq!(out, "@PIPE_1 @_AUDIT");
}

// =========================================================================
// 2. Formatting
// =========================================================================

#[test]
fn quote_escapes() {
    assert_eq!(quote(r#"{{foo-{.a||"none"}}}"#), r#""{{foo-{.a||\"none\"}}}""#);
    assert_eq!(render_one("{{ quote .s }}", json!({"s": "a\\b"})), r#""a\\b""#);
}

#[test]
fn quote_list_and_join() {
    let data = json!({"xs": ["a", "b"]});
    assert_eq!(render_one("{{ quoteList .xs }}", data.clone()), r#"["a", "b"]"#);
    assert_eq!(render_one(r#"{{ .xs | join "," }}"#, data), "a,b");
}

#[test]
fn kv_skips_empty_values() {
    let src = r#"{{ kv "tenant" .t }}"#;
    assert_eq!(render_one(src, json!({"t": "x"})), "tenant x");
    assert_eq!(render_one(src, json!({"t": ""})), "");
}

#[test]
fn indent_leaves_blank_lines_empty() {
    assert_eq!(render_one("{{ indent 2 .s }}", json!({"s": "a\n\nb"})), "  a\n\n  b");
}

#[test]
fn secret_path_uses_mount_convention() {
    let out = render_one(r#"{{ secretPath .s "tls.key" }}"#, json!({"s": "es-secret"}));
    assert_eq!(out, "/var/run/ocp-collector/secrets/es-secret/tls.key");
}

#[test]
fn route_map_values_are_sorted() {
    let out = render_one(
        r#"{{ routeMapValues .m "app" | join "," }}"#,
        json!({"m": {"app": ["y", "x", "y"]}}),
    );
    assert_eq!(out, "x,y");
}

#[test]
fn logic_helpers() {
    let data = json!({"a": "x", "b": "", "n": [1, 2]});
    assert_eq!(render_one(r#"{{ ne .a "y" }}"#, data.clone()), "true");
    assert_eq!(render_one("{{ and .a .b }}", data.clone()), "false");
    assert_eq!(render_one("{{ or .a .b }}", data.clone()), "true");
    assert_eq!(render_one("{{ len .n }}", data), "2");
}

#[test]
fn helper_arity_is_checked() {
    let err = render_err(r#"{{ quote "a" "b" }}"#, empty());
    assert!(err.contains("expected 1 argument"), "{err}");
}
