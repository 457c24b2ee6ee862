//! Loki label keys, shared by both dialects.

use clf_config::Loki;

pub const LOG_TYPE: &str = "log_type";
pub const KUBERNETES_NAMESPACE_NAME: &str = "kubernetes.namespace_name";
pub const KUBERNETES_POD_NAME: &str = "kubernetes.pod_name";
pub const KUBERNETES_CONTAINER_NAME: &str = "kubernetes.container_name";
pub const KUBERNETES_HOST: &str = "kubernetes.host";

/// Keys used when an output names none.
pub const DEFAULT_LABEL_KEYS: [&str; 4] = [
    LOG_TYPE,
    KUBERNETES_NAMESPACE_NAME,
    KUBERNETES_POD_NAME,
    KUBERNETES_CONTAINER_NAME,
];

/// Keys every stream carries regardless of configuration.
pub const REQUIRED_LABEL_KEYS: [&str; 1] = [KUBERNETES_HOST];

/// Configured (or default) keys plus the required ones, sorted and unique.
pub fn label_keys(loki: Option<&Loki>) -> Vec<String> {
    let mut keys: Vec<String> = match loki {
        Some(l) if !l.label_keys.is_empty() => l.label_keys.clone(),
        _ => DEFAULT_LABEL_KEYS.iter().map(|k| k.to_string()).collect(),
    };
    keys.extend(REQUIRED_LABEL_KEYS.iter().map(|k| k.to_string()));
    keys.sort();
    keys.dedup();
    keys
}

/// `kubernetes.labels.app.kubernetes.io/name` → `kubernetes_labels_app_kubernetes_io_name`.
pub fn label_name(key: &str) -> String {
    key.chars()
        .map(|c| if matches!(c, '.' | '/' | '\\' | '-') { '_' } else { c })
        .collect()
}

/// Record path for a label key with the part after `labels.` quoted, e.g.
/// `kubernetes.labels."app_kubernetes_io_name"`. The quotes are escaped for
/// embedding in a TOML string when `escape_quotes` is set.
pub fn label_path(key: &str, escape_quotes: bool) -> String {
    for prefix in ["kubernetes.labels.", "kubernetes.namespace_labels."] {
        if let Some(rest) = key.strip_prefix(prefix) {
            let sub: String = rest
                .chars()
                .map(|c| if matches!(c, '/' | '.') { '_' } else { c })
                .collect();
            let q = if escape_quotes { "\\\"" } else { "\"" };
            return format!("{prefix}{q}{sub}{q}");
        }
    }
    key.to_string()
}
