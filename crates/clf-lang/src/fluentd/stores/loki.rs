use clf_config::secrets::{
    CLIENT_CERT_KEY, CLIENT_PASSWORD, CLIENT_PRIVATE_KEY, CLIENT_USERNAME, TRUSTED_CA_BUNDLE_KEY,
};
use serde::Serialize;

use super::security::{SERVICE_CA_PATH, Settings};
use super::{Store, buffer};
use crate::auth::AuthState;
use crate::endpoint::parse_url;
use crate::error::CompileResult;
use crate::fluentd::templates::LABEL_LOKI;
use crate::ir::Element;
use crate::labels::{KUBERNETES_HOST, label_keys, label_name};

#[derive(Debug, PartialEq, Eq, Serialize)]
struct LokiLabel {
    name: String,
    /// Record accessor copying the value into `_<name>`.
    record: String,
}

/// `kubernetes.labels.app.kubernetes.io/name` reads
/// `record.dig("kubernetes","labels","app_kubernetes_io_name")`; labels are
/// dedotted before this filter runs.
fn record_accessor(key: &str) -> String {
    if key == KUBERNETES_HOST {
        return r##""#{ENV['NODE_NAME']}""##.to_string();
    }
    let nested = ["kubernetes.labels.", "kubernetes.namespace_labels."]
        .into_iter()
        .find_map(|p| key.strip_prefix(p).map(|sub| (p, sub)));
    let path: Vec<String> = match nested {
        Some((prefix, sub)) => prefix
            .trim_end_matches('.')
            .split('.')
            .map(str::to_string)
            .chain([sub.replace(['.', '/'], "_")])
            .collect(),
        None => key.split('.').map(str::to_string).collect(),
    };
    let quoted: Vec<String> = path.iter().map(|p| format!("\"{p}\"")).collect();
    format!("${{record.dig({})}}", quoted.join(","))
}

pub(super) fn label(store: &Store<'_>) -> CompileResult<Element> {
    let raw = store.output.url();
    let url = parse_url(raw).map_err(|e| store.endpoint_error(e))?;
    let loki = store.output.loki.as_ref();

    let labels: Vec<LokiLabel> = label_keys(loki)
        .iter()
        .map(|k| LokiLabel {
            name: label_name(k),
            record: record_accessor(k),
        })
        .collect();

    let tenant_key = loki
        .and_then(|l| l.tenant_key.as_deref())
        .filter(|k| !k.is_empty())
        .map(|k| format!("$.{k}"));
    let tenant = tenant_key.as_ref().map(|k| format!("${{{k}}}"));

    let mut settings = Settings::new();
    match &store.auth {
        AuthState::Basic { .. } => {
            settings
                .push_opt("username", store.secret_expr(CLIENT_USERNAME))
                .push_opt("password", store.secret_expr(CLIENT_PASSWORD));
        }
        AuthState::Bearer { .. } | AuthState::BearerFromServiceAccount { .. } => {
            settings.push_opt("bearer_token_file", store.auth.token_file());
        }
        AuthState::NoAuth | AuthState::Error(_) => {}
    }
    if url.scheme() == "https" {
        if store.output.is_default() {
            settings.push("ca_cert", SERVICE_CA_PATH);
        } else {
            settings
                .push_opt("ca_cert", store.secret_file(TRUSTED_CA_BUNDLE_KEY))
                .push_opt("cert", store.secret_file(CLIENT_CERT_KEY))
                .push_opt("key", store.secret_file(CLIENT_PRIVATE_KEY));
        }
        if store.output.insecure_skip_verify() {
            settings.push("insecure_tls", "true");
        }
        if !store.options.ciphers.is_empty() {
            settings.push("ciphers", store.options.ciphers.join(":"));
        }
    }

    store.label(
        LABEL_LOKI,
        serde_json::json!({
            "url": raw.trim_end_matches('/'),
            "tenant": tenant,
            "labels": labels,
            "settings": settings,
            "buffer": buffer(&store.store_id, store.tuning, "1s", tenant_key.into_iter().collect()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_follow_dedotted_paths() {
        assert_eq!(record_accessor("log_type"), r#"${record.dig("log_type")}"#);
        assert_eq!(
            record_accessor("kubernetes.namespace_name"),
            r#"${record.dig("kubernetes","namespace_name")}"#
        );
        assert_eq!(
            record_accessor("kubernetes.labels.app.kubernetes.io/name"),
            r#"${record.dig("kubernetes","labels","app_kubernetes_io_name")}"#
        );
        assert_eq!(record_accessor("kubernetes.host"), r##""#{ENV['NODE_NAME']}""##);
    }
}
