use clf_config::secrets::{
    CLIENT_CERT_KEY, CLIENT_PASSWORD, CLIENT_PRIVATE_KEY, CLIENT_USERNAME, TRUSTED_CA_BUNDLE_KEY,
};
use serde::Serialize;

use super::security::{SERVICE_CA_PATH, Settings, ssl_version};
use super::{BufferParams, Store, buffer};
use crate::auth::AuthState;
use crate::endpoint::parse_url;
use crate::error::CompileResult;
use crate::fluentd::sections::{AUDIT_TAGS, INFRA_TAGS};
use crate::fluentd::templates::LABEL_ELASTICSEARCH;
use crate::ir::Element;

const DEFAULT_PORT: u16 = 9200;

#[derive(Serialize)]
struct EsStore {
    tags: String,
    store_id: String,
    host: String,
    port: u16,
    settings: Settings,
    suppress_type_name: bool,
    retry_tag: Option<String>,
    buffer: BufferParams,
}

/// Index-name filters, then a retry store matching the retry tag and the
/// main store that re-emits failed records under it.
pub(super) fn label(store: &Store<'_>) -> CompileResult<Element> {
    let url = parse_url(store.output.url()).map_err(|e| store.endpoint_error(e))?;
    let es = store.output.elasticsearch.clone().unwrap_or_default();
    let host = url.host_str().unwrap_or_default().to_string();
    let port = url.port().unwrap_or(DEFAULT_PORT);
    let settings = settings(store, url.scheme());

    let retry_id = format!("retry_{}", store.store_id);
    let retry = EsStore {
        tags: retry_id.clone(),
        store_id: retry_id.clone(),
        host: host.clone(),
        port,
        settings: settings.clone(),
        suppress_type_name: es.suppress_type_name(),
        retry_tag: None,
        buffer: buffer(&retry_id, store.tuning, "1s", vec![]),
    };
    let main = EsStore {
        tags: "**".to_string(),
        store_id: store.store_id.clone(),
        host,
        port,
        settings,
        suppress_type_name: es.suppress_type_name(),
        retry_tag: Some(retry_id),
        buffer: buffer(&store.store_id, store.tuning, "1s", vec![]),
    };

    store.label(
        LABEL_ELASTICSEARCH,
        serde_json::json!({
            "infra_tags": INFRA_TAGS,
            "audit_tags": AUDIT_TAGS,
            "structured": es.wants_structured_index(),
            "structured_type_key": es.structured_type_key,
            "structured_type_name": es.structured_type_name,
            "retry": retry,
            "main": main,
        }),
    )
}

fn settings(store: &Store<'_>, scheme: &str) -> Settings {
    let mut s = Settings::new();
    s.push("scheme", scheme);
    if scheme == "https" {
        s.push("ssl_version", ssl_version(store));
    }
    if store.output.insecure_skip_verify() {
        s.push("ssl_verify_peer", "false");
    }
    match &store.auth {
        AuthState::Basic { .. } => {
            s.push_opt("user", store.secret_expr(CLIENT_USERNAME))
                .push_opt("password", store.secret_expr(CLIENT_PASSWORD));
        }
        AuthState::Bearer { token, .. } | AuthState::BearerFromServiceAccount { token, .. } => {
            s.push("custom_headers", format!(r#"{{"Authorization":"Bearer {token}"}}"#));
        }
        AuthState::NoAuth | AuthState::Error(_) => {}
    }
    if store.output.is_default() {
        s.push("ca_file", SERVICE_CA_PATH);
    } else {
        s.push_opt("client_key", store.secret_file(CLIENT_PRIVATE_KEY))
            .push_opt("client_cert", store.secret_file(CLIENT_CERT_KEY))
            .push_opt("ca_file", store.secret_file(TRUSTED_CA_BUNDLE_KEY));
    }
    s
}
