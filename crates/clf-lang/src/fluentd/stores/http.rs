use std::collections::BTreeMap;

use clf_config::secrets::{
    CLIENT_CERT_KEY, CLIENT_PASSWORD, CLIENT_PRIVATE_KEY, CLIENT_USERNAME, TRUSTED_CA_BUNDLE_KEY,
};
use clf_config::secret_path;
use serde::Serialize;

use super::security::{Settings, ssl_version};
use super::{Store, buffer};
use crate::auth::AuthState;
use crate::error::{CompileResult, internal};
use crate::fluentd::templates::LABEL_HTTP;
use crate::ir::Element;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize)]
struct BasicAuth {
    username: String,
    password: String,
}

/// `File.read` of a mounted secret key; `nil` when the file is missing.
fn read_or_nil(name: &str, key: &str) -> String {
    format!(r##""#{{File.read('{}') rescue nil}}""##, secret_path(name, key))
}

pub(super) fn label(store: &Store<'_>) -> CompileResult<Element> {
    let http = store.output.http.clone().unwrap_or_default();
    let url = store.output.url();
    let method = http
        .method
        .as_deref()
        .map_or_else(|| "post".to_string(), str::to_ascii_lowercase);

    let mut headers: BTreeMap<String, String> = http.headers;
    if let Some(token) = store.auth.token() {
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    }
    let headers = if headers.is_empty() {
        None
    } else {
        Some(
            serde_json::to_string(&headers)
                .map_err(|e| internal(format!("output `{}` headers: {e}", store.output.name)))?,
        )
    };

    let auth = match (&store.auth, store.output.secret_name()) {
        (AuthState::Basic { .. }, Some(name)) => Some(BasicAuth {
            username: read_or_nil(name, CLIENT_USERNAME),
            password: read_or_nil(name, CLIENT_PASSWORD),
        }),
        _ => None,
    };

    let mut settings = Settings::new();
    if url.starts_with("https://") {
        settings
            .push_opt("tls_ca_cert_path", store.secret_file(TRUSTED_CA_BUNDLE_KEY))
            .push_opt("tls_client_cert_path", store.secret_file(CLIENT_CERT_KEY))
            .push_opt("tls_private_key_path", store.secret_file(CLIENT_PRIVATE_KEY))
            .push("tls_version", ssl_version(store));
        if store.output.insecure_skip_verify() {
            settings.push("tls_verify_mode", "none");
        }
        if !store.options.ciphers.is_empty() {
            settings.push("tls_ciphers", store.options.ciphers.join(":"));
        }
    }

    store.label(
        LABEL_HTTP,
        serde_json::json!({
            "url": url,
            "method": method,
            "timeout": http.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
            "headers": headers,
            "auth": auth,
            "settings": settings,
            "buffer": buffer(&store.store_id, store.tuning, "1s", vec![]),
        }),
    )
}
