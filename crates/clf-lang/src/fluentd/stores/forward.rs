use clf_config::secrets::{
    CLIENT_CERT_KEY, CLIENT_PRIVATE_KEY, PASSPHRASE, SHARED_KEY, TRUSTED_CA_BUNDLE_KEY,
};

use super::security::{SERVICE_CA_PATH, Settings, ssl_version};
use super::{Store, buffer};
use crate::endpoint::host_port;
use crate::error::CompileResult;
use crate::fluentd::templates::LABEL_FORWARD;
use crate::ir::Element;

const DEFAULT_PORT: u16 = 24224;

pub(super) fn label(store: &Store<'_>) -> CompileResult<Element> {
    let raw = store.output.url();
    let (host, port) = host_port(raw).map_err(|e| store.endpoint_error(e))?;
    let secure = raw.starts_with("tls://") || raw.starts_with("https://");

    let mut settings = Settings::new();
    if secure {
        settings
            .push("transport", "tls")
            .push("tls_verify_hostname", "false")
            .push("tls_version", format!("'{}'", ssl_version(store)));
        if store.output.insecure_skip_verify() {
            settings.push("tls_insecure_mode", "true");
        }
        if !store.options.ciphers.is_empty() {
            settings.push("tls_ciphers", store.options.ciphers.join(":"));
        }
        if store.output.is_default() {
            settings.push("tls_cert_path", format!("'{SERVICE_CA_PATH}'"));
        } else {
            let quoted = |key: &str| store.secret_file(key).map(|p| format!("'{p}'"));
            settings
                .push_opt("tls_cert_path", quoted(TRUSTED_CA_BUNDLE_KEY))
                .push_opt("tls_client_cert_path", quoted(CLIENT_CERT_KEY))
                .push_opt("tls_client_private_key_path", quoted(CLIENT_PRIVATE_KEY))
                .push_opt("tls_client_private_key_passphrase", store.secret_expr(PASSPHRASE));
        }
    }

    store.label(
        LABEL_FORWARD,
        serde_json::json!({
            "host": host,
            "port": port.unwrap_or(DEFAULT_PORT),
            "shared_key": store.secret_expr(SHARED_KEY),
            "settings": settings,
            "buffer": buffer(&store.store_id, store.tuning, "5s", vec![]),
        }),
    )
}
