use clf_config::secrets::{
    CLIENT_CERT_KEY, CLIENT_PASSWORD, CLIENT_PRIVATE_KEY, CLIENT_USERNAME, SASL_MECHANISMS,
    TRUSTED_CA_BUNDLE_KEY,
};

use super::security::Settings;
use super::{Store, buffer};
use crate::auth::AuthState;
use crate::endpoint::{kafka_brokers, kafka_topic, kafka_uses_tls};
use crate::error::CompileResult;
use crate::fluentd::templates::LABEL_KAFKA;
use crate::ir::Element;

pub(super) fn label(store: &Store<'_>) -> CompileResult<Element> {
    let brokers = kafka_brokers(store.output).map_err(|e| store.endpoint_error(e))?;
    let tls = kafka_uses_tls(store.output);

    let mut settings = Settings::new();
    if matches!(store.auth, AuthState::Basic { .. }) {
        settings
            .push_opt("username", store.secret_expr(CLIENT_USERNAME))
            .push_opt("password", store.secret_expr(CLIENT_PASSWORD))
            .push("sasl_over_ssl", tls.to_string())
            .push_opt("scram_mechanism", scram_mechanism(store));
    }
    if tls {
        let quoted = |key: &str| store.secret_file(key).map(|p| format!("'{p}'"));
        settings
            .push_opt("ssl_ca_cert", quoted(TRUSTED_CA_BUNDLE_KEY))
            .push_opt("ssl_client_cert", quoted(CLIENT_CERT_KEY))
            .push_opt("ssl_client_cert_key", quoted(CLIENT_PRIVATE_KEY));
        if store.output.insecure_skip_verify() {
            settings.push("ssl_verify_hostname", "false");
        }
    }

    store.label(
        LABEL_KAFKA,
        serde_json::json!({
            "brokers": brokers,
            "topic": kafka_topic(store.output),
            "settings": settings,
            "buffer": buffer(&store.store_id, store.tuning, "1s", vec![]),
        }),
    )
}

/// `SCRAM-SHA-512` → `sha512`. Plain mechanisms have no scram setting.
fn scram_mechanism(store: &Store<'_>) -> Option<String> {
    let name = store.output.secret_name()?;
    let mechanism = store.secrets.value(name, SASL_MECHANISMS)?.to_ascii_lowercase();
    mechanism
        .strip_prefix("scram-")
        .map(|m| m.replace('-', ""))
}
