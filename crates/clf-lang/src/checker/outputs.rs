use std::collections::BTreeSet;

use clf_config::secrets::{
    AWS_ACCESS_KEY_ID, AWS_ROLE_ARN, AWS_SECRET_ACCESS_KEY, AZURE_SHARED_KEY, GOOGLE_CREDENTIALS,
    SPLUNK_HEC_TOKEN,
};
use clf_config::{Dialect, ForwarderSpec, Options, OutputSpec, OutputType, Secrets};

use super::{CheckError, CheckKind};
use crate::auth::{AuthState, resolve_auth};
use crate::endpoint;

/// Whether `dialect` can emit a sink for `t`.
pub fn dialect_supports(dialect: Dialect, t: &OutputType) -> bool {
    use OutputType::*;
    match dialect {
        Dialect::Fluentd => matches!(
            t,
            Elasticsearch | FluentForward | Syslog | Kafka | Loki | LokiStack | Cloudwatch | Http
        ),
        Dialect::Vector => t.is_known() && *t != FluentForward,
    }
}

fn needs_url(t: &OutputType) -> bool {
    use OutputType::*;
    matches!(
        t,
        Elasticsearch | FluentForward | Syslog | Loki | Http | Splunk | Otlp
    )
}

pub(super) fn check_outputs(
    spec: &ForwarderSpec,
    secrets: &Secrets,
    options: &Options,
    errors: &mut Vec<CheckError>,
) {
    let mut seen = BTreeSet::new();
    for output in &spec.outputs {
        let name = output.name.as_str();
        let mut err = |kind, msg: String| errors.push(CheckError::output(kind, name, msg));

        if name.is_empty() {
            err(CheckKind::RequiredField, "output name must not be empty".into());
            continue;
        }
        if !seen.insert(name) {
            err(CheckKind::Uniqueness, "duplicate output name".into());
        }
        if !output.output_type.is_known() {
            err(
                CheckKind::UnknownOutputType,
                format!("unknown output type `{}`", output.output_type),
            );
            continue;
        }

        if let Some(secret) = output.secret_name()
            && secrets.get(secret).is_none()
        {
            err(CheckKind::Reference, format!("secret `{secret}` not found"));
        }

        check_url(output, &mut err);
        check_type_fields(output, secrets, &mut err);

        if let AuthState::Error(msg) = resolve_auth(output, secrets, options) {
            err(CheckKind::AuthConfiguration, msg);
        }
    }
}

fn check_url(output: &OutputSpec, err: &mut impl FnMut(CheckKind, String)) {
    let url = output.url.as_deref().filter(|u| !u.is_empty());
    match url {
        None if needs_url(&output.output_type) => {
            err(
                CheckKind::RequiredField,
                format!("`url` is required for {} outputs", output.output_type),
            );
        }
        None => {}
        Some(u) if output.output_type == OutputType::Syslog => {
            if let Err(e) = endpoint::host_port(u) {
                err(CheckKind::RequiredField, e.to_string());
            }
        }
        Some(u) => {
            if let Err(e) = endpoint::parse_url(u) {
                err(CheckKind::RequiredField, e.to_string());
            }
        }
    }
}

fn check_type_fields(
    output: &OutputSpec,
    secrets: &Secrets,
    err: &mut impl FnMut(CheckKind, String),
) {
    let secret = output.secret_name();
    let has = |key: &str| secret.is_some_and(|s| secrets.has_key(s, key));
    let missing = |field: &str| format!("`{field}` is required for {} outputs", output.output_type);

    match &output.output_type {
        OutputType::Cloudwatch => {
            let cw = output.cloudwatch.as_ref();
            if cw.and_then(|c| c.region.as_deref()).is_none_or(str::is_empty) {
                err(CheckKind::RequiredField, missing("cloudwatch.region"));
            }
            match secret {
                None => err(CheckKind::RequiredField, missing("secret")),
                Some(_) => match (has(AWS_ACCESS_KEY_ID), has(AWS_SECRET_ACCESS_KEY)) {
                    (true, true) => {}
                    (false, false) if has(AWS_ROLE_ARN) => {}
                    (false, false) => err(
                        CheckKind::AuthConfiguration,
                        format!(
                            "secret must carry `{AWS_ACCESS_KEY_ID}` and `{AWS_SECRET_ACCESS_KEY}`, or `{AWS_ROLE_ARN}`"
                        ),
                    ),
                    _ => err(
                        CheckKind::AuthConfiguration,
                        format!(
                            "secret must carry both `{AWS_ACCESS_KEY_ID}` and `{AWS_SECRET_ACCESS_KEY}`"
                        ),
                    ),
                },
            }
        }
        OutputType::Kafka => {
            if let Err(e) = endpoint::kafka_brokers(output) {
                err(CheckKind::RequiredField, e.to_string());
            }
        }
        OutputType::AzureMonitor => {
            let az = output.azure_monitor.as_ref();
            if az.and_then(|a| a.customer_id.as_deref()).is_none_or(str::is_empty) {
                err(CheckKind::RequiredField, missing("azureMonitor.customerId"));
            }
            if az.and_then(|a| a.log_type.as_deref()).is_none_or(str::is_empty) {
                err(CheckKind::RequiredField, missing("azureMonitor.logType"));
            }
            if !has(AZURE_SHARED_KEY) {
                err(CheckKind::RequiredField, missing(&format!("secret key {AZURE_SHARED_KEY}")));
            }
        }
        OutputType::GoogleCloudLogging => {
            let gcl = output.google_cloud_logging.as_ref();
            let destinations = gcl.map(|g| g.destinations().len()).unwrap_or_default();
            if destinations != 1 {
                err(
                    CheckKind::RequiredField,
                    "exactly one of projectId, folderId, organizationId or billingAccountId is required"
                        .into(),
                );
            }
            if gcl.and_then(|g| g.log_id.as_deref()).is_none_or(str::is_empty) {
                err(CheckKind::RequiredField, missing("googleCloudLogging.logId"));
            }
            if !has(GOOGLE_CREDENTIALS) {
                err(CheckKind::RequiredField, missing(&format!("secret key {GOOGLE_CREDENTIALS}")));
            }
        }
        OutputType::Splunk => {
            if !has(SPLUNK_HEC_TOKEN) {
                err(CheckKind::RequiredField, missing(&format!("secret key {SPLUNK_HEC_TOKEN}")));
            }
        }
        OutputType::LokiStack => {
            let target = output.lokistack.as_ref().map(|l| &l.target);
            if target.is_none_or(|t| t.name.is_empty()) {
                err(CheckKind::RequiredField, missing("lokistack.target.name"));
            }
            if target.is_none_or(|t| t.namespace.is_empty()) {
                err(CheckKind::RequiredField, missing("lokistack.target.namespace"));
            }
        }
        _ => {}
    }
}
