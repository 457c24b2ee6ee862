use clf_config::GroupBy;
use clf_config::secrets::{AWS_ACCESS_KEY_ID, AWS_ROLE_ARN, AWS_SECRET_ACCESS_KEY};
use serde::Serialize;

use super::Store;
use super::security::{Settings, read_secret_stripped};
use crate::auth::SERVICE_ACCOUNT_TOKEN_PATH;
use crate::error::CompileResult;
use crate::fluentd::sections::{APPLICATION_TAGS, AUDIT_TAGS, INFRA_TAGS};
use crate::fluentd::templates::LABEL_CLOUDWATCH;
use crate::ir::Element;

#[derive(Debug, PartialEq, Eq, Serialize)]
struct Group {
    tags: &'static str,
    group: String,
    stream: &'static str,
}

/// Group and stream names per kind. Filters apply in order, so the
/// infrastructure filter overrides the broader application one.
fn groups(group_by: GroupBy, prefix: &str) -> Vec<Group> {
    let application = match group_by {
        GroupBy::LogType => "application",
        GroupBy::NamespaceName => "${record['kubernetes']['namespace_name']}",
        GroupBy::NamespaceUuid => "${record['kubernetes']['namespace_id']}",
    };
    vec![
        Group {
            tags: APPLICATION_TAGS,
            group: format!("{prefix}{application}"),
            stream: "${tag}",
        },
        Group {
            tags: INFRA_TAGS,
            group: format!("{prefix}infrastructure"),
            stream: "${record['hostname']}.${tag}",
        },
        Group {
            tags: AUDIT_TAGS,
            group: format!("{prefix}audit"),
            stream: "${record['hostname']}.${tag}",
        },
    ]
}

pub(super) fn label(store: &Store<'_>) -> CompileResult<Element> {
    let cw = store.output.cloudwatch.clone().unwrap_or_default();
    let region = store.required(cw.region.as_deref(), "cloudwatch.region")?;
    let prefix = cw
        .group_prefix
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| format!("{p}."))
        .unwrap_or_default();

    let mut settings = Settings::new();
    let key_id = store.secret_file(AWS_ACCESS_KEY_ID);
    let role_arn = if key_id.is_some() {
        None
    } else {
        store
            .output
            .secret_name()
            .and_then(|name| store.secrets.value(name, AWS_ROLE_ARN))
            .map(str::trim)
    };
    settings
        .push_opt("aws_key_id", key_id.map(|p| read_secret_stripped(&p)))
        .push_opt(
            "aws_sec_key",
            store.secret_file(AWS_SECRET_ACCESS_KEY).map(|p| read_secret_stripped(&p)),
        );
    if let Some(url) = store.output.url.as_deref().filter(|u| !u.is_empty()) {
        settings.push("endpoint", url);
    }
    if store.output.insecure_skip_verify() {
        settings.push("ssl_verify_peer", "false");
    }

    store.label(
        LABEL_CLOUDWATCH,
        serde_json::json!({
            "region": region,
            "groups": groups(cw.group_by, &prefix),
            "settings": settings,
            "role_arn": role_arn,
            "token_file": SERVICE_ACCOUNT_TOKEN_PATH,
        }),
    )
}
