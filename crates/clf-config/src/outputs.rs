//! Type-specific output sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::forwarder::InputKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Elasticsearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Record path whose value names the write index for structured records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_type_key: Option<String>,
    /// Fallback index name for structured records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_type_name: Option<String>,
}

impl Elasticsearch {
    /// Version 8 dropped mapping types.
    pub fn suppress_type_name(&self) -> bool {
        self.version.is_some_and(|v| v >= 8)
    }

    pub fn wants_structured_index(&self) -> bool {
        self.structured_type_key.is_some() || self.structured_type_name.is_some()
    }
}

// ---------------------------------------------------------------------------
// Syslog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Syslog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rfc: Option<SyslogRfc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(rename = "msgID", skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,
    #[serde(rename = "procID", skip_serializing_if = "Option::is_none")]
    pub proc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_key: Option<String>,
    pub add_log_source: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyslogRfc {
    #[serde(rename = "RFC3164", alias = "rfc3164")]
    Rfc3164,
    #[default]
    #[serde(rename = "RFC5424", alias = "rfc5424")]
    Rfc5424,
}

impl SyslogRfc {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rfc3164 => "rfc3164",
            Self::Rfc5424 => "rfc5424",
        }
    }
}

// ---------------------------------------------------------------------------
// Kafka / Loki / LokiStack
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Kafka {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub brokers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Loki {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_key: Option<String>,
    pub label_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LokiStack {
    pub target: LokiStackTarget,
    pub data_model: DataModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_keys: Option<LokiStackLabelKeys>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LokiStackTarget {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataModel {
    #[default]
    #[serde(rename = "viaq", alias = "Viaq", alias = "ViaQ")]
    Viaq,
    #[serde(rename = "otel", alias = "openTelemetry", alias = "OpenTelemetry")]
    Otel,
}

/// Label keys for a lokistack, globally and per tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LokiStackLabelKeys {
    pub global: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<TenantLabelKeys>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<TenantLabelKeys>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<TenantLabelKeys>,
}

impl LokiStackLabelKeys {
    pub fn tenant(&self, kind: InputKind) -> Option<&TenantLabelKeys> {
        match kind {
            InputKind::Application => self.application.as_ref(),
            InputKind::Infrastructure => self.infrastructure.as_ref(),
            InputKind::Audit => self.audit.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantLabelKeys {
    pub ignore_global: bool,
    pub label_keys: Vec<String>,
}

// ---------------------------------------------------------------------------
// Cloud outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cloudwatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub group_by: GroupBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_prefix: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupBy {
    #[default]
    #[serde(rename = "logType")]
    LogType,
    #[serde(rename = "namespaceName")]
    NamespaceName,
    #[serde(rename = "namespaceUUID")]
    NamespaceUuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Http {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Splunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureMonitor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleCloudLogging {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_id: Option<String>,
}

impl GoogleCloudLogging {
    /// The single configured log destination as `(vector key, value)` pairs.
    pub fn destinations(&self) -> Vec<(&'static str, &str)> {
        [
            ("billing_account_id", self.billing_account_id.as_deref()),
            ("folder_id", self.folder_id.as_deref()),
            ("organization_id", self.organization_id.as_deref()),
            ("project_id", self.project_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }
}
