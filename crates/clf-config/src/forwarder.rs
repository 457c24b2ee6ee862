use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::outputs::{
    AzureMonitor, Cloudwatch, Elasticsearch, GoogleCloudLogging, Http, Kafka, Loki, LokiStack,
    Splunk, Syslog,
};
use crate::tuning::{OutputTuning, Tuning};

/// Outputs whose name starts with this prefix are reserved for the in-cluster store.
pub const DEFAULT_OUTPUT_PREFIX: &str = "default-";

// ---------------------------------------------------------------------------
// ForwarderSpec
// ---------------------------------------------------------------------------

/// The declarative description of what to collect and where to send it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForwarderSpec {
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
    pub pipelines: Vec<PipelineSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuning: Option<Tuning>,
}

impl ForwarderSpec {
    /// Read a spec file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => content.parse(),
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).map_err(|e| anyhow::anyhow!("invalid forwarder spec: {e}"))
    }

    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

impl FromStr for ForwarderSpec {
    type Err = anyhow::Error;

    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).map_err(|e| anyhow::anyhow!("invalid forwarder spec: {e}"))
    }
}

// ---------------------------------------------------------------------------
// Reserved input kinds
// ---------------------------------------------------------------------------

/// One of the built-in log source classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Application,
    Infrastructure,
    Audit,
}

impl InputKind {
    /// Reserved-kind order used wherever kinds are iterated.
    pub const ALL: [InputKind; 3] = [
        InputKind::Application,
        InputKind::Infrastructure,
        InputKind::Audit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Infrastructure => "infrastructure",
            Self::Audit => "audit",
        }
    }

    /// Resolve a reserved input name. User-defined names return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// InputSpec
// ---------------------------------------------------------------------------

/// A user-named input. Exactly one of the kind sections should be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<InfrastructureInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditInput>,
}

impl InputSpec {
    /// The reserved kind this input projects to, if exactly one section is set.
    pub fn kind(&self) -> Option<InputKind> {
        match (
            self.application.is_some(),
            self.infrastructure.is_some(),
            self.audit.is_some(),
        ) {
            (true, false, false) => Some(InputKind::Application),
            (false, true, false) => Some(InputKind::Infrastructure),
            (false, false, true) => Some(InputKind::Audit),
            _ => None,
        }
    }

    /// Number of kind sections set; anything but 1 is a spec error.
    pub fn kind_sections(&self) -> usize {
        [
            self.application.is_some(),
            self.infrastructure.is_some(),
            self.audit.is_some(),
        ]
        .into_iter()
        .filter(|b| *b)
        .count()
    }

    /// True when the input narrows the application stream by namespace or label.
    pub fn has_app_selector(&self) -> bool {
        self.application.as_ref().is_some_and(|a| {
            !a.namespaces.is_empty()
                || a.selector
                    .as_ref()
                    .is_some_and(|s| !s.match_labels.is_empty())
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationInput {
    pub namespaces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSelector {
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureInput {
    pub sources: Vec<InfrastructureSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfrastructureSource {
    Container,
    Node,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditInput {
    pub sources: Vec<AuditSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditSource {
    #[serde(rename = "auditd")]
    Auditd,
    #[serde(rename = "kubeAPI")]
    KubeApi,
    #[serde(rename = "openshiftAPI")]
    OpenshiftApi,
    #[serde(rename = "ovn")]
    Ovn,
}

// ---------------------------------------------------------------------------
// PipelineSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub input_refs: Vec<String>,
    pub output_refs: Vec<String>,
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse: Option<ParseFormat>,
}

impl PipelineSpec {
    /// The pipeline name, or the empty string before normalization fills it.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseFormat {
    Json,
}

// ---------------------------------------------------------------------------
// OutputType
// ---------------------------------------------------------------------------

/// The closed set of output types. Names outside the set deserialize to
/// `Unknown` so that validation can report them alongside other errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputType {
    Elasticsearch,
    FluentForward,
    Syslog,
    Kafka,
    Loki,
    LokiStack,
    Cloudwatch,
    Otlp,
    Http,
    Splunk,
    AzureMonitor,
    GoogleCloudLogging,
    Unknown(String),
}

impl OutputType {
    pub const KNOWN: [OutputType; 12] = [
        OutputType::Elasticsearch,
        OutputType::FluentForward,
        OutputType::Syslog,
        OutputType::Kafka,
        OutputType::Loki,
        OutputType::LokiStack,
        OutputType::Cloudwatch,
        OutputType::Otlp,
        OutputType::Http,
        OutputType::Splunk,
        OutputType::AzureMonitor,
        OutputType::GoogleCloudLogging,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Elasticsearch => "elasticsearch",
            Self::FluentForward => "fluentForward",
            Self::Syslog => "syslog",
            Self::Kafka => "kafka",
            Self::Loki => "loki",
            Self::LokiStack => "lokistack",
            Self::Cloudwatch => "cloudwatch",
            Self::Otlp => "otlp",
            Self::Http => "http",
            Self::Splunk => "splunk",
            Self::AzureMonitor => "azureMonitor",
            Self::GoogleCloudLogging => "googleCloudLogging",
            Self::Unknown(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl FromStr for OutputType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::KNOWN
            .into_iter()
            .find(|t| t.as_str() == s)
            .unwrap_or_else(|| Self::Unknown(s.to_string())))
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OutputType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OutputType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let Ok(t) = s.parse::<OutputType>();
        Ok(t)
    }
}

// ---------------------------------------------------------------------------
// OutputSpec
// ---------------------------------------------------------------------------

/// A named sink. Only the section matching `output_type` is consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub output_type: OutputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<OutputSecretSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutputTls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch: Option<Elasticsearch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog: Option<Syslog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka: Option<Kafka>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loki: Option<Loki>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lokistack: Option<LokiStack>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudwatch: Option<Cloudwatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<Http>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splunk: Option<Splunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_monitor: Option<AzureMonitor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_cloud_logging: Option<GoogleCloudLogging>,
}

impl OutputSpec {
    /// A bare output of the given type; used by builders and tests.
    pub fn new(name: impl Into<String>, output_type: OutputType) -> Self {
        Self {
            name: name.into(),
            output_type,
            url: None,
            secret: None,
            tls: None,
            authentication: None,
            tuning: None,
            elasticsearch: None,
            syslog: None,
            kafka: None,
            loki: None,
            lokistack: None,
            cloudwatch: None,
            http: None,
            splunk: None,
            azure_monitor: None,
            google_cloud_logging: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_secret(mut self, name: impl Into<String>) -> Self {
        self.secret = Some(OutputSecretSpec { name: name.into() });
        self
    }

    pub fn is_default(&self) -> bool {
        self.name.starts_with(DEFAULT_OUTPUT_PREFIX)
    }

    pub fn secret_name(&self) -> Option<&str> {
        self.secret.as_ref().map(|s| s.name.as_str())
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    pub fn insecure_skip_verify(&self) -> bool {
        self.tls.as_ref().is_some_and(|t| t.insecure_skip_verify)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSecretSpec {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputTls {
    pub insecure_skip_verify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Authentication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<BearerTokenSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BearerTokenSpec {
    pub from: TokenSource,
}

/// Where a bearer token comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenSource {
    /// The `token` key of the output's own secret.
    Secret,
    /// The collector's service-account token.
    ServiceAccount,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC_TOML: &str = r#"
[[inputs]]
name = "my-app"
[inputs.application]
namespaces = ["ns1", "ns2"]
[inputs.application.selector.matchLabels]
app = "web"

[[outputs]]
name = "loki-receiver"
type = "loki"
url = "https://logs-us-west1.grafana.net"
[outputs.loki]
tenantKey = "foo-{.foo.bar.baz||\"none\"}"
labelKeys = ["kubernetes.labels.app"]

[[outputs]]
name = "es"
type = "elasticsearch"
url = "http://es.svc:9200"
secret = { name = "es-secret" }
tls = { insecureSkipVerify = true }

[[pipelines]]
name = "app-pipe"
inputRefs = ["my-app", "audit"]
outputRefs = ["loki-receiver", "es"]
labels = { team = "a" }
parse = "json"
"#;

    #[test]
    fn parse_toml_spec() {
        let spec: ForwarderSpec = SPEC_TOML.parse().unwrap();
        assert_eq!(spec.inputs.len(), 1);
        let input = &spec.inputs[0];
        assert_eq!(input.kind(), Some(InputKind::Application));
        assert!(input.has_app_selector());

        assert_eq!(spec.outputs[0].output_type, OutputType::Loki);
        let loki = spec.outputs[0].loki.as_ref().unwrap();
        assert_eq!(loki.tenant_key.as_deref(), Some("foo-{.foo.bar.baz||\"none\"}"));
        assert_eq!(spec.outputs[1].secret_name(), Some("es-secret"));
        assert!(spec.outputs[1].insecure_skip_verify());

        let p = &spec.pipelines[0];
        assert_eq!(p.name(), "app-pipe");
        assert_eq!(p.parse, Some(ParseFormat::Json));
        assert_eq!(p.labels.get("team").map(String::as_str), Some("a"));
    }

    #[test]
    fn unknown_output_type_is_preserved() {
        let spec: ForwarderSpec = r#"
[[outputs]]
name = "x"
type = "carrier-pigeon"
"#
        .parse()
        .unwrap();
        assert_eq!(
            spec.outputs[0].output_type,
            OutputType::Unknown("carrier-pigeon".into())
        );
        assert!(!spec.outputs[0].output_type.is_known());
    }

    #[test]
    fn parse_json_spec() {
        let spec = ForwarderSpec::from_json(
            r#"{"outputs":[{"name":"k","type":"kafka","kafka":{"brokers":["tls://b1:9092"],"topic":"t"}}],
                "pipelines":[{"inputRefs":["application"],"outputRefs":["k"]}]}"#,
        )
        .unwrap();
        assert_eq!(spec.outputs[0].output_type, OutputType::Kafka);
        assert_eq!(spec.pipelines[0].name, None);
        assert_eq!(spec.pipelines[0].name(), "");
    }

    #[test]
    fn output_type_names_roundtrip() {
        for t in OutputType::KNOWN {
            let parsed: OutputType = t.as_str().parse().unwrap();
            assert_eq!(parsed, t);
        }
    }

    #[test]
    fn input_with_two_sections_has_no_kind() {
        let input = InputSpec {
            name: "x".into(),
            application: Some(ApplicationInput::default()),
            audit: Some(AuditInput::default()),
            ..Default::default()
        };
        assert_eq!(input.kind(), None);
        assert_eq!(input.kind_sections(), 2);
    }

    #[test]
    fn reserved_kind_lookup() {
        assert_eq!(InputKind::from_name("audit"), Some(InputKind::Audit));
        assert_eq!(InputKind::from_name("my-app"), None);
    }
}
