//! Templates of the TOML dialect. One template renders one table; parts
//! receive the table path they extend as `.table`.

pub(super) const SOURCE_KUBERNETES_LOGS: &str = "source_kubernetes_logs";
pub(super) const SOURCE_JOURNALD: &str = "source_journald";
pub(super) const SOURCE_FILE: &str = "source_file";
pub(super) const SOURCE_INTERNAL_METRICS: &str = "source_internal_metrics";
pub(super) const REMAP: &str = "remap";
pub(super) const ROUTE: &str = "route";
pub(super) const FILTER: &str = "filter";

pub(super) const SINK_CONSOLE: &str = "sink_console";
pub(super) const SINK_LOKI: &str = "sink_loki";
pub(super) const SINK_ELASTICSEARCH: &str = "sink_elasticsearch";
pub(super) const SINK_KAFKA: &str = "sink_kafka";
pub(super) const SINK_SOCKET: &str = "sink_socket";
pub(super) const SINK_CLOUDWATCH: &str = "sink_cloudwatch";
pub(super) const SINK_HTTP: &str = "sink_http";
pub(super) const SINK_SPLUNK: &str = "sink_splunk";
pub(super) const SINK_AZURE_MONITOR: &str = "sink_azure_monitor";
pub(super) const SINK_GCP: &str = "sink_gcp";
pub(super) const SINK_OTLP: &str = "sink_otlp";
pub(super) const SINK_PROMETHEUS: &str = "sink_prometheus";

pub(super) const PART_ENCODING: &str = "part_encoding";
pub(super) const PART_SYSLOG_ENCODING: &str = "part_syslog_encoding";
pub(super) const PART_LABELS: &str = "part_labels";
pub(super) const PART_TLS: &str = "part_tls";
pub(super) const PART_AUTH: &str = "part_auth";
pub(super) const PART_SASL: &str = "part_sasl";
pub(super) const PART_BUFFER: &str = "part_buffer";
pub(super) const PART_BATCH: &str = "part_batch";
pub(super) const PART_REQUEST: &str = "part_request";
pub(super) const PART_GCP_RESOURCE: &str = "part_gcp_resource";
pub(super) const PART_OTLP_PROTOCOL: &str = "part_otlp_protocol";

pub(super) const TEMPLATES: &[(&str, &str)] = &[
    (
        SOURCE_KUBERNETES_LOGS,
        r#"# Logs from containers (including openshift containers)
[sources.{{.id}}]
type = "kubernetes_logs"
glob_minimum_cooldown_ms = 15000
auto_partial_merge = true
exclude_paths_glob_patterns = {{quoteList .exclude}}
pod_annotation_fields.pod_labels = "kubernetes.labels"
pod_annotation_fields.pod_namespace = "kubernetes.namespace_name"
pod_annotation_fields.pod_annotations = "kubernetes.annotations"
pod_annotation_fields.pod_uid = "kubernetes.pod_id"
pod_annotation_fields.pod_node_name = "hostname"
"#,
    ),
    (
        SOURCE_JOURNALD,
        r#"[sources.{{.id}}]
type = "journald"
journal_directory = "/var/log/journal"
"#,
    ),
    (
        SOURCE_FILE,
        r#"# {{.desc}}
[sources.{{.id}}]
type = "file"
include = {{quoteList .include}}
host_key = "hostname"
glob_minimum_cooldown_ms = 15000
"#,
    ),
    (
        SOURCE_INTERNAL_METRICS,
        r#"[sources.{{.id}}]
type = "internal_metrics"
"#,
    ),
    (
        REMAP,
        r#"{{with .desc}}# {{.}}
{{end}}[transforms.{{.id}}]
type = "remap"
inputs = {{quoteList .inputs}}
source = '''
{{indent 2 .vrl}}
'''
"#,
    ),
    (
        ROUTE,
        r#"[transforms.{{.id}}]
type = "route"
inputs = {{quoteList .inputs}}
{{range .routes}}route.{{.name}} = '{{.condition}}'
{{end}}"#,
    ),
    (
        FILTER,
        r#"[transforms.{{.id}}]
type = "filter"
inputs = {{quoteList .inputs}}
condition = '{{.condition}}'
"#,
    ),
    (
        SINK_CONSOLE,
        r#"[sinks.{{.id}}]
type = "console"
inputs = {{quoteList .inputs}}
encoding.codec = "json"
"#,
    ),
    (
        SINK_LOKI,
        r#"[sinks.{{.id}}]
type = "loki"
inputs = {{quoteList .inputs}}
endpoint = {{quote .endpoint}}
out_of_order_action = "accept"
healthcheck.enabled = false
{{with .tenant_id}}tenant_id = {{quote .}}
{{end}}{{with .compression}}compression = {{quote .}}
{{end}}"#,
    ),
    (
        SINK_ELASTICSEARCH,
        r#"[sinks.{{.id}}]
type = "elasticsearch"
inputs = {{quoteList .inputs}}
endpoints = {{quoteList .endpoints}}
bulk.index = {{quote .index}}
bulk.action = "create"
encoding.except_fields = ["write_index"]
id_key = "_id"
{{with .api_version}}api_version = {{quote .}}
{{end}}{{if .suppress_type_name}}suppress_type_name = true
{{end}}{{with .compression}}compression = {{quote .}}
{{end}}"#,
    ),
    (
        SINK_KAFKA,
        r#"[sinks.{{.id}}]
type = "kafka"
inputs = {{quoteList .inputs}}
bootstrap_servers = {{quote .bootstrap_servers}}
topic = {{quote .topic}}
healthcheck.enabled = false
{{with .compression}}compression = {{quote .}}
{{end}}"#,
    ),
    (
        SINK_SOCKET,
        r#"[sinks.{{.id}}]
type = "socket"
inputs = {{quoteList .inputs}}
address = {{quote .address}}
mode = {{quote .mode}}
"#,
    ),
    (
        SINK_CLOUDWATCH,
        r#"[sinks.{{.id}}]
type = "aws_cloudwatch_logs"
inputs = {{quoteList .inputs}}
region = {{quote .region}}
compression = {{quote .compression}}
group_name = {{quote .group_name}}
stream_name = {{quote .stream_name}}
{{with .access_key_id}}auth.access_key_id = {{quote .}}
auth.secret_access_key = {{quote $.secret_access_key}}
{{end}}{{with .assume_role}}auth.assume_role = {{quote .}}
{{end}}encoding.codec = "json"
healthcheck.enabled = false
{{with .endpoint}}endpoint = {{quote .}}
{{end}}"#,
    ),
    (
        SINK_HTTP,
        r#"[sinks.{{.id}}]
type = "http"
inputs = {{quoteList .inputs}}
uri = {{quote .uri}}
method = {{quote .method}}
{{with .compression}}compression = {{quote .}}
{{end}}"#,
    ),
    (
        SINK_SPLUNK,
        r#"[sinks.{{.id}}]
type = "splunk_hec_logs"
inputs = {{quoteList .inputs}}
endpoint = {{quote .endpoint}}
compression = {{quote .compression}}
default_token = {{quote .default_token}}
{{with .index}}index = {{quote .}}
{{end}}timestamp_key = "@timestamp"
host_key = "hostname"
"#,
    ),
    (
        SINK_AZURE_MONITOR,
        r#"[sinks.{{.id}}]
type = "azure_monitor_logs"
inputs = {{quoteList .inputs}}
customer_id = {{quote .customer_id}}
log_type = {{quote .log_type}}
shared_key = {{quote .shared_key}}
{{with .azure_resource_id}}azure_resource_id = {{quote .}}
{{end}}{{with .host}}host = {{quote .}}
{{end}}"#,
    ),
    (
        SINK_GCP,
        r#"[sinks.{{.id}}]
type = "gcp_stackdriver_logs"
inputs = {{quoteList .inputs}}
{{.destination_key}} = {{quote .destination}}
credentials_path = {{quote .credentials_path}}
log_id = {{quote .log_id}}
severity_key = "level"
"#,
    ),
    (
        SINK_OTLP,
        r#"[sinks.{{.id}}]
type = "opentelemetry"
inputs = {{quoteList .inputs}}
"#,
    ),
    (
        SINK_PROMETHEUS,
        r#"[sinks.{{.id}}]
type = "prometheus_exporter"
inputs = {{quoteList .inputs}}
address = {{quote .address}}
default_namespace = "collector"
"#,
    ),
    (
        PART_ENCODING,
        r#"[{{.table}}.encoding]
codec = {{quote .codec}}
{{with .timestamp_format}}timestamp_format = {{quote .}}
{{end}}{{with .except_fields}}except_fields = {{quoteList .}}
{{end}}"#,
    ),
    (
        PART_SYSLOG_ENCODING,
        r#"[{{.table}}.encoding]
codec = "syslog"
except_fields = ["_internal"]
rfc = {{quote .rfc}}
facility = {{quote .facility}}
severity = {{quote .severity}}
{{with .app_name}}app_name = {{quote .}}
{{end}}{{with .msg_id}}msg_id = {{quote .}}
{{end}}{{with .proc_id}}proc_id = {{quote .}}
{{end}}{{with .tag}}tag = {{quote .}}
{{end}}{{if .add_log_source}}add_log_source = true
{{end}}{{with .payload_key}}payload_key = {{quote .}}
{{end}}"#,
    ),
    (
        PART_LABELS,
        r#"[{{.table}}.labels]
{{range .labels}}{{.name}} = "{{.value}}"
{{end}}"#,
    ),
    (
        PART_TLS,
        r#"[{{.table}}.tls]
{{if .enabled}}enabled = true
{{end}}{{if .insecure}}verify_certificate = false
verify_hostname = false
{{end}}{{with .min_tls_version}}min_tls_version = {{quote .}}
{{end}}{{with .ciphersuites}}ciphersuites = {{quote .}}
{{end}}{{with .key_file}}key_file = {{quote .}}
{{end}}{{with .crt_file}}crt_file = {{quote .}}
{{end}}{{with .ca_file}}ca_file = {{quote .}}
{{end}}{{with .key_pass}}key_pass = {{quote .}}
{{end}}"#,
    ),
    (
        PART_AUTH,
        r#"[{{.table}}.auth]
strategy = {{quote .strategy}}
{{if eq .strategy "basic"}}user = {{quote .user}}
password = {{quote .password}}
{{else}}token = {{quote .token}}
{{end}}"#,
    ),
    (
        PART_SASL,
        r#"[{{.table}}.sasl]
enabled = true
mechanism = {{quote .mechanism}}
username = {{quote .username}}
password = {{quote .password}}
"#,
    ),
    (
        PART_BUFFER,
        r#"[{{.table}}.buffer]
{{with .type}}type = {{quote .}}
{{end}}{{with .max_size}}max_size = {{.}}
{{end}}when_full = {{quote .when_full}}
"#,
    ),
    (
        PART_BATCH,
        r#"[{{.table}}.batch]
max_bytes = {{.max_bytes}}
"#,
    ),
    (
        PART_REQUEST,
        r#"[{{.table}}.request]
{{with .timeout_secs}}timeout_secs = {{.}}
{{end}}{{with .retry_initial_backoff_secs}}retry_initial_backoff_secs = {{.}}
{{end}}{{with .retry_max_duration_secs}}retry_max_duration_secs = {{.}}
{{end}}{{with .headers}}headers = {{.}}
{{end}}"#,
    ),
    (
        PART_GCP_RESOURCE,
        r#"[{{.table}}.resource]
type = "k8s_node"
node_name = {{quote .node_name}}
"#,
    ),
    (
        PART_OTLP_PROTOCOL,
        r#"[{{.table}}.protocol]
type = "http"
uri = {{quote .uri}}
method = "post"
encoding.codec = "json"
payload_prefix = {{quote .payload_prefix}}
payload_suffix = "}"
{{with .compression}}compression = {{quote .}}
{{end}}"#,
    ),
];
