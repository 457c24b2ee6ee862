use super::*;
use crate::auth::SERVICE_ACCOUNT_TOKEN_PATH;
use crate::error::CompileReason;

fn with_tuning(body: &str, tuning: &str) -> String {
    format!("{}\n[tuning]\n{tuning}\n", single_output(body))
}

// =========================================================================
// Elasticsearch
// =========================================================================

#[test]
fn elasticsearch_retries_under_its_own_tag() {
    let text = render(&single_output(
        "type = \"elasticsearch\"\nurl = \"http://es.svc:9200\"",
    ));
    let es = label(&text, "@OUT");
    assert!(es.contains(
        "  <match retry_out>\n    @type elasticsearch\n    @id retry_out\n    host es.svc\n    port 9200\n    scheme http\n    target_index_key viaq_index_name\n"
    ));
    assert!(es.contains("  <match **>\n    @type elasticsearch\n    @id out\n"));
    assert!(es.contains("    retry_tag retry_out\n"));
    assert_eq!(es.matches("retry_tag").count(), 1);
    assert!(es.contains("      path '/var/lib/fluentd/retry_out'\n"));
    assert!(es.contains("      path '/var/lib/fluentd/out'\n"));
    assert!(es.contains("    remove_keys structured\n"));
    assert!(!es.contains("ssl_version"));
}

#[test]
fn elasticsearch_basic_auth_and_client_certs() {
    let secrets = secret(
        "es-secret",
        &[
            ("username", "elastic"),
            ("password", "changeme"),
            ("tls.crt", "CERT"),
            ("ca-bundle.crt", "CA"),
        ],
    );
    let text = render_with(
        &single_output(
            "type = \"elasticsearch\"\nurl = \"https://es.svc\"\nsecret = { name = \"es-secret\" }",
        ),
        &secrets,
        &Options::default(),
    );
    let es = label(&text, "@OUT");
    assert!(es.contains("    port 9200\n    scheme https\n    ssl_version TLSv1_2\n"));
    assert!(es.contains(
        "    user \"#{File.exists?('/var/run/ocp-collector/secrets/es-secret/username') ? open('/var/run/ocp-collector/secrets/es-secret/username','r') do |f|f.read end : ''}\"\n"
    ));
    assert!(es.contains("    client_cert /var/run/ocp-collector/secrets/es-secret/tls.crt\n"));
    assert!(es.contains("    ca_file /var/run/ocp-collector/secrets/es-secret/ca-bundle.crt\n"));
    assert!(!es.contains("client_key"));
    assert!(!es.contains("changeme"));
}

#[test]
fn elasticsearch_bearer_token_becomes_a_header() {
    let secrets = secret("es-secret", &[("token", "abc")]);
    let text = render_with(
        &single_output(
            "type = \"elasticsearch\"\nurl = \"http://es:9200\"\nsecret = { name = \"es-secret\" }",
        ),
        &secrets,
        &Options::default(),
    );
    assert!(text.contains(r#"    custom_headers {"Authorization":"Bearer abc"}"#));
}

#[test]
fn tuning_reaches_the_buffer() {
    let text = render(&with_tuning(
        "type = \"elasticsearch\"\nurl = \"http://es:9200\"",
        "flushMode = \"lazy\"\nflushThreadCount = 4\noverflowAction = \"drop_oldest_chunk\"",
    ));
    let es = label(&text, "@OUT");
    assert!(es.contains("      flush_mode lazy\n      flush_thread_count 4\n"));
    assert!(es.contains("      overflow_action drop_oldest_chunk\n"));
    assert!(!es.contains("flush_interval"));
}

// =========================================================================
// Forward
// =========================================================================

#[test]
fn forward_over_tls_with_shared_key() {
    let secrets = secret("fwd-secret", &[("shared_key", "k"), ("ca-bundle.crt", "CA")]);
    let text = render_with(
        &single_output(
            "type = \"fluentForward\"\nurl = \"tls://fwd.svc:24224\"\nsecret = { name = \"fwd-secret\" }",
        ),
        &secrets,
        &Options::default(),
    );
    let fwd = label(&text, "@OUT");
    assert!(fwd.contains("    @type forward\n    @id out\n    <security>\n      self_hostname ${hostname}\n"));
    assert!(fwd.contains(
        "      shared_key \"#{File.exists?('/var/run/ocp-collector/secrets/fwd-secret/shared_key')"
    ));
    assert!(fwd.contains("      host fwd.svc\n      port 24224\n"));
    assert!(fwd.contains("    transport tls\n    tls_verify_hostname false\n    tls_version 'TLSv1_2'\n"));
    assert!(fwd.contains(
        "    tls_cert_path '/var/run/ocp-collector/secrets/fwd-secret/ca-bundle.crt'\n"
    ));
    assert!(fwd.contains("      flush_interval 5s\n"));
}

#[test]
fn plain_forward_has_no_tls() {
    let text = render(&single_output("type = \"fluentForward\"\nurl = \"tcp://fwd.svc\""));
    let fwd = label(&text, "@OUT");
    assert!(fwd.contains("      port 24224\n"));
    assert!(!fwd.contains("transport tls"));
    assert!(!fwd.contains("<security>"));
}

// =========================================================================
// Syslog
// =========================================================================

const SYSLOG: &str = "type = \"syslog\"\nurl = \"tcp://syslog.svc:6514\"\nsyslog = { rfc = \"RFC3164\", appName = \"$.kubernetes.namespace_name\" }";

#[test]
fn syslog_placeholders_key_the_buffer() {
    let text = render(&single_output(SYSLOG));
    let sys = label(&text, "@OUT");
    assert!(sys.contains(
        "    @type remote_syslog\n    @id out\n    host syslog.svc\n    port 6514\n    rfc rfc3164\n    facility user\n    severity debug\n    appname ${$.kubernetes.namespace_name}\n    protocol tcp\n"
    ));
    assert!(sys.contains("    keep_alive true\n"));
    assert!(sys.contains("    <buffer $.kubernetes.namespace_name>\n"));
    assert!(sys.contains("    <format>\n      @type json\n    </format>\n"));
}

#[test]
fn syslog_record_facility_and_severity() {
    let text = render(&single_output(
        "type = \"syslog\"\nurl = \"tcp://syslog.svc:6514\"\nsyslog = { facility = \"$.kubernetes.fac\", severity = \"$.level\", appName = \"${tag[0]}\" }",
    ));
    let sys = label(&text, "@OUT");
    assert!(sys.contains("    facility ${$.kubernetes.fac}\n    severity ${$.level}\n"), "{sys}");
    assert!(sys.contains("    appname ${tag[0]}\n"));
    assert!(sys.contains("    <buffer tag, $.kubernetes.fac, $.level>\n"), "{sys}");
}

#[test]
fn syslog_keyword_facility_is_literal() {
    let text = render(&single_output(
        "type = \"syslog\"\nurl = \"tcp://syslog.svc:6514\"\nsyslog = { facility = \"local0\", severity = \"info\" }",
    ));
    let sys = label(&text, "@OUT");
    assert!(sys.contains("    facility local0\n    severity info\n"));
    assert!(sys.contains("    <buffer>\n"), "{sys}");
}

#[test]
fn syslog_old_plugin() {
    let options = Options {
        use_old_remote_syslog_plugin: true,
        ..Default::default()
    };
    let text = render_with(&single_output(SYSLOG), &Secrets::new(), &options);
    let sys = label(&text, "@OUT");
    assert!(sys.contains("    @type syslog_buffered\n    @id out\n    remote_syslog syslog.svc\n    port 6514\n"));
    assert!(!sys.contains("@type remote_syslog"));
    assert!(!sys.contains("<buffer"));
}

#[test]
fn syslog_over_udp_has_no_keepalive() {
    let text = render(&single_output("type = \"syslog\"\nurl = \"udp://syslog.svc\""));
    let sys = label(&text, "@OUT");
    assert!(sys.contains("    port 514\n    rfc rfc5424\n"));
    assert!(sys.contains("    protocol udp\n"));
    assert!(!sys.contains("keep_alive"));
}

// =========================================================================
// Kafka
// =========================================================================

#[test]
fn kafka_topic_from_url_and_sasl() {
    let secrets = secret(
        "kafka-secret",
        &[
            ("username", "u"),
            ("password", "p"),
            ("sasl.mechanisms", "SCRAM-SHA-512"),
            ("ca-bundle.crt", "CA"),
        ],
    );
    let text = render_with(
        &single_output(
            "type = \"kafka\"\nurl = \"tls://broker.svc:9093/app-logs\"\nsecret = { name = \"kafka-secret\" }",
        ),
        &secrets,
        &Options::default(),
    );
    let kafka = label(&text, "@OUT");
    assert!(kafka.contains("    brokers broker.svc:9093\n    default_topic app-logs\n"));
    assert!(kafka.contains("    sasl_over_ssl true\n"));
    assert!(kafka.contains("    scram_mechanism sha512\n"));
    assert!(kafka.contains(
        "    ssl_ca_cert '/var/run/ocp-collector/secrets/kafka-secret/ca-bundle.crt'\n"
    ));
    assert!(kafka.contains("_dummy_ ${if m=record.dig(\"kubernetes\",\"namespace_labels\")"));
}

#[test]
fn kafka_broker_list_overrides_url() {
    let text = render(&single_output(
        "type = \"kafka\"\nkafka = { brokers = [\"tcp://b1:9092\", \"tcp://b2:9092\"], topic = \"t\" }",
    ));
    let kafka = label(&text, "@OUT");
    assert!(kafka.contains("    brokers b1:9092,b2:9092\n    default_topic t\n"));
    assert!(!kafka.contains("sasl_over_ssl"));
}

// =========================================================================
// Loki
// =========================================================================

#[test]
fn loki_labels_and_tenant() {
    let text = render(&single_output(
        "type = \"loki\"\nurl = \"https://logs.example.com/\"\nloki = { tenantKey = \"kubernetes.namespace_name\" }",
    ));
    let loki = label(&text, "@OUT");
    assert!(loki.contains("    url https://logs.example.com\n    tenant ${$.kubernetes.namespace_name}\n"));
    assert!(loki.contains(
        "      _kubernetes_container_name ${record.dig(\"kubernetes\",\"container_name\")}\n      _kubernetes_host \"#{ENV['NODE_NAME']}\"\n"
    ));
    assert!(loki.contains(
        "    <label>\n      kubernetes_container_name _kubernetes_container_name\n      kubernetes_host _kubernetes_host\n      kubernetes_namespace_name _kubernetes_namespace_name\n      kubernetes_pod_name _kubernetes_pod_name\n      log_type _log_type\n    </label>\n"
    ));
    assert!(loki.contains("    <buffer $.kubernetes.namespace_name>\n"));
}

#[test]
fn loki_bearer_token_file() {
    let secrets = secret("loki-secret", &[("token", "abc")]);
    let text = render_with(
        &single_output(
            "type = \"loki\"\nurl = \"http://loki:3100\"\nsecret = { name = \"loki-secret\" }",
        ),
        &secrets,
        &Options::default(),
    );
    let loki = label(&text, "@OUT");
    assert!(loki.contains("    bearer_token_file /var/run/ocp-collector/secrets/loki-secret/token\n"));
    assert!(!loki.contains("tenant "));
    assert!(!loki.contains("abc"));
}

// =========================================================================
// Cloudwatch
// =========================================================================

#[test]
fn cloudwatch_static_keys_and_groups() {
    let secrets = secret(
        "cw",
        &[("aws_access_key_id", "AKIA"), ("aws_secret_access_key", "s3cr3t")],
    );
    let text = render_with(
        &single_output(
            "type = \"cloudwatch\"\nsecret = { name = \"cw\" }\ncloudwatch = { region = \"us-east-2\", groupBy = \"namespaceName\", groupPrefix = \"acme\" }",
        ),
        &secrets,
        &Options::default(),
    );
    let cw = label(&text, "@OUT");
    assert!(cw.contains("    region us-east-2\n"));
    assert!(cw.contains("      cw_group_name acme.${record['kubernetes']['namespace_name']}\n"));
    assert!(cw.contains("      cw_group_name acme.infrastructure\n"));
    assert!(cw.contains(
        "    aws_key_id \"#{open('/var/run/ocp-collector/secrets/cw/aws_access_key_id','r') do |f|f.read.strip end}\"\n"
    ));
    assert!(!cw.contains("web_identity_credentials"));
    assert!(!cw.contains("AKIA"));
}

#[test]
fn cloudwatch_role_arn_uses_web_identity() {
    let secrets = secret("cw", &[("role_arn", "arn:aws:iam::123456789012:role/logs\n")]);
    let text = render_with(
        &single_output(
            "type = \"cloudwatch\"\nsecret = { name = \"cw\" }\ncloudwatch = { region = \"us-east-2\" }",
        ),
        &secrets,
        &Options::default(),
    );
    let cw = label(&text, "@OUT");
    assert!(cw.contains("      role_arn \"arn:aws:iam::123456789012:role/logs\"\n"));
    assert!(cw.contains(&format!(
        "      web_identity_token_file \"{SERVICE_ACCOUNT_TOKEN_PATH}\"\n"
    )));
    assert!(cw.contains("      cw_group_name application\n"));
}

#[test]
fn cloudwatch_without_region_is_rejected() {
    let spec = spec(&single_output("type = \"cloudwatch\""));
    let err = build(&spec, &plan_routes(&spec), &Secrets::new(), &Options::default()).unwrap_err();
    assert_eq!(err.reason(), &CompileReason::SpecRequiredField);
}

// =========================================================================
// HTTP
// =========================================================================

#[test]
fn http_basic_auth_reads_files() {
    let secrets = secret("http-secret", &[("username", "u"), ("password", "p")]);
    let text = render_with(
        &single_output(
            "type = \"http\"\nurl = \"https://h.example.com/logs\"\nsecret = { name = \"http-secret\" }\nhttp = { method = \"PUT\", timeout = 30, headers = { \"X-Env\" = \"prod\" } }",
        ),
        &secrets,
        &Options::default(),
    );
    let http = label(&text, "@OUT");
    assert!(http.contains(
        "    endpoint https://h.example.com/logs\n    http_method put\n    content_type \"application/x-ndjson\"\n    read_timeout 30\n    headers {\"X-Env\":\"prod\"}\n"
    ));
    assert!(http.contains(
        "    <auth>\n      method basic\n      username \"#{File.read('/var/run/ocp-collector/secrets/http-secret/username') rescue nil}\"\n"
    ));
    assert!(http.contains("    tls_version TLSv1_2\n"));
}

#[test]
fn http_bearer_token_is_a_header() {
    let secrets = secret("http-secret", &[("token", "abc")]);
    let text = render_with(
        &single_output(
            "type = \"http\"\nurl = \"http://h\"\nsecret = { name = \"http-secret\" }",
        ),
        &secrets,
        &Options::default(),
    );
    let http = label(&text, "@OUT");
    assert!(http.contains("    http_method post\n"));
    assert!(http.contains("    read_timeout 10\n"));
    assert!(http.contains(r#"    headers {"Authorization":"Bearer abc"}"#));
    assert!(!http.contains("<auth>"));
}

// =========================================================================
// Unsupported
// =========================================================================

#[test]
fn splunk_has_no_fluentd_store() {
    let spec = spec(&single_output(
        "type = \"splunk\"\nurl = \"https://splunk:8088\"",
    ));
    let err = build(&spec, &plan_routes(&spec), &Secrets::new(), &Options::default()).unwrap_err();
    assert_eq!(err.reason(), &CompileReason::SpecUnknownOutputType);
}
