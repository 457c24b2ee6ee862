use super::*;
use crate::ir::Stage;

const HTTP: &str = "type = \"http\"\nurl = \"http://collector.example.com\"";

/// Every reserved kind, a selector input and two outputs.
const ALL_INPUTS: &str = r#"
[[inputs]]
name = "web"
application = { namespaces = ["web", "shop"], selector = { matchLabels = { tier = "front" } } }

[[outputs]]
name = "es-1"
type = "elasticsearch"
url = "http://es.svc:9200"

[[outputs]]
name = "fwd"
type = "fluentForward"
url = "tcp://fwd.svc:24224"

[[pipelines]]
name = "web-apps"
inputRefs = ["web"]
outputRefs = ["es-1"]
labels = { team = "a", env = "prod" }
parse = "json"

[[pipelines]]
name = "all"
inputRefs = ["application", "infrastructure", "audit"]
outputRefs = ["es-1", "fwd"]
"#;

// =========================================================================
// Graph
// =========================================================================

#[test]
fn every_label_is_defined_before_it_is_referenced() {
    let spec = spec(ALL_INPUTS);
    let arena = arena(&spec, &Secrets::new(), &Options::default());
    assert!(arena.dangling_inputs(&[]).is_empty(), "{:?}", arena.dangling_inputs(&[]));

    let ids: Vec<&str> = arena.ids().collect();
    let pos = |id: &str| ids.iter().position(|i| *i == id).unwrap();
    assert!(pos("@CONCAT") < pos("@INGRESS"));
    assert!(pos("@INGRESS") < pos("@_APPLICATION"));
    assert!(pos("@_APPLICATION") < pos("@_APPLICATION_ALL"));
    assert!(pos("@_APPLICATION_ALL") < pos("@ALL"));
    assert!(pos("@ALL") < pos("@ES_1"));
    assert_eq!(arena.by_stage(Stage::Sink).count(), 2);
}

#[test]
fn rendering_is_deterministic() {
    assert_eq!(render(ALL_INPUTS), render(ALL_INPUTS));
}

// =========================================================================
// Sources and ingress
// =========================================================================

#[test]
fn application_only_tails_containers() {
    let text = render(&single_output(HTTP));
    assert!(text.starts_with("## CLF GENERATED CONFIGURATION ###"));
    assert!(text.contains("<source>\n  @type prometheus\n"));
    assert!(text.contains("  @id container-input\n"));
    assert!(text.contains("  @label @CONCAT\n"));
    assert!(!text.contains("systemd-input"));
    assert!(!text.contains("@id audit-input"));

    let ingress = label(&text, "@INGRESS");
    assert!(ingress.contains(
        "  # Include Application logs\n  <match kubernetes.**>\n    @type relabel\n    @label @_APPLICATION\n  </match>"
    ));
    assert!(ingress.contains("  # Discard Infrastructure logs\n"));
    assert!(ingress.contains("  # Discard Audit logs\n"));
    assert!(ingress.ends_with("  <match **>\n    @type stdout\n  </match>\n</label>"));
}

#[test]
fn infrastructure_is_matched_before_application() {
    let text = render(ALL_INPUTS);
    let ingress = label(&text, "@INGRESS");
    let infra = ingress.find("# Include Infrastructure logs").unwrap();
    let app = ingress.find("# Include Application logs").unwrap();
    let audit = ingress.find("# Include Audit logs").unwrap();
    assert!(infra < app && app < audit);
}

#[test]
fn audit_kind_adds_audit_tails() {
    let text = render(ALL_INPUTS);
    for id in ["audit-input", "k8s-audit-input", "openshift-audit-input", "ovn-audit-input"] {
        assert!(text.contains(&format!("  @id {id}\n")), "{id}");
    }
    assert!(text.contains("    time_key requestReceivedTimestamp\n"));
    assert!(text.contains("    @type viaq_host_audit\n"));
    assert!(text.contains("  @id systemd-input\n"));
}

#[test]
fn metrics_follow_the_tls_profile() {
    let options = Options {
        min_tls_version: Some("VersionTLS12".into()),
        ciphers: vec!["TLS_AES_128_GCM_SHA256".into(), "TLS_AES_256_GCM_SHA384".into()],
        ..Default::default()
    };
    let text = render_with(&single_output(HTTP), &Secrets::new(), &options);
    assert!(text.contains("    min_version TLS1_2\n"));
    assert!(text.contains("    ciphers TLS_AES_128_GCM_SHA256:TLS_AES_256_GCM_SHA384\n"));

    let plain = render(&single_output(HTTP));
    assert!(!plain.contains("min_version"));
}

// =========================================================================
// Kind and pipeline labels
// =========================================================================

#[test]
fn kind_label_relabels_to_its_only_pipeline() {
    let text = render(&single_output(HTTP));
    let app = label(&text, "@_APPLICATION");
    assert!(app.contains("      log_type application\n"));
    assert!(app.ends_with("  <match **>\n    @type relabel\n    @label @P\n  </match>\n</label>"));
}

#[test]
fn selected_application_goes_through_the_label_router() {
    let text = render(ALL_INPUTS);
    let app = label(&text, "@_APPLICATION");
    assert!(app.contains("    @type label_router\n"));
    assert!(app.contains(
        "    <route>\n      @label @WEB_APPS\n      <match>\n        namespaces web, shop\n        labels tier:front\n      </match>\n    </route>"
    ));
    assert!(app.contains(
        "    <route>\n      @label @_APPLICATION_ALL\n      <match>\n      </match>\n    </route>"
    ));

    let rest = label(&text, "@_APPLICATION_ALL");
    assert!(rest.contains("    @label @ALL\n"));

    let spec = spec(ALL_INPUTS);
    let arena = arena(&spec, &Secrets::new(), &Options::default());
    assert_eq!(arena.get("@WEB_APPS").unwrap().inputs, vec!["@_APPLICATION"]);
    assert_eq!(
        arena.get("@ALL").unwrap().inputs,
        vec!["@_APPLICATION_ALL", "@_INFRASTRUCTURE", "@_AUDIT"]
    );
}

#[test]
fn selector_without_a_direct_reader_has_no_fallback() {
    let text = render(
        r#"
[[inputs]]
name = "web"
application = { namespaces = ["web"] }

[[outputs]]
name = "out"
type = "http"
url = "http://h"

[[pipelines]]
name = "p"
inputRefs = ["web"]
outputRefs = ["out"]
"#,
    );
    let app = label(&text, "@_APPLICATION");
    assert!(app.contains("        namespaces web\n"));
    assert!(!app.contains("@_APPLICATION_ALL"));
    assert!(!text.contains("<label @_APPLICATION_ALL>"));
}

#[test]
fn pipeline_label_adds_labels_and_parses_json() {
    let text = render(ALL_INPUTS);
    let web = label(&text, "@WEB_APPS");
    assert!(web.contains(r#"      openshift { "labels": {"env":"prod","team":"a"} }"#));
    assert!(web.contains("    @type parser\n"));
    assert!(web.ends_with("  <match **>\n    @type relabel\n    @label @ES_1\n  </match>\n</label>"));

    let all = label(&text, "@ALL");
    assert!(!all.contains("openshift {"));
    assert!(all.contains(
        "    @type copy\n    copy_mode deep\n    <store>\n      @type relabel\n      @label @ES_1\n    </store>\n    <store>\n      @type relabel\n      @label @FWD\n    </store>"
    ));
}

#[test]
fn debug_mode_prints_pipelines_to_stdout() {
    let options = Options::default().with_debug(true);
    let text = render_with(ALL_INPUTS, &Secrets::new(), &options);
    let all = label(&text, "@ALL");
    assert!(all.ends_with("  <match **>\n    @type stdout\n  </match>\n</label>"));
    assert!(!text.contains("<label @ES_1>"));
    assert!(!text.contains("@type elasticsearch\n"));
    assert!(!text.contains("@type forward\n"));
}

// =========================================================================
// Legacy forwarding
// =========================================================================

#[test]
fn legacy_forwarding_reads_every_kind() {
    let options = Options {
        include_legacy_secure_forward: true,
        include_legacy_syslog: true,
        ..Default::default()
    };
    let spec = spec("");
    let arena = arena(&spec, &Secrets::new(), &options);
    assert_eq!(
        arena.get("@_LEGACY_SECUREFORWARD").unwrap().inputs,
        vec!["@_APPLICATION", "@_INFRASTRUCTURE", "@_AUDIT"]
    );
    assert!(arena.dangling_inputs(&[]).is_empty());

    let text = generate(&spec, &plan_routes(&spec), &Secrets::new(), &options).unwrap();
    assert_eq!(
        label(&text, "@_LEGACY_SECUREFORWARD"),
        "<label @_LEGACY_SECUREFORWARD>\n  <match **>\n    @type copy\n    #include legacy secure-forward.conf\n    @include /etc/fluent/configs.d/secure-forward/secure-forward.conf\n  </match>\n</label>"
    );
    assert!(text.contains("    @include /etc/fluent/configs.d/syslog/syslog.conf\n"));
    let infra = label(&text, "@_INFRASTRUCTURE");
    assert!(infra.contains("      @label @_LEGACY_SECUREFORWARD\n    </store>"));
    assert!(infra.contains("      @label @_LEGACY_SYSLOG\n    </store>"));
    assert!(!infra.contains("copy_mode deep"));
}

#[test]
fn no_pipelines_means_no_kind_labels() {
    let spec = spec("");
    let arena = arena(&spec, &Secrets::new(), &Options::default());
    let ids: Vec<&str> = arena.ids().collect();
    assert_eq!(ids, vec!["system", "metrics", "@INGRESS"]);
}
