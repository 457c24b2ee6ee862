//! Kind labels, the application label router, pipeline labels and the
//! legacy forwarding labels.

use std::collections::BTreeMap;

use clf_config::{ForwarderSpec, InputKind, InputSpec, Options, ParseFormat};
use serde::Serialize;

use super::templates::{LABEL_FAN, LABEL_LEGACY, LABEL_PIPELINE, LABEL_SOURCE_TYPE};
use crate::error::{CompileResult, internal};
use crate::ir::{Element, Stage};
use crate::template::{label_name, source_type_label_name};

pub(super) const CONCAT: &str = "@CONCAT";
pub(super) const INGRESS: &str = "@INGRESS";
pub(super) const APPLICATION_ALL: &str = "@_APPLICATION_ALL";
pub(super) const LEGACY_SECURE_FORWARD: &str = "@_LEGACY_SECUREFORWARD";
pub(super) const LEGACY_SYSLOG: &str = "@_LEGACY_SYSLOG";

/// Labels the generator defines itself. Pipeline and output labels must not
/// collide with them.
pub const RESERVED_LABELS: [&str; 8] = [
    CONCAT,
    INGRESS,
    "@_APPLICATION",
    APPLICATION_ALL,
    "@_INFRASTRUCTURE",
    "@_AUDIT",
    LEGACY_SECURE_FORWARD,
    LEGACY_SYSLOG,
];

pub(super) fn kind_label(kind: InputKind) -> String {
    source_type_label_name(kind.as_str())
}

/// An application input narrowed by namespace or pod labels, routed to one
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Selected {
    pub namespaces: Vec<String>,
    /// `key:value` pairs.
    pub labels: Vec<String>,
    pub pipeline: String,
}

/// Where the events of one reserved kind go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct KindRoute {
    pub kind: InputKind,
    /// Pipeline labels reading every event of the kind. Source subsets
    /// count as the whole kind.
    pub direct: Vec<String>,
    pub selected: Vec<Selected>,
    pub legacy: Vec<&'static str>,
}

impl KindRoute {
    fn new(kind: InputKind) -> Self {
        Self {
            kind,
            direct: Vec::new(),
            selected: Vec::new(),
            legacy: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.selected.is_empty() && self.legacy.is_empty()
    }

    /// Direct pipeline labels followed by the legacy labels.
    fn fan_targets(&self) -> Vec<String> {
        self.direct
            .iter()
            .cloned()
            .chain(self.legacy.iter().map(|l| l.to_string()))
            .collect()
    }

    /// The router sends unselected events on to `@_APPLICATION_ALL`.
    fn has_fallback(&self) -> bool {
        !self.selected.is_empty() && !(self.direct.is_empty() && self.legacy.is_empty())
    }
}

/// The routed reserved kinds, in [`InputKind::ALL`] order.
#[derive(Debug, Clone, Default)]
pub(super) struct SourceRouting {
    kinds: BTreeMap<InputKind, KindRoute>,
}

impl SourceRouting {
    pub fn plan(spec: &ForwarderSpec, options: &Options) -> Self {
        let mut kinds: BTreeMap<InputKind, KindRoute> = InputKind::ALL
            .into_iter()
            .map(|k| (k, KindRoute::new(k)))
            .collect();

        for p in &spec.pipelines {
            let pipeline = label_name(p.name());
            for r in &p.input_refs {
                let (kind, selected) = match InputKind::from_name(r) {
                    Some(kind) => (kind, None),
                    None => {
                        let Some(input) = spec.input(r) else { continue };
                        let Some(kind) = input.kind() else { continue };
                        let selected = input
                            .has_app_selector()
                            .then(|| selection(input, &pipeline));
                        (kind, selected.flatten())
                    }
                };
                let Some(route) = kinds.get_mut(&kind) else { continue };
                match selected {
                    Some(s) => route.selected.push(s),
                    None if !route.direct.contains(&pipeline) => route.direct.push(pipeline.clone()),
                    None => {}
                }
            }
        }

        for route in kinds.values_mut() {
            if options.include_legacy_secure_forward {
                route.legacy.push(LEGACY_SECURE_FORWARD);
            }
            if options.include_legacy_syslog {
                route.legacy.push(LEGACY_SYSLOG);
            }
        }
        kinds.retain(|_, r| !r.is_empty());
        Self { kinds }
    }

    pub fn has(&self, kind: InputKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    pub fn routes(&self) -> impl Iterator<Item = &KindRoute> {
        self.kinds.values()
    }

    pub fn kind_labels(&self) -> Vec<String> {
        self.kinds.keys().map(|k| kind_label(*k)).collect()
    }

    /// Label a pipeline reads `kind` from.
    fn source_of(&self, kind: InputKind, selected: bool) -> String {
        let routed_app = kind == InputKind::Application
            && self.kinds.get(&kind).is_some_and(|r| !r.selected.is_empty());
        if routed_app && !selected {
            APPLICATION_ALL.to_string()
        } else {
            kind_label(kind)
        }
    }
}

fn selection(input: &InputSpec, pipeline: &str) -> Option<Selected> {
    let app = input.application.as_ref()?;
    let labels = app
        .selector
        .as_ref()
        .map(|s| s.match_labels.iter().map(|(k, v)| format!("{k}:{v}")).collect())
        .unwrap_or_default();
    Some(Selected {
        namespaces: app.namespaces.clone(),
        labels,
        pipeline: pipeline.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub(super) struct FanParams {
    stdout: bool,
    single: Option<String>,
    copy: Option<CopyParams>,
}

#[derive(Debug, Serialize)]
struct CopyParams {
    deep: bool,
    targets: Vec<String>,
}

/// Relabel to a single target, copy to several.
pub(super) fn fan(targets: Vec<String>, deep: bool) -> FanParams {
    match targets.len() {
        0 => FanParams {
            stdout: true,
            ..Default::default()
        },
        1 => FanParams {
            single: targets.into_iter().next(),
            ..Default::default()
        },
        _ => FanParams {
            copy: Some(CopyParams { deep, targets }),
            ..Default::default()
        },
    }
}

// ---------------------------------------------------------------------------
// Kind labels
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RouterParams {
    routes: Vec<RouterRoute>,
    fallback: Option<&'static str>,
}

#[derive(Serialize)]
struct RouterRoute {
    label: String,
    namespaces: Vec<String>,
    labels: Vec<String>,
}

/// One label per routed kind, plus `@_APPLICATION_ALL` when the application
/// stream is split by a label router.
pub(super) fn kind_labels(routing: &SourceRouting) -> CompileResult<Vec<Element>> {
    let mut out = Vec::new();
    for route in routing.routes() {
        let id = kind_label(route.kind);
        let router = (!route.selected.is_empty()).then(|| RouterParams {
            routes: route
                .selected
                .iter()
                .map(|s| RouterRoute {
                    label: s.pipeline.clone(),
                    namespaces: s.namespaces.clone(),
                    labels: s.labels.clone(),
                })
                .collect(),
            fallback: route.has_fallback().then_some(APPLICATION_ALL),
        });
        let fan_params = fan(route.fan_targets(), false);
        tracing::trace!(
            kind = %route.kind,
            direct = route.direct.len(),
            selected = route.selected.len(),
            "kind label"
        );
        out.push(Element::new(
            Stage::Section,
            id.clone(),
            vec![INGRESS.to_string()],
            LABEL_SOURCE_TYPE,
            serde_json::json!({
                "kind": route.kind.as_str(),
                "router": router,
                "fan": fan_params,
            }),
        )?);

        if route.has_fallback() {
            out.push(Element::new(
                Stage::Section,
                APPLICATION_ALL,
                vec![id],
                LABEL_FAN,
                serde_json::json!({
                    "desc": "Sending unrouted application to pipelines",
                    "fan": fan(route.fan_targets(), false),
                }),
            )?);
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Pipeline labels
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PipelineParams<'a> {
    name: &'a str,
    labels: Option<String>,
    parse_json: bool,
    fan: FanParams,
}

/// One label per pipeline: optional label and parse filters, then a deep
/// copy to its outputs, or stdout in debug mode.
pub(super) fn pipeline_labels(
    spec: &ForwarderSpec,
    routing: &SourceRouting,
    options: &Options,
) -> CompileResult<Vec<Element>> {
    let mut out = Vec::new();
    for p in &spec.pipelines {
        let mut inputs: Vec<String> = Vec::new();
        for r in &p.input_refs {
            let source = match InputKind::from_name(r) {
                Some(kind) => routing.source_of(kind, false),
                None => match spec.input(r).and_then(|i| i.kind().map(|k| (k, i))) {
                    Some((kind, input)) => routing.source_of(kind, input.has_app_selector()),
                    None => continue,
                },
            };
            if !inputs.contains(&source) {
                inputs.push(source);
            }
        }

        let labels = if p.labels.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&p.labels)
                    .map_err(|e| internal(format!("pipeline `{}` labels: {e}", p.name())))?,
            )
        };
        let targets = if options.debug {
            Vec::new()
        } else {
            p.output_refs.iter().map(|o| label_name(o)).collect()
        };
        out.push(Element::new(
            Stage::Transform,
            label_name(p.name()),
            inputs,
            LABEL_PIPELINE,
            PipelineParams {
                name: p.name(),
                labels,
                parse_json: p.parse == Some(ParseFormat::Json),
                fan: fan(targets, true),
            },
        )?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Legacy forwarding
// ---------------------------------------------------------------------------

/// `@include` hand-offs to the legacy secure-forward and syslog files.
pub(super) fn legacy_labels(
    routing: &SourceRouting,
    options: &Options,
) -> CompileResult<Vec<Element>> {
    let legacy = [
        (
            options.include_legacy_secure_forward,
            LEGACY_SECURE_FORWARD,
            "legacy secure-forward.conf",
            "/etc/fluent/configs.d/secure-forward/secure-forward.conf",
        ),
        (
            options.include_legacy_syslog,
            LEGACY_SYSLOG,
            "legacy Syslog",
            "/etc/fluent/configs.d/syslog/syslog.conf",
        ),
    ];
    legacy
        .into_iter()
        .filter(|(enabled, ..)| *enabled)
        .map(|(_, id, desc, include)| {
            Element::new(
                Stage::Sink,
                id,
                routing.kind_labels(),
                LABEL_LEGACY,
                serde_json::json!({ "desc": desc, "include": include }),
            )
        })
        .collect()
}
