use clf_config::secrets::{CLIENT_PASSWORD, CLIENT_USERNAME, SASL_ENABLE, SASL_MECHANISMS};
use serde::Serialize;
use serde_json::json;

use super::{Extras, Sink, endpoint_error, finish};
use crate::endpoint::{kafka_brokers, kafka_topic, kafka_uses_tls};
use crate::error::CompileResult;
use crate::ir::{Element, Stage};
use crate::vector::common::{compression, is_template, vrl_template};
use crate::vector::sources::remap;
use crate::vector::templates::{PART_ENCODING, PART_SASL, SINK_KAFKA};

const DEFAULT_SASL_MECHANISM: &str = "PLAIN";

#[derive(Serialize)]
struct KafkaParams {
    bootstrap_servers: String,
    topic: String,
    compression: Option<String>,
}

#[derive(Serialize)]
struct SaslParams<'a> {
    table: String,
    mechanism: &'a str,
    username: &'a str,
    password: &'a str,
}

fn sasl<'a>(sink: &'a Sink<'_>) -> Option<SaslParams<'a>> {
    let username = sink.secret_value(CLIENT_USERNAME)?;
    let password = sink.secret_value(CLIENT_PASSWORD)?;
    let mechanism = sink.secret_value(SASL_MECHANISMS);
    let enabled = sink.secret_value(SASL_ENABLE) == Some("true") || mechanism.is_some();
    enabled.then(|| SaslParams {
        table: sink.table(),
        mechanism: mechanism.unwrap_or(DEFAULT_SASL_MECHANISM),
        username,
        password,
    })
}

pub(super) fn build(sink: &Sink<'_>, inputs: Vec<String>) -> CompileResult<Vec<Element>> {
    let brokers = kafka_brokers(sink.output).map_err(|e| endpoint_error(sink.output, e))?;
    let topic = kafka_topic(sink.output);

    let mut chain = Vec::new();
    let mut upstream = inputs;
    let topic = if is_template(&topic) {
        let el = remap(
            sink.child("topic"),
            upstream,
            None,
            format!("._internal.topic = {}", vrl_template(&topic)),
        )?;
        upstream = vec![el.id.clone()];
        chain.push(el);
        "{{ _internal.topic }}".to_string()
    } else {
        topic
    };

    let params = KafkaParams {
        bootstrap_servers: brokers.join(","),
        topic,
        compression: compression(sink.output),
    };
    let el = Element::new(Stage::Sink, &sink.id, upstream, SINK_KAFKA, params)?
        .part(
            PART_ENCODING,
            json!({
                "table": sink.table(),
                "codec": "json",
                "timestamp_format": "rfc3339",
                "except_fields": ["_internal"],
            }),
        )?
        .maybe_part(PART_SASL, sasl(sink))?;
    let secure = kafka_uses_tls(sink.output);
    let mut extras = Extras::new(sink, secure);
    extras.tls = sink.tls(sink.table(), secure, secure);
    chain.push(finish(el, sink, extras)?);
    Ok(chain)
}
