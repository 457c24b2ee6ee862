//! Endpoint parsing shared by both dialects: URLs, kafka brokers and topic,
//! syslog transport.

use clf_config::OutputSpec;
use url::Url;

/// Topic used when neither `kafka.topic` nor a URL path names one.
pub const DEFAULT_KAFKA_TOPIC: &str = "topic";

/// Parse an absolute URL that must carry a scheme and a host.
pub fn parse_url(raw: &str) -> anyhow::Result<Url> {
    if !raw.contains("://") {
        anyhow::bail!("url {raw:?} has no scheme");
    }
    let url = Url::parse(raw).map_err(|e| anyhow::anyhow!("invalid url {raw:?}: {e}"))?;
    if url.host_str().is_none_or(str::is_empty) {
        anyhow::bail!("url {raw:?} has no host");
    }
    Ok(url)
}

/// `host:port` of `raw`; a scheme is optional. Schemes with a well-known
/// port fill it in.
pub fn host_port(raw: &str) -> anyhow::Result<(String, Option<u16>)> {
    if raw.contains("://") {
        let url = parse_url(raw)?;
        let host = url.host_str().unwrap_or_default().to_string();
        return Ok((host, url.port_or_known_default()));
    }
    let trimmed = raw.trim_end_matches('/');
    match trimmed.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("invalid port in {raw:?}"))?;
            Ok((host.to_string(), Some(port)))
        }
        Some(_) => anyhow::bail!("missing host in {raw:?}"),
        None if trimmed.is_empty() => anyhow::bail!("empty address"),
        None => Ok((trimmed.to_string(), None)),
    }
}

fn join_host_port(host: &str, port: Option<u16>) -> String {
    match port {
        Some(p) => format!("{host}:{p}"),
        None => host.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Kafka
// ---------------------------------------------------------------------------

/// Broker `host:port` list: `kafka.brokers` when set, else the output URL.
pub fn kafka_brokers(output: &OutputSpec) -> anyhow::Result<Vec<String>> {
    let listed = output.kafka.as_ref().map(|k| k.brokers.as_slice()).unwrap_or_default();
    let raw: Vec<&str> = if listed.is_empty() {
        output.url.as_deref().into_iter().collect()
    } else {
        listed.iter().map(String::as_str).collect()
    };
    if raw.is_empty() {
        anyhow::bail!("kafka requires brokers or url");
    }
    raw.into_iter()
        .map(|b| host_port(b).map(|(h, p)| join_host_port(&h, p)))
        .collect()
}

/// Topic: `kafka.topic`, else the URL path, else [`DEFAULT_KAFKA_TOPIC`].
pub fn kafka_topic(output: &OutputSpec) -> String {
    if let Some(topic) = output.kafka.as_ref().and_then(|k| k.topic.as_deref())
        && !topic.is_empty()
    {
        return topic.to_string();
    }
    output
        .url
        .as_deref()
        .and_then(|u| Url::parse(u).ok())
        .map(|u| u.path().trim_matches('/').to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_string())
}

/// True when any broker (or the URL) asks for TLS.
pub fn kafka_uses_tls(output: &OutputSpec) -> bool {
    let listed = output.kafka.as_ref().map(|k| k.brokers.as_slice()).unwrap_or_default();
    listed
        .iter()
        .map(String::as_str)
        .chain(output.url.as_deref())
        .any(|b| b.starts_with("tls://") || b.starts_with("ssl://"))
}

// ---------------------------------------------------------------------------
// Syslog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyslogTransport {
    Udp,
    Tcp,
    Tls,
}

impl SyslogTransport {
    /// Transport from the URL scheme; no scheme means tcp.
    pub fn from_url(raw: &str) -> Self {
        match raw.split_once("://").map(|(s, _)| s.to_ascii_lowercase()) {
            Some(s) if s == "udp" => Self::Udp,
            Some(s) if s == "tls" => Self::Tls,
            _ => Self::Tcp,
        }
    }

    /// Socket mode: tls rides on tcp.
    pub fn protocol(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp | Self::Tls => "tcp",
        }
    }

    /// Plugin of the old fluentd syslog output.
    pub fn old_plugin(&self) -> &'static str {
        match self {
            Self::Udp => "syslog",
            Self::Tcp | Self::Tls => "syslog_buffered",
        }
    }
}

#[cfg(test)]
mod tests {
    use clf_config::{Kafka, OutputType};

    use super::*;

    fn kafka(url: Option<&str>, brokers: &[&str], topic: Option<&str>) -> OutputSpec {
        let mut o = OutputSpec::new("k", OutputType::Kafka);
        o.url = url.map(str::to_string);
        o.kafka = Some(Kafka {
            topic: topic.map(str::to_string),
            brokers: brokers.iter().map(|s| s.to_string()).collect(),
        });
        o
    }

    #[test]
    fn brokers_win_over_url() {
        let o = kafka(Some("tls://other:1/x"), &["tls://b1:9092", "tls://b2:9092"], Some("t"));
        assert_eq!(kafka_brokers(&o).unwrap(), vec!["b1:9092", "b2:9092"]);
        assert_eq!(kafka_topic(&o), "t");
        assert!(kafka_uses_tls(&o));
    }

    #[test]
    fn url_supplies_broker_and_topic() {
        let o = kafka(Some("tls://b1:9092/t"), &[], None);
        assert_eq!(kafka_brokers(&o).unwrap(), vec!["b1:9092"]);
        assert_eq!(kafka_topic(&o), "t");
    }

    #[test]
    fn default_topic() {
        let o = kafka(Some("tls://b1:9092"), &[], None);
        assert_eq!(kafka_topic(&o), DEFAULT_KAFKA_TOPIC);
        assert_eq!(kafka_topic(&kafka(None, &["b1:9092"], None)), "topic");
    }

    #[test]
    fn plain_broker_addresses() {
        let o = kafka(None, &["b1:9092", "b2"], None);
        assert_eq!(kafka_brokers(&o).unwrap(), vec!["b1:9092", "b2"]);
        assert!(!kafka_uses_tls(&o));
        assert!(kafka_brokers(&kafka(None, &[], None)).is_err());
        assert!(kafka_brokers(&kafka(None, &["b1:port"], None)).is_err());
    }

    #[test]
    fn syslog_transport_from_scheme() {
        assert_eq!(SyslogTransport::from_url("udp://h:9"), SyslogTransport::Udp);
        assert_eq!(SyslogTransport::from_url("tcp://h:9"), SyslogTransport::Tcp);
        assert_eq!(SyslogTransport::from_url("h:9"), SyslogTransport::Tcp);
        assert_eq!(SyslogTransport::from_url("tls://h:6514"), SyslogTransport::Tls);
        assert_eq!(SyslogTransport::Udp.old_plugin(), "syslog");
        assert_eq!(SyslogTransport::Tls.old_plugin(), "syslog_buffered");
        assert_eq!(SyslogTransport::Tls.protocol(), "tcp");
    }

    #[test]
    fn host_port_with_and_without_scheme() {
        assert_eq!(host_port("udp://h:9").unwrap(), ("h".into(), Some(9)));
        assert_eq!(host_port("h:514").unwrap(), ("h".into(), Some(514)));
        assert_eq!(host_port("https://es.svc").unwrap(), ("es.svc".into(), Some(443)));
        assert!(host_port(":9").is_err());
    }

    #[test]
    fn parse_url_requires_scheme_and_host() {
        assert!(parse_url("http://es.svc:9200").is_ok());
        assert!(parse_url("es.svc:9200").is_err());
        assert!(parse_url("http://").is_err());
    }
}
