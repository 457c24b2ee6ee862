//! Store settings read from secrets: credentials, certificates and TLS
//! versions.

use clf_config::secret_path;
use serde::Serialize;

use super::Store;

/// CA bundle trusted by outputs named `default-*`.
pub(super) const SERVICE_CA_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/service-ca.crt";

/// One `key value` line of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(in crate::fluentd) struct Setting {
    pub key: &'static str,
    pub value: String,
}

/// Ordered store settings. Empty values are never recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(in crate::fluentd) struct Settings(Vec<Setting>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &'static str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if !value.is_empty() {
            self.0.push(Setting { key, value });
        }
        self
    }

    pub fn push_opt(&mut self, key: &'static str, value: Option<impl Into<String>>) -> &mut Self {
        if let Some(v) = value {
            self.push(key, v);
        }
        self
    }
}

/// Ruby expression reading a mounted secret file, empty when it is missing.
pub(super) fn read_secret_file(path: &str) -> String {
    format!(r##""#{{File.exists?('{path}') ? open('{path}','r') do |f|f.read end : ''}}""##)
}

/// Ruby expression reading a mounted secret file with surrounding
/// whitespace removed.
pub(super) fn read_secret_stripped(path: &str) -> String {
    format!(r##""#{{open('{path}','r') do |f|f.read.strip end}}""##)
}

impl Store<'_> {
    /// Mount path of `key` in the output's secret, if the secret has it.
    pub fn secret_file(&self, key: &str) -> Option<String> {
        let name = self.output.secret_name()?;
        self.secrets.has_key(name, key).then(|| secret_path(name, key))
    }

    /// The file-read expression for `key`, if the secret has it.
    pub fn secret_expr(&self, key: &str) -> Option<String> {
        self.secret_file(key).map(|p| read_secret_file(&p))
    }
}

/// `VersionTLS12` → `<prefix>1_2`. Unknown spellings yield `None`.
pub(in crate::fluentd) fn tls_version(version: &str, prefix: &str) -> Option<String> {
    let minor = match version {
        "VersionTLS10" => "0",
        "VersionTLS11" => "1",
        "VersionTLS12" => "2",
        "VersionTLS13" => "3",
        _ => return None,
    };
    Some(format!("{prefix}1_{minor}"))
}

/// The `ssl_version` style minimum version, `TLSv1_2` unless configured.
pub(super) fn ssl_version(store: &Store<'_>) -> String {
    store
        .options
        .min_tls_version
        .as_deref()
        .and_then(|v| tls_version(v, "TLSv"))
        .unwrap_or_else(|| "TLSv1_2".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_are_skipped() {
        let mut s = Settings::new();
        s.push("a", "1").push("b", "").push_opt("c", None::<String>).push_opt("d", Some("4"));
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            serde_json::json!([{"key": "a", "value": "1"}, {"key": "d", "value": "4"}])
        );
    }

    #[test]
    fn tls_version_spellings() {
        assert_eq!(tls_version("VersionTLS12", "TLS").as_deref(), Some("TLS1_2"));
        assert_eq!(tls_version("VersionTLS13", "TLSv").as_deref(), Some("TLSv1_3"));
        assert_eq!(tls_version("TLS1.2", "TLS"), None);
    }

    #[test]
    fn secret_expressions() {
        assert_eq!(
            read_secret_file("/s/a/username"),
            r##""#{File.exists?('/s/a/username') ? open('/s/a/username','r') do |f|f.read end : ''}""##
        );
        assert_eq!(
            read_secret_stripped("/s/a/key"),
            r##""#{open('/s/a/key','r') do |f|f.read.strip end}""##
        );
    }
}
