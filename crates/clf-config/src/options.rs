use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the secret holding the collector's service-account token.
pub const DEFAULT_SA_TOKEN_SECRET: &str = "logcollector-token";

/// Generator switches supplied alongside the spec.
///
/// All fields default, so `[options]` may be omitted from `clf.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Secret whose `token` key backs bearer-from-service-account auth.
    pub service_account_token_secret_name: String,
    pub include_legacy_secure_forward: bool,
    pub include_legacy_syslog: bool,
    /// Use the `syslog_buffered` / `syslog` plugins instead of `remote_syslog`.
    pub use_old_remote_syslog_plugin: bool,
    /// Applied to every TLS block, e.g. `"VersionTLS12"`.
    pub min_tls_version: Option<String>,
    /// Cipher suites applied to every TLS block, joined with `,`.
    pub ciphers: Vec<String>,
    /// Per reserved kind (`application`, `infrastructure`, `audit`) the log
    /// sources an otlp sink accepts. Missing kinds accept every source.
    pub otlp_log_sources: BTreeMap<String, Vec<String>>,
    /// Replace every output with one stdout sink per pipeline.
    pub debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            service_account_token_secret_name: DEFAULT_SA_TOKEN_SECRET.to_string(),
            include_legacy_secure_forward: false,
            include_legacy_syslog: false,
            use_old_remote_syslog_plugin: false,
            min_tls_version: None,
            ciphers: Vec::new(),
            otlp_log_sources: BTreeMap::new(),
            debug: false,
        }
    }
}

impl Options {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn ciphers_joined(&self) -> Option<String> {
        (!self.ciphers.is_empty()).then(|| self.ciphers.join(","))
    }

    pub fn has_tls_profile(&self) -> bool {
        self.min_tls_version.is_some() || !self.ciphers.is_empty()
    }
}
