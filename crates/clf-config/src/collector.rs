use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::forwarder::ForwarderSpec;
use crate::logging::LoggingConfig;
use crate::options::Options;
use crate::secrets::Secrets;
use crate::validate;

/// Target collector configuration dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Label/match block syntax.
    Fluentd,
    /// TOML with typed components.
    Vector,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fluentd => "fluentd",
            Self::Vector => "vector",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "fluentd" => Ok(Self::Fluentd),
            "vector" => Ok(Self::Vector),
            other => anyhow::bail!("unknown dialect {other:?} (expected fluentd or vector)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw TOML structure (intermediate representation)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CollectorConfigRaw {
    collector: CollectorSection,
    #[serde(default)]
    forwarder: ForwarderSection,
    #[serde(default)]
    secrets: SecretsSection,
    #[serde(default)]
    options: Options,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
struct CollectorSection {
    dialect: Dialect,
    #[serde(default)]
    output: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ForwarderSection {
    /// Path to a TOML or JSON spec file. Mutually exclusive with inline tables.
    #[serde(default)]
    spec: Option<PathBuf>,
    #[serde(flatten)]
    inline: ForwarderSpec,
}

#[derive(Debug, Default, Deserialize)]
struct SecretsSection {
    #[serde(default)]
    dir: Option<PathBuf>,
    #[serde(default)]
    inline: BTreeMap<String, BTreeMap<String, String>>,
}

// ---------------------------------------------------------------------------
// CollectorConfig (resolved, validated)
// ---------------------------------------------------------------------------

/// A fully resolved `clf.toml`: the spec, its secrets and generator options.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub dialect: Dialect,
    /// Where the generated file is written; `None` means stdout.
    pub output: Option<PathBuf>,
    pub spec: ForwarderSpec,
    /// Spec file the forwarder was loaded from, if not inline.
    pub spec_path: Option<PathBuf>,
    pub secrets: Secrets,
    pub options: Options,
    pub logging: LoggingConfig,
    pub base_dir: PathBuf,
}

impl CollectorConfig {
    /// Read and parse a `clf.toml` file. Relative paths inside it resolve
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::parse_with_base(&content, base)
    }

    pub fn parse_with_base(toml_str: &str, base_dir: &Path) -> anyhow::Result<Self> {
        let raw: CollectorConfigRaw = toml::from_str(toml_str)?;
        validate::validate_raw_forwarder(raw.forwarder.spec.as_deref(), &raw.forwarder.inline)?;

        let resolve = |p: PathBuf| {
            if p.is_absolute() {
                p
            } else {
                base_dir.join(p)
            }
        };

        let spec_path = raw.forwarder.spec.map(resolve);
        let spec = match &spec_path {
            Some(path) => ForwarderSpec::load(path)?,
            None => raw.forwarder.inline,
        };

        let mut secrets = match raw.secrets.dir.map(resolve) {
            Some(dir) => Secrets::load_dir(dir)?,
            None => Secrets::new(),
        };
        secrets.merge(raw.secrets.inline.into_iter().collect());

        let mut logging = raw.logging;
        logging.file = logging.file.map(resolve);

        let config = CollectorConfig {
            dialect: raw.collector.dialect,
            output: raw.collector.output.map(resolve),
            spec,
            spec_path,
            secrets,
            options: raw.options,
            logging,
            base_dir: base_dir.to_path_buf(),
        };

        validate::validate(&config)?;

        Ok(config)
    }
}

impl FromStr for CollectorConfig {
    type Err = anyhow::Error;

    /// Parse with relative paths resolved against the current directory.
    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        Self::parse_with_base(toml_str, Path::new("."))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forwarder::OutputType;
    use crate::logging::LogFormat;

    const INLINE_TOML: &str = r#"
[collector]
dialect = "vector"

[[forwarder.outputs]]
name = "loki-receiver"
type = "loki"
url = "https://logs-us-west1.grafana.net"

[[forwarder.pipelines]]
inputRefs = ["application"]
outputRefs = ["loki-receiver"]

[secrets.inline.loki-secret]
username = "u"
password = "p"

[options]
debug = true

[logging]
level = "debug"
format = "json"
[logging.modules]
"clf_lang::vector" = "trace"
"#;

    #[test]
    fn load_inline_forwarder() {
        let cfg: CollectorConfig = INLINE_TOML.parse().unwrap();
        assert_eq!(cfg.dialect, Dialect::Vector);
        assert_eq!(cfg.output, None);
        assert_eq!(cfg.spec.outputs.len(), 1);
        assert_eq!(cfg.spec.outputs[0].output_type, OutputType::Loki);
        assert_eq!(cfg.secrets.value("loki-secret", "username"), Some("u"));
        assert!(cfg.options.debug);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.directives(), "debug,clf_lang::vector=trace");
    }

    #[test]
    fn load_spec_file_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("spec.json"),
            r#"{"outputs":[{"name":"es","type":"elasticsearch","url":"http://es:9200"}],
                "pipelines":[{"inputRefs":["audit"],"outputRefs":["es"]}]}"#,
        )
        .unwrap();
        let secrets = dir.path().join("secrets").join("es");
        std::fs::create_dir_all(&secrets).unwrap();
        std::fs::write(secrets.join("username"), "from-dir").unwrap();
        std::fs::write(
            dir.path().join("clf.toml"),
            r#"
[collector]
dialect = "fluentd"
output = "out/fluent.conf"

[forwarder]
spec = "spec.json"

[secrets]
dir = "secrets"
[secrets.inline.es]
username = "inline"
"#,
        )
        .unwrap();

        let cfg = CollectorConfig::load(dir.path().join("clf.toml")).unwrap();
        assert_eq!(cfg.dialect, Dialect::Fluentd);
        assert_eq!(cfg.output, Some(dir.path().join("out/fluent.conf")));
        assert_eq!(cfg.spec_path, Some(dir.path().join("spec.json")));
        assert_eq!(cfg.spec.outputs[0].name, "es");
        assert_eq!(cfg.secrets.value("es", "username"), Some("inline"));
    }

    #[test]
    fn reject_spec_path_with_inline_tables() {
        let toml = r#"
[collector]
dialect = "vector"

[forwarder]
spec = "spec.toml"

[[forwarder.outputs]]
name = "x"
type = "http"
"#;
        let err = toml.parse::<CollectorConfig>().unwrap_err();
        assert!(err.to_string().contains("forwarder"), "{err}");
    }

    #[test]
    fn reject_unknown_dialect() {
        let toml = "[collector]\ndialect = \"logstash\"\n";
        assert!(toml.parse::<CollectorConfig>().is_err());
    }

    #[test]
    fn reject_bad_log_level() {
        let toml = INLINE_TOML.replace("level = \"debug\"", "level = \"loud\"");
        let err = toml.parse::<CollectorConfig>().unwrap_err();
        assert!(err.to_string().contains("loud"), "{err}");
    }

    #[test]
    fn missing_collector_section_fails() {
        assert!("[options]\ndebug = true\n".parse::<CollectorConfig>().is_err());
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = CollectorConfig::load("/nope/clf.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read /nope/clf.toml"));
    }

    #[test]
    fn dialect_from_str() {
        assert_eq!("fluentd".parse::<Dialect>().unwrap(), Dialect::Fluentd);
        assert!("Vector".parse::<Dialect>().is_err());
    }
}
