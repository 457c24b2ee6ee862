use std::collections::BTreeMap;
use std::path::Path;

/// Root under which each secret is mounted as `<root>/<name>/<key>`.
pub const SECRETS_MOUNT_DIR: &str = "/var/run/ocp-collector/secrets";

// Well-known keys read from output secrets.
pub const CLIENT_CERT_KEY: &str = "tls.crt";
pub const CLIENT_PRIVATE_KEY: &str = "tls.key";
pub const TRUSTED_CA_BUNDLE_KEY: &str = "ca-bundle.crt";
pub const PASSPHRASE: &str = "passphrase";
pub const TOKEN_KEY: &str = "token";
pub const CLIENT_USERNAME: &str = "username";
pub const CLIENT_PASSWORD: &str = "password";
pub const SASL_ENABLE: &str = "sasl.enable";
pub const SASL_MECHANISMS: &str = "sasl.mechanisms";
pub const SHARED_KEY: &str = "shared_key";
pub const AWS_ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const AWS_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
pub const AWS_ROLE_ARN: &str = "role_arn";
pub const SPLUNK_HEC_TOKEN: &str = "hecToken";
pub const AZURE_SHARED_KEY: &str = "shared_key";
pub const GOOGLE_CREDENTIALS: &str = "google-application-credentials.json";

/// Mount path of a secret key as seen by the collector.
pub fn secret_path(secret: &str, key: &str) -> String {
    format!("{SECRETS_MOUNT_DIR}/{secret}/{key}")
}

/// One opaque secret: key to raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secret {
    data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// The value as trimmed UTF-8. Non-UTF-8 and empty values read as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|b| std::str::from_utf8(b).ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|b| !b.is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}

/// Every secret available to a compile, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    by_name: BTreeMap<String, Secret>,
}

impl Secrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, secret: Secret) -> Self {
        self.insert(name, secret);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, secret: Secret) {
        self.by_name.insert(name.into(), secret);
    }

    pub fn get(&self, name: &str) -> Option<&Secret> {
        self.by_name.get(name)
    }

    /// Shortcut for `get(name)?.get_str(key)`.
    pub fn value(&self, name: &str, key: &str) -> Option<&str> {
        self.get(name)?.get_str(key)
    }

    pub fn has_key(&self, name: &str, key: &str) -> bool {
        self.get(name).is_some_and(|s| s.has(key))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Merge `other` into `self`; keys in `other` win.
    pub fn merge(&mut self, other: Secrets) {
        for (name, secret) in other.by_name {
            let slot = self.by_name.entry(name).or_default();
            slot.data.extend(secret.data);
        }
    }

    /// Read a directory laid out as `<dir>/<secret name>/<key>`.
    ///
    /// Hidden entries (leading `.`) are skipped, which ignores the
    /// `..data` symlinks of projected volumes.
    pub fn load_dir(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("failed to read secrets dir {}: {e}", dir.display()))?;

        let mut secrets = Secrets::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = file_name(&path) else {
                continue;
            };
            if !path.is_dir() {
                continue;
            }
            let mut secret = Secret::new();
            for key_entry in std::fs::read_dir(&path)? {
                let key_path = key_entry?.path();
                let Some(key) = file_name(&key_path) else {
                    continue;
                };
                if !key_path.is_file() {
                    continue;
                }
                let bytes = std::fs::read(&key_path).map_err(|e| {
                    anyhow::anyhow!("failed to read secret key {}: {e}", key_path.display())
                })?;
                secret.insert(key, bytes);
            }
            secrets.insert(name, secret);
        }
        Ok(secrets)
    }
}

impl FromIterator<(String, BTreeMap<String, String>)> for Secrets {
    fn from_iter<I: IntoIterator<Item = (String, BTreeMap<String, String>)>>(iter: I) -> Self {
        let mut secrets = Secrets::new();
        for (name, kv) in iter {
            let mut secret = Secret::new();
            for (k, v) in kv {
                secret.insert(k, v.into_bytes());
            }
            secrets.insert(name, secret);
        }
        secrets
    }
}

fn file_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}
