//! Per-output authentication strategy.

use clf_config::secrets::{CLIENT_PASSWORD, CLIENT_USERNAME, TOKEN_KEY};
use clf_config::{Options, OutputSpec, Secrets, TokenSource, secret_path};

/// Token file of the collector's own service account.
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// The credentials an output sends, derived from its `authentication`
/// block and the keys present in its secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    NoAuth,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
        token_file: String,
    },
    BearerFromServiceAccount {
        token: String,
        token_file: &'static str,
    },
    Error(String),
}

impl AuthState {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Self::NoAuth => "none",
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } | Self::BearerFromServiceAccount { .. } => "bearer",
            Self::Error(_) => "error",
        }
    }

    /// Token value, for bearer states.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Bearer { token, .. } | Self::BearerFromServiceAccount { token, .. } => {
                Some(token)
            }
            _ => None,
        }
    }

    /// Token file path, for bearer states.
    pub fn token_file(&self) -> Option<&str> {
        match self {
            Self::Bearer { token_file, .. } => Some(token_file),
            Self::BearerFromServiceAccount { token_file, .. } => Some(token_file),
            _ => None,
        }
    }
}

pub fn resolve_auth(output: &OutputSpec, secrets: &Secrets, options: &Options) -> AuthState {
    let token_from = output
        .authentication
        .as_ref()
        .and_then(|a| a.token.as_ref())
        .map(|t| t.from);

    if token_from == Some(TokenSource::ServiceAccount) {
        let sa = &options.service_account_token_secret_name;
        return match secrets.value(sa, TOKEN_KEY) {
            Some(token) => AuthState::BearerFromServiceAccount {
                token: token.to_string(),
                token_file: SERVICE_ACCOUNT_TOKEN_PATH,
            },
            None => AuthState::Error(format!(
                "service account token secret `{sa}` has no `{TOKEN_KEY}` key"
            )),
        };
    }

    let Some(name) = output.secret_name() else {
        if token_from == Some(TokenSource::Secret) {
            return AuthState::Error("bearer token from secret requires `secret`".into());
        }
        return AuthState::NoAuth;
    };

    let username = secrets.value(name, CLIENT_USERNAME);
    let password = secrets.value(name, CLIENT_PASSWORD);
    match (username, password) {
        (Some(u), Some(p)) => {
            return AuthState::Basic {
                username: u.to_string(),
                password: p.to_string(),
            };
        }
        (Some(_), None) => {
            return AuthState::Error(format!(
                "secret `{name}` carries `{CLIENT_USERNAME}` without `{CLIENT_PASSWORD}`"
            ));
        }
        (None, Some(_)) => {
            return AuthState::Error(format!(
                "secret `{name}` carries `{CLIENT_PASSWORD}` without `{CLIENT_USERNAME}`"
            ));
        }
        (None, None) => {}
    }

    match secrets.value(name, TOKEN_KEY) {
        Some(token) => AuthState::Bearer {
            token: token.to_string(),
            token_file: secret_path(name, TOKEN_KEY),
        },
        None if token_from == Some(TokenSource::Secret) => {
            AuthState::Error(format!("secret `{name}` has no `{TOKEN_KEY}` key"))
        }
        None => AuthState::NoAuth,
    }
}

#[cfg(test)]
mod tests {
    use clf_config::{Authentication, BearerTokenSpec, OutputType, Secret};

    use super::*;

    fn loki() -> OutputSpec {
        OutputSpec::new("lk", OutputType::Loki)
            .with_url("https://lk:3100")
            .with_secret("s")
    }

    fn with_secret(pairs: &[(&str, &str)]) -> Secrets {
        let secret = pairs
            .iter()
            .fold(Secret::new(), |s, (k, v)| s.with(*k, v.as_bytes()));
        Secrets::new().with("s", secret)
    }

    fn token_from(mut o: OutputSpec, from: TokenSource) -> OutputSpec {
        o.authentication = Some(Authentication {
            token: Some(BearerTokenSpec { from }),
        });
        o
    }

    #[test]
    fn username_and_password_is_basic() {
        let state = resolve_auth(
            &loki(),
            &with_secret(&[("username", "u"), ("password", "p")]),
            &Options::default(),
        );
        assert_eq!(
            state,
            AuthState::Basic {
                username: "u".into(),
                password: "p".into()
            }
        );
        assert_eq!(state.strategy(), "basic");
    }

    #[test]
    fn half_credentials_are_an_error() {
        for key in ["username", "password"] {
            let state = resolve_auth(&loki(), &with_secret(&[(key, "x")]), &Options::default());
            assert!(state.is_error(), "{key}: {state:?}");
        }
    }

    #[test]
    fn token_key_is_bearer_with_secret_file() {
        let state = resolve_auth(&loki(), &with_secret(&[("token", "t0k")]), &Options::default());
        assert_eq!(state.token(), Some("t0k"));
        assert_eq!(
            state.token_file(),
            Some("/var/run/ocp-collector/secrets/s/token")
        );
    }

    #[test]
    fn service_account_token() {
        let secrets = Secrets::new().with("logcollector-token", Secret::new().with("token", "sa"));
        let state = resolve_auth(
            &token_from(loki(), TokenSource::ServiceAccount),
            &secrets,
            &Options::default(),
        );
        assert_eq!(
            state,
            AuthState::BearerFromServiceAccount {
                token: "sa".into(),
                token_file: SERVICE_ACCOUNT_TOKEN_PATH
            }
        );
        let missing = resolve_auth(
            &token_from(loki(), TokenSource::ServiceAccount),
            &Secrets::new(),
            &Options::default(),
        );
        assert!(missing.is_error());
    }

    #[test]
    fn token_from_secret_without_token_is_an_error() {
        let o = token_from(loki(), TokenSource::Secret);
        assert!(resolve_auth(&o, &with_secret(&[("tls.crt", "c")]), &Options::default()).is_error());
        let mut bare = o.clone();
        bare.secret = None;
        assert!(resolve_auth(&bare, &Secrets::new(), &Options::default()).is_error());
    }

    #[test]
    fn no_secret_is_no_auth() {
        let o = OutputSpec::new("lk", OutputType::Loki);
        assert_eq!(resolve_auth(&o, &Secrets::new(), &Options::default()), AuthState::NoAuth);
        let tls_only = resolve_auth(&loki(), &with_secret(&[("ca-bundle.crt", "ca")]), &Options::default());
        assert_eq!(tls_only, AuthState::NoAuth);
    }
}
