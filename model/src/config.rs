/*!

The `config` module reads the Salt API connection settings from the process environment.

!*/

use crate::constants::{
    DEFAULT_EAUTH, DEFAULT_POLL_INTERVAL, DEFAULT_SALTAPI_URL, DEFAULT_TIMEOUT, ENV_SALTAPI_EAUTH,
    ENV_SALTAPI_PASS, ENV_SALTAPI_URL, ENV_SALTAPI_USER,
};
use crate::error::{self, Result};
use snafu::ResultExt;
use std::env::VarError;
use std::fmt::{Debug, Formatter};
use std::time::Duration;
use url::Url;

/// Everything the [`SaltApiClient`](crate::clients::SaltApiClient) needs to reach the Salt API.
#[derive(Clone)]
pub struct SaltApiConfig {
    /// The base URL of the Salt API, e.g. `https://cfg01:8000`.
    pub url: Url,
    pub username: String,
    pub password: String,
    /// The external authentication backend, e.g. `pam` or `auto`.
    pub eauth: String,
    /// Accept invalid TLS certificates.
    pub ignore_ssl: bool,
    /// How long to wait for every targeted minion to return.
    pub timeout: Duration,
    /// How long to wait between job lookups.
    pub poll_interval: Duration,
}

impl SaltApiConfig {
    pub fn new<S1, S2>(url: Url, username: S1, password: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            url,
            username: username.into(),
            password: password.into(),
            eauth: DEFAULT_EAUTH.to_string(),
            ignore_ssl: false,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Read `SALTAPI_URL`, `SALTAPI_USER`, `SALTAPI_PASS` and `SALTAPI_EAUTH`. The URL and eauth
    /// have defaults, the credentials are required.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key))
    }

    fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let url = var(ENV_SALTAPI_URL).unwrap_or_else(|_| DEFAULT_SALTAPI_URL.to_string());
        let url = Url::parse(&url).context(error::InvalidUrlSnafu {
            key: ENV_SALTAPI_URL,
            value: &url,
        })?;
        let username = var(ENV_SALTAPI_USER).context(error::EnvReadSnafu {
            key: ENV_SALTAPI_USER,
        })?;
        let password = var(ENV_SALTAPI_PASS).context(error::EnvReadSnafu {
            key: ENV_SALTAPI_PASS,
        })?;
        let mut config = Self::new(url, username, password);
        if let Ok(eauth) = var(ENV_SALTAPI_EAUTH) {
            config.eauth = eauth;
        }
        Ok(config)
    }
}

impl Debug for SaltApiConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaltApiConfig")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("eauth", &self.eauth)
            .field("ignore_ssl", &self.ignore_ssl)
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::SaltApiConfig;
    use std::collections::HashMap;
    use std::env::VarError;
    use url::Url;

    fn from_map(vars: &[(&str, &str)]) -> crate::Result<SaltApiConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SaltApiConfig::from_vars(|key| vars.get(key).cloned().ok_or(VarError::NotPresent))
    }

    #[test]
    fn url_and_eauth_have_defaults() {
        let config = from_map(&[("SALTAPI_USER", "salt"), ("SALTAPI_PASS", "hunter2")]).unwrap();
        assert_eq!(config.url.as_str(), "https://localhost:8000/");
        assert_eq!(config.eauth, "auto");
        assert_eq!(config.username, "salt");
    }

    #[test]
    fn eauth_can_be_overridden() {
        let config = from_map(&[
            ("SALTAPI_URL", "http://cfg01:6969"),
            ("SALTAPI_USER", "salt"),
            ("SALTAPI_PASS", "hunter2"),
            ("SALTAPI_EAUTH", "pam"),
        ])
        .unwrap();
        assert_eq!(config.eauth, "pam");
        assert_eq!(config.url.as_str(), "http://cfg01:6969/");
    }

    #[test]
    fn invalid_url_names_the_variable() {
        let error = from_map(&[
            ("SALTAPI_URL", "not a url"),
            ("SALTAPI_USER", "salt"),
            ("SALTAPI_PASS", "hunter2"),
        ])
        .unwrap_err();
        assert!(error.to_string().contains("SALTAPI_URL"));
    }

    #[test]
    fn credentials_are_required() {
        let error = from_map(&[("SALTAPI_USER", "salt")]).unwrap_err();
        assert!(error.to_string().contains("SALTAPI_PASS"));
    }

    #[test]
    fn debug_redacts_password() {
        let config = SaltApiConfig::new(
            Url::parse("https://cfg01:8000").unwrap(),
            "salt",
            "hunter2",
        );
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
        assert_eq!(config.eauth, "auto");
    }
}
