use http::Uri;
use std::env;
use std::env::VarError;
use std::fmt::Display;
use std::time::Duration;

use crate::timeouts::DEFAULT_READ_TIMEOUT;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const HTTP_PROXY_ENV_NAME: &str = "HTTP_PROXY";
const HTTPS_PROXY_ENV_NAME: &str = "HTTPS_PROXY";

/// Settings for the management-plane HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// Used when a request carries no time budget of its own.
    pub(crate) timeout: Duration,
    pub(crate) conn_timeout: Duration,
    pub(crate) proxy: ProxyUrl,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_READ_TIMEOUT,
            conn_timeout: DEFAULT_CONNECT_TIMEOUT,
            proxy: ProxyUrl::default(),
        }
    }
}

impl HttpConfig {
    pub fn new(timeout: Duration, conn_timeout: Duration, proxy: ProxyUrl) -> Self {
        Self {
            timeout,
            conn_timeout,
            proxy,
        }
    }

    pub fn proxy(&self) -> &ProxyUrl {
        &self.proxy
    }

    /// Falls back to `HTTPS_PROXY`/`HTTP_PROXY` when no proxy was configured explicitly.
    pub fn try_with_proxy_from_env(self) -> Result<Self, ProxyError> {
        self.with_env_aware_proxy(env::var)
    }

    fn with_env_aware_proxy<F>(self, env_var: F) -> Result<Self, ProxyError>
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        if !self.proxy.is_empty() {
            return Ok(self);
        }
        let proxy = env_var(HTTPS_PROXY_ENV_NAME)
            .or_else(|_| env_var(HTTP_PROXY_ENV_NAME))
            .unwrap_or_default()
            .as_str()
            .try_into()?;
        Ok(Self { proxy, ..self })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("invalid proxy url `{0}`: `{1}`")]
    InvalidUrl(String, String),
}

/// Proxy url, possibly empty.
/// Format: `<protocol>://<user>:<password>@<host>:<port>` (all parts except host are optional).
#[derive(Debug, Default, PartialEq, Clone)]
pub struct ProxyUrl(Option<Uri>);

impl TryFrom<&str> for ProxyUrl {
    type Error = ProxyError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.is_empty() {
            return Ok(Self(None));
        }
        let uri = s
            .parse::<Uri>()
            .map_err(|err| ProxyError::InvalidUrl(s.to_string(), err.to_string()))?;
        Ok(Self(Some(uri)))
    }
}

impl Display for ProxyUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(url) => write!(f, "{url}"),
            None => write!(f, ""),
        }
    }
}

impl ProxyUrl {
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn env_from(
        values: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&'static str) -> Result<String, VarError> {
        move |k| {
            values
                .get(k)
                .map(|v| v.to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn configured_proxy_wins_over_environment() {
        let config = HttpConfig {
            proxy: "http://localhost:8888".try_into().unwrap(),
            ..Default::default()
        };

        let config = config
            .with_env_aware_proxy(env_from(HashMap::from([(
                "HTTPS_PROXY",
                "http://other.proxy:9999",
            )])))
            .unwrap();

        assert_eq!(
            config.proxy(),
            &ProxyUrl::try_from("http://localhost:8888").unwrap()
        );
    }

    #[test]
    fn https_proxy_has_priority_over_http_proxy() {
        let config = HttpConfig::default()
            .with_env_aware_proxy(env_from(HashMap::from([
                ("HTTPS_PROXY", "http://one.proxy:9999"),
                ("HTTP_PROXY", "http://other.proxy:9999"),
            ])))
            .unwrap();

        assert_eq!(
            config.proxy,
            ProxyUrl::try_from("http://one.proxy:9999").unwrap()
        );
    }

    #[test]
    fn no_proxy_anywhere() {
        let config = HttpConfig::default()
            .with_env_aware_proxy(env_from(HashMap::new()))
            .unwrap();

        assert!(config.proxy().is_empty());
    }

    #[test]
    fn invalid_proxy_from_environment() {
        let result = HttpConfig::default().with_env_aware_proxy(|_| Ok("http://".to_string()));

        assert_matches!(result.unwrap_err(), ProxyError::InvalidUrl(s, _) => {
            assert_eq!(s, "http://")
        });
    }
}
