use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("no access token available: `{0}`")]
    Unavailable(String),
    #[error("access token expired at `{0}`")]
    Expired(DateTime<Utc>),
}

/// Bearer token used to authenticate against the management endpoint.
#[derive(Clone, PartialEq)]
pub struct Token {
    access_token: Zeroizing<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Token {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: Zeroizing::new(access_token.into()),
            expires_at,
        }
    }

    /// Tokens without a known expiration never expire from our point of view.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at < Utc::now())
    }

    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of the bearer token used for each request.
pub trait TokenProvider {
    fn token(&self) -> Result<Token, TokenError>;
}

// Accept closures as TokenProvider implementations
impl<F> TokenProvider for F
where
    F: Fn() -> Result<Token, TokenError>,
{
    fn token(&self) -> Result<Token, TokenError> {
        self()
    }
}

/// Hands out a token obtained elsewhere, e.g. `az account get-access-token`.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: Token,
}

impl StaticTokenProvider {
    pub fn new(token: Token) -> Self {
        Self { token }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self) -> Result<Token, TokenError> {
        if self.token.access_token().is_empty() {
            return Err(TokenError::Unavailable("empty access token".to_string()));
        }
        match self.token.expires_at() {
            Some(at) if self.token.is_expired() => Err(TokenError::Expired(at)),
            _ => Ok(self.token.clone()),
        }
    }
}
