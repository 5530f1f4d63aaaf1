use thiserror::Error;

use crate::timeouts::TimeoutError;
use crate::token::TokenError;

#[derive(Debug, Error)]
pub enum DatabasesClientError {
    #[error("obtaining access token: `{0}`")]
    Token(#[from] TokenError),
    #[error("time budget exhausted before sending the request: `{0}`")]
    Timeout(#[from] TimeoutError),
    #[error("error computing the request: `{0}`")]
    Encoder(String),
    #[error("error decoding the response payload: `{0}`")]
    Decoder(String),
    #[error("transport error: `{0}`")]
    Transport(String),
    #[error("unexpected status `{status}`: {code}: {message}")]
    Response {
        status: u16,
        code: String,
        message: String,
    },
}
