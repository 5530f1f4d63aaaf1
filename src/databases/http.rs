use http::{
    HeaderValue, Request, StatusCode, Uri,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::Deserialize;
use tracing::debug;

use std::time::Duration;

use crate::http_client::{HttpClient, HttpClientError, RequestTimeout};
use crate::resource_id::DatabaseId;
use crate::timeouts::{ReadContext, TimeoutError};
use crate::token::{Token, TokenProvider};

use super::{API_VERSION, AccessKeys, DatabasesClient, DatabasesClientError, ListKeysResponse};

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Implementation of the DatabasesClient trait for a generic HTTP client.
pub struct HttpDatabasesClient<C, T>
where
    C: HttpClient,
    T: TokenProvider,
{
    http_client: C,
    token_provider: T,
    endpoint: String,
}

impl<C, T> HttpDatabasesClient<C, T>
where
    C: HttpClient,
    T: TokenProvider,
{
    pub fn new(http_client: C, token_provider: T, endpoint: &str) -> Self {
        Self {
            http_client,
            token_provider,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn build_request(
        endpoint: &str,
        id: &DatabaseId,
        token: &Token,
        timeout: Duration,
    ) -> Result<Request<Vec<u8>>, DatabasesClientError> {
        // Ids built through `DatabaseId::new` are unchecked; only send those whose
        // segments stay in place once rendered into the path.
        if DatabaseId::parse(&id.id()).ok().as_ref() != Some(id) {
            return Err(DatabasesClientError::Encoder(format!(
                "`{id}` is not a valid database id"
            )));
        }

        let uri: Uri = format!("{endpoint}{id}/listKeys?api-version={API_VERSION}")
            .parse()
            .map_err(|e| DatabasesClientError::Encoder(format!("invalid request uri: {e}")))?;

        let mut bearer_token_header =
            HeaderValue::from_str(&format!("Bearer {}", token.access_token())).map_err(|_| {
                DatabasesClientError::Encoder(
                    "invalid HTTP header value set for Authorization".to_string(),
                )
            })?;
        bearer_token_header.set_sensitive(true);

        let mut request = Request::builder()
            .uri(uri)
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, bearer_token_header)
            .body(b"{}".to_vec())
            .map_err(|e| DatabasesClientError::Encoder(format!("Failed to build request: {e}")))?;
        request.extensions_mut().insert(RequestTimeout(timeout));

        Ok(request)
    }
}

/// Error payload returned by the management API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

fn decode_keys(body: &[u8]) -> Result<ListKeysResponse, DatabasesClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ListKeysResponse { model: None });
    }
    let model: Option<AccessKeys> = serde_json::from_slice(body)
        .map_err(|e| DatabasesClientError::Decoder(format!("Failed to decode JSON: {e}")))?;
    Ok(ListKeysResponse { model })
}

fn decode_error(status: StatusCode, body: &[u8]) -> DatabasesClientError {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => DatabasesClientError::Response {
            status: status.as_u16(),
            code: error.code,
            message: error.message,
        },
        Err(_) => DatabasesClientError::Response {
            status: status.as_u16(),
            code: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

impl<C, T> DatabasesClient for HttpDatabasesClient<C, T>
where
    C: HttpClient,
    T: TokenProvider,
{
    fn list_keys(
        &self,
        id: &DatabaseId,
        ctx: &ReadContext,
    ) -> Result<ListKeysResponse, DatabasesClientError> {
        let timeout = ctx.remaining()?;
        let token = self.token_provider.token()?;
        let request = Self::build_request(&self.endpoint, id, &token, timeout)?;

        debug!(%id, ?timeout, "listing database keys");
        let response = self.http_client.send(request).map_err(|e| match e {
            HttpClientError::Timeout(d) => {
                DatabasesClientError::Timeout(TimeoutError::DeadlineExceeded(d))
            }
            e => DatabasesClientError::Transport(format!("Failed to send HTTP request: {e}")),
        })?;

        match response.status() {
            StatusCode::OK => decode_keys(response.body()),
            status => Err(decode_error(status, response.body())),
        }
    }
}
