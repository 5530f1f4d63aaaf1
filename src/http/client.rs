use crate::http::config::HttpConfig;
use crate::http_client::{
    HttpClient as LookupHttpClient, HttpClientError as LookupHttpClientError, RequestTimeout,
};
use http::{Request, Response};
use reqwest::Proxy;
use reqwest::blocking::{Client, Response as BlockingResponse};
use std::time::Duration;
use tracing::debug;

/// Blocking HTTP client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, HttpBuildError> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .tls_built_in_native_certs(true)
            .timeout(config.timeout)
            .connect_timeout(config.conn_timeout);

        if !config.proxy.is_empty() {
            let proxy = Proxy::all(config.proxy.to_string())
                .map_err(|err| HttpBuildError::InvalidProxy(err.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|err| HttpBuildError::ClientBuilder(err.to_string()))?;

        Ok(Self {
            client,
            default_timeout: config.timeout,
        })
    }

    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpResponseError> {
        let timeout = request
            .extensions()
            .get::<RequestTimeout>()
            .map(|t| t.0)
            .unwrap_or(self.default_timeout);

        debug!(method = %request.method(), uri = %request.uri(), ?timeout, "sending request");

        let res = self
            .client
            .request(request.method().clone(), request.uri().to_string().as_str())
            .headers(request.headers().clone())
            .timeout(timeout)
            .body(request.body().to_vec())
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    HttpResponseError::Timeout(timeout)
                } else {
                    HttpResponseError::TransportError(err.to_string())
                }
            })?;

        try_build_response(res)
    }
}

fn try_build_response(res: BlockingResponse) -> Result<Response<Vec<u8>>, HttpResponseError> {
    let status = res.status();
    let version = res.version();
    let headers = res.headers().clone();

    let body: Vec<u8> = res
        .bytes()
        .map_err(|err| HttpResponseError::ReadingResponse(err.to_string()))?
        .into();

    let mut response = Response::builder()
        .status(status)
        .version(version)
        .body(body)
        .map_err(|err| HttpResponseError::BuildingResponse(err.to_string()))?;
    *response.headers_mut() = headers;

    Ok(response)
}

impl LookupHttpClient for HttpClient {
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, LookupHttpClientError> {
        let response = self.send(req)?;

        Ok(response)
    }
}

impl From<HttpResponseError> for LookupHttpClientError {
    fn from(err: HttpResponseError) -> Self {
        match err {
            HttpResponseError::TransportError(msg) => LookupHttpClientError::TransportError(msg),
            HttpResponseError::Timeout(timeout) => LookupHttpClientError::Timeout(timeout),
            HttpResponseError::BuildingResponse(msg) | HttpResponseError::ReadingResponse(msg) => {
                LookupHttpClientError::InvalidResponse(msg)
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HttpBuildError {
    #[error("could not build the http client: {0}")]
    ClientBuilder(String),
    #[error("invalid proxy: {0}")]
    InvalidProxy(String),
}

#[derive(thiserror::Error, Debug)]
enum HttpResponseError {
    #[error("could read response body: {0}")]
    ReadingResponse(String),
    #[error("could build response: {0}")]
    BuildingResponse(String),
    #[error("http transport error: `{0}`")]
    TransportError(String),
    #[error("request timed out after `{0:?}`")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::config::ProxyUrl;
    use assert_matches::assert_matches;
    use httpmock::{Method::POST, MockServer};

    fn client_with_timeout(timeout: Duration) -> HttpClient {
        HttpClient::new(HttpConfig::new(
            timeout,
            Duration::from_secs(1),
            ProxyUrl::default(),
        ))
        .unwrap()
    }

    #[test]
    fn forwards_request_and_response() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/keys")
                .header("authorization", "Bearer token");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"primaryKey":"p"}"#);
        });

        let request = Request::builder()
            .method("POST")
            .uri(server.url("/keys"))
            .header("authorization", "Bearer token")
            .body(Vec::new())
            .unwrap();

        let response = LookupHttpClient::send(&client_with_timeout(Duration::from_secs(5)), request)
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), br#"{"primaryKey":"p"}"#);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        mock.assert();
    }

    #[test]
    fn request_timeout_extension_takes_precedence() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/slow");
            then.status(200).delay(Duration::from_millis(200));
        });

        let mut request = Request::builder()
            .method("POST")
            .uri(server.url("/slow"))
            .body(Vec::new())
            .unwrap();
        request
            .extensions_mut()
            .insert(RequestTimeout(Duration::from_millis(20)));

        let error = LookupHttpClient::send(&client_with_timeout(Duration::from_secs(5)), request)
            .unwrap_err();

        assert_matches!(error, LookupHttpClientError::Timeout(t) => {
            assert_eq!(t, Duration::from_millis(20))
        });
        mock.assert();
    }

    #[test]
    fn builds_with_proxy() {
        let config = HttpConfig::new(
            Duration::from_secs(1),
            Duration::from_secs(1),
            ProxyUrl::try_from("http://localhost:8888").unwrap(),
        );

        assert!(HttpClient::new(config).is_ok());
    }
}
