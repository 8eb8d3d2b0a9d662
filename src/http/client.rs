use crate::http::config::{HttpConfig, LogLevel, LoggingOptions};
use crate::http::telemetry::{TELEMETRY_HEADER, Telemetry};
use crate::http_client::{HttpClient as Auth0HttpClient, HttpClientError as Auth0HttpClientError};
use async_trait::async_trait;
use http::header::{HeaderMap, HeaderValue};
use http::{Request, Response};
use reqwest::blocking::{Client as BlockingClient, Response as BlockingResponse};
use reqwest::{Client, Proxy};
use std::sync::OnceLock;
use tracing::debug;

/// [`Auth0HttpClient`] backed by `reqwest`.
///
/// The asynchronous client is built right away. The blocking one is built the first time a
/// blocking request is sent, so applications that only use the asynchronous API never create it
/// inside their runtime. Blocking requests must not be sent from an asynchronous context.
#[derive(Debug)]
pub struct DefaultHttpClient {
    config: HttpConfig,
    client: Client,
    blocking: OnceLock<BlockingClient>,
}

impl DefaultHttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, HttpBuildError> {
        let client = Client::builder()
            .use_rustls_tls()
            .tls_built_in_native_certs(true)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .default_headers(default_headers(&config)?);
        let client = match proxy(&config)? {
            Some(proxy) => client.proxy(proxy),
            None => client,
        };
        let client = client
            .build()
            .map_err(|err| HttpBuildError::ClientBuilder(err.to_string()))?;

        Ok(Self {
            config,
            client,
            blocking: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn blocking_client(&self) -> Result<&BlockingClient, HttpBuildError> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }
        let config = &self.config;
        let builder = BlockingClient::builder()
            .use_rustls_tls()
            .tls_built_in_native_certs(true)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .default_headers(default_headers(config)?);
        let builder = match proxy(config)? {
            Some(proxy) => builder.proxy(proxy),
            None => builder,
        };
        let client = builder
            .build()
            .map_err(|err| HttpBuildError::ClientBuilder(err.to_string()))?;
        Ok(self.blocking.get_or_init(|| client))
    }

    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpResponseError> {
        log_request(&self.config.logging, &request);
        let client = self
            .blocking_client()
            .map_err(|err| HttpResponseError::TransportError(err.to_string()))?;
        let req = client
            .request(request.method().into(), request.uri().to_string().as_str())
            .headers(request.headers().clone())
            .body(request.into_body());

        let res = req
            .send()
            .map_err(|err| HttpResponseError::TransportError(err.to_string()))?;

        let response = try_build_response(res)?;
        log_response(&self.config.logging, &response);
        Ok(response)
    }

    async fn send_async(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, HttpResponseError> {
        log_request(&self.config.logging, &request);
        let req = self
            .client
            .request(request.method().into(), request.uri().to_string().as_str())
            .headers(request.headers().clone())
            .body(request.into_body());

        let res = req
            .send()
            .await
            .map_err(|err| HttpResponseError::TransportError(err.to_string()))?;

        let status = res.status();
        let version = res.version();
        let headers = res.headers().clone();
        let body: Vec<u8> = res
            .bytes()
            .await
            .map_err(|err| HttpResponseError::ReadingResponse(err.to_string()))?
            .into();

        let response = build_response(status, version, headers, body)?;
        log_response(&self.config.logging, &response);
        Ok(response)
    }
}

fn default_headers(config: &HttpConfig) -> Result<HeaderMap, HttpBuildError> {
    let mut headers = HeaderMap::new();
    if config.telemetry {
        let value = Telemetry::default()
            .header_value()
            .map_err(|err| HttpBuildError::Telemetry(err.to_string()))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|err| HttpBuildError::Telemetry(err.to_string()))?;
        headers.insert(TELEMETRY_HEADER, value);
    }
    Ok(headers)
}

fn proxy(config: &HttpConfig) -> Result<Option<Proxy>, HttpBuildError> {
    let proxy_config = config
        .proxy
        .clone()
        .try_with_url_from_env()
        .map_err(|err| HttpBuildError::Proxy(err.to_string()))?;
    if proxy_config.url().is_empty() {
        return Ok(None);
    }
    let proxy = Proxy::all(proxy_config.url_as_string())
        .map_err(|err| HttpBuildError::Proxy(err.to_string()))?;
    let proxy = match proxy_config.credentials() {
        Some(credentials) => proxy.basic_auth(&credentials.username, &credentials.password),
        None => proxy,
    };
    Ok(Some(proxy))
}

/// Reads the whole body so the connection is released before returning.
fn try_build_response(res: BlockingResponse) -> Result<Response<Vec<u8>>, HttpResponseError> {
    let status = res.status();
    let version = res.version();
    let headers = res.headers().clone();

    let body: Vec<u8> = res
        .bytes()
        .map_err(|err| HttpResponseError::ReadingResponse(err.to_string()))?
        .into();

    build_response(status, version, headers, body)
}

fn build_response(
    status: http::StatusCode,
    version: http::Version,
    headers: HeaderMap,
    body: Vec<u8>,
) -> Result<Response<Vec<u8>>, HttpResponseError> {
    let mut response = Response::builder()
        .status(status)
        .version(version)
        .body(body)
        .map_err(|err| HttpResponseError::BuildingResponse(err.to_string()))?;
    *response.headers_mut() = headers;
    Ok(response)
}

fn log_request(options: &LoggingOptions, request: &Request<Vec<u8>>) {
    if options.level == LogLevel::None {
        return;
    }
    debug!("--> {} {}", request.method(), request.uri());
    log_headers(options, request.headers());
    if options.level >= LogLevel::Body {
        debug!("{}", String::from_utf8_lossy(request.body()));
    }
}

fn log_response(options: &LoggingOptions, response: &Response<Vec<u8>>) {
    if options.level == LogLevel::None {
        return;
    }
    debug!("<-- {}", response.status());
    log_headers(options, response.headers());
    if options.level >= LogLevel::Body {
        debug!("{}", String::from_utf8_lossy(response.body()));
    }
}

fn log_headers(options: &LoggingOptions, headers: &HeaderMap) {
    if options.level < LogLevel::Headers {
        return;
    }
    for (name, value) in headers {
        if options.is_redacted(name.as_str()) {
            debug!("{name}: ██");
        } else {
            debug!("{name}: {}", String::from_utf8_lossy(value.as_bytes()));
        }
    }
}

#[async_trait]
impl Auth0HttpClient for DefaultHttpClient {
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Auth0HttpClientError> {
        let response = self.send(req)?;

        Ok(response)
    }

    async fn send_async(
        &self,
        req: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, Auth0HttpClientError> {
        let response = self.send_async(req).await?;

        Ok(response)
    }
}

impl From<HttpResponseError> for Auth0HttpClientError {
    fn from(err: HttpResponseError) -> Self {
        match err {
            HttpResponseError::TransportError(msg) => Auth0HttpClientError::TransportError(msg),
            HttpResponseError::BuildingResponse(msg) | HttpResponseError::ReadingResponse(msg) => {
                Auth0HttpClientError::InvalidResponse(msg)
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HttpBuildError {
    #[error("could not build the http client: {0}")]
    ClientBuilder(String),
    #[error("invalid proxy configuration: {0}")]
    Proxy(String),
    #[error("could not build the telemetry header: {0}")]
    Telemetry(String),
}

#[derive(thiserror::Error, Debug)]
enum HttpResponseError {
    #[error("could read response body: {0}")]
    ReadingResponse(String),
    #[error("could build response: {0}")]
    BuildingResponse(String),
    #[error("http transport error: `{0}`")]
    TransportError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::config::ProxyConfig;
    use assert_matches::assert_matches;
    use httpmock::{Method::GET, Method::POST, MockServer};
    use std::time::Duration;

    fn client(config: HttpConfig) -> DefaultHttpClient {
        DefaultHttpClient::new(config).unwrap()
    }

    #[test]
    fn blocking_send_returns_status_headers_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth/token")
                .header("content-type", "application/json")
                .body("{}");
            then.status(201)
                .header("x-ratelimit-limit", "10")
                .body("created");
        });

        let req = Request::post(server.url("/oauth/token"))
            .header("content-type", "application/json")
            .body(b"{}".to_vec())
            .unwrap();
        let response = Auth0HttpClient::send(&client(HttpConfig::default()), req).unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.headers()["x-ratelimit-limit"], "10");
        assert_eq!(response.body(), b"created");
        mock.assert();
    }

    #[test]
    fn telemetry_header_is_sent_by_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/userinfo").header_exists(TELEMETRY_HEADER);
            then.status(200);
        });

        let req = Request::get(server.url("/userinfo")).body(vec![]).unwrap();
        Auth0HttpClient::send(&client(HttpConfig::default()), req).unwrap();

        mock.assert();
    }

    #[test]
    fn telemetry_header_can_be_disabled() {
        let enabled = default_headers(&HttpConfig::default()).unwrap();
        let disabled = default_headers(&HttpConfig::default().with_telemetry(false)).unwrap();

        assert!(enabled.contains_key(TELEMETRY_HEADER));
        assert!(disabled.is_empty());
    }

    #[test]
    fn blocking_send_timeout_is_a_transport_error() {
        let timeout = Duration::from_millis(10);
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .delay(timeout.saturating_add(Duration::from_millis(50)));
        });

        let config = HttpConfig::new(timeout, timeout, ProxyConfig::default());
        let req = Request::get(server.url("/slow")).body(vec![]).unwrap();
        let err = Auth0HttpClient::send(&client(config), req).unwrap_err();

        assert_matches!(err, Auth0HttpClientError::TransportError(_));
        mock.assert();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn async_send_returns_status_headers_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v2/users");
                then.status(429).header("retry-after", "3").body("[]");
            })
            .await;

        let req = Request::get(server.url("/api/v2/users"))
            .body(vec![])
            .unwrap();
        let response = Auth0HttpClient::send_async(&client(HttpConfig::default()), req)
            .await
            .unwrap();

        assert_eq!(response.status(), 429);
        assert_eq!(response.headers()["retry-after"], "3");
        assert_eq!(response.body(), b"[]");
        mock.assert_async().await;
    }
}
