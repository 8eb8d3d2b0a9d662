use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::error::{self, Auth0Error};
use crate::http_client::HttpClient;
use crate::token_provider::TokenProvider;

mod body;

use body::Body;
pub use body::Part;

type Decoder<T> = fn(&[u8]) -> Result<T, String>;

/// Description of a single API call, decoding successful responses into `T`.
///
/// Built by the API clients, optionally customized by the caller and then executed with
/// [`Request::execute`] or [`Request::execute_async`]. Every execution sends a new request.
pub struct Request<T> {
    client: Arc<dyn HttpClient>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: Body,
    invalid: Option<String>,
    decode: Decoder<T>,
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("authenticated", &self.token_provider.is_some())
            .finish_non_exhaustive()
    }
}

/// Successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    status: StatusCode,
    headers: HeaderMap,
    body: T,
}

impl<T> Response<T> {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &T {
        &self.body
    }

    pub fn into_body(self) -> T {
        self.body
    }
}

impl<T> Request<T>
where
    T: DeserializeOwned,
{
    /// A request sending a JSON body, if any.
    pub fn new(client: Arc<dyn HttpClient>, method: Method, url: Url) -> Self {
        Self {
            client,
            token_provider: None,
            method,
            url,
            headers: Vec::new(),
            body: Body::json(),
            invalid: None,
            decode: decode_json::<T>,
        }
    }

    /// A request sending its parameters `application/x-www-form-urlencoded`.
    pub fn form(client: Arc<dyn HttpClient>, method: Method, url: Url) -> Result<Self, Auth0Error> {
        reject_get(&method, "Form")?;
        Ok(Self {
            body: Body::Form(Vec::new()),
            ..Self::new(client, method, url)
        })
    }

    /// A request sending its parts as `multipart/form-data`. At least one part must be added.
    pub fn multipart(
        client: Arc<dyn HttpClient>,
        method: Method,
        url: Url,
    ) -> Result<Self, Auth0Error> {
        reject_get(&method, "Multipart/form-data")?;
        Ok(Self {
            body: Body::Multipart(Vec::new()),
            ..Self::new(client, method, url)
        })
    }
}

impl<T> Request<T> {
    /// Sets a header. Names are case-insensitive and the last value set wins. `Content-Type` is
    /// ignored for form and multipart bodies and `Authorization` is replaced when the request has
    /// a token provider.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Adds a body parameter: a field of the JSON object, a form field or a multipart text part.
    pub fn with_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.body.add_parameter(name.to_string(), value.into());
        self
    }

    /// Adds the parameter only when present.
    pub fn with_optional_parameter(self, name: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.with_parameter(name, value),
            None => self,
        }
    }

    /// Appends a query parameter. Values are encoded once.
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Sends `body` as JSON instead of the parameters.
    pub fn with_body<B: Serialize>(mut self, body: &B) -> Result<Self, Auth0Error> {
        let value =
            serde_json::to_value(body).map_err(|err| Auth0Error::RequestBody(err.to_string()))?;
        match &mut self.body {
            Body::Json { body, .. } => {
                *body = Some(value);
                Ok(self)
            }
            _ => Err(Auth0Error::Configuration(
                "only JSON requests accept a body".into(),
            )),
        }
    }

    /// Adds a part to a multipart request.
    pub fn with_part(mut self, part: Part) -> Self {
        match &mut self.body {
            Body::Multipart(parts) => parts.push(part),
            _ => self.invalid = Some("only multipart requests accept parts".into()),
        }
        self
    }

    /// Authenticates the request with a bearer token obtained from `provider` right before it
    /// is sent.
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// The same request ignoring the body of successful responses.
    pub fn into_void(self) -> Request<()> {
        Request {
            client: self.client,
            token_provider: self.token_provider,
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            invalid: self.invalid,
            decode: decode_void,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Sends the request blocking the calling thread.
    pub fn execute(&self) -> Result<Response<T>, Auth0Error> {
        let mut request = self.build()?;
        if let Some(provider) = &self.token_provider {
            authorize(&mut request, &provider.get_token()?)?;
        }
        let response = self.client.send(request)?;
        self.parse(response)
    }

    /// Sends the request without blocking. Fails with [`Auth0Error::UnsupportedOperation`] when
    /// the HTTP client only supports blocking calls.
    pub async fn execute_async(&self) -> Result<Response<T>, Auth0Error> {
        let mut request = self.build()?;
        if let Some(provider) = &self.token_provider {
            authorize(&mut request, &provider.get_token_async().await?)?;
        }
        let response = self.client.send_async(request).await?;
        self.parse(response)
    }

    /// Everything but the token, so invalid requests fail before a token is requested.
    fn build(&self) -> Result<http::Request<Vec<u8>>, Auth0Error> {
        if let Some(reason) = &self.invalid {
            return Err(Auth0Error::Configuration(reason.clone()));
        }
        let body = self.body.encode()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, body.content_type.clone());
        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|err| Auth0Error::Configuration(format!("header `{name}`: {err}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|err| Auth0Error::Configuration(format!("header `{name}`: {err}")))?;
            headers.insert(name, value);
        }
        if self.body.forces_content_type() {
            headers.insert(CONTENT_TYPE, body.content_type);
        }

        let mut request = http::Request::builder()
            .method(self.method.clone())
            .uri(self.url.as_str())
            .body(body.bytes)
            .map_err(|err| Auth0Error::Configuration(err.to_string()))?;
        *request.headers_mut() = headers;
        Ok(request)
    }

    fn parse(&self, response: http::Response<Vec<u8>>) -> Result<Response<T>, Auth0Error> {
        let (parts, body) = response.into_parts();
        if !parts.status.is_success() {
            return Err(error::from_response(parts.status, &body, &parts.headers));
        }
        let body = (self.decode)(&body).map_err(|message| Auth0Error::ResponseParse {
            status: parts.status.as_u16(),
            message,
        })?;
        Ok(Response {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

fn reject_get(method: &Method, kind: &str) -> Result<(), Auth0Error> {
    if method == Method::GET {
        return Err(Auth0Error::Configuration(format!(
            "{kind} requests do not support the GET method."
        )));
    }
    Ok(())
}

fn authorize(request: &mut http::Request<Vec<u8>>, token: &str) -> Result<(), Auth0Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|err| Auth0Error::Configuration(format!("invalid access token: {err}")))?;
    value.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}

/// Empty bodies are decoded as JSON `null`.
fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, String> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|err| err.to_string())
}

fn decode_void(_body: &[u8]) -> Result<(), String> {
    Ok(())
}

/// Appends path segments to `base`, encoding each of them.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, Auth0Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Auth0Error::Configuration(format!("`{base}` cannot be a base url")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpClientError;
    use crate::http_client::tests::{MockHttpClient, response};
    use crate::token_provider::StaticTokenProvider;
    use crate::token_provider::tests::MockTokenProviderMock;
    use assert_matches::assert_matches;
    use mockall::Sequence;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        user_id: String,
    }

    fn url() -> Url {
        Url::parse("https://tenant.auth0.com/api/v2/users").unwrap()
    }

    fn client(mock: MockHttpClient) -> Arc<dyn HttpClient> {
        Arc::new(mock)
    }

    fn header<'a>(req: &'a http::Request<Vec<u8>>, name: &str) -> Option<&'a str> {
        req.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn json_request_default_content_type_can_be_overridden() {
        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .withf(|req| header(req, "content-type") == Some("application/merge-patch+json"))
            .times(1)
            .returning(|_| Ok(response(200, r#"{"user_id":"auth0|1"}"#)));

        let request = Request::<User>::new(client(mock), Method::PATCH, url())
            .with_header("Content-Type", "application/merge-patch+json");

        assert_eq!(request.execute().unwrap().body().user_id, "auth0|1");
    }

    #[test]
    fn json_request_sets_content_type_and_body() {
        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .withf(|req| {
                header(req, "content-type") == Some("application/json")
                    && header(req, "x-custom") == Some("second")
                    && serde_json::from_slice::<Value>(req.body()).unwrap()
                        == json!({"email": "me@example.com", "verify_email": true})
            })
            .times(1)
            .returning(|_| Ok(response(201, r#"{"user_id":"auth0|1"}"#)));

        let request = Request::<User>::new(client(mock), Method::POST, url())
            .with_header("X-Custom", "first")
            .with_header("x-custom", "second")
            .with_parameter("email", "me@example.com")
            .with_parameter("verify_email", true);

        let response = request.execute().unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn multipart_content_type_is_not_overridden() {
        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .withf(|req| {
                header(req, "content-type")
                    .is_some_and(|ct| ct.starts_with("multipart/form-data; boundary="))
            })
            .times(1)
            .returning(|_| Ok(response(201, r#"{"user_id":"auth0|1"}"#)));

        let request = Request::<User>::multipart(client(mock), Method::POST, url())
            .unwrap()
            .with_header("Content-Type", "text/plain")
            .with_part(Part::text("connection_id", "con_1"));

        request.execute().unwrap();
    }

    #[test]
    fn form_content_type_and_authorization_are_not_overridden() {
        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .withf(|req| {
                header(req, "content-type") == Some("application/x-www-form-urlencoded")
                    && header(req, "authorization") == Some("Bearer xyz")
                    && req.body() == b"a=1"
            })
            .times(1)
            .returning(|_| Ok(response(201, r#"{"user_id":"auth0|1"}"#)));

        let request = Request::<User>::form(client(mock), Method::POST, url())
            .unwrap()
            .with_header("Content-Type", "application/json")
            .with_header("Authorization", "Bearer abc")
            .with_parameter("a", "1")
            .with_token_provider(Arc::new(StaticTokenProvider::new("xyz")));

        request.execute().unwrap();
    }

    #[test]
    fn body_requests_reject_get() {
        let form = Request::<User>::form(client(MockHttpClient::new()), Method::GET, url());
        let multipart =
            Request::<User>::multipart(client(MockHttpClient::new()), Method::GET, url());

        assert_matches!(form, Err(Auth0Error::Configuration(msg)) => {
            assert_eq!(msg, "Form requests do not support the GET method.");
        });
        assert_matches!(multipart, Err(Auth0Error::Configuration(msg)) => {
            assert_eq!(msg, "Multipart/form-data requests do not support the GET method.");
        });
    }

    #[test]
    fn multipart_without_parts_fails_before_requesting_a_token() {
        let provider = MockTokenProviderMock::new();
        let request = Request::<User>::multipart(client(MockHttpClient::new()), Method::POST, url())
            .unwrap()
            .with_token_provider(Arc::new(provider));

        assert_matches!(request.execute(), Err(Auth0Error::RequestBody(_)));
    }

    #[test]
    fn token_provider_failure_prevents_the_request() {
        let mut provider = MockTokenProviderMock::new();
        provider
            .expect_get_token()
            .times(1)
            .returning(|| Err(Auth0Error::Transport("token endpoint unreachable".into())));

        let request = Request::<User>::new(client(MockHttpClient::new()), Method::GET, url())
            .with_token_provider(Arc::new(provider));

        assert_matches!(request.execute(), Err(Auth0Error::Transport(msg)) => {
            assert_eq!(msg, "token endpoint unreachable");
        });
    }

    #[test]
    fn undecodable_success_is_a_parse_error_with_status() {
        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .returning(|_| Ok(response(200, r#"{"unexpected":true}"#)));

        let request = Request::<User>::new(client(mock), Method::GET, url());

        assert_matches!(
            request.execute(),
            Err(Auth0Error::ResponseParse { status: 200, .. })
        );
    }

    #[test]
    fn empty_success_bodies() {
        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .times(2)
            .returning(|_| Ok(response(204, "")));
        let client = client(mock);

        let optional = Request::<Option<User>>::new(client.clone(), Method::DELETE, url());
        assert_eq!(optional.execute().unwrap().into_body(), None);

        let void = Request::<User>::new(client, Method::DELETE, url()).into_void();
        assert_eq!(void.execute().unwrap().status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn failure_responses_are_mapped() {
        let mut mock = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock.expect_send().times(1).in_sequence(&mut seq).returning(|_| {
            Ok(response(
                404,
                r#"{"statusCode":404,"error":"Not Found","message":"The user does not exist.","errorCode":"inexistent_user"}"#,
            ))
        });
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(429, "Too Many Requests")));
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(HttpClientError::TransportError("reset".into())));

        let request = Request::<User>::new(client(mock), Method::GET, url());

        assert_matches!(request.execute(), Err(Auth0Error::Api(err)) => {
            assert_eq!(err.status_code(), 404);
            assert_eq!(err.error(), Some("inexistent_user"));
        });
        assert_matches!(request.execute(), Err(Auth0Error::RateLimit(err)) => {
            assert_eq!(err.api().description(), "Too Many Requests");
        });
        assert_matches!(request.execute(), Err(Auth0Error::Transport(_)));
    }

    #[test]
    fn parts_on_json_requests_are_rejected() {
        let request = Request::<User>::new(client(MockHttpClient::new()), Method::POST, url())
            .with_part(Part::text("a", "b"));

        assert_matches!(request.execute(), Err(Auth0Error::Configuration(_)));
    }

    #[test]
    fn body_on_form_requests_is_rejected() {
        let request = Request::<User>::form(client(MockHttpClient::new()), Method::POST, url())
            .unwrap()
            .with_body(&json!({"a": 1}));

        assert_matches!(request.map(|_| ()), Err(Auth0Error::Configuration(_)));
    }

    #[test]
    fn invalid_header_fails_without_a_request() {
        let request = Request::<User>::new(client(MockHttpClient::new()), Method::GET, url())
            .with_header("bad header", "value");

        assert_matches!(request.execute(), Err(Auth0Error::Configuration(_)));
    }

    #[test]
    fn segments_and_query_are_encoded_once() {
        let base = Url::parse("https://tenant.auth0.com/api/v2/").unwrap();
        let url = endpoint(&base, &["users", "auth0|abc/def", "roles"]).unwrap();

        let request = Request::<User>::new(client(MockHttpClient::new()), Method::GET, url)
            .with_query("q", "email:\"a b\"")
            .with_query("fields", "user_id,email");

        assert_eq!(
            request.url().as_str(),
            "https://tenant.auth0.com/api/v2/users/auth0|abc%2Fdef/roles?q=email%3A%22a+b%22&fields=user_id%2Cemail"
        );
    }

    #[tokio::test]
    async fn asynchronous_execution_uses_asynchronous_token_and_transport() {
        let mut mock = MockHttpClient::new();
        mock.expect_send_async()
            .withf(|req| header(req, "authorization") == Some("Bearer async-token"))
            .times(1)
            .returning(|_| Ok(response(200, r#"{"user_id":"auth0|1"}"#)));
        let mut provider = MockTokenProviderMock::new();
        provider
            .expect_get_token_async()
            .times(1)
            .returning(|| Ok("async-token".into()));

        let request = Request::<User>::new(client(mock), Method::GET, url())
            .with_token_provider(Arc::new(provider));

        let user = request.execute_async().await.unwrap().into_body();
        assert_eq!(user, User { user_id: "auth0|1".into() });
    }

    #[tokio::test]
    async fn asynchronous_execution_on_blocking_only_client_is_unsupported() {
        let blocking_only = |_req: http::Request<Vec<u8>>| {
            Ok::<_, HttpClientError>(response(200, r#"{"user_id":"auth0|1"}"#))
        };

        let request = Request::<User>::new(Arc::new(blocking_only), Method::GET, url());

        assert_matches!(
            request.execute_async().await,
            Err(Auth0Error::UnsupportedOperation(_))
        );
        assert!(request.execute().is_ok());
    }
}
