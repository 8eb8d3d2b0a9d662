use async_trait::async_trait;
use http::{Request, Response};

#[derive(thiserror::Error, Debug)]
pub enum HttpClientError {
    /// Represents an http transport crate error.
    #[error("HTTP Transport error: `{0}`")]
    TransportError(String),
    /// Represents an unexpected response.
    #[error("invalid http response: `{0}`")]
    InvalidResponse(String),
    /// The client cannot perform the requested kind of call.
    #[error("unsupported http client operation: `{0}`")]
    Unsupported(String),
}

/// Transport seam used by every request. Implementations must be safe to share between
/// concurrent requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request blocking the calling thread. The method and url are defined inside the Request.
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError>;

    /// Sends a request without blocking. Clients that are only able to perform blocking calls keep
    /// this default, which fails instead of blocking an asynchronous runtime.
    async fn send_async(
        &self,
        req: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, HttpClientError> {
        Err(HttpClientError::Unsupported(format!(
            "asynchronous {} {}",
            req.method(),
            req.uri()
        )))
    }
}

// Accept closures as HttpClient implementations
#[async_trait]
impl<F> HttpClient for F
where
    F: Fn(Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError> + Send + Sync,
{
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError> {
        self(req)
    }
}

/// Copies a request so it can be sent more than once. `http::Request` is not `Clone` because of
/// its extensions, which are not carried over.
pub(crate) fn copy_request(req: &Request<Vec<u8>>) -> Request<Vec<u8>> {
    let mut copy = Request::new(req.body().clone());
    *copy.method_mut() = req.method().clone();
    *copy.uri_mut() = req.uri().clone();
    *copy.version_mut() = req.version();
    *copy.headers_mut() = req.headers().clone();
    copy
}
